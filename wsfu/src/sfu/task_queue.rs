use super::errors::Error;
use anyhow::Result;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::{sleep, Duration};

pub type Task = Pin<Box<dyn Future<Output = Result<()>> + Send + 'static>>;

/// Serializes every state-mutating operation server-wide.
///
/// Tasks run strictly in submission order, one at a time; the worker does not
/// pick up the next task until the current one (including its awaited engine
/// calls) has completed. A task submitting further tasks appends them to the
/// tail. A failing task is logged and the worker moves on.
#[derive(Clone)]
pub struct TaskQueue {
    sender: mpsc::UnboundedSender<Task>,
    pending: Arc<AtomicUsize>,
}

impl TaskQueue {
    pub fn new() -> Self {
        let (sender, mut receiver) = mpsc::unbounded_channel::<Task>();
        let pending = Arc::new(AtomicUsize::new(0));
        let pending_out = pending.clone();

        tokio::spawn(async move {
            while let Some(task) = receiver.recv().await {
                if let Err(err) = task.await {
                    log::error!("task error: {}", err);
                }
                pending_out.fetch_sub(1, Ordering::SeqCst);
            }
        });

        TaskQueue { sender, pending }
    }

    /// Appends a task and returns immediately.
    pub fn submit(&self, task: Task) -> Result<()> {
        self.pending.fetch_add(1, Ordering::SeqCst);
        self.sender.send(task).map_err(|_| {
            self.pending.fetch_sub(1, Ordering::SeqCst);
            Error::ErrChannelSend
        })?;
        Ok(())
    }

    pub fn is_idle(&self) -> bool {
        self.pending.load(Ordering::SeqCst) == 0
    }

    /// Waits until no task is queued or running. Observation hook for tests
    /// and shutdown diagnostics; tasks submitted while draining are waited
    /// for as well.
    pub async fn drain(&self) {
        while !self.is_idle() {
            sleep(Duration::from_millis(1)).await;
        }
    }
}

impl Default for TaskQueue {
    fn default() -> Self {
        TaskQueue::new()
    }
}
