use super::task_queue::TaskQueue;
use anyhow::anyhow;
use std::sync::Arc;
use tokio::sync::Mutex;

#[tokio::test]
async fn test_fifo_order() {
    let queue = TaskQueue::new();
    let sequence: Arc<Mutex<Vec<u32>>> = Arc::new(Mutex::new(Vec::new()));

    for i in 0..100u32 {
        let sequence_out = sequence.clone();
        queue
            .submit(Box::pin(async move {
                sequence_out.lock().await.push(i);
                Ok(())
            }))
            .unwrap();
    }

    queue.drain().await;

    let sequence_val = sequence.lock().await;
    assert_eq!(*sequence_val, (0..100).collect::<Vec<u32>>());
}

#[tokio::test]
async fn test_failing_task_does_not_stall_queue() {
    let queue = TaskQueue::new();
    let sequence: Arc<Mutex<Vec<&'static str>>> = Arc::new(Mutex::new(Vec::new()));

    let sequence_out = sequence.clone();
    queue
        .submit(Box::pin(async move {
            sequence_out.lock().await.push("before");
            Err(anyhow!("relay failed"))
        }))
        .unwrap();

    let sequence_out = sequence.clone();
    queue
        .submit(Box::pin(async move {
            sequence_out.lock().await.push("after");
            Ok(())
        }))
        .unwrap();

    queue.drain().await;

    let sequence_val = sequence.lock().await;
    assert_eq!(*sequence_val, vec!["before", "after"]);
}

#[tokio::test]
async fn test_nested_submit_appends_to_tail() {
    let queue = TaskQueue::new();
    let sequence: Arc<Mutex<Vec<&'static str>>> = Arc::new(Mutex::new(Vec::new()));

    let queue_out = queue.clone();
    let sequence_out = sequence.clone();
    queue
        .submit(Box::pin(async move {
            sequence_out.lock().await.push("first");

            let sequence_nested = sequence_out.clone();
            queue_out.submit(Box::pin(async move {
                sequence_nested.lock().await.push("nested");
                Ok(())
            }))?;

            Ok(())
        }))
        .unwrap();

    let sequence_out = sequence.clone();
    queue
        .submit(Box::pin(async move {
            sequence_out.lock().await.push("second");
            Ok(())
        }))
        .unwrap();

    queue.drain().await;

    // the nested task lands behind everything already queued
    let sequence_val = sequence.lock().await;
    assert_eq!(*sequence_val, vec!["first", "second", "nested"]);
}
