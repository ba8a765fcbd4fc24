use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;
use wsfu::sfu::engine::{
    ConnectionEngine, EngineFactory, MediaStream, MediaTrack, OnErrorFn, OnSignalFn, OnStreamFn,
    SessionDescriptor,
};

/// Stand-in engine for running the gateway without a media stack. It accepts
/// signaling and track calls and never emits events. Deployments implement
/// `ConnectionEngine` over their media-connection primitive and supply their
/// own factory in `main`.
#[derive(Default)]
pub struct NoopEngine {
    #[allow(dead_code)]
    on_signal_handler: Mutex<Option<OnSignalFn>>,
    #[allow(dead_code)]
    on_stream_handler: Mutex<Option<OnStreamFn>>,
    #[allow(dead_code)]
    on_error_handler: Mutex<Option<OnErrorFn>>,
}

#[async_trait]
impl ConnectionEngine for NoopEngine {
    async fn signal(&self, descriptor: SessionDescriptor) -> Result<()> {
        log::debug!("noop engine ignoring descriptor: {}", descriptor);
        Ok(())
    }

    async fn add_track(&self, track: MediaTrack, stream: MediaStream) -> Result<()> {
        log::debug!("noop engine ignoring track {} of stream {}", track.id, stream.id);
        Ok(())
    }

    async fn destroy(&self) -> Result<()> {
        Ok(())
    }

    async fn on_signal(&self, f: OnSignalFn) {
        *self.on_signal_handler.lock().await = Some(f);
    }

    async fn on_stream(&self, f: OnStreamFn) {
        *self.on_stream_handler.lock().await = Some(f);
    }

    async fn on_error(&self, f: OnErrorFn) {
        *self.on_error_handler.lock().await = Some(f);
    }
}

#[derive(Default)]
pub struct NoopEngineFactory {}

impl EngineFactory for NoopEngineFactory {
    fn create_engine(&self) -> Arc<dyn ConnectionEngine + Send + Sync> {
        Arc::new(NoopEngine::default())
    }
}
