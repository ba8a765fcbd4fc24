use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Opaque session-description/ICE payload, passed through unmodified.
pub type SessionDescriptor = serde_json::Value;

pub type OnSignalFn = Box<
    dyn (FnMut(SessionDescriptor) -> Pin<Box<dyn Future<Output = ()> + Send + 'static>>)
        + Send
        + Sync,
>;

pub type OnStreamFn = Box<
    dyn (FnMut(MediaStream) -> Pin<Box<dyn Future<Output = ()> + Send + 'static>>) + Send + Sync,
>;

pub type OnErrorFn =
    Box<dyn (FnMut(String) -> Pin<Box<dyn Future<Output = ()> + Send + 'static>>) + Send + Sync>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Audio,
    Video,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MediaTrack {
    pub id: String,
    pub kind: MediaKind,
}

impl MediaTrack {
    pub fn new(id: String, kind: MediaKind) -> Self {
        MediaTrack { id, kind }
    }
}

/// A named bundle of tracks published by one peer. A peer may publish several
/// streams over its lifetime (camera plus screen share).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MediaStream {
    pub id: String,
    pub tracks: Vec<MediaTrack>,
}

impl MediaStream {
    pub fn new(id: String, tracks: Vec<MediaTrack>) -> Self {
        MediaStream { id, tracks }
    }
}

/// The external media-connection primitive, one instance per client.
///
/// The relay never assumes a concrete engine; it drives negotiation through
/// `signal`, attaches forwarded media through `add_track` and tears the
/// instance down with `destroy`. The engine reports its own negotiation
/// payloads, incoming streams and fatal failures through the registered
/// callbacks. The underlying primitive does not tolerate concurrent
/// renegotiation, which is why every call below is made from queue tasks only.
#[async_trait]
pub trait ConnectionEngine {
    async fn signal(&self, descriptor: SessionDescriptor) -> Result<()>;
    async fn add_track(&self, track: MediaTrack, stream: MediaStream) -> Result<()>;
    /// Idempotent; a second call is a no-op.
    async fn destroy(&self) -> Result<()>;

    async fn on_signal(&self, f: OnSignalFn);
    async fn on_stream(&self, f: OnStreamFn);
    async fn on_error(&self, f: OnErrorFn);
}

/// Creates one engine per accepted signaling connection.
pub trait EngineFactory {
    fn create_engine(&self) -> Arc<dyn ConnectionEngine + Send + Sync>;
}
