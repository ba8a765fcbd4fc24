use super::engine::ConnectionEngine;
use super::signal::ServerMessage;
use anyhow::Result;
use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

pub type OnOutboundFn = Box<
    dyn (FnMut(ServerMessage) -> Pin<Box<dyn Future<Output = ()> + Send + 'static>>) + Send + Sync,
>;

/// Server-side state for one connected client: the signaling identity, the
/// exclusively owned engine instance, the room it currently belongs to and
/// the forwarding record for media relayed *to* this peer.
pub struct PeerSession {
    id: String,
    engine: Arc<dyn ConnectionEngine + Send + Sync>,
    room_id: Option<String>,
    forwarded: HashSet<String>,
    destroyed: Arc<AtomicBool>,
    on_outbound_handler: Arc<Mutex<Option<OnOutboundFn>>>,
}

impl PeerSession {
    pub fn new(engine: Arc<dyn ConnectionEngine + Send + Sync>) -> Self {
        PeerSession {
            id: Uuid::new_v4().to_string(),
            engine,
            room_id: None,
            forwarded: HashSet::new(),
            destroyed: Arc::new(AtomicBool::new(false)),
            on_outbound_handler: Arc::new(Mutex::new(None)),
        }
    }

    pub fn id(&self) -> String {
        self.id.clone()
    }

    pub fn engine(&self) -> Arc<dyn ConnectionEngine + Send + Sync> {
        self.engine.clone()
    }

    pub fn room_id(&self) -> Option<String> {
        self.room_id.clone()
    }

    pub fn set_room_id(&mut self, room_id: String) {
        self.room_id = Some(room_id);
    }

    /// Idempotency key guarding `add_track`: source stream id concatenated
    /// with track id, matching the wire-level stream/track identifiers.
    pub fn relay_key(stream_id: &str, track_id: &str) -> String {
        format!("{}-{}", stream_id, track_id)
    }

    /// Records a (stream, track) pair as relayed to this peer. Returns false
    /// if the pair was already present; entries are never removed for the
    /// lifetime of the session.
    pub fn mark_relayed(&mut self, key: String) -> bool {
        self.forwarded.insert(key)
    }

    pub fn destroyed(&self) -> bool {
        self.destroyed.load(Ordering::Relaxed)
    }

    pub async fn on_outbound(&self, f: OnOutboundFn) {
        let mut handler = self.on_outbound_handler.lock().await;
        *handler = Some(f);
    }

    /// Pushes a server message out through the signaling connection. A
    /// session without a registered outbound handler drops the message.
    pub async fn send(&self, message: ServerMessage) {
        let mut handler = self.on_outbound_handler.lock().await;
        if let Some(f) = &mut *handler {
            f(message).await;
        } else {
            log::warn!("peer {} has no outbound handler, message dropped", self.id);
        }
    }

    /// Tears down the owned engine. Idempotent; a second call is a no-op.
    pub async fn destroy(&self) -> Result<()> {
        if self.destroyed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        self.engine.destroy().await
    }
}
