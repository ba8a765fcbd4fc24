use super::engine::{ConnectionEngine, MediaStream, MediaTrack, SessionDescriptor};
use super::errors::ConfigError;
use super::peer::PeerSession;
use super::room::RoomRegistry;
use super::signal::ServerMessage;
use super::task_queue::TaskQueue;
use anyhow::Result;
use serde::Deserialize;
use std::fs;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Clone, Default, Deserialize)]
pub struct WsConfig {
    pub port: Option<u16>,
}

impl WsConfig {
    pub fn port(&self) -> u16 {
        self.port.unwrap_or(8081)
    }
}

#[derive(Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub ws: WsConfig,
}

pub fn load(cfg_path: &String) -> Result<Config, ConfigError> {
    let content = fs::read_to_string(cfg_path)?;
    let decoded_config = toml::from_str(&content[..])?;
    Ok(decoded_config)
}

/// The relay core: room registry plus the serialized forwarding engine.
///
/// Every operation below merely submits a task to the global queue; all
/// mutation of rooms, stream indexes and forwarding records happens inside
/// queue-executed tasks, which is the sole ordering discipline. Engine calls
/// for a peer therefore never overlap, as the underlying media primitive
/// requires strictly sequential signaling.
#[derive(Clone)]
pub struct SFU {
    registry: Arc<Mutex<RoomRegistry>>,
    queue: TaskQueue,
}

impl SFU {
    pub fn new() -> Self {
        SFU {
            registry: Arc::new(Mutex::new(RoomRegistry::new())),
            queue: TaskQueue::new(),
        }
    }

    pub fn queue(&self) -> TaskQueue {
        self.queue.clone()
    }

    pub fn registry(&self) -> Arc<Mutex<RoomRegistry>> {
        self.registry.clone()
    }

    /// Creates a peer session for a freshly accepted signaling connection and
    /// wires the engine events into the relay: `signal` goes straight back
    /// out to the owning client, `stream` schedules a publish, `error` tears
    /// the session down.
    pub async fn connect(
        &self,
        engine: Arc<dyn ConnectionEngine + Send + Sync>,
    ) -> Arc<Mutex<PeerSession>> {
        let peer = Arc::new(Mutex::new(PeerSession::new(engine.clone())));
        let peer_id = peer.lock().await.id();
        log::info!("new client connected, peer id: {}", peer_id);

        let peer_out = peer.clone();
        engine
            .on_signal(Box::new(move |descriptor: SessionDescriptor| {
                let peer_in = peer_out.clone();
                Box::pin(async move {
                    peer_in
                        .lock()
                        .await
                        .send(ServerMessage::Signal { signal: descriptor })
                        .await;
                })
            }))
            .await;

        let sfu_out = self.clone();
        let peer_out_1 = peer.clone();
        engine
            .on_stream(Box::new(move |stream: MediaStream| {
                let sfu_in = sfu_out.clone();
                let peer_in = peer_out_1.clone();
                Box::pin(async move {
                    if let Err(err) = sfu_in.publish(peer_in, stream) {
                        log::error!("publish submit error: {}", err);
                    }
                })
            }))
            .await;

        let sfu_out_1 = self.clone();
        let peer_out_2 = peer.clone();
        engine
            .on_error(Box::new(move |err: String| {
                let sfu_in = sfu_out_1.clone();
                let peer_in = peer_out_2.clone();
                let peer_id_in = peer_id.clone();
                Box::pin(async move {
                    log::error!("engine error for peer {}: {}", peer_id_in, err);
                    if let Err(err) = sfu_in.disconnect(peer_in) {
                        log::error!("disconnect submit error: {}", err);
                    }
                })
            }))
            .await;

        peer
    }

    /// Forwards a client descriptor into the peer's engine. Goes through the
    /// global queue so descriptor exchange stays ordered relative to every
    /// other engine mutation for the same peer.
    pub fn signal(
        &self,
        peer: Arc<Mutex<PeerSession>>,
        descriptor: SessionDescriptor,
    ) -> Result<()> {
        self.queue.submit(Box::pin(async move {
            let (peer_id, destroyed, engine) = {
                let peer_val = peer.lock().await;
                (peer_val.id(), peer_val.destroyed(), peer_val.engine())
            };

            if destroyed {
                log::warn!("signal for destroyed peer {} skipped", peer_id);
                return Ok(());
            }

            engine.signal(descriptor).await
        }))
    }

    /// Adds the peer to the room (creating it on first join) and notifies
    /// every other current member with a `newPeer` event. The joiner is not
    /// told about existing members; it discovers them when their published
    /// streams are forwarded to it.
    pub fn join_room(&self, peer: Arc<Mutex<PeerSession>>, room_id: String) -> Result<()> {
        let registry = self.registry.clone();

        self.queue.submit(Box::pin(async move {
            let peer_id = {
                let mut peer_val = peer.lock().await;
                if peer_val.destroyed() {
                    log::warn!(
                        "join to {} for destroyed peer {} skipped",
                        room_id,
                        peer_val.id()
                    );
                    return Ok(());
                }
                if let Some(current) = peer_val.room_id() {
                    log::warn!(
                        "peer {} already joined room {}, join ignored",
                        peer_val.id(),
                        current
                    );
                    return Ok(());
                }
                peer_val.set_room_id(room_id.clone());
                peer_val.id()
            };

            let room = registry.lock().await.get_or_create(&room_id);
            let mut room_val = room.lock().await;
            room_val.add_peer(peer_id.clone(), peer.clone());
            log::info!(
                "peer {} joined room {}, {} members",
                peer_id,
                room_id,
                room_val.member_count()
            );

            for (_, other) in room_val.other_members(&peer_id) {
                other
                    .lock()
                    .await
                    .send(ServerMessage::new_peer(peer_id.clone()))
                    .await;
            }

            Ok(())
        }))
    }

    /// Handles a `stream` event from a peer's engine: records the stream in
    /// the room index, backfills the publisher with everything already
    /// flowing from other members, and fans the new tracks out to every other
    /// member. Each individual relay is its own queued task guarded by the
    /// destination's forwarding record.
    pub fn publish(&self, peer: Arc<Mutex<PeerSession>>, stream: MediaStream) -> Result<()> {
        let sfu = self.clone();

        self.queue.submit(Box::pin(async move {
            let (peer_id, room_id) = {
                let peer_val = peer.lock().await;
                (peer_val.id(), peer_val.room_id())
            };

            let room_id = match room_id {
                Some(id) => id,
                None => {
                    log::warn!(
                        "stream {} from peer {} dropped, no room joined",
                        stream.id,
                        peer_id
                    );
                    return Ok(());
                }
            };

            let room = match sfu.registry.lock().await.get(&room_id) {
                Some(room) => room,
                None => {
                    log::warn!("room {} gone, stream {} dropped", room_id, stream.id);
                    return Ok(());
                }
            };

            let mut room_val = room.lock().await;
            let total = room_val.record_stream(peer_id.clone(), stream.clone());
            log::info!(
                "peer {} published stream {} in room {}, {} streams total",
                peer_id,
                stream.id,
                room_id,
                total
            );

            for existing in room_val.streams_of_others(&peer_id) {
                for track in existing.tracks.clone() {
                    sfu.submit_relay(peer.clone(), existing.clone(), track)?;
                }
            }

            for (_, other) in room_val.other_members(&peer_id) {
                if other.lock().await.destroyed() {
                    continue;
                }
                for track in stream.tracks.clone() {
                    sfu.submit_relay(other.clone(), stream.clone(), track)?;
                }
            }

            Ok(())
        }))
    }

    /// Schedules one (track, destination) relay. The forwarding record is the
    /// sole admission test before `add_track`; it is what keeps backfill and
    /// fan-out from ever adding the same media leg twice.
    fn submit_relay(
        &self,
        destination: Arc<Mutex<PeerSession>>,
        stream: MediaStream,
        track: MediaTrack,
    ) -> Result<()> {
        self.queue.submit(Box::pin(async move {
            let key = PeerSession::relay_key(&stream.id, &track.id);

            let (destination_id, engine) = {
                let mut destination_val = destination.lock().await;
                if destination_val.destroyed() {
                    log::warn!("relay of {} skipped, destination destroyed", key);
                    return Ok(());
                }
                if !destination_val.mark_relayed(key.clone()) {
                    log::info!(
                        "track {} already relayed to peer {}, skipping",
                        key,
                        destination_val.id()
                    );
                    return Ok(());
                }
                (destination_val.id(), destination_val.engine())
            };

            engine.add_track(track, stream).await?;
            log::info!("track {} relayed to peer {}", key, destination_id);
            Ok(())
        }))
    }

    /// Runs the disconnect protocol for a peer: notify remaining members once
    /// per (stream, member) pair, drop the peer's streams from the room
    /// index, destroy its engine and remove the membership, deleting the room
    /// when it empties. Idempotent; invoked on socket close and on fatal
    /// engine errors.
    pub fn disconnect(&self, peer: Arc<Mutex<PeerSession>>) -> Result<()> {
        let sfu = self.clone();

        self.queue.submit(Box::pin(async move {
            let (peer_id, room_id, destroyed) = {
                let peer_val = peer.lock().await;
                (peer_val.id(), peer_val.room_id(), peer_val.destroyed())
            };

            if destroyed {
                return Ok(());
            }

            log::info!("client disconnected, peer id: {}", peer_id);

            let room_id = match room_id {
                Some(id) => id,
                None => {
                    // never joined, nothing to withdraw
                    return peer.lock().await.destroy().await;
                }
            };

            if let Some(room) = sfu.registry.lock().await.get(&room_id) {
                let mut room_val = room.lock().await;
                let streams = room_val.remove_streams(&peer_id);

                for stream in &streams {
                    for (_, other) in room_val.other_members(&peer_id) {
                        if other.lock().await.destroyed() {
                            continue;
                        }
                        let other_in = other.clone();
                        let stream_id = stream.id.clone();
                        sfu.queue.submit(Box::pin(async move {
                            other_in
                                .lock()
                                .await
                                .send(ServerMessage::peer_disconnected(stream_id))
                                .await;
                            Ok(())
                        }))?;
                    }
                }

                peer.lock().await.destroy().await?;

                room_val.remove_peer(&peer_id);
                if room_val.is_empty() {
                    drop(room_val);
                    sfu.registry.lock().await.remove(&room_id);
                }
            } else {
                peer.lock().await.destroy().await?;
            }

            Ok(())
        }))
    }
}

impl Default for SFU {
    fn default() -> Self {
        SFU::new()
    }
}
