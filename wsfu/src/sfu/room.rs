use super::engine::MediaStream;
use super::peer::PeerSession;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// A named set of peers whose published media is mutually forwarded, plus the
/// per-publisher index of streams currently flowing in it. Membership and the
/// stream index are only ever mutated from queue-executed tasks.
pub struct Room {
    id: String,
    members: HashMap<String, Arc<Mutex<PeerSession>>>,
    streams: HashMap<String, Vec<MediaStream>>,
}

impl Room {
    pub fn new(id: String) -> Self {
        Room {
            id,
            members: HashMap::new(),
            streams: HashMap::new(),
        }
    }

    pub fn id(&self) -> String {
        self.id.clone()
    }

    pub fn add_peer(&mut self, peer_id: String, peer: Arc<Mutex<PeerSession>>) {
        self.members.insert(peer_id, peer);
    }

    pub fn remove_peer(&mut self, peer_id: &str) {
        self.members.remove(peer_id);
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    pub fn other_members(&self, peer_id: &str) -> Vec<(String, Arc<Mutex<PeerSession>>)> {
        self.members
            .iter()
            .filter(|(id, _)| id.as_str() != peer_id)
            .map(|(id, peer)| (id.clone(), peer.clone()))
            .collect()
    }

    /// Records a published stream under its publisher. Re-announcing a stream
    /// id already in the index is a no-op, so a disconnect later withdraws
    /// each stream exactly once.
    pub fn record_stream(&mut self, peer_id: String, stream: MediaStream) -> usize {
        let streams = self.streams.entry(peer_id).or_insert_with(Vec::new);
        if !streams.iter().any(|existing| existing.id == stream.id) {
            streams.push(stream);
        }
        streams.len()
    }

    /// Every stream published by members other than `peer_id`, used to
    /// backfill a newly publishing peer with what is already flowing.
    pub fn streams_of_others(&self, peer_id: &str) -> Vec<MediaStream> {
        let mut streams: Vec<MediaStream> = Vec::new();
        for (publisher_id, published) in &self.streams {
            if publisher_id.as_str() == peer_id {
                continue;
            }
            streams.extend(published.iter().cloned());
        }
        streams
    }

    pub fn remove_streams(&mut self, peer_id: &str) -> Vec<MediaStream> {
        self.streams.remove(peer_id).unwrap_or_default()
    }
}

/// Maps room identifiers to live rooms. Rooms are created on first join and
/// removed when their last member leaves; no orphan room survives.
#[derive(Default)]
pub struct RoomRegistry {
    rooms: HashMap<String, Arc<Mutex<Room>>>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        RoomRegistry {
            rooms: HashMap::new(),
        }
    }

    pub fn get_or_create(&mut self, room_id: &str) -> Arc<Mutex<Room>> {
        if let Some(room) = self.rooms.get(room_id) {
            return room.clone();
        }

        log::info!("room {} created", room_id);
        let room = Arc::new(Mutex::new(Room::new(room_id.to_string())));
        self.rooms.insert(room_id.to_string(), room.clone());
        room
    }

    pub fn get(&self, room_id: &str) -> Option<Arc<Mutex<Room>>> {
        self.rooms.get(room_id).cloned()
    }

    pub fn remove(&mut self, room_id: &str) {
        if self.rooms.remove(room_id).is_some() {
            log::info!("room {} deleted", room_id);
        }
    }

    pub fn contains(&self, room_id: &str) -> bool {
        self.rooms.contains_key(room_id)
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }
}
