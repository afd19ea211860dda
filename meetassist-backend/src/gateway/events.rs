use crate::gateway::protocol::GatewayEvent;
use dashmap::DashMap;
use std::collections::HashSet;
use tokio::sync::mpsc;

/// Fans events out to connected clients and meeting rooms.
/// Each client owns an unbounded channel; closed channels are pruned on send.
pub struct EventBroadcaster {
    clients: DashMap<String, mpsc::UnboundedSender<GatewayEvent>>,
    rooms: DashMap<i64, HashSet<String>>,
}

impl EventBroadcaster {
    pub fn new() -> Self {
        Self {
            clients: DashMap::new(),
            rooms: DashMap::new(),
        }
    }

    /// Register a client and get its event stream
    pub fn subscribe(&self, client_id: &str) -> mpsc::UnboundedReceiver<GatewayEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.clients.insert(client_id.to_string(), tx);
        log::debug!("Client {} subscribed ({} connected)", client_id, self.clients.len());
        rx
    }

    /// Drop a client and remove it from every room. Returns the rooms it was in.
    pub fn unsubscribe(&self, client_id: &str) -> Vec<i64> {
        self.clients.remove(client_id);
        let mut left = Vec::new();
        for mut room in self.rooms.iter_mut() {
            if room.value_mut().remove(client_id) {
                left.push(*room.key());
            }
        }
        self.rooms.retain(|_, members| !members.is_empty());
        left.sort_unstable();
        left
    }

    /// Returns false when the client was already in the room
    pub fn join(&self, room: i64, client_id: &str) -> bool {
        self.rooms
            .entry(room)
            .or_default()
            .insert(client_id.to_string())
    }

    /// Returns false when the client was not in the room
    pub fn leave(&self, room: i64, client_id: &str) -> bool {
        let removed = self
            .rooms
            .get_mut(&room)
            .map(|mut members| members.remove(client_id))
            .unwrap_or(false);
        self.rooms.remove_if(&room, |_, members| members.is_empty());
        removed
    }

    pub fn is_member(&self, room: i64, client_id: &str) -> bool {
        self.rooms
            .get(&room)
            .map(|members| members.contains(client_id))
            .unwrap_or(false)
    }

    pub fn room_size(&self, room: i64) -> usize {
        self.rooms.get(&room).map(|members| members.len()).unwrap_or(0)
    }

    /// Send to every member of a room. Returns how many clients received it.
    pub fn broadcast_to_room(&self, room: i64, event: GatewayEvent) -> usize {
        let members: Vec<String> = match self.rooms.get(&room) {
            Some(members) => members.iter().cloned().collect(),
            None => return 0,
        };
        let mut delivered = 0;
        let mut dead = Vec::new();
        for client_id in members {
            match self.clients.get(&client_id) {
                Some(tx) if tx.send(event.clone()).is_ok() => delivered += 1,
                _ => dead.push(client_id),
            }
        }
        for client_id in dead {
            log::debug!("Pruning closed client {}", client_id);
            self.unsubscribe(&client_id);
        }
        delivered
    }
}

impl Default for EventBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}
