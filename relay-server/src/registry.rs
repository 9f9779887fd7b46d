//! Component A — room registry.
//!
//! Tracks connected peers, their classification, and room membership behind
//! a single `RwLock`. Contention is negligible at LAN scale (§5), so a
//! coarse lock is the whole strategy: one writer at a time, readers take a
//! clone of whatever they need and never hold the guard across a suspension
//! point that touches the network.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use parking_lot::RwLock;

/// Where a peer's accept-time classification landed (§3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Classification {
    Internal,
    Mobile,
    Unknown,
}

impl Classification {
    pub fn as_str(&self) -> &'static str {
        match self {
            Classification::Internal => "internal",
            Classification::Mobile => "mobile",
            Classification::Unknown => "unknown",
        }
    }

    /// Evaluate the classification rules in §3, in order, first match wins.
    pub fn classify(auth_client_type: Option<&str>, user_agent: Option<&str>) -> Classification {
        if auth_client_type == Some("internal") {
            return Classification::Internal;
        }
        if let Some(ua) = user_agent {
            if ua.contains("Python/Threethreeter-Client") || ua.contains("t3t-capture-worker") {
                return Classification::Internal;
            }
            if ua.contains("iOS") || ua.contains("t3t-mobile") {
                return Classification::Mobile;
            }
        }
        Classification::Unknown
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Peer {
    pub sid: String,
    pub addr: String,
    pub connected_at: DateTime<Utc>,
    pub classification: Classification,
    pub rooms: HashSet<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("sid {sid} already registered with a different address ({existing} vs {attempted})")]
    AddressMismatch {
        sid: String,
        existing: String,
        attempted: String,
    },
}

#[derive(Default)]
struct RegistryState {
    peers: HashMap<String, Peer>,
    rooms: HashMap<String, HashSet<String>>,
    internal_slot: Option<String>,
}

#[derive(Default)]
pub struct Registry {
    state: RwLock<RegistryState>,
}

impl Registry {
    pub fn new() -> Self {
        Registry::default()
    }

    /// Register a newly-accepted peer. Idempotent for a repeat call with the
    /// same `(sid, addr)` pair; fails if the same sid reappears with a
    /// different address (transport bug, per §4.A).
    pub fn register(
        &self,
        sid: impl Into<String>,
        addr: impl Into<String>,
        classification: Classification,
    ) -> Result<Peer, RegistryError> {
        let sid = sid.into();
        let addr = addr.into();
        let mut state = self.state.write();
        if let Some(existing) = state.peers.get(&sid) {
            if existing.addr != addr {
                return Err(RegistryError::AddressMismatch {
                    sid,
                    existing: existing.addr.clone(),
                    attempted: addr,
                });
            }
            return Ok(existing.clone());
        }
        let peer = Peer {
            sid: sid.clone(),
            addr,
            connected_at: Utc::now(),
            classification,
            rooms: HashSet::new(),
        };
        state.peers.insert(sid, peer.clone());
        Ok(peer)
    }

    /// Remove a peer on disconnect, free its room memberships, and free the
    /// InternalSlot if it held it. Returns the previous internal-slot holder
    /// status so the caller can decide whether to log the eviction warning.
    pub fn deregister(&self, sid: &str) -> (Option<Peer>, bool) {
        let mut state = self.state.write();
        let peer = state.peers.remove(sid);
        if let Some(ref peer) = peer {
            for room in &peer.rooms {
                if let Some(members) = state.rooms.get_mut(room) {
                    members.remove(sid);
                }
            }
        }
        let held_slot = state.internal_slot.as_deref() == Some(sid);
        if held_slot {
            state.internal_slot = None;
        }
        (peer, held_slot)
    }

    pub fn join(&self, sid: &str, room: impl Into<String>) {
        let room = room.into();
        let mut state = self.state.write();
        if let Some(peer) = state.peers.get_mut(sid) {
            peer.rooms.insert(room.clone());
        }
        state.rooms.entry(room).or_default().insert(sid.to_string());
    }

    pub fn leave(&self, sid: &str, room: &str) {
        let mut state = self.state.write();
        if let Some(peer) = state.peers.get_mut(sid) {
            peer.rooms.remove(room);
        }
        if let Some(members) = state.rooms.get_mut(room) {
            members.remove(sid);
        }
    }

    /// Snapshot of every sid currently in `room`.
    pub fn members(&self, room: &str) -> HashSet<String> {
        self.state
            .read()
            .rooms
            .get(room)
            .cloned()
            .unwrap_or_default()
    }

    pub fn count_where(&self, predicate: impl Fn(&Peer) -> bool) -> usize {
        self.state.read().peers.values().filter(|p| predicate(p)).count()
    }

    pub fn lookup(&self, sid: &str) -> Option<Peer> {
        self.state.read().peers.get(sid).cloned()
    }

    /// Register `sid` as the internal worker, displacing any previous
    /// holder. Returns the displaced sid, if any, so the caller can log the
    /// eviction warning (§3 InternalSlot invariant).
    pub fn register_internal(&self, sid: impl Into<String>) -> Option<String> {
        let mut state = self.state.write();
        state.internal_slot.replace(sid.into())
    }

    pub fn internal_slot(&self) -> Option<String> {
        self.state.read().internal_slot.clone()
    }

    pub fn is_internal_slot(&self, sid: &str) -> bool {
        self.state.read().internal_slot.as_deref() == Some(sid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_prefers_auth_client_type_over_user_agent() {
        let c = Classification::classify(Some("internal"), Some("iOS/1.0"));
        assert_eq!(c, Classification::Internal);
    }

    #[test]
    fn classify_falls_back_to_user_agent() {
        assert_eq!(
            Classification::classify(None, Some("Python/Threethreeter-Client 2.1")),
            Classification::Internal
        );
        assert_eq!(Classification::classify(None, Some("MyApp/iOS 3.0")), Classification::Mobile);
    }

    #[test]
    fn classify_unknown_with_no_signal() {
        assert_eq!(Classification::classify(None, None), Classification::Unknown);
        assert_eq!(Classification::classify(None, Some("curl/8.0")), Classification::Unknown);
    }

    #[test]
    fn register_is_idempotent_for_same_address() {
        let reg = Registry::new();
        reg.register("s1", "1.2.3.4", Classification::Mobile).unwrap();
        let p = reg.register("s1", "1.2.3.4", Classification::Mobile).unwrap();
        assert_eq!(p.sid, "s1");
    }

    #[test]
    fn register_rejects_address_mismatch() {
        let reg = Registry::new();
        reg.register("s1", "1.2.3.4", Classification::Mobile).unwrap();
        let err = reg.register("s1", "5.6.7.8", Classification::Mobile).unwrap_err();
        assert!(matches!(err, RegistryError::AddressMismatch { .. }));
    }

    #[test]
    fn join_twice_leaves_membership_unchanged() {
        let reg = Registry::new();
        reg.register("s1", "1.2.3.4", Classification::Mobile).unwrap();
        reg.join("s1", "room");
        reg.join("s1", "room");
        assert_eq!(reg.members("room").len(), 1);
    }

    #[test]
    fn deregister_frees_internal_slot() {
        let reg = Registry::new();
        reg.register("s1", "1.2.3.4", Classification::Internal).unwrap();
        reg.register_internal("s1");
        assert_eq!(reg.internal_slot().as_deref(), Some("s1"));
        let (_, held) = reg.deregister("s1");
        assert!(held);
        assert_eq!(reg.internal_slot(), None);
    }

    #[test]
    fn register_internal_displaces_previous_holder() {
        let reg = Registry::new();
        let previous = reg.register_internal("a");
        assert_eq!(previous, None);
        let previous = reg.register_internal("b");
        assert_eq!(previous.as_deref(), Some("a"));
        assert_eq!(reg.internal_slot().as_deref(), Some("b"));
    }

    #[test]
    fn full_connect_disconnect_cycle_restores_empty_state() {
        let reg = Registry::new();
        reg.register("s1", "1.2.3.4", Classification::Mobile).unwrap();
        reg.join("s1", "room");
        reg.deregister("s1");
        assert!(reg.members("room").is_empty());
        assert_eq!(reg.lookup("s1"), None);
    }
}
