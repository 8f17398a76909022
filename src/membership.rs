//! src/membership.rs
//!
//! The bounded, self-healing partial view of the overlay (§4.1). Owns its
//! own lock in the running node (`membership.lock`), separate from the
//! node's main lock, so handlers that only touch the view never contend
//! with handlers touching the seen-set or gossip store.

use std::net::SocketAddr;

use rand::rngs::StdRng;
use rand::SeedableRng;

/// Hard ceiling on view size regardless of configured `peer_limit`.
pub const MAX_PEERS: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeerRecord {
    pub addr: SocketAddr,
    pub last_seen_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Added,
    Refreshed,
    Rejected,
}

/// The partial membership view. Every public operation acquires nothing
/// itself — callers own the lock (typically `Arc<parking_lot::Mutex<Membership>>`
/// in the owning `Node`) for the operation's full duration, per §4.1.
pub struct Membership {
    limit: usize,
    peers: Vec<PeerRecord>,
    rng: StdRng,
}

impl Membership {
    /// Empties the view and fixes capacity to `min(limit, MAX_PEERS)`.
    pub fn init(limit: usize, seed: u64) -> Self {
        Self {
            limit: limit.min(MAX_PEERS),
            peers: Vec::new(),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    pub fn contains(&self, addr: &SocketAddr) -> bool {
        self.peers.iter().any(|p| &p.addr == addr)
    }

    /// Refreshes `addr`'s last-seen if present; otherwise inserts it if
    /// there is room. Never evicts to make room.
    pub fn add(&mut self, addr: SocketAddr, now_ms: u64) -> AddOutcome {
        if let Some(peer) = self.peers.iter_mut().find(|p| p.addr == addr) {
            peer.last_seen_ms = now_ms;
            return AddOutcome::Refreshed;
        }
        if self.peers.len() < self.limit {
            self.peers.push(PeerRecord {
                addr,
                last_seen_ms: now_ms,
            });
            AddOutcome::Added
        } else {
            AddOutcome::Rejected
        }
    }

    /// Refreshes `addr`'s last-seen only if it is already a known peer;
    /// a no-op otherwise. Backs the "any inbound datagram refreshes
    /// liveness" rule of §4.6 without implicitly growing the view.
    pub fn touch_if_known(&mut self, addr: &SocketAddr, now_ms: u64) {
        if let Some(peer) = self.peers.iter_mut().find(|p| &p.addr == addr) {
            peer.last_seen_ms = now_ms;
        }
    }

    /// Selects up to `k` distinct peers uniformly at random, omitting any
    /// equal to `exclude`. Partial Fisher-Yates over index positions using
    /// the view's own deterministic PRNG.
    pub fn sample(&mut self, k: usize, exclude: Option<&SocketAddr>) -> Vec<PeerRecord> {
        use rand::Rng;

        let mut indices: Vec<usize> = (0..self.peers.len())
            .filter(|&i| exclude != Some(&self.peers[i].addr))
            .collect();

        let take = k.min(indices.len());
        let mut result = Vec::with_capacity(take);
        for i in 0..take {
            let remaining = indices.len() - i;
            let j = i + self.rng.gen_range(0..remaining);
            indices.swap(i, j);
            result.push(self.peers[indices[i]]);
        }
        result
    }

    /// Removes every peer whose last-seen is older than `peer_timeout_ms`.
    /// Uses swap-remove; ordering is not preserved.
    pub fn expire(&mut self, now_ms: u64, peer_timeout_ms: u64) {
        let mut i = 0;
        while i < self.peers.len() {
            if now_ms.saturating_sub(self.peers[i].last_seen_ms) > peer_timeout_ms {
                self.peers.swap_remove(i);
            } else {
                i += 1;
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &PeerRecord> {
        self.peers.iter()
    }
}
