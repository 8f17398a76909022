//! src/engine/mod.rs
//!
//! Defines `Node`, the core application actor: the listener, ping, and
//! optional pull threads, the per-message-type handlers, and the relay
//! path. This is the seam where §4.4 through §4.7 of the component design
//! all meet.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use parking_lot::Mutex;

use crate::config::NodeConfig;
use crate::eventlog::{Event, EventLog};
use crate::gossip::{GossipStore, SeenSet};
use crate::membership::Membership;
use crate::pow;
use crate::transport::UdpTransport;
use crate::wire::{self, Message, MessageType};

pub mod protocol;

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before the epoch")
        .as_millis() as u64
}

/// State guarded by the node's main lock (`node.lock` in §5): the seen-set,
/// the gossip store, the sent-datagram counter, and the log sink. Never
/// held across a `sendto` — every call site acquires this lock only to
/// record bookkeeping immediately after a send or receive completes.
struct NodeState {
    seen: SeenSet,
    store: GossipStore,
    sent_messages: u64,
    log: EventLog,
}

impl NodeState {
    fn note_sent(&mut self) {
        self.sent_messages += 1;
    }
}

/// A single gossip-protocol node: owns its socket, its membership view, and
/// its node state, and runs the listener/ping/pull threads described in §5.
pub struct Node {
    config: NodeConfig,
    node_id: String,
    self_addr: SocketAddr,
    transport: Arc<UdpTransport>,
    running: Arc<AtomicBool>,
    membership: Arc<Mutex<Membership>>,
    state: Arc<Mutex<NodeState>>,
    threads: Vec<JoinHandle<()>>,
}

impl Node {
    /// Binds the socket and initializes membership/seen-set/store/log for
    /// `config`. Corresponds to the `init` operation of §6's control
    /// surface; socket bind failure is the one fatal path (§7).
    pub fn init(config: NodeConfig, log_dir: &std::path::Path) -> crate::error::Result<Self> {
        let transport = UdpTransport::bind(config.port)?;
        let self_addr = transport.local_addr()?;
        let node_id = uuid::Uuid::new_v4().to_string();
        let log = EventLog::open_for_port(log_dir, config.port)?;

        Ok(Self {
            membership: Arc::new(Mutex::new(Membership::init(config.peer_limit, config.seed))),
            state: Arc::new(Mutex::new(NodeState {
                seen: SeenSet::new(),
                store: GossipStore::new(),
                sent_messages: 0,
                log,
            })),
            transport: Arc::new(transport),
            running: Arc::new(AtomicBool::new(false)),
            threads: Vec::new(),
            node_id,
            self_addr,
            config,
        })
    }

    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.self_addr
    }

    /// Monotonic count of datagrams sent, guarded by `node.lock` per §3.
    pub fn sent_messages(&self) -> u64 {
        self.state.lock().sent_messages
    }

    /// Current membership view size. Read-only observability, not part of
    /// the propagation path itself.
    pub fn peer_count(&self) -> usize {
        self.membership.lock().len()
    }

    pub fn has_peer(&self, addr: &SocketAddr) -> bool {
        self.membership.lock().contains(addr)
    }

    /// Inserts `boot_addr` into the view, sends a HELLO (with a PoW
    /// envelope if `pow_difficulty > 0`), then a GET_PEERS (§4.5).
    pub fn bootstrap(&self, boot_addr: SocketAddr) -> crate::error::Result<()> {
        self.membership.lock().add(boot_addr, now_ms());

        let payload = if self.config.pow_difficulty > 0 {
            let (nonce, digest) = pow::mine(&self.node_id, self.config.pow_difficulty);
            serde_json::json!({
                "capabilities": [],
                "pow": {
                    "algo": "sha256",
                    "k": self.config.pow_difficulty,
                    "nonce": nonce,
                    "digest": digest,
                }
            })
        } else {
            serde_json::json!({"capabilities": []})
        };
        let hello = Message::new(
            MessageType::Hello,
            &self.node_id,
            self.self_addr.to_string(),
            now_ms(),
            0,
            payload,
        );
        self.send_message(&hello, boot_addr)?;

        let get_peers = Message::new(
            MessageType::GetPeers,
            &self.node_id,
            self.self_addr.to_string(),
            now_ms(),
            0,
            serde_json::json!({}),
        );
        self.send_message(&get_peers, boot_addr)?;
        Ok(())
    }

    /// Starts the listener, ping, and (if enabled) pull threads.
    pub fn run(&mut self) {
        self.running.store(true, Ordering::SeqCst);

        let listener = {
            let transport = Arc::clone(&self.transport);
            let running = Arc::clone(&self.running);
            let membership = Arc::clone(&self.membership);
            let state = Arc::clone(&self.state);
            let node_id = self.node_id.clone();
            let self_addr = self.self_addr;
            let config = self.config.clone();
            std::thread::spawn(move || {
                listener_loop(transport, running, membership, state, node_id, self_addr, config);
            })
        };

        let ping = {
            let transport = Arc::clone(&self.transport);
            let running = Arc::clone(&self.running);
            let membership = Arc::clone(&self.membership);
            let state = Arc::clone(&self.state);
            let node_id = self.node_id.clone();
            let self_addr = self.self_addr;
            let config = self.config.clone();
            std::thread::spawn(move || {
                ping_loop(transport, running, membership, state, node_id, self_addr, config);
            })
        };

        self.threads.push(listener);
        self.threads.push(ping);

        if self.config.pull_interval_secs > 0 {
            let transport = Arc::clone(&self.transport);
            let running = Arc::clone(&self.running);
            let membership = Arc::clone(&self.membership);
            let state = Arc::clone(&self.state);
            let node_id = self.node_id.clone();
            let self_addr = self.self_addr;
            let config = self.config.clone();
            self.threads.push(std::thread::spawn(move || {
                pull_loop(transport, running, membership, state, node_id, self_addr, config);
            }));
        }
    }

    /// Originates a GOSSIP at the configured TTL and relays it immediately.
    pub fn inject(&self, payload_bytes: &[u8]) -> crate::error::Result<()> {
        let payload = serde_json::json!({"data": hex::encode(payload_bytes)});
        let msg = Message::new(
            MessageType::Gossip,
            &self.node_id,
            self.self_addr.to_string(),
            now_ms(),
            self.config.ttl,
            payload,
        );

        {
            let mut state = self.state.lock();
            state.seen.mark_seen(&msg.msg_id);
            let encoded = wire::encode(&msg)?;
            state.store.store(&msg.msg_id, encoded);
        }

        self.relay(&msg, None)
    }

    /// Stops the running flag; threads observe it within `RECV_TIMEOUT` or
    /// their next scheduled tick and exit. Joins all threads.
    pub fn shutdown(mut self) {
        self.running.store(false, Ordering::SeqCst);
        for handle in self.threads.drain(..) {
            let _ = handle.join();
        }
    }

    fn send_message(&self, msg: &Message, to: SocketAddr) -> crate::error::Result<()> {
        let encoded = wire::encode(msg)?;
        self.transport.send_to(&encoded, to)?;
        self.state.lock().note_sent();
        Ok(())
    }

    /// Relays `msg` to up to `fanout` peers, decrementing TTL, excluding
    /// `exclude` (typically the immediate sender). No-op if `msg.ttl == 0`.
    /// Never holds a lock across `sendto` (§4.4, §5).
    fn relay(&self, msg: &Message, exclude: Option<&SocketAddr>) -> crate::error::Result<()> {
        if msg.ttl == 0 {
            return Ok(());
        }
        let mut relayed = msg.clone();
        relayed.ttl -= 1;
        let encoded = wire::encode(&relayed)?;

        let targets = self
            .membership
            .lock()
            .sample(self.config.fanout, exclude)
            .into_iter()
            .map(|p| p.addr)
            .collect::<Vec<_>>();

        for addr in targets {
            self.transport.send_to(&encoded, addr)?;
            let mut state = self.state.lock();
            state.note_sent();
            let _ = state.log.record(Event::Send, MessageType::Gossip, &relayed.msg_id, now_ms());
        }
        Ok(())
    }
}

#[allow(clippy::too_many_arguments)]
fn listener_loop(
    transport: Arc<UdpTransport>,
    running: Arc<AtomicBool>,
    membership: Arc<Mutex<Membership>>,
    state: Arc<Mutex<NodeState>>,
    node_id: String,
    self_addr: SocketAddr,
    config: NodeConfig,
) {
    while running.load(Ordering::SeqCst) {
        let datagram = match transport.recv() {
            Ok(Some(d)) => d,
            Ok(None) => continue,
            Err(e) => {
                tracing::warn!(error = %e, "transient recv failure");
                continue;
            }
        };
        let (bytes, from) = datagram;
        let msg = match wire::decode(&bytes) {
            Ok(m) => m,
            Err(e) => {
                tracing::debug!(error = %e, "dropping undecodable datagram");
                continue;
            }
        };

        membership.lock().touch_if_known(&from, now_ms());

        dispatch(
            &transport,
            &membership,
            &state,
            &node_id,
            self_addr,
            &config,
            msg,
            from,
        );
    }
}

#[allow(clippy::too_many_arguments)]
fn dispatch(
    transport: &Arc<UdpTransport>,
    membership: &Arc<Mutex<Membership>>,
    state: &Arc<Mutex<NodeState>>,
    node_id: &str,
    self_addr: SocketAddr,
    config: &NodeConfig,
    msg: Message,
    from: SocketAddr,
) {
    let send = |m: &Message, to: SocketAddr| {
        if let Ok(encoded) = wire::encode(m) {
            let _ = transport.send_to(&encoded, to);
            state.lock().note_sent();
        }
    };

    match msg.msg_type {
        MessageType::Hello => handle_hello(&send, membership, node_id, self_addr, config, &msg, from),
        MessageType::GetPeers => handle_get_peers(&send, membership, node_id, self_addr, &msg, from),
        MessageType::PeersList => handle_peers_list(membership, &msg),
        MessageType::Gossip => handle_gossip(transport, membership, state, config, &msg, from),
        MessageType::Ping => handle_ping(&send, membership, node_id, self_addr, &msg, from),
        MessageType::Pong => {
            membership.lock().touch_if_known(&from, now_ms());
        }
        MessageType::IHave => handle_ihave(&send, state, node_id, self_addr, &msg, from),
        MessageType::IWant => handle_iwant(transport, state, &msg, from),
    }
}

fn handle_hello(
    send: &impl Fn(&Message, SocketAddr),
    membership: &Arc<Mutex<Membership>>,
    node_id: &str,
    self_addr: SocketAddr,
    config: &NodeConfig,
    msg: &Message,
    from: SocketAddr,
) {
    let nonce = msg
        .payload
        .get("pow")
        .and_then(|pow_val| pow_val.get("nonce"))
        .and_then(|v| v.as_u64())
        .unwrap_or(0);

    if !pow::verify(&msg.sender_id, nonce, config.pow_difficulty) {
        tracing::debug!(sender = %msg.sender_id, "rejecting HELLO: PoW verification failed");
        return;
    }

    membership.lock().add(from, now_ms());
    handle_get_peers(send, membership, node_id, self_addr, msg, from);
}

fn handle_get_peers(
    send: &impl Fn(&Message, SocketAddr),
    membership: &Arc<Mutex<Membership>>,
    node_id: &str,
    self_addr: SocketAddr,
    _msg: &Message,
    from: SocketAddr,
) {
    let peers: Vec<SocketAddr> = membership.lock().iter().map(|p| p.addr).collect();
    let payload = protocol::build_peers_list_payload(&peers);
    let reply = Message::new(
        MessageType::PeersList,
        node_id,
        self_addr.to_string(),
        now_ms(),
        0,
        payload,
    );
    send(&reply, from);
}

fn handle_peers_list(membership: &Arc<Mutex<Membership>>, msg: &Message) {
    let addrs = protocol::parse_peers_list(&msg.payload);
    let now = now_ms();
    let mut membership = membership.lock();
    for addr in addrs {
        membership.add(addr, now);
    }
}

fn handle_gossip(
    transport: &Arc<UdpTransport>,
    membership: &Arc<Mutex<Membership>>,
    state: &Arc<Mutex<NodeState>>,
    config: &NodeConfig,
    msg: &Message,
    from: SocketAddr,
) {
    let is_new = {
        let mut state = state.lock();
        let was_new = state.seen.mark_seen(&msg.msg_id);
        if was_new {
            let _ = state
                .log
                .record(Event::Receive, MessageType::Gossip, &msg.msg_id, now_ms());
            if let Ok(encoded) = wire::encode(msg) {
                state.store.store(&msg.msg_id, encoded);
            }
        }
        was_new
    };
    if !is_new {
        return;
    }

    if msg.ttl == 0 {
        return;
    }
    let mut relayed = msg.clone();
    relayed.ttl -= 1;
    let encoded = match wire::encode(&relayed) {
        Ok(e) => e,
        Err(_) => return,
    };
    let targets: Vec<SocketAddr> = membership
        .lock()
        .sample(config.fanout, Some(&from))
        .into_iter()
        .map(|p| p.addr)
        .collect();
    for addr in targets {
        let _ = transport.send_to(&encoded, addr);
        let mut state = state.lock();
        state.note_sent();
        let _ = state
            .log
            .record(Event::Send, MessageType::Gossip, &relayed.msg_id, now_ms());
    }
}

fn handle_ping(
    send: &impl Fn(&Message, SocketAddr),
    membership: &Arc<Mutex<Membership>>,
    node_id: &str,
    self_addr: SocketAddr,
    msg: &Message,
    from: SocketAddr,
) {
    membership.lock().touch_if_known(&from, now_ms());
    let reply = Message::new(
        MessageType::Pong,
        node_id,
        self_addr.to_string(),
        now_ms(),
        0,
        serde_json::json!({"reply_to": msg.msg_id}),
    );
    send(&reply, from);
}

fn handle_ihave(
    send: &impl Fn(&Message, SocketAddr),
    state: &Arc<Mutex<NodeState>>,
    node_id: &str,
    self_addr: SocketAddr,
    msg: &Message,
    from: SocketAddr,
) {
    let advertised = protocol::parse_ids(&msg.payload);
    let unknown = {
        let state = state.lock();
        protocol::unknown_ids(&advertised, |id| state.seen.contains(id))
    };
    if unknown.is_empty() {
        return;
    }
    let payload = protocol::build_iwant_payload(&unknown);
    let reply = Message::new(
        MessageType::IWant,
        node_id,
        self_addr.to_string(),
        now_ms(),
        0,
        payload,
    );
    send(&reply, from);
}

fn handle_iwant(transport: &Arc<UdpTransport>, state: &Arc<Mutex<NodeState>>, msg: &Message, from: SocketAddr) {
    let requested = protocol::parse_ids(&msg.payload);
    let payloads: Vec<Vec<u8>> = {
        let state = state.lock();
        requested
            .iter()
            .filter_map(|id| state.store.get(id).map(|b| b.to_vec()))
            .collect()
    };
    for bytes in payloads {
        let _ = transport.send_to(&bytes, from);
    }
}

fn ping_loop(
    transport: Arc<UdpTransport>,
    running: Arc<AtomicBool>,
    membership: Arc<Mutex<Membership>>,
    state: Arc<Mutex<NodeState>>,
    node_id: String,
    self_addr: SocketAddr,
    config: NodeConfig,
) {
    let interval = Duration::from_secs(config.ping_interval_secs);
    let mut last_tick = std::time::Instant::now();
    while running.load(Ordering::SeqCst) {
        std::thread::sleep(Duration::from_millis(100));
        if last_tick.elapsed() < interval {
            continue;
        }
        last_tick = std::time::Instant::now();
        if !running.load(Ordering::SeqCst) {
            break;
        }

        let targets: Vec<SocketAddr> = membership
            .lock()
            .sample(config.fanout, None)
            .into_iter()
            .map(|p| p.addr)
            .collect();
        for addr in &targets {
            let ping = Message::new(
                MessageType::Ping,
                &node_id,
                self_addr.to_string(),
                now_ms(),
                0,
                serde_json::json!({}),
            );
            if let Ok(encoded) = wire::encode(&ping) {
                if transport.send_to(&encoded, *addr).is_ok() {
                    state.lock().note_sent();
                }
            }
        }

        membership
            .lock()
            .expire(now_ms(), config.peer_timeout_secs * 1000);
    }
}

fn pull_loop(
    transport: Arc<UdpTransport>,
    running: Arc<AtomicBool>,
    membership: Arc<Mutex<Membership>>,
    state: Arc<Mutex<NodeState>>,
    node_id: String,
    self_addr: SocketAddr,
    config: NodeConfig,
) {
    let interval = Duration::from_secs(config.pull_interval_secs);
    let mut last_tick = std::time::Instant::now();
    while running.load(Ordering::SeqCst) {
        std::thread::sleep(Duration::from_millis(100));
        if last_tick.elapsed() < interval {
            continue;
        }
        last_tick = std::time::Instant::now();
        if !running.load(Ordering::SeqCst) {
            break;
        }

        let ids = state.lock().seen.recent_ids(config.max_ihave_ids);
        let payload = protocol::build_ihave_payload(&ids, config.max_ihave_ids);
        let targets: Vec<SocketAddr> = membership
            .lock()
            .sample(config.fanout, None)
            .into_iter()
            .map(|p| p.addr)
            .collect();
        for addr in targets {
            let ihave = Message::new(
                MessageType::IHave,
                &node_id,
                self_addr.to_string(),
                now_ms(),
                0,
                payload.clone(),
            );
            if let Ok(encoded) = wire::encode(&ihave) {
                if transport.send_to(&encoded, addr).is_ok() {
                    state.lock().note_sent();
                }
            }
        }
    }
}
