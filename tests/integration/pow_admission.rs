//! tests/integration/pow_admission.rs
//!
//! Scenario E: a target node running with `pow_difficulty=3` rejects a
//! forged HELLO (nonce=0) and accepts one produced by a real `mine` call.

use std::net::UdpSocket;
use std::time::Duration;

use test_log::test;

use gossip_node::wire::{self, Message, MessageType};

use crate::common::harness::TestNode;

fn send_hello(socket: &UdpSocket, target: std::net::SocketAddr, sender_id: &str, nonce: u64, k: u32) {
    let payload = serde_json::json!({
        "capabilities": [],
        "pow": {"algo": "sha256", "k": k, "nonce": nonce, "digest": ""},
    });
    let hello = Message::new(
        MessageType::Hello,
        sender_id,
        socket.local_addr().unwrap().to_string(),
        0,
        0,
        payload,
    );
    let bytes = wire::encode(&hello).unwrap();
    socket.send_to(&bytes, target).unwrap();
}

#[test]
fn forged_hello_rejected_valid_hello_admitted() {
    let target = TestNode::spawn(|c| c.pow_difficulty = 3);
    let target_addr = target.addr();

    let attacker = UdpSocket::bind("127.0.0.1:0").unwrap();
    attacker.set_read_timeout(Some(Duration::from_millis(500))).unwrap();
    let forged_sender_id = "forged-sender-id";

    send_hello(&attacker, target_addr, forged_sender_id, 0, 3);
    std::thread::sleep(Duration::from_millis(300));
    assert!(
        !target.node.has_peer(&attacker.local_addr().unwrap()),
        "forged HELLO with nonce=0 must not admit the sender"
    );

    let (nonce, _digest) = gossip_node::pow::mine(forged_sender_id, 3);
    send_hello(&attacker, target_addr, forged_sender_id, nonce, 3);

    let deadline = std::time::Instant::now() + Duration::from_secs(2);
    let mut admitted = false;
    while std::time::Instant::now() < deadline {
        if target.node.has_peer(&attacker.local_addr().unwrap()) {
            admitted = true;
            break;
        }
        std::thread::sleep(Duration::from_millis(50));
    }
    assert!(admitted, "HELLO with a valid PoW nonce must admit the sender");

    // A PEERS_LIST reply should also be observable on the attacker socket.
    let mut buf = [0u8; 8192];
    let mut saw_peers_list = false;
    for _ in 0..5 {
        if let Ok((n, _)) = attacker.recv_from(&mut buf) {
            if let Ok(msg) = wire::decode(&buf[..n]) {
                if msg.msg_type == MessageType::PeersList {
                    saw_peers_list = true;
                    break;
                }
            }
        }
    }
    assert!(saw_peers_list, "expected a PEERS_LIST reply after admission");

    target.shutdown();
}
