//! tests/integration/expiry.rs
//!
//! Scenario C: a peer that stops responding is expired from the view
//! within roughly `peer_timeout` of its last activity.

use std::net::UdpSocket;
use std::time::Duration;

use test_log::test;

use crate::common::harness::TestNode;

#[test]
fn unresponsive_peer_is_expired() {
    let node = TestNode::spawn(|c| {
        c.ping_interval_secs = 1;
        c.peer_timeout_secs = 2;
    });

    // A silent peer: bound but never replies to pings.
    let silent = UdpSocket::bind("127.0.0.1:0").unwrap();
    let silent_addr = silent.local_addr().unwrap();

    node.node.bootstrap(silent_addr).expect("bootstrap failed");
    assert!(node.node.has_peer(&silent_addr));

    let deadline = std::time::Instant::now() + Duration::from_secs(4);
    let mut removed = false;
    while std::time::Instant::now() < deadline {
        if !node.node.has_peer(&silent_addr) {
            removed = true;
            break;
        }
        std::thread::sleep(Duration::from_millis(100));
    }
    assert!(removed, "stale peer should have been expired within 4s");

    node.shutdown();
}
