//! tests/integration/dissemination.rs
//!
//! Scenario A (push dissemination): a star of nodes bootstrapping to a
//! common seed node, with a short-lived injector originating one GOSSIP.
//! Every node's event log should observe exactly one `RECEIVE,GOSSIP`
//! line for the injected message within the timeout.

use std::time::Duration;

use test_log::test;

use crate::common::harness::{coverage_fraction, wait_for_log_line, TestNode};

#[test]
fn push_dissemination_reaches_every_node() {
    const N: usize = 10;

    let seed_node = TestNode::spawn(|c| c.seed = 0);
    let seed_addr = seed_node.addr();

    let mut nodes: Vec<TestNode> = (1..N)
        .map(|i| {
            let node = TestNode::spawn(|c| c.seed = i as u64);
            node.node.bootstrap(seed_addr).expect("bootstrap failed");
            node
        })
        .collect();

    std::thread::sleep(Duration::from_millis(1_000));

    let injector = TestNode::spawn(|c| c.seed = 999);
    injector.node.bootstrap(seed_addr).expect("bootstrap failed");
    std::thread::sleep(Duration::from_millis(200));
    injector.node.inject(b"hello").expect("inject failed");

    nodes.push(seed_node);

    let all_received = nodes
        .iter()
        .all(|n| wait_for_log_line(n, "RECEIVE,GOSSIP,", Duration::from_secs(5)));

    assert_eq!(
        coverage_fraction(&nodes, "RECEIVE,GOSSIP,"),
        1.0,
        "expected all {N} nodes to receive the injected gossip"
    );
    assert!(all_received);

    injector.shutdown();
    for node in nodes {
        node.shutdown();
    }
}
