//! tests/integration/hybrid_pull.rs
//!
//! Scenario D: with push alone lossy (fanout=1, ttl=2), hybrid push-pull
//! should achieve strictly greater coverage than push-only within the
//! timeout.

use std::time::Duration;

use test_log::test;

use crate::common::harness::{coverage_fraction, TestNode};

const N: usize = 20;

struct Cluster {
    /// The 20 measured nodes (seed + 19 bootstrapped peers).
    measured: Vec<TestNode>,
    /// A dedicated injector, excluded from coverage: an originating node
    /// never logs a RECEIVE for its own message.
    injector: TestNode,
}

fn run_cluster(pull_interval_secs: u64) -> Cluster {
    let configure = move |c: &mut gossip_node::NodeConfig| {
        c.fanout = 1;
        c.ttl = 2;
        c.pull_interval_secs = pull_interval_secs;
        c.max_ihave_ids = 32;
    };

    let seed_node = TestNode::spawn(|c| {
        configure(c);
        c.seed = 0;
    });
    let seed_addr = seed_node.addr();

    let mut measured: Vec<TestNode> = (1..N)
        .map(|i| {
            let node = TestNode::spawn(|c| {
                configure(c);
                c.seed = i as u64;
            });
            node.node.bootstrap(seed_addr).expect("bootstrap failed");
            node
        })
        .collect();
    measured.push(seed_node);

    let injector = TestNode::spawn(|c| {
        configure(c);
        c.seed = 12345;
    });
    injector.node.bootstrap(seed_addr).expect("bootstrap failed");
    std::thread::sleep(Duration::from_millis(300));
    injector
        .node
        .inject(b"hybrid-payload")
        .expect("inject failed");

    Cluster { measured, injector }
}

#[test]
fn hybrid_pull_improves_coverage_over_push_only() {
    let push_only = run_cluster(0);
    std::thread::sleep(Duration::from_secs(20));
    let push_only_coverage = coverage_fraction(&push_only.measured, "RECEIVE,GOSSIP,");
    push_only.injector.shutdown();
    for node in push_only.measured {
        node.shutdown();
    }

    let hybrid = run_cluster(2);
    std::thread::sleep(Duration::from_secs(20));
    let hybrid_coverage = coverage_fraction(&hybrid.measured, "RECEIVE,GOSSIP,");
    hybrid.injector.shutdown();
    for node in hybrid.measured {
        node.shutdown();
    }

    assert!(
        hybrid_coverage >= 0.95,
        "expected hybrid coverage >= 0.95, got {hybrid_coverage}"
    );
    assert!(
        hybrid_coverage > push_only_coverage,
        "hybrid coverage ({hybrid_coverage}) should exceed push-only coverage ({push_only_coverage})"
    );
}
