//! src/engine/protocol.rs
//!
//! Pure helpers for building and parsing the structured payloads carried by
//! HELLO, PEERS_LIST, IHAVE, and IWANT (§4.2, §4.5, §4.7). Kept free of any
//! locking or I/O so they can be unit-tested in isolation from `Node`.

use std::collections::HashSet;
use std::net::SocketAddr;

use serde_json::{json, Value};

/// Builds `{peers: [{addr: "ip:port"}, …]}` from a membership snapshot.
pub fn build_peers_list_payload(peers: &[SocketAddr]) -> Value {
    json!({
        "peers": peers.iter().map(|a| json!({"addr": a.to_string()})).collect::<Vec<_>>()
    })
}

/// Parses a PEERS_LIST payload, skipping any entry whose `addr` is absent
/// or fails to parse as a socket address (§4.5: "malformed entries are
/// skipped").
pub fn parse_peers_list(payload: &Value) -> Vec<SocketAddr> {
    payload
        .get("peers")
        .and_then(Value::as_array)
        .map(|entries| {
            entries
                .iter()
                .filter_map(|e| e.get("addr").and_then(Value::as_str))
                .filter_map(|s| s.parse::<SocketAddr>().ok())
                .collect()
        })
        .unwrap_or_default()
}

/// Builds `{ids: [...], max_ids: N}` for an IHAVE advertisement.
pub fn build_ihave_payload(ids: &[String], max_ids: usize) -> Value {
    json!({
        "ids": ids,
        "max_ids": max_ids,
    })
}

/// Extracts the `ids` array of an IHAVE or IWANT payload as owned strings.
pub fn parse_ids(payload: &Value) -> Vec<String> {
    payload
        .get("ids")
        .and_then(Value::as_array)
        .map(|entries| {
            entries
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_owned)
                .collect()
        })
        .unwrap_or_default()
}

/// From an advertised id list, returns the subset (deduplicated) not
/// present per `have`. Tolerates duplicate ids within `advertised`.
pub fn unknown_ids(advertised: &[String], have: impl Fn(&str) -> bool) -> Vec<String> {
    let mut seen_in_batch = HashSet::new();
    advertised
        .iter()
        .filter(|id| !have(id))
        .filter(|id| seen_in_batch.insert((*id).clone()))
        .cloned()
        .collect()
}

/// Builds `{ids: [...]}` for an IWANT solicitation.
pub fn build_iwant_payload(ids: &[String]) -> Value {
    json!({ "ids": ids })
}
