//! src/eventlog.rs
//!
//! The mandated experiment event log (§6): append-only,
//! `timestamp_ms,EVENT,msg_type,msg_id` per line, flushed immediately so the
//! harness can parse logs after SIGTERM. This is a tested data contract
//! (§8's scenarios parse it), not a pretty-printed operational log, which is
//! why it is written directly rather than through `tracing`.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::wire::MessageType;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Send,
    Receive,
}

impl Event {
    fn as_str(&self) -> &'static str {
        match self {
            Event::Send => "SEND",
            Event::Receive => "RECEIVE",
        }
    }
}

fn msg_type_tag(ty: MessageType) -> &'static str {
    match ty {
        MessageType::Hello => "HELLO",
        MessageType::GetPeers => "GET_PEERS",
        MessageType::PeersList => "PEERS_LIST",
        MessageType::Gossip => "GOSSIP",
        MessageType::Ping => "PING",
        MessageType::Pong => "PONG",
        MessageType::IHave => "IHAVE",
        MessageType::IWant => "IWANT",
    }
}

pub struct EventLog {
    file: File,
}

impl EventLog {
    /// Opens (creating/truncating) `node_<port>.log` in `dir`.
    pub fn open_for_port(dir: &Path, port: u16) -> Result<Self> {
        Self::open_path(&dir.join(format!("node_{port}.log")))
    }

    pub fn open_path(path: &PathBuf) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;
        Ok(Self { file })
    }

    pub fn record(&mut self, event: Event, msg_type: MessageType, msg_id: &str, now_ms: u64) -> Result<()> {
        writeln!(
            self.file,
            "{now_ms},{},{},{msg_id}",
            event.as_str(),
            msg_type_tag(msg_type)
        )?;
        self.file.flush()?;
        Ok(())
    }
}
