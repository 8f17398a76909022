//! src/error.rs
//!
//! Defines the library's custom, comprehensive `Error` enum using `thiserror`.
//! Per the error handling design, this type is reserved for the narrow set of
//! fatal paths (socket setup, configuration loading); per-datagram failures
//! such as decode errors or PoW mismatches are handled inline and never
//! surface as an `Err` here.

use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(#[from] figment::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode or decode a message: {0}")]
    Wire(#[from] serde_json::Error),

    #[error("encoded message exceeds the {0}-byte datagram limit")]
    MessageTooLarge(usize),

    #[error("invalid peer address: {0}")]
    InvalidAddress(String),
}
