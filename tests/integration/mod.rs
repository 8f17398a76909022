//! tests/integration/mod.rs

mod dissemination;
mod expiry;
mod hybrid_pull;
mod pow_admission;
mod ttl_bound;
