pub mod config;
pub mod logging;

pub mod batch;
pub mod control;
pub mod fingerprint;
pub mod proxy;
pub mod retry;
pub mod scheduler;
pub mod storage;
pub mod tracking;
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;
