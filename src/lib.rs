pub mod config;
pub mod monitor;
pub mod replay;

pub use alloy_primitives::TxHash;
