//! Transaction lifecycle monitor.
//!
//! Watches a submitted transaction hash and folds the observation service's
//! callbacks (replaced, error, confirmed) into one current
//! [`TransactionStatus`](types::TransactionStatus).

pub mod engine;
pub mod observer;
pub mod presenter;
pub mod runtime;
pub mod types;

pub use presenter::{StatusPresenter, StatusView};
pub use runtime::{StatusStream, TransactionWatcher};
pub use types::{ObservationError, TransactionStatus, TxState, WatchError};
