pub mod driver;
pub mod watcher;

pub use driver::{StatusUpdate, WatchDriver, WatchRequest};
pub use watcher::{StatusStream, TransactionWatcher};
