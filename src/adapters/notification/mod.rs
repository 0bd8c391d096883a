//! Client notification adapters.
//!
//! - `HttpNotifier` - messaging gateway (bot / email relay)
//! - `LogNotifier` - writes notifications to the log when no gateway is set
//! - `MockNotifier` - records notifications for tests

mod http_notifier;
mod log_notifier;
mod mock_notifier;

pub use http_notifier::{HttpNotifier, NotifierConfig};
pub use log_notifier::LogNotifier;
pub use mock_notifier::MockNotifier;
