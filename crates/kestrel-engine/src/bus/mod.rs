//! In-process notification bus.
//!
//! Decouples construction-time wiring from lifecycle ordering: GPU buffers
//! and batching services subscribe when built, and the runtime later
//! announces device readiness, capacity changes and shutdown.
//!
//! Delivery is synchronous and single-threaded. There is no queue, no retry
//! and no cross-thread hand-off.

mod bus;
pub mod ids;
mod notification;

pub use bus::{NotificationBus, Subscription};
pub use notification::{Notification, NotificationId};

/// Notification contract violations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NotificationError {
    /// A subscriber required a payload the publisher did not supply (or supplied with another type).
    #[error("notification '{id}' from '{publisher}' is missing the data required by '{subscriber}'")]
    MissingData {
        publisher: &'static str,
        subscriber: String,
        id: NotificationId,
    },

    /// A handler was re-entered by a nested publish of the same notification.
    #[error("subscriber '{subscriber}' was re-entered while handling '{id}'")]
    Reentrant { id: NotificationId, subscriber: String },
}
