use crate::buffer::BufferError;
use crate::bus::NotificationError;
use crate::items::ItemKind;
use crate::layout::LayoutError;

/// Errors raised by the rendering core.
///
/// Every variant is an integration defect: nothing here is retried, and a
/// frame that hits one is abandoned.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    /// Vertex layout misconfiguration.
    #[error(transparent)]
    Configuration(#[from] LayoutError),

    /// A buffer operation invoked in the wrong lifecycle state.
    #[error(transparent)]
    Lifecycle(#[from] BufferError),

    /// A publisher broke a subscriber's payload contract.
    #[error(transparent)]
    Notification(#[from] NotificationError),

    /// A draw request arrived while the batch was still full from an
    /// unflushed fill. The item was not queued.
    #[error("the {kind} batch is full; the previous fill was not flushed")]
    BatchFull { kind: ItemKind },

    /// A draw request rejected before batching.
    #[error("invalid {kind} item: {reason}")]
    InvalidItem { kind: ItemKind, reason: &'static str },
}

pub type Result<T, E = Error> = core::result::Result<T, E>;
