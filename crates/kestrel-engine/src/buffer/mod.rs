//! Lifecycle-gated GPU buffers, one per batch item kind.

mod gpu_buffer;

pub use gpu_buffer::GpuBuffer;

use core::fmt;

use crate::items::ItemKind;

/// Lifecycle of a [`GpuBuffer`].
///
/// `Uninitialized -> Initialized -> Disposed`. GPU handles exist only while
/// `Initialized`; `Disposed` is terminal.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub enum BufferState {
    #[default]
    Uninitialized,
    Initialized,
    Disposed,
}

impl fmt::Display for BufferState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BufferState::Uninitialized => "uninitialized",
            BufferState::Initialized => "initialized",
            BufferState::Disposed => "disposed",
        })
    }
}

/// Buffer operations invoked in the wrong state or out of bounds.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BufferError {
    #[error("The {kind} buffer has not been initialized.")]
    NotInitialized { kind: ItemKind, state: BufferState },

    #[error("The {kind} buffer has been disposed.")]
    Disposed { kind: ItemKind },

    #[error("slot {slot} is outside the {kind} buffer capacity of {capacity}")]
    SlotOutOfRange { kind: ItemKind, slot: u32, capacity: u32 },
}
