//! Well-known notifications and their payloads.

use super::NotificationId;

/// The graphics device became usable. No payload.
pub const GL_INITIALIZED: NotificationId = NotificationId::new("gl-initialized");

/// The batch capacity changed. Payload: [`BatchSize`].
pub const BATCH_SIZE_SET: NotificationId = NotificationId::new("batch-size-set");

/// The window viewport was resized. Payload: [`crate::coords::Viewport`].
pub const VIEWPORT_SIZE_CHANGED: NotificationId = NotificationId::new("viewport-size-changed");

/// The application is tearing down. No payload.
///
/// Subscribers release their subscriptions and GPU handles while this is delivered.
pub const SYSTEM_SHUTTING_DOWN: NotificationId = NotificationId::new("system-shutting-down");

/// A batching service filled its last slot. Payload: [`crate::items::ItemKind`].
pub const BATCH_FILLED: NotificationId = NotificationId::new("batch-filled");

/// Payload of [`BATCH_SIZE_SET`]: number of items per batch.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct BatchSize(pub u32);
