use core::any::Any;
use core::fmt;

use super::NotificationError;

/// Identifies a kind of notification on the bus.
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub struct NotificationId(&'static str);

impl NotificationId {
    #[inline]
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    #[inline]
    pub const fn name(self) -> &'static str {
        self.0
    }
}

impl fmt::Debug for NotificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NotificationId({})", self.0)
    }
}

impl fmt::Display for NotificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// A notification being delivered: id, publisher and optional typed payload.
///
/// Borrowed for the duration of one `push`; handlers copy out what they keep.
#[derive(Copy, Clone)]
pub struct Notification<'a> {
    id: NotificationId,
    publisher: &'static str,
    data: Option<&'a dyn Any>,
}

impl<'a> Notification<'a> {
    #[inline]
    pub fn new(id: NotificationId, publisher: &'static str) -> Self {
        Self { id, publisher, data: None }
    }

    #[inline]
    pub fn with_data(id: NotificationId, publisher: &'static str, data: &'a dyn Any) -> Self {
        Self {
            id,
            publisher,
            data: Some(data),
        }
    }

    #[inline]
    pub fn id(&self) -> NotificationId {
        self.id
    }

    #[inline]
    pub fn publisher(&self) -> &'static str {
        self.publisher
    }

    /// Returns the payload as `T`.
    ///
    /// `subscriber` names the caller in the error raised when the publisher
    /// sent no payload, or a payload of another type.
    pub fn data<T: Any>(&self, subscriber: &str) -> Result<&'a T, NotificationError> {
        self.data
            .and_then(|d| d.downcast_ref::<T>())
            .ok_or_else(|| NotificationError::MissingData {
                publisher: self.publisher,
                subscriber: subscriber.to_string(),
                id: self.id,
            })
    }
}

impl fmt::Debug for Notification<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Notification")
            .field("id", &self.id)
            .field("publisher", &self.publisher)
            .field("has_data", &self.data.is_some())
            .finish()
    }
}
