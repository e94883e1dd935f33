use core::any::Any;
use core::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use crate::error::Error;

use super::{Notification, NotificationError, NotificationId};

type Handler = Box<dyn FnMut(&Notification<'_>) -> Result<(), Error>>;

struct Entry {
    key: u64,
    id: NotificationId,
    name: Rc<str>,
    active: Rc<Cell<bool>>,
    handler: Rc<RefCell<Handler>>,
}

#[derive(Default)]
struct Inner {
    next_key: Cell<u64>,
    entries: RefCell<Vec<Entry>>,
}

/// Synchronous, single-threaded publish/subscribe bus.
///
/// Cloning yields another handle to the same bus. Handlers run on the
/// publisher's stack, in subscription order; nothing is queued.
#[derive(Clone, Default)]
pub struct NotificationBus {
    inner: Rc<Inner>,
}

impl NotificationBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` for `id`.
    ///
    /// `name` identifies the subscriber in diagnostics. The handler stays
    /// registered until the returned subscription is disposed or dropped.
    pub fn subscribe<F>(&self, id: NotificationId, name: impl Into<String>, handler: F) -> Subscription
    where
        F: FnMut(&Notification<'_>) -> Result<(), Error> + 'static,
    {
        let key = self.inner.next_key.get();
        self.inner.next_key.set(key.wrapping_add(1));

        let name: Rc<str> = Rc::from(name.into());
        let active = Rc::new(Cell::new(true));

        self.inner.entries.borrow_mut().push(Entry {
            key,
            id,
            name: Rc::clone(&name),
            active: Rc::clone(&active),
            handler: Rc::new(RefCell::new(Box::new(handler))),
        });

        log::trace!("bus: '{name}' subscribed to {id}");

        Subscription {
            id,
            key,
            name,
            active,
            bus: Rc::downgrade(&self.inner),
        }
    }

    /// Publishes `id` without a payload.
    pub fn push(&self, id: NotificationId, publisher: &'static str) -> Result<(), Error> {
        self.publish(&Notification::new(id, publisher))
    }

    /// Publishes `id` with `data` as payload.
    pub fn push_data<T: Any>(&self, id: NotificationId, publisher: &'static str, data: &T) -> Result<(), Error> {
        self.publish(&Notification::with_data(id, publisher, data))
    }

    /// Delivers `notification` to every active subscriber of its id.
    ///
    /// Stops at the first failing handler and returns its error.
    pub fn publish(&self, notification: &Notification<'_>) -> Result<(), Error> {
        let id = notification.id();

        // Snapshot so handlers may subscribe/dispose while we deliver.
        let targets: Vec<(Rc<str>, Rc<Cell<bool>>, Rc<RefCell<Handler>>)> = self
            .inner
            .entries
            .borrow()
            .iter()
            .filter(|e| e.id == id)
            .map(|e| (Rc::clone(&e.name), Rc::clone(&e.active), Rc::clone(&e.handler)))
            .collect();

        for (name, active, handler) in targets {
            if !active.get() {
                continue;
            }

            let mut guard = handler.try_borrow_mut().map_err(|_| NotificationError::Reentrant {
                id,
                subscriber: name.to_string(),
            })?;
            let handler = &mut *guard;
            handler(notification)?;
        }

        Ok(())
    }

    /// Number of active subscribers for `id`.
    pub fn subscriber_count(&self, id: NotificationId) -> usize {
        self.inner.entries.borrow().iter().filter(|e| e.id == id).count()
    }
}

/// Handle to a registered handler.
///
/// Disposing is idempotent; dropping the handle disposes it.
pub struct Subscription {
    id: NotificationId,
    key: u64,
    name: Rc<str>,
    active: Rc<Cell<bool>>,
    bus: Weak<Inner>,
}

impl Subscription {
    #[inline]
    pub fn id(&self) -> NotificationId {
        self.id
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.active.get()
    }

    /// Removes the handler from the bus. A second call does nothing.
    pub fn dispose(&self) {
        if !self.active.replace(false) {
            return;
        }

        if let Some(inner) = self.bus.upgrade() {
            let removed = {
                let mut entries = inner.entries.borrow_mut();
                entries
                    .iter()
                    .position(|e| e.key == self.key)
                    .map(|i| entries.remove(i))
            };
            // The handler may own other subscriptions; drop it outside the borrow.
            drop(removed);
        }

        log::trace!("bus: '{}' unsubscribed from {}", self.name, self.id);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl core::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("name", &&*self.name)
            .field("active", &self.active.get())
            .finish()
    }
}
