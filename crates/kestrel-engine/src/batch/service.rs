use core::cell::RefCell;
use std::rc::Rc;

use crate::bus::ids::{BatchSize, BATCH_FILLED, BATCH_SIZE_SET, SYSTEM_SHUTTING_DOWN};
use crate::bus::{NotificationBus, Subscription};
use crate::config::BatchConfig;
use crate::error::Result;
use crate::items::BatchItem;

const PUBLISHER: &str = "BatchingService";

/// One position in a batch.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Slot<I> {
    pub occupied: bool,
    pub item: I,
}

/// What happened to an item passed to [`BatchingService::add`].
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AddOutcome {
    /// Stored; the batch still has room.
    Queued,
    /// Stored in the last free slot. `BATCH_FILLED` has been published and
    /// the batch must be flushed before the next add.
    Filled,
    /// No free slot: the previous fill was not flushed. The item was discarded.
    Dropped,
}

/// Fixed-size slot array for one item kind.
///
/// The array is sized by the most recent `BATCH_SIZE_SET`; a resize discards
/// whatever was pending.
pub struct BatchingService<I: BatchItem> {
    bus: NotificationBus,
    slots: Rc<RefCell<Vec<Slot<I>>>>,
    subscriptions: Rc<RefCell<Vec<Subscription>>>,
}

impl<I: BatchItem> BatchingService<I> {
    pub fn new(bus: &NotificationBus, config: BatchConfig) -> Self {
        let slots = Rc::new(RefCell::new(vec![Slot::default(); config.batch_size as usize]));
        let subscriptions: Rc<RefCell<Vec<Subscription>>> = Rc::new(RefCell::new(Vec::with_capacity(2)));
        let name = format!("BatchingService<{}>", I::KIND);

        let weak = Rc::downgrade(&slots);
        let sub_name = name.clone();
        let resize = bus.subscribe(BATCH_SIZE_SET, name.clone(), move |n| {
            let BatchSize(size) = *n.data::<BatchSize>(&sub_name)?;
            if size == 0 {
                log::warn!("{sub_name}: ignoring batch size 0");
                return Ok(());
            }
            if let Some(slots) = weak.upgrade() {
                *slots.borrow_mut() = vec![Slot::default(); size as usize];
            }
            Ok(())
        });

        let subs = Rc::downgrade(&subscriptions);
        let shutdown = bus.subscribe(SYSTEM_SHUTTING_DOWN, name, move |_| {
            if let Some(subs) = subs.upgrade() {
                subs.borrow().iter().for_each(Subscription::dispose);
            }
            Ok(())
        });

        subscriptions.borrow_mut().extend([resize, shutdown]);

        Self {
            bus: bus.clone(),
            slots,
            subscriptions,
        }
    }

    /// Stores `item` in the first free slot.
    ///
    /// When that fills the batch, `BATCH_FILLED` (payload: the item kind) is
    /// published before returning [`AddOutcome::Filled`].
    pub fn add(&self, item: I) -> Result<AddOutcome> {
        let filled = {
            let mut slots = self.slots.borrow_mut();
            let Some(free) = slots.iter().position(|s| !s.occupied) else {
                log::warn!("{} batch is full; item dropped", I::KIND);
                return Ok(AddOutcome::Dropped);
            };
            slots[free] = Slot { occupied: true, item };
            slots.iter().all(|s| s.occupied)
        };

        if !filled {
            return Ok(AddOutcome::Queued);
        }

        log::trace!("{} batch filled", I::KIND);
        self.bus.push_data(BATCH_FILLED, PUBLISHER, &I::KIND)?;
        Ok(AddOutcome::Filled)
    }

    /// Adds every item in order. Returns how many times the batch filled.
    pub fn add_range(&self, items: impl IntoIterator<Item = I>) -> Result<u32> {
        let mut fills = 0;
        for item in items {
            if self.add(item)? == AddOutcome::Filled {
                fills += 1;
            }
        }
        Ok(fills)
    }

    /// Resets occupied slots to the empty sentinel.
    pub fn empty_batch(&self) {
        for slot in self.slots.borrow_mut().iter_mut().filter(|s| s.occupied) {
            *slot = Slot::default();
        }
    }

    /// Snapshot of every slot, in slot order.
    pub fn batch_items(&self) -> Vec<Slot<I>> {
        self.slots.borrow().clone()
    }

    /// `(slot, item)` for occupied slots, in slot order.
    pub fn occupied_items(&self) -> Vec<(u32, I)> {
        self.slots
            .borrow()
            .iter()
            .enumerate()
            .filter(|(_, s)| s.occupied)
            .map(|(i, s)| (i as u32, s.item))
            .collect()
    }

    pub fn occupied_count(&self) -> usize {
        self.slots.borrow().iter().filter(|s| s.occupied).count()
    }

    pub fn capacity(&self) -> usize {
        self.slots.borrow().len()
    }

    pub fn is_full(&self) -> bool {
        let slots = self.slots.borrow();
        !slots.is_empty() && slots.iter().all(|s| s.occupied)
    }

    pub fn dispose(&self) {
        self.subscriptions.borrow().iter().for_each(Subscription::dispose);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::Rect;
    use crate::items::{ItemKind, RectItem};
    use crate::paint::Color;
    use core::cell::Cell;

    fn rect(x: f32) -> RectItem {
        RectItem::solid(Rect::new(x, 0.0, 10.0, 10.0), Color::WHITE)
    }

    fn service(batch_size: u32) -> (NotificationBus, BatchingService<RectItem>) {
        let bus = NotificationBus::new();
        let svc = BatchingService::new(&bus, BatchConfig { batch_size });
        (bus, svc)
    }

    fn count_fills(bus: &NotificationBus) -> (Rc<Cell<u32>>, Subscription) {
        let fills = Rc::new(Cell::new(0));
        let f = Rc::clone(&fills);
        let sub = bus.subscribe(BATCH_FILLED, "counter", move |n| {
            assert_eq!(*n.data::<ItemKind>("counter")?, ItemKind::Rect);
            f.set(f.get() + 1);
            Ok(())
        });
        (fills, sub)
    }

    // ── filling ──────────────────────────────────────────────────────────

    #[test]
    fn two_adds_fill_a_batch_of_two_once() {
        let (bus, svc) = service(2);
        let (fills, _sub) = count_fills(&bus);

        assert_eq!(svc.add(rect(1.0)).unwrap(), AddOutcome::Queued);
        assert_eq!(fills.get(), 0);
        assert_eq!(svc.add(rect(2.0)).unwrap(), AddOutcome::Filled);
        assert_eq!(fills.get(), 1);

        let snapshot = svc.batch_items();
        assert_eq!(snapshot.len(), 2);
        assert!(snapshot.iter().all(|s| s.occupied));
        assert_eq!(snapshot[0].item, rect(1.0));
        assert_eq!(snapshot[1].item, rect(2.0));
    }

    #[test]
    fn add_to_unflushed_full_batch_drops() {
        let (_bus, svc) = service(1);
        assert_eq!(svc.add(rect(1.0)).unwrap(), AddOutcome::Filled);
        assert_eq!(svc.add(rect(2.0)).unwrap(), AddOutcome::Dropped);
        assert_eq!(svc.batch_items()[0].item, rect(1.0));
    }

    #[test]
    fn add_range_fires_once_per_fill_when_consumer_flushes() {
        let (bus, svc) = service(2);
        let svc = Rc::new(svc);
        let (fills, _counter) = count_fills(&bus);

        let weak = Rc::downgrade(&svc);
        let _flusher = bus.subscribe(BATCH_FILLED, "flusher", move |_| {
            if let Some(svc) = weak.upgrade() {
                svc.empty_batch();
            }
            Ok(())
        });

        let n = svc.add_range([rect(1.0), rect(2.0), rect(3.0), rect(4.0)]).unwrap();
        assert_eq!(n, 2);
        assert_eq!(fills.get(), 2);
        assert_eq!(svc.occupied_count(), 0);
    }

    #[test]
    fn add_fills_holes_first() {
        let (_bus, svc) = service(3);
        svc.add(rect(1.0)).unwrap();
        svc.add(rect(2.0)).unwrap();
        svc.empty_batch();
        svc.add(rect(3.0)).unwrap();
        assert_eq!(svc.occupied_items(), vec![(0, rect(3.0))]);
    }

    // ── emptying ─────────────────────────────────────────────────────────

    #[test]
    fn empty_batch_is_idempotent() {
        let (_bus, svc) = service(4);
        svc.add(rect(1.0)).unwrap();
        svc.add(rect(2.0)).unwrap();

        svc.empty_batch();
        let once = svc.batch_items();
        svc.empty_batch();
        let twice = svc.batch_items();

        assert_eq!(once, twice);
        assert!(once.iter().all(|s| !s.occupied && s.item.is_empty()));
    }

    // ── sizing ───────────────────────────────────────────────────────────

    #[test]
    fn batch_size_set_recreates_slots() {
        let (bus, svc) = service(4);
        svc.add(rect(1.0)).unwrap();

        bus.push_data(BATCH_SIZE_SET, "test", &BatchSize(8)).unwrap();
        assert_eq!(svc.capacity(), 8);
        assert_eq!(svc.occupied_count(), 0);

        bus.push_data(BATCH_SIZE_SET, "test", &BatchSize(0)).unwrap();
        assert_eq!(svc.capacity(), 8);
    }

    #[test]
    fn is_full_tracks_occupancy() {
        let (_bus, svc) = service(1);
        assert!(!svc.is_full());
        svc.add(rect(1.0)).unwrap();
        assert!(svc.is_full());
    }

    #[test]
    fn shutdown_releases_subscriptions() {
        let (bus, _svc) = service(1);
        assert_eq!(bus.subscriber_count(BATCH_SIZE_SET), 1);
        bus.push(SYSTEM_SHUTTING_DOWN, "test").unwrap();
        assert_eq!(bus.subscriber_count(BATCH_SIZE_SET), 0);
        assert_eq!(bus.subscriber_count(SYSTEM_SHUTTING_DOWN), 0);
    }
}
