use std::sync::{Condvar, Mutex};
use std::time::Duration;

use mbroker_proto::MAX_N_BOXES;
use mbroker_store::{BoxSnapshot, OpenMode, PublisherHandle, StoreError, SubscriberHandle};

use crate::invariants::debug_assert_registry_bounded;
use crate::metrics::RegistryMetrics;

/// One slot's occupant name plus the condvar subscribers wait on for new
/// data or removal in that box. Paired one-to-one the way the original
/// kept a fixed `boxes[MAX_N_BOXES]` table, except here each slot also
/// owns its own wakeup channel instead of relying on a single global one.
struct Slot {
    name: Mutex<Option<String>>,
    changed: Condvar,
}

impl Slot {
    fn empty() -> Self {
        Self {
            name: Mutex::new(None),
            changed: Condvar::new(),
        }
    }
}

/// Wraps the byte-log store with the notification discipline subscriber
/// sessions need: waiting for a publisher's next write without busy
/// spinning, while still re-checking store state on a timer as a safety
/// net against a missed wakeup (the same hybrid polling idea a stream
/// consumer uses against poll/notify races).
pub struct BoxRegistry {
    store: mbroker_store::Store,
    slots: [Slot; MAX_N_BOXES],
    poll_interval: Duration,
    metrics: RegistryMetrics,
}

impl BoxRegistry {
    pub fn new(poll_interval: Duration) -> Self {
        Self {
            store: mbroker_store::Store::new(),
            slots: std::array::from_fn(|_| Slot::empty()),
            poll_interval,
            metrics: RegistryMetrics::default(),
        }
    }

    pub fn metrics(&self) -> &RegistryMetrics {
        &self.metrics
    }

    pub fn create(&self, name: &str) -> Result<(), StoreError> {
        self.store.create(name)?;
        for slot in &self.slots {
            let mut occupant = slot.name.lock().unwrap();
            if occupant.is_none() {
                *occupant = Some(name.to_string());
                self.metrics.record_box_created();
                return Ok(());
            }
        }
        debug_assert_registry_bounded!(MAX_N_BOXES + 1, MAX_N_BOXES);
        unreachable!("store accepted the box but the registry has no free slot to track it")
    }

    pub fn remove(&self, name: &str) -> Result<(), StoreError> {
        self.store.remove(name)?;
        for slot in &self.slots {
            let mut occupant = slot.name.lock().unwrap();
            if occupant.as_deref() == Some(name) {
                *occupant = None;
                slot.changed.notify_all();
                self.metrics.record_box_removed();
                return Ok(());
            }
        }
        Ok(())
    }

    pub fn open_publisher(
        &self,
        name: &str,
        mode: OpenMode,
    ) -> Result<PublisherHandle, StoreError> {
        let handle = self.store.open_publisher(name, mode)?;
        self.metrics.record_registration();
        Ok(handle)
    }

    pub fn open_subscriber(&self, name: &str) -> Result<SubscriberHandle, StoreError> {
        let handle = self.store.open_subscriber(name)?;
        self.metrics.record_registration();
        Ok(handle)
    }

    pub fn write(&self, handle: &PublisherHandle, buf: &[u8]) -> Result<usize, StoreError> {
        let n = self.store.write(handle, buf)?;
        if n > 0 {
            self.metrics.record_message_relayed();
            self.notify(handle.box_name());
        }
        Ok(n)
    }

    /// Blocks until there is something to read, the box has been removed
    /// (read returns `Ok(0)` and the caller should stop), or the store
    /// reports the box no longer exists at all.
    pub fn read_blocking(
        &self,
        handle: &mut SubscriberHandle,
        buf: &mut [u8],
    ) -> Result<usize, StoreError> {
        loop {
            let n = self.store.read(handle, buf)?;
            if n > 0 {
                return Ok(n);
            }
            if !self.exists(handle.box_name()) {
                return Ok(0);
            }
            self.wait(handle.box_name());
        }
    }

    pub fn close_publisher(&self, handle: PublisherHandle) {
        self.store.close_publisher(handle);
    }

    pub fn close_subscriber(&self, handle: SubscriberHandle) {
        self.store.close_subscriber(handle);
    }

    pub fn list(&self) -> Vec<BoxSnapshot> {
        self.store.list()
    }

    fn exists(&self, name: &str) -> bool {
        self.slots
            .iter()
            .any(|slot| slot.name.lock().unwrap().as_deref() == Some(name))
    }

    fn notify(&self, name: &str) {
        for slot in &self.slots {
            if slot.name.lock().unwrap().as_deref() == Some(name) {
                slot.changed.notify_all();
                return;
            }
        }
    }

    fn wait(&self, name: &str) {
        for slot in &self.slots {
            let occupant = slot.name.lock().unwrap();
            if occupant.as_deref() == Some(name) {
                let _ = slot.changed.wait_timeout(occupant, self.poll_interval).unwrap();
                return;
            }
        }
    }
}
