use std::sync::atomic::{AtomicU64, Ordering};

/// Counters observed from the outside (logging, tests); never consulted
/// for correctness decisions.
#[derive(Debug, Default)]
pub struct RegistryMetrics {
    registrations_total: AtomicU64,
    publishers_rejected_total: AtomicU64,
    messages_relayed_total: AtomicU64,
    boxes_created_total: AtomicU64,
    boxes_removed_total: AtomicU64,
}

impl RegistryMetrics {
    pub fn record_registration(&self) {
        self.registrations_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_publisher_rejected(&self) {
        self.publishers_rejected_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_message_relayed(&self) {
        self.messages_relayed_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_box_created(&self) {
        self.boxes_created_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_box_removed(&self) {
        self.boxes_removed_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn registrations_total(&self) -> u64 {
        self.registrations_total.load(Ordering::Relaxed)
    }

    pub fn publishers_rejected_total(&self) -> u64 {
        self.publishers_rejected_total.load(Ordering::Relaxed)
    }

    pub fn messages_relayed_total(&self) -> u64 {
        self.messages_relayed_total.load(Ordering::Relaxed)
    }

    pub fn boxes_created_total(&self) -> u64 {
        self.boxes_created_total.load(Ordering::Relaxed)
    }

    pub fn boxes_removed_total(&self) -> u64 {
        self.boxes_removed_total.load(Ordering::Relaxed)
    }
}
