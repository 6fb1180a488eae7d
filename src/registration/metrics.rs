use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct RegistrationMetrics {
    pub events_received: AtomicU64,
    pub registrations: AtomicU64,
    pub deregistrations: AtomicU64,
    pub failures: AtomicU64,
}

impl RegistrationMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc_events(&self) {
        self.events_received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_registrations(&self) {
        self.registrations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_deregistrations(&self) {
        self.deregistrations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_failures(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            events_received: self.events_received.load(Ordering::Relaxed),
            registrations: self.registrations.load(Ordering::Relaxed),
            deregistrations: self.deregistrations.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MetricsSnapshot {
    pub events_received: u64,
    pub registrations: u64,
    pub deregistrations: u64,
    pub failures: u64,
}
