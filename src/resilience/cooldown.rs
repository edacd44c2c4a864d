//! Cooldown gate: minimum spacing between outbound VRChat lookups.
//!
//! Each admission reserves a slot under a mutex, then sleeps until that slot
//! outside the lock. Slots are handed out at least `interval` apart, so the
//! spacing holds for every pair of callers no matter how many arrive at once.

use std::sync::Mutex;
use std::time::Duration;

use tokio::time::Instant;

use crate::config::CooldownConfig;
use crate::observability::metrics;

pub struct CooldownGate {
    interval: Duration,
    /// Admission time of the most recent slot handed out.
    last: Mutex<Option<Instant>>,
}

impl CooldownGate {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: Mutex::new(None),
        }
    }

    pub fn from_config(config: &CooldownConfig) -> Self {
        Self::new(Duration::from_millis(config.interval_ms))
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Wait until this caller may hit the upstream, and return its admission time.
    ///
    /// Dropping the future before its slot arrives gives the slot back when no
    /// later caller has queued behind it.
    pub async fn admit(&self) -> Instant {
        let (slot, previous) = self.reserve();
        let now = Instant::now();

        if slot > now {
            let wait = slot - now;
            tracing::debug!(wait_ms = wait.as_millis() as u64, "Cooldown active, delaying upstream call");
            metrics::record_cooldown_wait(wait);

            let pending = PendingSlot {
                gate: self,
                slot,
                previous,
                reached: false,
            };
            tokio::time::sleep_until(slot).await;
            pending.reached();
        } else {
            metrics::record_cooldown_wait(Duration::ZERO);
        }

        slot
    }

    /// Hand out the next slot. Returns it together with the slot it replaced.
    fn reserve(&self) -> (Instant, Option<Instant>) {
        let mut last = self.last.lock().expect("cooldown mutex poisoned");
        let now = Instant::now();
        let previous = *last;

        let slot = match previous {
            Some(prev) => (prev + self.interval).max(now),
            None => now,
        };
        *last = Some(slot);
        (slot, previous)
    }

    /// Undo a reservation that was abandoned while still the newest one.
    fn release(&self, slot: Instant, previous: Option<Instant>) {
        let mut last = self.last.lock().expect("cooldown mutex poisoned");
        if *last == Some(slot) {
            *last = previous;
            tracing::debug!("Abandoned cooldown slot released");
        }
    }
}

/// A reserved slot whose waiter has not reached it yet.
struct PendingSlot<'a> {
    gate: &'a CooldownGate,
    slot: Instant,
    previous: Option<Instant>,
    reached: bool,
}

impl PendingSlot<'_> {
    fn reached(mut self) {
        self.reached = true;
    }
}

impl Drop for PendingSlot<'_> {
    fn drop(&mut self) {
        if !self.reached {
            self.gate.release(self.slot, self.previous);
        }
    }
}

impl Default for CooldownGate {
    fn default() -> Self {
        Self::from_config(&CooldownConfig::default())
    }
}
