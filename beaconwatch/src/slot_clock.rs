use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;

use beaconwatch_monitor::SlotClock;

/// Wall-clock slot clock derived from the testnet's genesis time.
pub struct SystemSlotClock {
    genesis_time: u64,
    seconds_per_slot: u64,
}

impl SystemSlotClock {
    pub fn new(genesis_time: u64, seconds_per_slot: u64) -> Self {
        Self {
            genesis_time,
            seconds_per_slot,
        }
    }

    fn now_unix(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs()
    }
}

#[async_trait]
impl SlotClock for SystemSlotClock {
    async fn current_slot(&self) -> u64 {
        let now = self.now_unix();
        if now < self.genesis_time {
            return 0;
        }
        (now - self.genesis_time) / self.seconds_per_slot
    }

    async fn wait_for_slot(&self, slot: u64) {
        let target = self.genesis_time + slot * self.seconds_per_slot;
        let now = self.now_unix();
        if target > now {
            tokio::time::sleep(Duration::from_secs(target - now)).await;
        }
    }

    async fn wait_for_next_slot(&self) -> u64 {
        let next = self.current_slot().await + 1;
        self.wait_for_slot(next).await;
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_current_slot_before_genesis_is_zero() {
        let far_future = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs()
            + 3600;
        let clock = SystemSlotClock::new(far_future, 12);
        assert_eq!(clock.current_slot().await, 0);
    }

    #[tokio::test]
    async fn test_current_slot_counts_from_genesis() {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs();
        let clock = SystemSlotClock::new(now - 25, 12);
        assert_eq!(clock.current_slot().await, 2);
    }
}
