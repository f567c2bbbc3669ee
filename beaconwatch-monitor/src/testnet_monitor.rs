//! Scheduler glue: binds metric actions to a slot cadence.
//!
//! The slot clock itself is an external collaborator; this module only
//! consumes the [`SlotClock`] contract and drives registered actions when
//! their cadence comes due.

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// How often an action fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorInterval {
    EverySlot,
    EveryEpoch,
    Once,
}

/// A named unit of monitoring work driven by the testnet monitor.
#[async_trait]
pub trait MonitorAction: Send + Sync {
    fn name(&self) -> &str;

    fn interval(&self) -> MonitorInterval;

    async fn perform(&mut self) -> Result<()>;
}

/// The slot/epoch-aware clock contract. Implementations live outside the
/// observation core.
#[async_trait]
pub trait SlotClock: Send + Sync {
    async fn current_slot(&self) -> u64;

    async fn wait_for_slot(&self, slot: u64);

    /// Blocks until the next slot boundary and returns the new slot.
    async fn wait_for_next_slot(&self) -> u64;
}

/// Drives registered actions at their cadence against a slot clock.
pub struct TestnetMonitor {
    clock: Arc<dyn SlotClock>,
    slots_per_epoch: u64,
    actions: Vec<Box<dyn MonitorAction>>,
}

impl TestnetMonitor {
    pub fn new(clock: Arc<dyn SlotClock>, slots_per_epoch: u64) -> Self {
        Self {
            clock,
            slots_per_epoch,
            actions: Vec::new(),
        }
    }

    pub fn add_action(&mut self, action: Box<dyn MonitorAction>) {
        self.actions.push(action);
    }

    /// Fires every action due at `slot`. Action failures are logged and do
    /// not stop the other actions.
    pub async fn tick(&mut self, slot: u64) {
        let slots_per_epoch = self.slots_per_epoch;
        for action in &mut self.actions {
            let due = match action.interval() {
                MonitorInterval::EverySlot => true,
                MonitorInterval::EveryEpoch => slot % slots_per_epoch == 0,
                MonitorInterval::Once => false,
            };
            if !due {
                continue;
            }
            if let Err(err) = action.perform().await {
                log::error!("action {} failed: {:#}", action.name(), err);
            }
        }
    }

    /// Runs one-shot actions, then loops forever firing actions each slot.
    pub async fn run(&mut self) -> Result<()> {
        for action in &mut self.actions {
            if action.interval() == MonitorInterval::Once {
                if let Err(err) = action.perform().await {
                    log::error!("action {} failed: {:#}", action.name(), err);
                }
            }
        }

        loop {
            let slot = self.clock.wait_for_next_slot().await;
            log::info!("slot {}", slot);
            self.tick(slot).await;
        }
    }
}
