use std::sync::Arc;
use std::time::Duration;

use govdesk_engine::DecisionEngine;
use tokio::task::JoinHandle;

/// Periodically drops conversations idle for longer than the engine's TTL.
pub fn spawn(engine: Arc<DecisionEngine>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // The first tick fires immediately.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            if let Err(err) = engine.evict_idle().await {
                tracing::error!(error = %err, "idle context sweep failed");
            }
        }
    })
}
