use crate::connection::ManagerCore;
use std::sync::Weak;
use std::time::Duration;
use tokio::time::{self, Instant};

/// Periodic keepalive for one connection generation
pub(crate) struct HeartbeatManager {
    interval: Duration,
    connection: Weak<ManagerCore>,
    generation: u64,
}

impl HeartbeatManager {
    pub fn new(connection: Weak<ManagerCore>, generation: u64, interval: Duration) -> Self {
        Self {
            interval,
            connection,
            generation,
        }
    }

    /// The heartbeat loop; the first ping goes out one interval after open
    pub async fn run(self) {
        let mut interval_timer = time::interval_at(Instant::now() + self.interval, self.interval);
        interval_timer.set_missed_tick_behavior(time::MissedTickBehavior::Skip);

        loop {
            interval_timer.tick().await;

            // Manager dropped, nothing left to keep alive
            let Some(connection) = self.connection.upgrade() else {
                break;
            };

            if !connection.heartbeat_tick(self.generation).await {
                tracing::debug!("Heartbeat for generation {} stopped", self.generation);
                break;
            }
        }
    }
}
