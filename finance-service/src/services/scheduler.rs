//! Background job that flips pending debts past their due date to overdue.
//!
//! The first sweep runs at startup; later sweeps follow the configured
//! interval (one day by default).

use chrono::Utc;
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{error, info};

use crate::services::database::Database;
use crate::services::metrics::{record_error, record_overdue_debts};

/// Starts the overdue-debt sweep. Returns `None` when the interval is zero.
pub fn start_debt_sweep(db: Database, interval_seconds: u64) -> Option<JoinHandle<()>> {
    if interval_seconds == 0 {
        info!("Overdue debt sweep disabled");
        return None;
    }

    Some(tokio::spawn(async move {
        info!(interval_seconds, "Overdue debt sweep started");

        let mut ticker = interval(Duration::from_secs(interval_seconds));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            let _ = sweep_overdue_debts(&db).await;
        }
    }))
}

/// Runs a single sweep and returns the number of debts marked overdue.
pub async fn sweep_overdue_debts(db: &Database) -> Option<u64> {
    let today = Utc::now().date_naive();
    match db.mark_overdue_debts(today).await {
        Ok(count) => {
            record_overdue_debts(count);
            info!(count, %today, "Overdue debt sweep completed");
            Some(count)
        }
        Err(e) => {
            record_error("debt_sweep");
            error!(error = %e, "Overdue debt sweep failed");
            None
        }
    }
}
