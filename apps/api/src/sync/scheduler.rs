//! Server-side auto-sync.
//!
//! Replaces the browser timer: every account with a stored refresh token is
//! synced once per interval. A failed account backs off exponentially (15 min
//! base, capped at the interval) without holding up the others.

use std::collections::HashMap;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use super::sync_account;
use crate::auth::sessions;
use crate::state::AppState;

const TICK: StdDuration = StdDuration::from_secs(5 * 60);
const STARTUP_DELAY: StdDuration = StdDuration::from_secs(30);
const BACKOFF_BASE_MINUTES: i64 = 15;

#[derive(Debug, Clone, Default)]
struct AccountState {
    next_due: Option<DateTime<Utc>>,
    failures: u32,
}

/// Per-account due times and failure counts.
#[derive(Debug)]
pub struct SyncSchedule {
    interval: Duration,
    accounts: HashMap<String, AccountState>,
}

impl SyncSchedule {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            accounts: HashMap::new(),
        }
    }

    /// Accounts from `known` that are due at `now`. Unseen accounts are due immediately.
    pub fn due<'a>(&self, known: &'a [String], now: DateTime<Utc>) -> Vec<&'a String> {
        known
            .iter()
            .filter(|email| {
                self.accounts
                    .get(*email)
                    .and_then(|s| s.next_due)
                    .map_or(true, |due| due <= now)
            })
            .collect()
    }

    pub fn record_success(&mut self, email: &str, now: DateTime<Utc>) {
        let entry = self.accounts.entry(email.to_string()).or_default();
        entry.failures = 0;
        entry.next_due = Some(now + self.interval);
    }

    pub fn record_failure(&mut self, email: &str, now: DateTime<Utc>) -> Duration {
        let entry = self.accounts.entry(email.to_string()).or_default();
        entry.failures += 1;
        let delay = backoff_delay(entry.failures, self.interval);
        entry.next_due = Some(now + delay);
        delay
    }
}

/// 15m, 30m, 1h, ... capped at `cap`.
pub fn backoff_delay(failures: u32, cap: Duration) -> Duration {
    let exponent = failures.saturating_sub(1).min(16);
    let minutes = BACKOFF_BASE_MINUTES.saturating_mul(1_i64 << exponent);
    Duration::minutes(minutes).min(cap)
}

/// Starts the auto-sync loop unless disabled or lacking a database.
pub fn spawn_auto_sync(state: AppState) -> Option<JoinHandle<()>> {
    let Some(interval) = state.config.auto_sync_interval else {
        info!("Auto-sync disabled (AUTO_SYNC_INTERVAL_HOURS=0)");
        return None;
    };
    if state.db.is_none() {
        warn!("Auto-sync disabled: DATABASE_URL is not set");
        return None;
    }
    info!("Auto-sync every {}h", interval.num_hours());
    Some(tokio::spawn(run_auto_sync(state, interval)))
}

async fn run_auto_sync(state: AppState, interval: Duration) {
    tokio::time::sleep(STARTUP_DELAY).await;
    let mut schedule = SyncSchedule::new(interval);
    let mut ticker = tokio::time::interval(TICK);

    loop {
        ticker.tick().await;

        let Ok(pool) = state.db() else { return };
        let accounts = match sessions::list_refreshable_accounts(pool).await {
            Ok(accounts) => accounts,
            Err(e) => {
                error!("Auto-sync could not list accounts: {e}");
                continue;
            }
        };

        let now = Utc::now();
        for email in schedule.due(&accounts, now) {
            match sync_account(&state, email).await {
                Ok(report) => {
                    info!("Auto-sync for {email}: {} records", report.count);
                    schedule.record_success(email, Utc::now());
                }
                Err(e) => {
                    let delay = schedule.record_failure(email, Utc::now());
                    warn!(
                        "Auto-sync for {email} failed: {e}; retrying in {}m",
                        delay.num_minutes()
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_doubles_and_caps() {
        let cap = Duration::hours(12);
        assert_eq!(backoff_delay(1, cap), Duration::minutes(15));
        assert_eq!(backoff_delay(2, cap), Duration::minutes(30));
        assert_eq!(backoff_delay(3, cap), Duration::minutes(60));
        assert_eq!(backoff_delay(10, cap), cap);
        assert_eq!(backoff_delay(u32::MAX, cap), cap);
    }

    #[test]
    fn test_new_accounts_are_due_immediately() {
        let schedule = SyncSchedule::new(Duration::hours(12));
        let known = vec!["a@x.com".to_string(), "b@x.com".to_string()];
        assert_eq!(schedule.due(&known, Utc::now()).len(), 2);
    }

    #[test]
    fn test_success_defers_until_next_interval() {
        let mut schedule = SyncSchedule::new(Duration::hours(12));
        let known = vec!["a@x.com".to_string()];
        let now = Utc::now();

        schedule.record_success("a@x.com", now);
        assert!(schedule.due(&known, now + Duration::hours(11)).is_empty());
        assert_eq!(schedule.due(&known, now + Duration::hours(12)).len(), 1);
    }

    #[test]
    fn test_failure_backs_off_then_success_resets() {
        let mut schedule = SyncSchedule::new(Duration::hours(12));
        let known = vec!["a@x.com".to_string()];
        let now = Utc::now();

        assert_eq!(schedule.record_failure("a@x.com", now), Duration::minutes(15));
        assert_eq!(schedule.record_failure("a@x.com", now), Duration::minutes(30));
        assert!(schedule.due(&known, now + Duration::minutes(29)).is_empty());
        assert_eq!(schedule.due(&known, now + Duration::minutes(30)).len(), 1);

        schedule.record_success("a@x.com", now);
        assert_eq!(schedule.record_failure("a@x.com", now), Duration::minutes(15));
    }
}
