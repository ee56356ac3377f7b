//! Per-owner mutual exclusion for sync runs.
//!
//! Redis `SET NX EX` when `REDIS_URL` is configured (works across processes),
//! otherwise an in-process set. The Redis key expires on its own so a crashed
//! run cannot wedge an account.

use std::collections::HashSet;
use std::future::Future;
use std::sync::{Arc, Mutex};

use redis::Client as RedisClient;
use tracing::warn;

use crate::errors::AppError;

const LOCK_TTL_SECS: u64 = 15 * 60;

#[derive(Clone)]
pub enum SyncLock {
    Redis(RedisClient),
    Local(Arc<Mutex<HashSet<String>>>),
}

fn lock_key(owner: &str) -> String {
    format!("applytrack:sync:{owner}")
}

impl SyncLock {
    pub fn local() -> Self {
        SyncLock::Local(Arc::new(Mutex::new(HashSet::new())))
    }

    /// Returns false if another run for `owner` holds the lock.
    pub async fn try_acquire(&self, owner: &str) -> Result<bool, AppError> {
        match self {
            SyncLock::Redis(client) => {
                let mut conn = client
                    .get_multiplexed_async_connection()
                    .await
                    .map_err(|e| AppError::Internal(anyhow::anyhow!("Redis unavailable: {e}")))?;
                let reply: Option<String> = redis::cmd("SET")
                    .arg(lock_key(owner))
                    .arg("1")
                    .arg("NX")
                    .arg("EX")
                    .arg(LOCK_TTL_SECS)
                    .query_async(&mut conn)
                    .await
                    .map_err(|e| AppError::Internal(anyhow::anyhow!("Redis SET failed: {e}")))?;
                Ok(reply.is_some())
            }
            SyncLock::Local(held) => {
                let mut held = held.lock().unwrap_or_else(|e| e.into_inner());
                Ok(held.insert(owner.to_string()))
            }
        }
    }

    pub async fn release(&self, owner: &str) {
        match self {
            SyncLock::Redis(client) => release_redis(client, owner).await,
            SyncLock::Local(held) => release_local(held, owner),
        }
    }

    /// Runs `work` while holding the lock for `owner`; 409 if already held.
    ///
    /// The lock is also released when the returned future is dropped mid-run,
    /// e.g. when the client disconnects during `POST /sync`.
    pub async fn run_exclusive<T, F>(&self, owner: &str, work: F) -> Result<T, AppError>
    where
        F: Future<Output = Result<T, AppError>>,
    {
        if !self.try_acquire(owner).await? {
            return Err(AppError::Conflict(
                "A sync is already running for this account".to_string(),
            ));
        }
        let guard = LockGuard {
            lock: self.clone(),
            owner: owner.to_string(),
            armed: true,
        };
        let result = work.await;
        guard.release().await;
        result
    }
}

/// Holds an acquired lock; releases it on drop if `release` was never reached.
struct LockGuard {
    lock: SyncLock,
    owner: String,
    armed: bool,
}

impl LockGuard {
    async fn release(mut self) {
        self.armed = false;
        self.lock.release(&self.owner).await;
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        match &self.lock {
            SyncLock::Local(held) => release_local(held, &self.owner),
            SyncLock::Redis(client) => {
                let client = client.clone();
                let owner = std::mem::take(&mut self.owner);
                match tokio::runtime::Handle::try_current() {
                    Ok(handle) => {
                        handle.spawn(async move { release_redis(&client, &owner).await });
                    }
                    Err(_) => warn!(
                        "Sync lock for {owner} dropped outside a runtime; it expires in {LOCK_TTL_SECS}s"
                    ),
                }
            }
        }
    }
}

fn release_local(held: &Mutex<HashSet<String>>, owner: &str) {
    held.lock()
        .unwrap_or_else(|e| e.into_inner())
        .remove(owner);
}

async fn release_redis(client: &RedisClient, owner: &str) {
    let result = async {
        let mut conn = client.get_multiplexed_async_connection().await?;
        redis::cmd("DEL")
            .arg(lock_key(owner))
            .query_async::<_, ()>(&mut conn)
            .await
    }
    .await;
    if let Err(e) = result {
        warn!("Failed to release sync lock for {owner}: {e}; it expires in {LOCK_TTL_SECS}s");
    }
}
