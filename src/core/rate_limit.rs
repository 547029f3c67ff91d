use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;

/// 單一用途的固定視窗額度，key 格式為 `<prefix>:<user>`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitPolicy {
    pub prefix: &'static str,
    pub window: Duration,
    pub max_requests: u32,
}

impl RateLimitPolicy {
    pub const DOCUMENT_GENERATION: RateLimitPolicy = RateLimitPolicy {
        prefix: "docgen",
        window: Duration::from_secs(60),
        max_requests: 20,
    };

    fn key(&self, identifier: &str) -> String {
        format!("{}:{}", self.prefix, identifier)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitEntry {
    pub count: u32,
    pub window_reset_at: Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub remaining: u32,
    /// 距離目前視窗重置的剩餘時間
    pub retry_after: Duration,
}

/// 行程內的計數器儲存，建立在其上的 limiter 共用
#[derive(Debug, Default)]
pub struct RateLimitStore {
    entries: Mutex<HashMap<String, RateLimitEntry>>,
}

impl RateLimitStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, RateLimitEntry>> {
        // 計數器本身沒有不變量會因 panic 而破壞，直接沿用
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn get(&self, key: &str) -> Option<RateLimitEntry> {
        self.lock().get(key).cloned()
    }

    /// 移除視窗已結束的紀錄，回傳移除筆數
    pub fn sweep_expired(&self, now: Instant) -> usize {
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|_, entry| now <= entry.window_reset_at);
        before - entries.len()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }
}

pub struct RateLimiter {
    policy: RateLimitPolicy,
    store: Arc<RateLimitStore>,
}

impl RateLimiter {
    pub fn new(policy: RateLimitPolicy, store: Arc<RateLimitStore>) -> Self {
        Self { policy, store }
    }

    pub fn document_generation(store: Arc<RateLimitStore>) -> Self {
        Self::new(RateLimitPolicy::DOCUMENT_GENERATION, store)
    }

    pub fn policy(&self) -> RateLimitPolicy {
        self.policy
    }

    pub fn store(&self) -> &Arc<RateLimitStore> {
        &self.store
    }

    pub fn admit(&self, user_id: &str) -> RateLimitDecision {
        self.admit_at(user_id, Instant::now())
    }

    /// 讀取、判斷、遞增在同一把鎖內完成
    pub fn admit_at(&self, user_id: &str, now: Instant) -> RateLimitDecision {
        let key = self.policy.key(user_id);
        let max = self.policy.max_requests;
        let mut entries = self.store.lock();

        let entry = entries.entry(key).or_insert_with(|| RateLimitEntry {
            count: 0,
            window_reset_at: now + self.policy.window,
        });

        if now > entry.window_reset_at {
            entry.count = 0;
            entry.window_reset_at = now + self.policy.window;
        }

        // 被拒絕的請求也計入
        entry.count = entry.count.saturating_add(1);
        let retry_after = entry.window_reset_at.saturating_duration_since(now);

        if entry.count > max {
            return RateLimitDecision {
                allowed: false,
                remaining: 0,
                retry_after,
            };
        }

        RateLimitDecision {
            allowed: true,
            remaining: max - entry.count,
            retry_after,
        }
    }
}

/// 定期清除過期紀錄，結束時 abort 回傳的 handle
pub fn spawn_sweeper(store: Arc<RateLimitStore>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let removed = store.sweep_expired(Instant::now());
            if removed > 0 {
                tracing::debug!(removed, "Swept expired rate limit entries");
            }
        }
    })
}
