use {
    crate::domain::error::ReconError,
    std::{
        collections::HashMap,
        sync::Arc,
        time::{Duration, Instant},
    },
    tokio::sync::Mutex,
};

/// Per-caller fixed window for the status-poll path: at most one poll per
/// caller per window. In-process state only — each replica enforces its
/// own window.
#[derive(Clone)]
pub struct PollLimiter {
    window: Duration,
    last_seen: Arc<Mutex<HashMap<String, Instant>>>,
}

impl PollLimiter {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_seen: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub async fn check(&self, caller: &str) -> Result<(), ReconError> {
        let mut last_seen = self.last_seen.lock().await;
        let now = Instant::now();

        // Opportunistic pruning so idle callers don't accumulate forever.
        if last_seen.len() > 4096 {
            let window = self.window;
            last_seen.retain(|_, seen| now.duration_since(*seen) < window);
        }

        match last_seen.get(caller) {
            Some(seen) if now.duration_since(*seen) < self.window => Err(ReconError::RateLimited),
            _ => {
                last_seen.insert(caller.to_string(), now);
                Ok(())
            }
        }
    }
}
