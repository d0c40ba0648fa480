use actix_web::HttpRequest;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, SystemTime};

pub const LOGIN_ATTEMPTS: usize = 5;
pub const LOGIN_WINDOW: Duration = Duration::from_secs(300);

/// Simple in-memory rate limiter
pub struct RateLimiter {
    requests: Mutex<HashMap<String, Vec<SystemTime>>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self {
            requests: Mutex::new(HashMap::new()),
        }
    }

    /// Check if request should be allowed
    /// Returns true if allowed, false if rate limit exceeded
    pub fn check_rate_limit(
        &self,
        key: &str,
        max_requests: usize,
        window: Duration,
    ) -> bool {
        let now = SystemTime::now();
        let mut requests = self
            .requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let entry =
            requests.entry(key.to_string()).or_default();

        // Remove old requests outside the window
        entry.retain(|&time| {
            now.duration_since(time).unwrap_or(Duration::from_secs(0))
                < window
        });

        if entry.len() >= max_requests {
            return false;
        }

        entry.push(now);

        // Cleanup: remove empty entries to prevent unbounded memory growth
        requests.retain(|_, times| !times.is_empty());

        true
    }

    /// Login throttle shared by visitor and admin sign-in.
    pub fn allow_login(&self, scope: &str, req: &HttpRequest) -> bool {
        let key = format!("{}:{}", scope, client_ip(req));
        let allowed = self.check_rate_limit(&key, LOGIN_ATTEMPTS, LOGIN_WINDOW);
        if !allowed {
            log::warn!("Rate limit hit for {}", key);
        }
        allowed
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

pub fn client_ip(req: &HttpRequest) -> String {
    req.connection_info()
        .realip_remote_addr()
        .unwrap_or("unknown")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocks_after_limit_within_window() {
        let limiter = RateLimiter::new();
        for _ in 0..LOGIN_ATTEMPTS {
            assert!(limiter.check_rate_limit("login:1.2.3.4", LOGIN_ATTEMPTS, LOGIN_WINDOW));
        }
        assert!(!limiter.check_rate_limit("login:1.2.3.4", LOGIN_ATTEMPTS, LOGIN_WINDOW));
        assert!(limiter.check_rate_limit("login:5.6.7.8", LOGIN_ATTEMPTS, LOGIN_WINDOW));
    }

    #[test]
    fn zero_window_never_blocks() {
        let limiter = RateLimiter::new();
        for _ in 0..10 {
            assert!(limiter.check_rate_limit("k", 1, Duration::ZERO));
        }
    }
}
