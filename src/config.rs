use std::env;

use crate::fetcher::DEFAULT_USER_AGENT;

/// Runtime settings, read from the environment (after `.env` is loaded).
#[derive(Debug, Clone)]
pub struct Settings {
    pub bind_host: String,
    pub port: u16,
    pub upstream_timeout_secs: u64,
    pub user_agents: Vec<String>,

    // Client side
    pub api_base_url: String,
    /// Entry cap of the in-memory cache. Eviction is a linear scan, keep it
    /// in the hundreds.
    pub cache_capacity: usize,
    pub cache_ttl_secs: Option<u64>,
    pub redis_url: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_host: "0.0.0.0".to_string(),
            port: 3000,
            upstream_timeout_secs: 15,
            user_agents: vec![DEFAULT_USER_AGENT.to_string()],
            api_base_url: "http://localhost:3000".to_string(),
            cache_capacity: 256,
            cache_ttl_secs: None,
            redis_url: None,
        }
    }
}

fn parsed<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = env::var(key).ok()?;
    match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::warn!(key, value = %raw, "ignoring unparsable setting");
            None
        }
    }
}

fn non_empty(key: &str) -> Option<String> {
    env::var(key).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

impl Settings {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let user_agents = non_empty("UPSTREAM_USER_AGENTS")
            .map(|raw| {
                raw.split(',')
                    .map(|ua| ua.trim().to_string())
                    .filter(|ua| !ua.is_empty())
                    .collect::<Vec<_>>()
            })
            .filter(|list| !list.is_empty())
            .unwrap_or(defaults.user_agents);

        Self {
            bind_host: non_empty("BIND_HOST").unwrap_or(defaults.bind_host),
            port: parsed("PORT").unwrap_or(defaults.port),
            upstream_timeout_secs: parsed("UPSTREAM_TIMEOUT_SECS").unwrap_or(defaults.upstream_timeout_secs),
            user_agents,
            api_base_url: non_empty("API_BASE_URL").unwrap_or(defaults.api_base_url),
            cache_capacity: parsed("CACHE_CAPACITY").unwrap_or(defaults.cache_capacity),
            cache_ttl_secs: parsed("CACHE_TTL_SECS"),
            redis_url: non_empty("REDIS_URL"),
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.bind_host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let s = Settings::default();
        assert_eq!(s.bind_addr(), "0.0.0.0:3000");
        assert_eq!(s.upstream_timeout_secs, 15);
        assert_eq!(s.user_agents, vec![DEFAULT_USER_AGENT.to_string()]);
        assert_eq!(s.cache_capacity, 256);
        assert!(s.cache_ttl_secs.is_none());
    }
}
