use std::env;

use serde::{Deserialize, Serialize};

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled env var: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some(v);
        }
    }
    env_opt(key)
}

fn profiled_env_parse<T: std::str::FromStr>(profile: &str, key: &str, default: T) -> T {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Active profile name (empty = default).
    pub profile: String,
    pub canvas: CanvasConfig,
    pub redraw: RedrawSettings,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `CANVAS_PROFILE`. When set (e.g. `BENCH`), every
    /// key is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Self {
        let profile = env_or("CANVAS_PROFILE", "").to_uppercase();
        Self::for_profile(&profile)
    }

    /// Build config for a specific named profile (empty string = default).
    pub fn for_profile(profile: &str) -> Self {
        let p = profile.to_uppercase();
        let p = p.as_str();
        Self {
            profile: p.to_string(),
            canvas: CanvasConfig::from_env_profiled(p),
            redraw: RedrawSettings::from_env_profiled(p),
        }
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Print a summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!("  canvas:  {}x{}", self.canvas.width, self.canvas.height);
        tracing::info!(
            "  redraw:  interval={}ms, overload_poll={}ms, workers={}, event_capacity={}",
            self.redraw.interval_ms,
            self.redraw.overload_poll_ms,
            self.redraw.worker_threads,
            self.redraw.event_capacity
        );
    }
}

// ── Canvas ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanvasConfig {
    pub width: f64,
    pub height: f64,
}

impl CanvasConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            width: profiled_env_parse(p, "CANVAS_WIDTH", 800.0),
            height: profiled_env_parse(p, "CANVAS_HEIGHT", 600.0),
        }
    }
}

// ── Redraw ────────────────────────────────────────────────────

/// Raw scheduler settings from the environment. Validation happens when the
/// scheduler is built from them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedrawSettings {
    pub interval_ms: f64,
    pub overload_poll_ms: u64,
    pub worker_threads: usize,
    pub event_capacity: usize,
}

impl RedrawSettings {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            interval_ms: profiled_env_parse(p, "REDRAW_INTERVAL_MS", 1.0),
            overload_poll_ms: profiled_env_parse(p, "REDRAW_OVERLOAD_POLL_MS", 5),
            worker_threads: profiled_env_parse(p, "REDRAW_WORKER_THREADS", 1),
            event_capacity: profiled_env_parse(p, "REDRAW_EVENT_CAPACITY", 256),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Env vars are process-global, so every test uses its own profile prefix.

    #[test]
    fn defaults_without_env() {
        let config = Config::for_profile("cfgtest_defaults_unset");
        assert_eq!(config.profile, "CFGTEST_DEFAULTS_UNSET");
        assert_eq!(config.canvas.width, 800.0);
        assert_eq!(config.canvas.height, 600.0);
        assert_eq!(config.redraw.overload_poll_ms, 5);
        assert_eq!(config.redraw.worker_threads, 1);
    }

    #[test]
    fn profiled_key_wins() {
        env::set_var("CFGTEST_PROFILED_REDRAW_INTERVAL_MS", "12.5");
        env::set_var("CFGTEST_PROFILED_CANVAS_WIDTH", "1024");
        let config = Config::for_profile("cfgtest_profiled");
        assert_eq!(config.redraw.interval_ms, 12.5);
        assert_eq!(config.canvas.width, 1024.0);
    }

    #[test]
    fn unparsable_value_falls_back_to_default() {
        env::set_var("CFGTEST_GARBAGE_REDRAW_OVERLOAD_POLL_MS", "soon");
        let config = Config::for_profile("cfgtest_garbage");
        assert_eq!(config.redraw.overload_poll_ms, 5);
    }

    #[test]
    fn profile_label_defaults() {
        let mut config = Config::for_profile("");
        config.profile.clear();
        assert_eq!(config.profile_label(), "default");
    }
}
