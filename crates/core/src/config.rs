use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Default `isapprox` window for date fields, in days either side.
pub const DEFAULT_DATE_APPROX_DAYS: i64 = 2;

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

fn profiled_env_bool(profile: &str, key: &str, default: bool) -> Result<bool> {
    match profiled_env_opt(profile, key) {
        None => Ok(default),
        Some(v) => match v.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(CoreError::InvalidConfig {
                key: key.to_string(),
                value: v,
            }),
        },
    }
}

fn profiled_env_i64(profile: &str, key: &str, default: i64) -> Result<i64> {
    match profiled_env_opt(profile, key) {
        None => Ok(default),
        Some(v) => v.trim().parse().map_err(|_| CoreError::InvalidConfig {
            key: key.to_string(),
            value: v,
        }),
    }
}

// ── Engine config ─────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Active profile name (empty = default).
    pub profile: String,
    /// Directory of entity-type YAML documents loaded at startup.
    pub schema_dir: Option<PathBuf>,
    /// Days either side of a date that still count as `isapprox`.
    pub date_approx_days: i64,
    /// Abort a rule-set load on the first invalid rule instead of skipping it.
    pub strict_load: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            profile: String::new(),
            schema_dir: None,
            date_approx_days: DEFAULT_DATE_APPROX_DAYS,
            strict_load: false,
        }
    }
}

impl EngineConfig {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `RULEBOOK_PROFILE`. When set (e.g. `PROD`),
    /// every key is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Result<Self> {
        let profile = env_or("RULEBOOK_PROFILE", "").to_uppercase();
        Self::for_profile(&profile)
    }

    /// Build config for a specific named profile (empty string = default).
    pub fn for_profile(profile: &str) -> Result<Self> {
        let p = profile.to_uppercase();
        let p = p.as_str();

        let date_approx_days =
            profiled_env_i64(p, "RULEBOOK_DATE_APPROX_DAYS", DEFAULT_DATE_APPROX_DAYS)?;
        if date_approx_days < 0 {
            return Err(CoreError::InvalidConfig {
                key: "RULEBOOK_DATE_APPROX_DAYS".to_string(),
                value: date_approx_days.to_string(),
            });
        }

        Ok(Self {
            profile: p.to_string(),
            schema_dir: profiled_env_opt(p, "RULEBOOK_SCHEMA_DIR").map(PathBuf::from),
            date_approx_days,
            strict_load: profiled_env_bool(p, "RULEBOOK_STRICT_LOAD", false)?,
        })
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Print a summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Rules config loaded (profile: {}):", self.profile_label());
        tracing::info!(
            "  schema_dir:       {}",
            self.schema_dir
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "(builtin)".to_string())
        );
        tracing::info!("  date_approx_days: {}", self.date_approx_days);
        tracing::info!("  strict_load:      {}", self.strict_load);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Each test uses its own profile prefix so parallel tests never share keys.

    #[test]
    fn defaults_without_env() {
        let config = EngineConfig::for_profile("RBTESTDEFAULTS").unwrap();
        assert_eq!(config.profile, "RBTESTDEFAULTS");
        assert_eq!(config.date_approx_days, DEFAULT_DATE_APPROX_DAYS);
        assert!(!config.strict_load);
    }

    #[test]
    fn profiled_keys_override() {
        env::set_var("RBTESTPROFILED_RULEBOOK_DATE_APPROX_DAYS", "5");
        env::set_var("RBTESTPROFILED_RULEBOOK_STRICT_LOAD", "yes");
        env::set_var("RBTESTPROFILED_RULEBOOK_SCHEMA_DIR", "/etc/rulebook/types");

        let config = EngineConfig::for_profile("rbtestprofiled").unwrap();
        assert_eq!(config.date_approx_days, 5);
        assert!(config.strict_load);
        assert_eq!(config.schema_dir, Some(PathBuf::from("/etc/rulebook/types")));
    }

    #[test]
    fn invalid_values_are_reported() {
        env::set_var("RBTESTINVALID_RULEBOOK_STRICT_LOAD", "maybe");
        let err = EngineConfig::for_profile("RBTESTINVALID").unwrap_err();
        assert!(matches!(err, CoreError::InvalidConfig { ref key, .. } if key == "RULEBOOK_STRICT_LOAD"));
    }

    #[test]
    fn negative_window_is_rejected() {
        env::set_var("RBTESTNEG_RULEBOOK_DATE_APPROX_DAYS", "-1");
        assert!(EngineConfig::for_profile("RBTESTNEG").is_err());
    }

    #[test]
    fn profile_label_defaults() {
        assert_eq!(EngineConfig::default().profile_label(), "default");
    }
}
