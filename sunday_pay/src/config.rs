//! Service configuration.
//!
//! Settings are read from the environment.  Every variable is optional.
//!
//! | Variable                  | Default          |
//! |---------------------------|------------------|
//! | `SUNDAY_PAY_BIND_ADDR`    | `127.0.0.1:3000` |
//! | `SUNDAY_PAY_TAX_LAW_DIR`  | `tax_laws`       |
//! | `SUNDAY_PAY_MAX_TRIALS`   | `20000`          |
//! | `SUNDAY_PAY_MAX_STAFF`    | `1000`           |
//! | `SUNDAY_PAY_MAX_SHIFT_DRAWS` | `50000000`    |

use anyhow::{Context, Result};
use std::path::PathBuf;

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";
pub const DEFAULT_TAX_LAW_DIR: &str = "tax_laws";
pub const DEFAULT_MAX_TRIALS: usize = 20_000;
pub const DEFAULT_MAX_STAFF: usize = 1_000;
pub const DEFAULT_MAX_SHIFT_DRAWS: u64 = 50_000_000;

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub bind_addr: String,
    pub tax_law_dir: PathBuf,
    /// Upper bound on trials per simulation request.
    pub max_trials: usize,
    /// Upper bound on `total_staff` for a simulated pool.
    pub max_staff: usize,
    /// Upper bound on trials x months x monthly quota per request.
    pub max_shift_draws: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            tax_law_dir: PathBuf::from(DEFAULT_TAX_LAW_DIR),
            max_trials: DEFAULT_MAX_TRIALS,
            max_staff: DEFAULT_MAX_STAFF,
            max_shift_draws: DEFAULT_MAX_SHIFT_DRAWS,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let bind_addr = lookup("SUNDAY_PAY_BIND_ADDR").unwrap_or(defaults.bind_addr);
        let tax_law_dir = lookup("SUNDAY_PAY_TAX_LAW_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.tax_law_dir);
        Ok(Self {
            bind_addr,
            tax_law_dir,
            max_trials: limit(&lookup, "SUNDAY_PAY_MAX_TRIALS", defaults.max_trials)?,
            max_staff: limit(&lookup, "SUNDAY_PAY_MAX_STAFF", defaults.max_staff)?,
            max_shift_draws: limit(
                &lookup,
                "SUNDAY_PAY_MAX_SHIFT_DRAWS",
                defaults.max_shift_draws,
            )?,
        })
    }
}

/// Reads a positive integer limit, falling back to `default` when unset.
fn limit<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr + PartialEq + Default,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let Some(raw) = lookup(key) else {
        return Ok(default);
    };
    let value = raw
        .trim()
        .parse::<T>()
        .with_context(|| format!("invalid {key} '{raw}'"))?;
    if value == T::default() {
        anyhow::bail!("{key} must be greater than 0");
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_environment_uses_defaults() {
        let config = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn reads_overrides() {
        let config = AppConfig::from_lookup(lookup(&[
            ("SUNDAY_PAY_BIND_ADDR", "0.0.0.0:8080"),
            ("SUNDAY_PAY_TAX_LAW_DIR", "/etc/sunday_pay/laws"),
            ("SUNDAY_PAY_MAX_TRIALS", " 500 "),
            ("SUNDAY_PAY_MAX_STAFF", "250"),
            ("SUNDAY_PAY_MAX_SHIFT_DRAWS", "1000000"),
        ]))
        .unwrap();
        assert_eq!(config.bind_addr, "0.0.0.0:8080");
        assert_eq!(config.tax_law_dir, PathBuf::from("/etc/sunday_pay/laws"));
        assert_eq!(config.max_trials, 500);
        assert_eq!(config.max_staff, 250);
        assert_eq!(config.max_shift_draws, 1_000_000);
    }

    #[test]
    fn rejects_bad_trial_limit() {
        let err = AppConfig::from_lookup(lookup(&[("SUNDAY_PAY_MAX_TRIALS", "lots")])).unwrap_err();
        assert_eq!(err.to_string(), "invalid SUNDAY_PAY_MAX_TRIALS 'lots'");
        assert!(AppConfig::from_lookup(lookup(&[("SUNDAY_PAY_MAX_TRIALS", "0")])).is_err());
    }

    #[test]
    fn rejects_bad_staff_and_draw_limits() {
        let err = AppConfig::from_lookup(lookup(&[("SUNDAY_PAY_MAX_STAFF", "0")])).unwrap_err();
        assert_eq!(err.to_string(), "SUNDAY_PAY_MAX_STAFF must be greater than 0");
        let err =
            AppConfig::from_lookup(lookup(&[("SUNDAY_PAY_MAX_SHIFT_DRAWS", "-5")])).unwrap_err();
        assert_eq!(err.to_string(), "invalid SUNDAY_PAY_MAX_SHIFT_DRAWS '-5'");
    }
}
