use std::path::PathBuf;

use crate::error::ConfigError;

/// Target average lot value used when nothing else is configured.
pub const DEFAULT_GOAL: f64 = 10_000.0;

/// Share of the goal at or above which a miss counts as `near`.
pub const NEAR_RATIO: f64 = 0.9;

pub const DATA_ENV: &str = "GEO_DRILL_DATA";
pub const GOAL_ENV: &str = "GEO_DRILL_GOAL";
pub const EXPORT_DIR_ENV: &str = "GEO_DRILL_EXPORT_DIR";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GoalConfig {
    pub goal: f64,
}

impl Default for GoalConfig {
    fn default() -> Self {
        GoalConfig { goal: DEFAULT_GOAL }
    }
}

impl GoalConfig {
    pub fn validated(goal: f64) -> Result<Self, ConfigError> {
        if goal.is_finite() && goal > 0.0 {
            Ok(GoalConfig { goal })
        } else {
            Err(ConfigError::InvalidGoal(goal))
        }
    }
}

/// Reads a per-call goal typed by the user. Blank means "use the
/// configured goal"; anything else must be a valid goal.
pub fn parse_goal_override(raw: &str) -> Result<Option<f64>, ConfigError> {
    if raw.trim().is_empty() {
        return Ok(None);
    }
    let parsed = crate::util::parse_f64_safe(Some(raw)).ok_or_else(|| {
        ConfigError::UnparseableGoal {
            var: "goal override",
            value: raw.to_string(),
        }
    })?;
    Ok(Some(GoalConfig::validated(parsed)?.goal))
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub data_path: PathBuf,
    pub goal: GoalConfig,
    pub export_dir: PathBuf,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup; blank values fall back to
    /// the defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let data_path = get(DATA_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("sales.csv"));
        let export_dir = get(EXPORT_DIR_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));
        let goal = match get(GOAL_ENV) {
            None => GoalConfig::default(),
            Some(raw) => {
                let parsed = crate::util::parse_f64_safe(Some(&raw)).ok_or_else(|| {
                    ConfigError::UnparseableGoal {
                        var: GOAL_ENV,
                        value: raw.clone(),
                    }
                })?;
                GoalConfig::validated(parsed)?
            }
        };

        Ok(AppConfig {
            data_path,
            goal,
            export_dir,
        })
    }
}
