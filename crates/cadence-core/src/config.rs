//! Engine configuration: typed structs mirroring `cadence-config.yaml`.
//!
//! Everything tunable about resolution -- the world seed, day length, hop
//! limit, tier intervals, and the scoring clamp bounds -- lives here, not
//! in code, so a world version pins its exact decision behavior. The
//! scoring bounds in particular are part of the reproducibility contract:
//! replaying a session requires the same config the session ran with.
//!
//! World *content* (activity catalog, routine graphs, preference
//! defaults) is not engine configuration; it arrives through the host's
//! configuration store as a [`crate::world::WorldDocument`].

use std::path::Path;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use cadence_types::{ActivityId, SimulationTier};

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level engine configuration.
///
/// Mirrors the structure of `cadence-config.yaml`. All fields have
/// defaults so a partial (or empty) file is valid.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// World-level settings (name, seed, day length).
    #[serde(default)]
    pub world: WorldTuning,

    /// Resolution settings (hop limit, fallback behavior).
    #[serde(default)]
    pub resolve: ResolveConfig,

    /// Scoring factor bounds and modifiers.
    #[serde(default)]
    pub scoring: ScoringConfig,

    /// Tier re-evaluation intervals.
    #[serde(default)]
    pub tiers: TiersConfig,
}

impl EngineConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// The `CADENCE_SEED` environment variable, when set to a valid
    /// integer, overrides `world.seed` -- useful for replaying a recorded
    /// session without editing the file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Self = serde_yml::from_str(&contents)?;
        config.world.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_yml::from_str(yaml)?;
        config.world.apply_env_overrides();
        Ok(config)
    }
}

// ---------------------------------------------------------------------------
// World tuning
// ---------------------------------------------------------------------------

/// World-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldTuning {
    /// Human-readable world name for logs.
    #[serde(default = "default_world_name")]
    pub name: String,

    /// Random seed. Per-NPC decision streams are derived from this, so
    /// the same seed + config + content replays identically.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Length of one world day in seconds.
    #[serde(default = "default_day_length_secs")]
    pub day_length_secs: u32,
}

impl WorldTuning {
    /// Override the seed with the `CADENCE_SEED` environment variable
    /// when set to a valid integer.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("CADENCE_SEED")
            && let Ok(seed) = val.parse::<u64>()
        {
            self.seed = seed;
        }
    }
}

impl Default for WorldTuning {
    fn default() -> Self {
        Self {
            name: default_world_name(),
            seed: default_seed(),
            day_length_secs: default_day_length_secs(),
        }
    }
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// Resolution behavior configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolveConfig {
    /// Maximum edges followed in one traversal before giving up.
    /// Bounds designer-introduced cycles; exceeding it degrades the NPC
    /// to idle for the tick.
    #[serde(default = "default_hop_limit")]
    pub hop_limit: u32,

    /// Activity selected when no candidate is feasible and the NPC is
    /// not already doing something. `None` leaves the NPC idle.
    #[serde(default = "default_fallback_activity")]
    pub fallback_activity: Option<ActivityId>,

    /// How long an idle NPC waits before re-checking for work, so
    /// feasibility exhaustion does not re-run every tick.
    #[serde(default = "default_idle_recheck_secs")]
    pub idle_recheck_secs: u64,
}

impl Default for ResolveConfig {
    fn default() -> Self {
        Self {
            hop_limit: default_hop_limit(),
            fallback_activity: default_fallback_activity(),
            idle_recheck_secs: default_idle_recheck_secs(),
        }
    }
}

// ---------------------------------------------------------------------------
// Scoring
// ---------------------------------------------------------------------------

/// Scoring factor bounds and modifiers.
///
/// Every one of the eight factors is clamped to
/// `[factor_floor, factor_ceiling]` before multiplication, and the final
/// product to `[product_floor, product_ceiling]`, so no single weak
/// factor can zero a candidate and no single strong factor can dominate
/// the pool. These bounds are versioned with the world: changing them
/// changes every NPC's behavior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Lower clamp applied to each factor.
    #[serde(default = "default_factor_floor")]
    pub factor_floor: Decimal,

    /// Upper clamp applied to each factor.
    #[serde(default = "default_factor_ceiling")]
    pub factor_ceiling: Decimal,

    /// Lower clamp applied to the final product.
    #[serde(default = "default_product_floor")]
    pub product_floor: Decimal,

    /// Upper clamp applied to the final product.
    #[serde(default = "default_product_ceiling")]
    pub product_ceiling: Decimal,

    /// Multiplier granted to the currently-running activity, reducing
    /// thrashing. Never overrides the `min_duration`/cooldown invariants.
    #[serde(default = "default_continuity_bonus")]
    pub continuity_bonus: Decimal,

    /// Energy level below which the urgency factor starts boosting
    /// restorative activities and dampening draining ones.
    #[serde(default = "default_urgency_energy_threshold")]
    pub urgency_energy_threshold: Decimal,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            factor_floor: default_factor_floor(),
            factor_ceiling: default_factor_ceiling(),
            product_floor: default_product_floor(),
            product_ceiling: default_product_ceiling(),
            continuity_bonus: default_continuity_bonus(),
            urgency_energy_threshold: default_urgency_energy_threshold(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tiers
// ---------------------------------------------------------------------------

/// Per-tier re-evaluation intervals in world seconds.
///
/// An NPC is only re-resolved when its tier's interval has elapsed since
/// its last evaluation; between evaluations its state is untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TiersConfig {
    /// Interval for the active (near-player) tier.
    #[serde(default = "default_active_interval_secs")]
    pub active_interval_secs: u64,

    /// Interval for the background tier.
    #[serde(default = "default_background_interval_secs")]
    pub background_interval_secs: u64,
}

impl TiersConfig {
    /// The re-evaluation interval for a tier.
    pub const fn interval_secs(&self, tier: SimulationTier) -> u64 {
        match tier {
            SimulationTier::Active => self.active_interval_secs,
            SimulationTier::Background => self.background_interval_secs,
        }
    }
}

impl Default for TiersConfig {
    fn default() -> Self {
        Self {
            active_interval_secs: default_active_interval_secs(),
            background_interval_secs: default_background_interval_secs(),
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions (serde default requires named functions)
// ---------------------------------------------------------------------------

fn default_world_name() -> String {
    "Cadence World".to_owned()
}

const fn default_seed() -> u64 {
    42
}

const fn default_day_length_secs() -> u32 {
    86_400
}

const fn default_hop_limit() -> u32 {
    8
}

fn default_fallback_activity() -> Option<ActivityId> {
    Some(ActivityId(String::from("activity:idle")))
}

const fn default_idle_recheck_secs() -> u64 {
    300
}

fn default_factor_floor() -> Decimal {
    Decimal::new(1, 1)
}

fn default_factor_ceiling() -> Decimal {
    Decimal::from(2)
}

fn default_product_floor() -> Decimal {
    Decimal::new(1, 2)
}

fn default_product_ceiling() -> Decimal {
    Decimal::from(100)
}

fn default_continuity_bonus() -> Decimal {
    Decimal::new(115, 2)
}

fn default_urgency_energy_threshold() -> Decimal {
    Decimal::from(30)
}

const fn default_active_interval_secs() -> u64 {
    60
}

const fn default_background_interval_secs() -> u64 {
    600
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = EngineConfig::default();
        assert_eq!(config.world.seed, 42);
        assert_eq!(config.world.day_length_secs, 86_400);
        assert_eq!(config.resolve.hop_limit, 8);
        assert_eq!(
            config.resolve.fallback_activity,
            Some(ActivityId::from("activity:idle"))
        );
        assert_eq!(config.scoring.factor_floor, Decimal::new(1, 1));
        assert_eq!(config.scoring.factor_ceiling, Decimal::from(2));
        assert_eq!(config.tiers.active_interval_secs, 60);
    }

    #[test]
    fn parse_full_yaml() {
        let yaml = r#"
world:
  name: "Harbor Town"
  seed: 123
  day_length_secs: 43200

resolve:
  hop_limit: 4
  fallback_activity: "activity:loiter"
  idle_recheck_secs: 120

scoring:
  factor_floor: "0.2"
  factor_ceiling: "1.5"
  product_floor: "0.05"
  product_ceiling: "50"
  continuity_bonus: "1.1"
  urgency_energy_threshold: "25"

tiers:
  active_interval_secs: 30
  background_interval_secs: 900
"#;
        let config = EngineConfig::parse(yaml).unwrap();
        assert_eq!(config.world.name, "Harbor Town");
        assert_eq!(config.world.day_length_secs, 43_200);
        assert_eq!(config.resolve.hop_limit, 4);
        assert_eq!(
            config.resolve.fallback_activity,
            Some(ActivityId::from("activity:loiter"))
        );
        assert_eq!(config.scoring.factor_ceiling, Decimal::new(15, 1));
        assert_eq!(
            config.tiers.interval_secs(SimulationTier::Background),
            900
        );
    }

    #[test]
    fn parse_minimal_yaml() {
        let yaml = "world:\n  seed: 7\n";
        let config = EngineConfig::parse(yaml).unwrap();
        assert_eq!(config.world.seed, 7);
        assert_eq!(config.resolve.hop_limit, 8);
    }

    #[test]
    fn parse_empty_yaml() {
        assert!(EngineConfig::parse("").is_ok());
    }

    #[test]
    fn explicit_null_fallback_disables_idle() {
        let yaml = "resolve:\n  fallback_activity: null\n";
        let config = EngineConfig::parse(yaml).unwrap();
        assert_eq!(config.resolve.fallback_activity, None);
    }
}
