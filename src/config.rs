//! Loading service configuration (timing windows + optional extra challenges) from TOML.
//!
//! See `AppConfig` and `Timing` for expected schema. Example:
//!
//! ```toml
//! [timing]
//! verdict_delay_ms = 2000
//! reset_delay_ms = 3000
//! submission_delay_ms = 1000
//!
//! [review]
//! policy = "coin_flip"   # or "always_accept" / "always_reject"
//!
//! [[challenges]]
//! id = 9
//! title = "Table Mountain Hike"
//! lat = -33.9628
//! lng = 18.4098
//! category = "nature"
//! difficulty = "Hard"
//! points = 320
//! description = "Summit Cape Town's flat-topped landmark."
//! estimated_time = "4-5 hours"
//! tasks = ["Take the Platteklip Gorge trail", "Photograph the city from the top"]
//! ```

use std::time::Duration;

use serde::Deserialize;
use tracing::{error, info};

use crate::verdict::PolicyKind;

#[derive(Clone, Debug, Deserialize, Default)]
pub struct AppConfig {
  #[serde(default)]
  pub timing: Timing,
  #[serde(default)]
  pub review: Review,
  #[serde(default)]
  pub challenges: Vec<ChallengeCfg>,
}

/// Delays for the simulated review flow and the business form acknowledgment.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Timing {
  pub verdict_delay_ms: u64,
  pub reset_delay_ms: u64,
  pub submission_delay_ms: u64,
}

impl Default for Timing {
  fn default() -> Self {
    Self { verdict_delay_ms: 2000, reset_delay_ms: 3000, submission_delay_ms: 1000 }
  }
}

impl Timing {
  pub fn verdict_delay(&self) -> Duration { Duration::from_millis(self.verdict_delay_ms) }
  pub fn reset_delay(&self) -> Duration { Duration::from_millis(self.reset_delay_ms) }
  pub fn submission_delay(&self) -> Duration { Duration::from_millis(self.submission_delay_ms) }
}

#[derive(Clone, Debug, Deserialize, Default)]
pub struct Review {
  #[serde(default)]
  pub policy: PolicyKind,
}

/// Challenge entry accepted in TOML configuration.
/// Category and difficulty stay raw here; the catalog rejects values outside the closed sets.
#[derive(Clone, Debug, Deserialize)]
pub struct ChallengeCfg {
  pub id: u32,
  pub title: String,
  #[serde(default)] pub description: String,
  pub lat: f64,
  pub lng: f64,
  pub category: String,
  pub difficulty: String,
  pub points: u32,
  #[serde(default)] pub estimated_time: String,
  #[serde(default)] pub tasks: Vec<String>,
}

pub fn parse_config(raw: &str) -> Result<AppConfig, toml::de::Error> {
  toml::from_str::<AppConfig>(raw)
}

/// Attempt to load `AppConfig` from QUESTMAP_CONFIG_PATH. On any parsing/IO error, returns None.
pub fn load_config_from_env() -> Option<AppConfig> {
  let path = std::env::var("QUESTMAP_CONFIG_PATH").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match parse_config(&s) {
      Ok(cfg) => {
        info!(target: "questmap_backend", %path, extra_challenges = cfg.challenges.len(), "Loaded config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "questmap_backend", %path, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "questmap_backend", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}
