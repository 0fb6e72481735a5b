//! Application state: the read-only catalog, static dashboard content, timing and
//! the verdict policy handed to every map surface.
//!
//! Nothing here is mutated after startup. Per-client interaction state lives in the
//! `MapSurface` each WebSocket connection creates through `new_surface`.

use std::sync::Arc;

use tracing::{info, instrument};

use crate::catalog::Catalog;
use crate::config::{load_config_from_env, AppConfig, Timing};
use crate::seeds::{category_cards, demo_profile, seed_challenges, CategoryCard, ExplorerProfile};
use crate::surface::MapSurface;
use crate::verdict::VerdictPolicy;

#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<Catalog>,
    pub categories: Arc<Vec<CategoryCard>>,
    pub profile: Arc<ExplorerProfile>,
    pub timing: Timing,
    pub policy: Arc<dyn VerdictPolicy>,
}

impl AppState {
    /// Build state from env: load config if present, otherwise defaults.
    #[instrument(level = "info", skip_all)]
    pub fn new() -> Self {
        Self::from_config(load_config_from_env().unwrap_or_default())
    }

    pub fn from_config(cfg: AppConfig) -> Self {
        let catalog = Catalog::build(seed_challenges(), &cfg.challenges);
        info!(
            target: "questmap_backend",
            challenges = catalog.len(),
            verdict_delay_ms = cfg.timing.verdict_delay_ms,
            reset_delay_ms = cfg.timing.reset_delay_ms,
            submission_delay_ms = cfg.timing.submission_delay_ms,
            policy = ?cfg.review.policy,
            "Application state ready"
        );
        Self {
            catalog: Arc::new(catalog),
            categories: Arc::new(category_cards()),
            profile: Arc::new(demo_profile()),
            policy: cfg.review.policy.build(),
            timing: cfg.timing,
        }
    }

    /// Fresh surface for one client; it shares only the catalog and policy.
    pub fn new_surface(&self) -> MapSurface {
        MapSurface::new(self.catalog.clone(), self.policy.clone(), &self.timing)
    }
}
