//! Read-only challenge catalog plus the pure helpers the map needs per marker.

use std::collections::HashMap;

use tracing::{error, info, instrument};

use crate::config::ChallengeCfg;
use crate::domain::{Category, Challenge, ChallengeId, Difficulty, LatLng};

/// External navigation link for a marker. Formatting only, nothing is fetched.
pub fn directions_url(location: LatLng) -> String {
  format!("https://www.google.com/maps/dir/?api=1&destination={},{}", location.lat, location.lng)
}

#[derive(Debug)]
pub struct Catalog {
  items: Vec<Challenge>,
  by_id: HashMap<ChallengeId, usize>,
}

impl Catalog {
  /// Built-in seeds first, then config-bank entries. Bank entries that break the
  /// catalog invariants (closed category/difficulty, non-empty tasks, unique id) are skipped.
  #[instrument(level = "info", skip_all, fields(seeds = seeds.len(), bank = bank.len()))]
  pub fn build(seeds: Vec<Challenge>, bank: &[ChallengeCfg]) -> Self {
    let mut catalog = Catalog { items: Vec::new(), by_id: HashMap::new() };
    for c in seeds {
      if let Err(reason) = catalog.push(c) {
        error!(target: "questmap_backend", %reason, "Skipping seed challenge");
      }
    }
    for cc in bank {
      match from_cfg(cc).and_then(|c| catalog.push(c)) {
        Ok(()) => {}
        Err(reason) => error!(target: "questmap_backend", id = cc.id, %reason, "Skipping bank challenge"),
      }
    }

    let mut count_by_cat: HashMap<Category, usize> = HashMap::new();
    for c in &catalog.items {
      *count_by_cat.entry(c.category).or_default() += 1;
    }
    for (category, n) in count_by_cat {
      info!(target: "questmap_backend", %category, challenges = n, "Startup catalog inventory");
    }
    catalog
  }

  fn push(&mut self, c: Challenge) -> Result<(), String> {
    if c.tasks.is_empty() {
      return Err("challenge has no tasks".into());
    }
    if self.by_id.contains_key(&c.id) {
      return Err(format!("duplicate id {}", c.id));
    }
    self.by_id.insert(c.id, self.items.len());
    self.items.push(c);
    Ok(())
  }

  pub fn get(&self, id: ChallengeId) -> Option<&Challenge> {
    self.by_id.get(&id).map(|&i| &self.items[i])
  }

  pub fn all(&self) -> &[Challenge] {
    &self.items
  }

  pub fn len(&self) -> usize {
    self.items.len()
  }
}

fn from_cfg(cc: &ChallengeCfg) -> Result<Challenge, String> {
  let category: Category = cc.category.parse()?;
  let difficulty: Difficulty = cc.difficulty.parse()?;
  let tasks: Vec<String> = cc.tasks.iter().map(|t| t.trim().to_string()).filter(|t| !t.is_empty()).collect();
  Ok(Challenge {
    id: cc.id,
    title: cc.title.clone(),
    description: cc.description.clone(),
    location: LatLng { lat: cc.lat, lng: cc.lng },
    category,
    difficulty,
    points: cc.points,
    estimated_time: cc.estimated_time.clone(),
    tasks,
  })
}
