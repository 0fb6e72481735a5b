//! Domain models: challenge categories/difficulties, the challenge record itself,
//! completion evidence and verdicts.

use std::fmt;
use std::str::FromStr;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type ChallengeId = u32;

/// Marker color used when a category string is not one we know.
pub const DEFAULT_MARKER_COLOR: &str = "#2563EB";

/// Closed set of challenge themes. Drives marker color and the food-only form fields.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Category {
  Adventure,
  Cultural,
  Food,
  Nature,
}

impl Category {
  pub const ALL: [Category; 4] = [Category::Adventure, Category::Cultural, Category::Food, Category::Nature];

  pub fn as_str(self) -> &'static str {
    match self {
      Category::Adventure => "adventure",
      Category::Cultural => "cultural",
      Category::Food => "food",
      Category::Nature => "nature",
    }
  }

  pub fn marker_color(self) -> &'static str {
    match self {
      Category::Adventure => "#DC2626",
      Category::Cultural => "#7C3AED",
      Category::Food => "#059669",
      Category::Nature => "#2563EB",
    }
  }
}

impl fmt::Display for Category {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for Category {
  type Err = String;
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Category::ALL
      .into_iter()
      .find(|c| c.as_str() == s)
      .ok_or_else(|| format!("unknown category '{}'", s))
  }
}

/// Marker color for a raw category string. Unknown input gets the default color.
pub fn marker_color_for(raw: &str) -> &'static str {
  match raw.parse::<Category>() {
    Ok(c) => c.marker_color(),
    Err(_) => DEFAULT_MARKER_COLOR,
  }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Difficulty {
  Easy,
  Medium,
  Hard,
  Expert,
}

impl Difficulty {
  pub const ALL: [Difficulty; 4] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard, Difficulty::Expert];

  /// Fixed point value per difficulty tier. Independent of `Challenge::points`.
  pub fn points(self) -> u32 {
    match self {
      Difficulty::Easy => 100,
      Difficulty::Medium => 200,
      Difficulty::Hard => 300,
      Difficulty::Expert => 400,
    }
  }

  pub fn as_str(self) -> &'static str {
    match self {
      Difficulty::Easy => "Easy",
      Difficulty::Medium => "Medium",
      Difficulty::Hard => "Hard",
      Difficulty::Expert => "Expert",
    }
  }
}

impl FromStr for Difficulty {
  type Err = String;
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Difficulty::ALL
      .into_iter()
      .find(|d| d.as_str() == s)
      .ok_or_else(|| format!("unknown difficulty '{}'", s))
  }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct LatLng {
  pub lat: f64,
  pub lng: f64,
}

/// A location-based challenge. Immutable once it is in the catalog.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Challenge {
  pub id: ChallengeId,
  pub title: String,
  pub description: String,
  pub location: LatLng,
  pub category: Category,
  pub difficulty: Difficulty,
  pub points: u32,
  pub estimated_time: String,
  pub tasks: Vec<String>,
}

/// Outcome of reviewing submitted evidence.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
  Accepted,
  Rejected,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct PhotoUpload {
  pub name: String,
  /// Base64 (standard alphabet) image bytes.
  pub data: String,
}

/// What the completion form submits for one challenge.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Evidence {
  #[serde(default)] pub photos: Vec<PhotoUpload>,
  #[serde(default)] pub time_spent_minutes: Option<u32>,
  #[serde(default)] pub rating: Option<u8>,
  #[serde(default)] pub review: Option<String>,
}

/// Completion-form input problems. They block Submit and never reach the state machine.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EvidenceError {
  #[error("Missing required field: {0}")]
  Missing(&'static str),
  #[error("Photo '{0}' is not valid base64 image data")]
  BadPhoto(String),
  #[error("Rating must be between 1 and 5, got {0}")]
  RatingOutOfRange(u8),
}

impl Evidence {
  /// Checks the fields the form marks as required. Rating and review only apply to food challenges.
  pub fn validate(&self, category: Category) -> Result<(), EvidenceError> {
    if self.photos.is_empty() {
      return Err(EvidenceError::Missing("photos"));
    }
    for p in &self.photos {
      let decoded = STANDARD.decode(p.data.trim()).map_err(|_| EvidenceError::BadPhoto(p.name.clone()))?;
      if decoded.is_empty() {
        return Err(EvidenceError::BadPhoto(p.name.clone()));
      }
    }
    match self.time_spent_minutes {
      Some(m) if m >= 1 => {}
      _ => return Err(EvidenceError::Missing("timeSpentMinutes")),
    }
    if category == Category::Food {
      match self.rating {
        None | Some(0) => return Err(EvidenceError::Missing("rating")),
        Some(r) if r > 5 => return Err(EvidenceError::RatingOutOfRange(r)),
        Some(_) => {}
      }
      if self.review.as_deref().map(str::trim).unwrap_or("").is_empty() {
        return Err(EvidenceError::Missing("review"));
      }
    }
    Ok(())
  }
}
