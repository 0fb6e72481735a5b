//! Built-in content: the challenge catalog, dashboard category cards and the demo profile.

use serde::Serialize;

use crate::domain::{Category, Challenge, Difficulty, LatLng};

#[allow(clippy::too_many_arguments)]
fn challenge(
  id: u32,
  title: &str,
  (lat, lng): (f64, f64),
  category: Category,
  points: u32,
  description: &str,
  difficulty: Difficulty,
  estimated_time: &str,
  tasks: [&str; 4],
) -> Challenge {
  Challenge {
    id,
    title: title.into(),
    description: description.into(),
    location: LatLng { lat, lng },
    category,
    difficulty,
    points,
    estimated_time: estimated_time.into(),
    tasks: tasks.iter().map(|t| t.to_string()).collect(),
  }
}

/// The world tour every deployment starts with.
pub fn seed_challenges() -> Vec<Challenge> {
  use Category::*;
  use Difficulty::*;
  vec![
    challenge(1, "Eiffel Tower Adventure", (48.8584, 2.2945), Cultural, 300,
      "Experience the iconic Eiffel Tower and its surrounding gardens.", Medium, "2-3 hours",
      ["Take a photo from the top observation deck", "Find the hidden Gustav Eiffel apartment",
       "Capture the tower sparkling at night", "Visit the Champ de Mars gardens"]),
    challenge(2, "Tokyo Street Food Safari", (35.6762, 139.6503), Food, 250,
      "Explore the vibrant street food scene in Tokyo.", Medium, "3-4 hours",
      ["Try takoyaki in Shibuya", "Sample ramen in a local shop",
       "Visit Tsukiji Outer Market", "Find a unique vending machine snack"]),
    challenge(3, "Colosseum Time Travel", (41.8902, 12.4922), Cultural, 350,
      "Step back in time at the magnificent Roman Colosseum.", Hard, "4-5 hours",
      ["Document the different levels of the arena", "Find the underground tunnels",
       "Photograph the Arch of Constantine", "Visit the Roman Forum nearby"]),
    challenge(4, "Sydney Harbor Challenge", (-33.8568, 151.2153), Adventure, 400,
      "Experience the best of Sydney Harbor.", Expert, "5-6 hours",
      ["Climb the Sydney Harbor Bridge", "Watch a performance at the Opera House",
       "Take the Manly Ferry", "Visit the Royal Botanic Garden"]),
    challenge(5, "Dubai Heights", (25.1972, 55.2744), Adventure, 450,
      "Explore the vertical wonders of Dubai.", Expert, "4-5 hours",
      ["Visit the Burj Khalifa observation deck", "Dine at At.mosphere restaurant",
       "Visit the Dubai Mall", "Watch the Dubai Fountain show"]),
    challenge(6, "Barcelona Gaudi Tour", (41.4036, 2.1744), Cultural, 300,
      "Discover the architectural wonders of Antoni Gaudi.", Medium, "6-7 hours",
      ["Visit Sagrada Familia", "Explore Park Güell", "Tour Casa Batlló", "Find Casa Milà"]),
    challenge(7, "Singapore Food Adventure", (1.3521, 103.8198), Food, 200,
      "Experience the diverse flavors of Singapore.", Easy, "4-5 hours",
      ["Visit a hawker center", "Try Hainanese chicken rice",
       "Sample chili crab", "Explore Chinatown Food Street"]),
    challenge(8, "New York City Landmarks", (40.7128, -74.0060), Adventure, 350,
      "Explore the iconic landmarks of NYC.", Hard, "8-9 hours",
      ["Visit Times Square", "Walk across Brooklyn Bridge",
       "Tour Central Park", "Visit the Statue of Liberty"]),
  ]
}

/// Dashboard card for one category.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryCard {
  pub category: Category,
  pub name: &'static str,
  pub description: &'static str,
  pub max_points: u32,
  pub color: &'static str,
}

pub fn category_cards() -> Vec<CategoryCard> {
  let card = |category: Category, name: &'static str, description: &'static str, max_points: u32| CategoryCard {
    category,
    name,
    description,
    max_points,
    color: category.marker_color(),
  };
  vec![
    card(Category::Adventure, "Adventure", "Explore thrilling outdoor activities", 500),
    card(Category::Cultural, "Cultural", "Discover local art and history", 400),
    card(Category::Food, "Food & Drink", "Taste Seattle's finest cuisine", 300),
    card(Category::Nature, "Nature", "Connect with the outdoors", 450),
  ]
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Achievement {
  pub id: u32,
  pub name: &'static str,
  pub description: &'static str,
  pub date: &'static str,
}

#[derive(Clone, Debug, Serialize)]
pub struct CategoryStats {
  pub adventure: u32,
  pub cultural: u32,
  pub food: u32,
  pub nature: u32,
}

/// Demo explorer shown on the profile page. There are no accounts behind it.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExplorerProfile {
  pub name: &'static str,
  pub avatar: &'static str,
  pub location: &'static str,
  pub join_date: &'static str,
  pub total_points: u32,
  pub rank: &'static str,
  pub completed_challenges: u32,
  pub stats: CategoryStats,
  pub achievements: Vec<Achievement>,
}

pub fn demo_profile() -> ExplorerProfile {
  ExplorerProfile {
    name: "Sarah Johnson",
    avatar: "https://images.unsplash.com/photo-1494790108377-be9c29b29330",
    location: "Seattle, WA",
    join_date: "January 2024",
    total_points: 2500,
    rank: "Explorer",
    completed_challenges: 15,
    stats: CategoryStats { adventure: 30, cultural: 25, food: 35, nature: 10 },
    achievements: vec![
      Achievement { id: 1, name: "First Challenge", description: "Complete your first challenge", date: "2024-01-15" },
      Achievement { id: 2, name: "Cultural Explorer", description: "Complete 5 cultural challenges", date: "2024-01-20" },
      Achievement { id: 3, name: "Foodie", description: "Complete 10 food challenges", date: "2024-02-01" },
    ],
  }
}
