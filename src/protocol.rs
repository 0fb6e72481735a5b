//! Public protocol structs for WebSocket and HTTP endpoints (serde ready).
//! Keep this small and stable to evolve backend and frontend independently.

use serde::{Deserialize, Serialize};

use crate::catalog::directions_url;
use crate::domain::{Category, Challenge, ChallengeId, Difficulty, Evidence, LatLng};
use crate::surface::{Cause, SessionSnapshot};

/// Messages the client can send over WebSocket.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientWsMessage {
    Ping,
    SelectChallenge {
        #[serde(rename = "challengeId")]
        challenge_id: ChallengeId,
    },
    Start,
    Cancel,
    Submit {
        evidence: Evidence,
    },
    Close,
}

/// Messages the server sends back over WebSocket.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerWsMessage {
    Pong,
    Session {
        cause: Cause,
        session: SessionSnapshot,
    },
    Error {
        message: String,
    },
}

/// DTO used by the catalog endpoints. Carries both point values untouched.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeOut {
    pub id: ChallengeId,
    pub title: String,
    pub description: String,
    pub location: LatLng,
    pub category: Category,
    pub difficulty: Difficulty,
    pub points: u32,
    pub difficulty_points: u32,
    pub estimated_time: String,
    pub tasks: Vec<String>,
    pub marker_color: &'static str,
    pub directions_url: String,
}

/// Convert a catalog `Challenge` to the public DTO.
pub fn to_out(c: &Challenge) -> ChallengeOut {
    ChallengeOut {
        id: c.id,
        title: c.title.clone(),
        description: c.description.clone(),
        location: c.location,
        category: c.category,
        difficulty: c.difficulty,
        points: c.points,
        difficulty_points: c.difficulty.points(),
        estimated_time: c.estimated_time.clone(),
        tasks: c.tasks.clone(),
        marker_color: c.category.marker_color(),
        directions_url: directions_url(c.location),
    }
}

//
// HTTP request/response DTOs
//

/// Acknowledgment for an accepted business proposal.
#[derive(Debug, Serialize)]
pub struct SubmitBusinessOut {
    pub success: bool,
    pub message: &'static str,
}

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
}
