//! Video consultation rooms.
//!
//! The vendor SDK runs in the browser; the server only picks the room id,
//! signs a short-lived room token for the participant and builds the
//! meet URL the client opens.

pub mod token;

pub use token::ZegoTokenIssuer;

use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum VideoError {
    #[error("Video server secret must be 32 bytes, got {0}")]
    InvalidSecret(usize),
    #[error("Room token signing failed")]
    Signing,
    #[error("Malformed room token")]
    MalformedToken,
}

/// Everything a participant needs to join a room.
#[derive(Debug, Clone, Serialize)]
pub struct RoomGrant {
    pub app_id: u32,
    pub room_id: String,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

pub trait VideoRooms: Send + Sync {
    /// Sign a token letting `user_id` join and publish in `room_id`.
    fn grant(&self, room_id: &str, user_id: &str) -> Result<RoomGrant, VideoError>;
}

/// Fresh room id for one consultation session.
pub fn new_room_id() -> String {
    format!("consult_{}", uuid::Uuid::new_v4().simple())
}

/// Public URL the client opens to join `room_id`.
pub fn meet_url(public_base_url: &str, room_id: &str) -> String {
    format!("{}/consult/{}", public_base_url.trim_end_matches('/'), room_id)
}
