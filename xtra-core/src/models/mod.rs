//! Backend-agnostic domain records
//!
//! Optional upstream fields stay `Option`: a missing viewer count is
//! `None`, never `0`.

pub mod page;
pub mod query;

pub use page::{Cursor, Page};
pub use query::{ChannelRef, GameRef, LogicalQuery};

use serde::{Deserialize, Serialize};
use xtra_media_providers::BroadcastType;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stream {
    pub id: Option<String>,
    pub channel_id: Option<String>,
    pub channel_login: String,
    pub channel_name: Option<String>,
    pub game_id: Option<String>,
    pub game_name: Option<String>,
    pub title: Option<String>,
    pub viewer_count: Option<u64>,
    pub started_at: Option<String>,
    pub language: Option<String>,
    pub thumbnail_url: Option<String>,
    pub profile_image_url: Option<String>,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Video {
    pub id: String,
    pub channel_id: Option<String>,
    pub channel_login: Option<String>,
    pub channel_name: Option<String>,
    pub title: Option<String>,
    pub view_count: Option<u64>,
    pub created_at: Option<String>,
    pub duration_seconds: Option<u64>,
    pub thumbnail_url: Option<String>,
    pub broadcast_type: Option<BroadcastType>,
    pub game_id: Option<String>,
    pub game_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clip {
    /// Clip slug
    pub id: String,
    pub channel_id: Option<String>,
    pub channel_login: Option<String>,
    pub channel_name: Option<String>,
    pub title: Option<String>,
    pub view_count: Option<u64>,
    pub created_at: Option<String>,
    pub duration_seconds: Option<f64>,
    pub thumbnail_url: Option<String>,
    pub video_id: Option<String>,
    pub video_offset_seconds: Option<u64>,
    pub game_id: Option<String>,
    pub game_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Game {
    pub id: Option<String>,
    pub name: String,
    pub box_art_url: Option<String>,
    pub viewer_count: Option<u64>,
    pub broadcaster_count: Option<u64>,
    pub tags: Vec<Tag>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Channel {
    pub id: Option<String>,
    pub login: String,
    pub display_name: Option<String>,
    pub profile_image_url: Option<String>,
    pub followers: Option<u64>,
    pub is_live: Option<bool>,
    pub followed_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: Option<String>,
    pub name: String,
}

/// Any record a listing can yield
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum DomainRecord {
    Stream(Stream),
    Video(Video),
    Clip(Clip),
    Game(Game),
    Channel(Channel),
}

impl DomainRecord {
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Stream(_) => "stream",
            Self::Video(_) => "video",
            Self::Clip(_) => "clip",
            Self::Game(_) => "game",
            Self::Channel(_) => "channel",
        }
    }
}

macro_rules! impl_from_record {
    ($($variant:ident),*) => {
        $(impl From<$variant> for DomainRecord {
            fn from(record: $variant) -> Self {
                Self::$variant(record)
            }
        })*
    };
}

impl_from_record!(Stream, Video, Clip, Game, Channel);

/// Playback URL of one clip rendition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClipUrl {
    /// `"720p"`, `"1080p60"`, or the rendition index when quality is unknown
    pub label: String,
    pub url: String,
}

/// A game segment of a past broadcast
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoChapter {
    pub description: Option<String>,
    pub position_ms: Option<u64>,
    pub duration_ms: Option<u64>,
    pub game: Option<Game>,
}

/// Resolved cheer emote, one per surviving tier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheerEmote {
    pub name: String,
    pub url1x: Option<String>,
    pub url2x: Option<String>,
    pub url3x: Option<String>,
    pub url4x: Option<String>,
    /// `Some("gif")` only for animated emotes
    #[serde(rename = "type")]
    pub emote_type: Option<String>,
    pub is_animated: bool,
    pub min_bits: u64,
    pub color: Option<String>,
}
