//! Logical queries: what a listing fetches, independent of backend

use serde::{Deserialize, Serialize};
use xtra_media_providers::{BroadcastType, StreamSort, VideoPeriod, VideoSort};

use crate::error::{Error, Result};

/// A game, known by id, name, or both.
///
/// GraphQL addresses games by name, Helix by id; a backend that needs the
/// form that is missing reports the query as unsupported.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GameRef {
    pub id: Option<String>,
    pub name: Option<String>,
}

impl GameRef {
    #[must_use]
    pub fn by_name(name: impl Into<String>) -> Self {
        Self { id: None, name: Some(name.into()) }
    }

    #[must_use]
    pub fn by_id(id: impl Into<String>) -> Self {
        Self { id: Some(id.into()), name: None }
    }

    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    #[must_use]
    pub fn id(&self) -> Option<&str> {
        non_blank(self.id.as_deref())
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        non_blank(self.name.as_deref())
    }
}

/// A channel, known by user id, login, or both.
///
/// GraphQL addresses channels by login, Helix by user id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChannelRef {
    pub id: Option<String>,
    pub login: Option<String>,
}

impl ChannelRef {
    #[must_use]
    pub fn by_login(login: impl Into<String>) -> Self {
        Self { id: None, login: Some(login.into()) }
    }

    #[must_use]
    pub fn by_id(id: impl Into<String>) -> Self {
        Self { id: Some(id.into()), login: None }
    }

    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    #[must_use]
    pub fn id(&self) -> Option<&str> {
        non_blank(self.id.as_deref())
    }

    #[must_use]
    pub fn login(&self) -> Option<&str> {
        non_blank(self.login.as_deref())
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// What a listing fetches. Immutable for the lifetime of the listing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LogicalQuery {
    TopGames {
        #[serde(default)]
        tags: Vec<String>,
    },
    TopStreams {
        #[serde(default)]
        tags: Vec<String>,
    },
    GameStreams {
        game: GameRef,
        #[serde(default)]
        sort: StreamSort,
        #[serde(default)]
        tags: Vec<String>,
    },
    GameVideos {
        game: GameRef,
        #[serde(default)]
        sort: VideoSort,
        #[serde(default)]
        period: VideoPeriod,
        broadcast_type: Option<BroadcastType>,
        language: Option<String>,
    },
    GameClips {
        game: GameRef,
        #[serde(default)]
        period: VideoPeriod,
    },
    ChannelVideos {
        channel: ChannelRef,
        #[serde(default)]
        sort: VideoSort,
        #[serde(default)]
        period: VideoPeriod,
        broadcast_type: Option<BroadcastType>,
    },
    ChannelClips {
        channel: ChannelRef,
        #[serde(default)]
        period: VideoPeriod,
    },
    SearchChannels {
        query: String,
    },
    SearchGames {
        query: String,
    },
    SearchVideos {
        query: String,
    },
    /// Live channels the signed-in user follows; Helix needs the user id
    FollowedStreams {
        user_id: Option<String>,
    },
    FollowedVideos,
    FollowedChannels {
        user_id: Option<String>,
    },
    FollowedGames,
}

impl LogicalQuery {
    /// Short description used in logs and `Unsupported` errors
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::TopGames { .. } => "top games".to_string(),
            Self::TopStreams { .. } => "top streams".to_string(),
            Self::GameStreams { game, .. } => format!("streams for game {}", game_label(game)),
            Self::GameVideos { game, .. } => format!("videos for game {}", game_label(game)),
            Self::GameClips { game, .. } => format!("clips for game {}", game_label(game)),
            Self::ChannelVideos { channel, .. } => format!("videos for channel {}", channel_label(channel)),
            Self::ChannelClips { channel, .. } => format!("clips for channel {}", channel_label(channel)),
            Self::SearchChannels { query } => format!("channel search `{query}`"),
            Self::SearchGames { query } => format!("game search `{query}`"),
            Self::SearchVideos { query } => format!("video search `{query}`"),
            Self::FollowedStreams { .. } => "followed streams".to_string(),
            Self::FollowedVideos => "followed videos".to_string(),
            Self::FollowedChannels { .. } => "followed channels".to_string(),
            Self::FollowedGames => "followed games".to_string(),
        }
    }

    /// Reject queries missing the identifier they are keyed on.
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::GameStreams { game, .. } | Self::GameVideos { game, .. } | Self::GameClips { game, .. } => {
                if game.id().is_none() && game.name().is_none() {
                    return Err(Error::Validation(format!("{} requires a game id or name", self.describe())));
                }
            }
            Self::ChannelVideos { channel, .. } | Self::ChannelClips { channel, .. } => {
                if channel.id().is_none() && channel.login().is_none() {
                    return Err(Error::Validation(format!(
                        "{} requires a channel id or login",
                        self.describe()
                    )));
                }
            }
            Self::SearchChannels { query } | Self::SearchGames { query } | Self::SearchVideos { query } => {
                if query.trim().is_empty() {
                    return Err(Error::Validation("search requires a non-empty query".to_string()));
                }
            }
            Self::TopGames { .. }
            | Self::TopStreams { .. }
            | Self::FollowedStreams { .. }
            | Self::FollowedVideos
            | Self::FollowedChannels { .. }
            | Self::FollowedGames => {}
        }
        Ok(())
    }
}

fn game_label(game: &GameRef) -> &str {
    game.name().or_else(|| game.id()).unwrap_or("?")
}

fn channel_label(channel: &ChannelRef) -> &str {
    channel.login().or_else(|| channel.id()).unwrap_or("?")
}
