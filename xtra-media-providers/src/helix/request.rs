//! Helix request builders
//!
//! A Helix request is a resource path plus query parameters. Pagination
//! uses `first` (page size, max 100) and `after` (the previous page's
//! cursor).

use chrono::{DateTime, SecondsFormat, Utc};

use crate::error::ProviderClientError;
use crate::filters::{BroadcastType, VideoPeriod, VideoSort};

/// Largest page size Helix accepts
pub const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HelixRequest {
    pub path: &'static str,
    pub query: Vec<(&'static str, String)>,
}

impl HelixRequest {
    fn new(path: &'static str) -> Self {
        Self { path, query: Vec::new() }
    }

    fn param(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.query.push((key, value.into()));
        self
    }

    fn param_opt(self, key: &'static str, value: Option<impl Into<String>>) -> Self {
        match value {
            Some(value) => self.param(key, value),
            None => self,
        }
    }

    fn page(self, first: Option<u32>, after: Option<&str>) -> Self {
        self.param_opt("first", first.map(|n| n.clamp(1, MAX_PAGE_SIZE).to_string()))
            .param_opt("after", after)
    }

    /// First value of a query parameter
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.query.iter().find(|(k, _)| *k == key).map(|(_, v)| v.as_str())
    }
}

fn required<'a>(value: &'a str, what: &str) -> Result<&'a str, ProviderClientError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ProviderClientError::Validation(format!("{what} is required")));
    }
    Ok(value)
}

fn rfc3339(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub fn top_games(first: Option<u32>, after: Option<&str>) -> HelixRequest {
    HelixRequest::new("games/top").page(first, after)
}

pub fn streams(
    game_id: Option<&str>,
    languages: &[String],
    first: Option<u32>,
    after: Option<&str>,
) -> HelixRequest {
    let mut request = HelixRequest::new("streams").param_opt("game_id", game_id);
    for language in languages {
        request = request.param("language", language.as_str());
    }
    request.page(first, after)
}

pub fn followed_streams(user_id: &str, first: Option<u32>, after: Option<&str>) -> Result<HelixRequest, ProviderClientError> {
    let user_id = required(user_id, "user_id")?;
    Ok(HelixRequest::new("streams/followed").param("user_id", user_id).page(first, after))
}

/// Selects whose videos are listed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoOwner<'a> {
    Game(&'a str),
    User(&'a str),
}

pub fn videos(
    owner: VideoOwner<'_>,
    sort: VideoSort,
    period: VideoPeriod,
    broadcast_type: Option<BroadcastType>,
    language: Option<&str>,
    first: Option<u32>,
    after: Option<&str>,
) -> Result<HelixRequest, ProviderClientError> {
    let request = match owner {
        VideoOwner::Game(id) => HelixRequest::new("videos").param("game_id", required(id, "game_id")?),
        VideoOwner::User(id) => HelixRequest::new("videos").param("user_id", required(id, "user_id")?),
    };
    Ok(request
        .param("sort", sort.helix_value())
        .param("period", period.helix_value())
        .param("type", broadcast_type.map_or("all", |t| t.helix_value()))
        .param_opt("language", language.map(str::to_ascii_lowercase))
        .page(first, after))
}

/// Selects whose clips are listed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipOwner<'a> {
    Game(&'a str),
    Broadcaster(&'a str),
}

/// Clips in `period` ending at `now`; all-time omits the window.
pub fn clips(
    owner: ClipOwner<'_>,
    period: VideoPeriod,
    now: DateTime<Utc>,
    first: Option<u32>,
    after: Option<&str>,
) -> Result<HelixRequest, ProviderClientError> {
    let mut request = match owner {
        ClipOwner::Game(id) => HelixRequest::new("clips").param("game_id", required(id, "game_id")?),
        ClipOwner::Broadcaster(id) => {
            HelixRequest::new("clips").param("broadcaster_id", required(id, "broadcaster_id")?)
        }
    };
    if let Some(window) = period.duration() {
        request = request
            .param("started_at", rfc3339(now - window))
            .param("ended_at", rfc3339(now));
    }
    Ok(request.page(first, after))
}

pub fn search_channels(query: &str, live_only: bool, first: Option<u32>, after: Option<&str>) -> Result<HelixRequest, ProviderClientError> {
    let query = required(query, "query")?;
    let mut request = HelixRequest::new("search/channels").param("query", query);
    if live_only {
        request = request.param("live_only", "true");
    }
    Ok(request.page(first, after))
}

pub fn search_categories(query: &str, first: Option<u32>, after: Option<&str>) -> Result<HelixRequest, ProviderClientError> {
    let query = required(query, "query")?;
    Ok(HelixRequest::new("search/categories").param("query", query).page(first, after))
}

pub fn followed_channels(user_id: &str, first: Option<u32>, after: Option<&str>) -> Result<HelixRequest, ProviderClientError> {
    let user_id = required(user_id, "user_id")?;
    Ok(HelixRequest::new("channels/followed").param("user_id", user_id).page(first, after))
}
