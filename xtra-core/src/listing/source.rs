//! Page sources: one backend's way of turning a logical query into a page

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::debug;
use xtra_media_providers::gql::request as gql;
use xtra_media_providers::helix::request as helix;
use xtra_media_providers::{
    ClipOwner, GqlRequest, GraphClient, HelixRequest, ProviderClientError, RestClient, StreamSort, VideoOwner,
};
use xtra_media_providers::gql::SearchIndex;

use crate::backend::BackendKind;
use crate::credentials::CredentialProvider;
use crate::error::{Error, Result};
use crate::models::{Cursor, DomainRecord, LogicalQuery, Page};
use crate::normalize;

/// A backend the listing engine can fetch pages from.
///
/// `cursor` is always one this same source produced for the same query.
#[async_trait]
pub trait PageSource: Send + Sync {
    fn kind(&self) -> BackendKind;

    async fn fetch(&self, query: &LogicalQuery, cursor: Option<&Cursor>, page_size: u32) -> Result<Page<DomainRecord>>;
}

fn unsupported(backend: BackendKind, query: &LogicalQuery) -> Error {
    Error::Unsupported {
        backend,
        query: query.describe(),
    }
}

/// Persisted-query GraphQL source
pub struct GqlSource {
    client: Arc<dyn GraphClient>,
    credentials: Arc<dyn CredentialProvider>,
}

impl GqlSource {
    pub fn new(client: Arc<dyn GraphClient>, credentials: Arc<dyn CredentialProvider>) -> Self {
        Self { client, credentials }
    }

    /// Build the request for one page of `query`.
    ///
    /// Games and channels must be known by name/login here.
    pub fn build_request(query: &LogicalQuery, cursor: Option<&str>, limit: u32) -> Result<GqlRequest> {
        let no_name = || unsupported(BackendKind::Gql, query);
        let limit = Some(limit);
        let request = match query {
            LogicalQuery::TopGames { tags } => gql::top_games(tags, limit, cursor),
            LogicalQuery::TopStreams { tags } => gql::top_streams(tags, limit, cursor),
            LogicalQuery::GameStreams { game, sort, tags } => {
                gql::game_streams(game.name().ok_or_else(no_name)?, *sort, tags, limit, cursor)
            }
            LogicalQuery::GameVideos { game, sort, broadcast_type, .. } => {
                gql::game_videos(game.name().ok_or_else(no_name)?, *broadcast_type, *sort, limit, cursor)
            }
            LogicalQuery::GameClips { game, period } => {
                gql::game_clips(game.name().ok_or_else(no_name)?, *period, limit, cursor)
            }
            LogicalQuery::ChannelVideos { channel, sort, broadcast_type, .. } => {
                gql::channel_videos(channel.login().ok_or_else(no_name)?, *broadcast_type, *sort, limit, cursor)
            }
            LogicalQuery::ChannelClips { channel, period } => {
                gql::channel_clips(channel.login().ok_or_else(no_name)?, *period, limit, cursor)
            }
            LogicalQuery::SearchChannels { query } => gql::search(SearchIndex::Channel, query, cursor),
            LogicalQuery::SearchGames { query } => gql::search(SearchIndex::Game, query, cursor),
            LogicalQuery::SearchVideos { query } => gql::search(SearchIndex::Vod, query, cursor),
            LogicalQuery::FollowedStreams { .. } => gql::followed_streams(limit, cursor),
            LogicalQuery::FollowedVideos => gql::followed_videos(limit, cursor),
            LogicalQuery::FollowedChannels { .. } => gql::followed_channels(limit, cursor),
            LogicalQuery::FollowedGames => gql::followed_games(limit),
        };
        request.map_err(|e| Error::from_provider(BackendKind::Gql, e))
    }
}

#[async_trait]
impl PageSource for GqlSource {
    fn kind(&self) -> BackendKind {
        BackendKind::Gql
    }

    async fn fetch(&self, query: &LogicalQuery, cursor: Option<&Cursor>, page_size: u32) -> Result<Page<DomainRecord>> {
        let request = Self::build_request(query, cursor.map(Cursor::as_str), page_size)?;
        let credentials = self.credentials.credentials(BackendKind::Gql);
        debug!(
            backend = %BackendKind::Gql,
            operation = request.operation_name,
            has_cursor = cursor.is_some(),
            "Sending persisted query"
        );
        let data = self
            .client
            .send(&request, &credentials)
            .await
            .map_err(|e| Error::from_provider(BackendKind::Gql, e))?;
        normalize::gql::normalize(query, data).map_err(|e| Error::from_provider(BackendKind::Gql, e))
    }
}

/// Helix REST source
pub struct HelixSource {
    client: Arc<dyn RestClient>,
    credentials: Arc<dyn CredentialProvider>,
}

impl HelixSource {
    pub fn new(client: Arc<dyn RestClient>, credentials: Arc<dyn CredentialProvider>) -> Self {
        Self { client, credentials }
    }

    /// Build the request for one page of `query`.
    ///
    /// Helix addresses games and channels by id, cannot filter the
    /// directory by tag and only sorts streams by viewers. Clip windows
    /// end at `now`.
    pub fn build_request(
        query: &LogicalQuery,
        cursor: Option<&str>,
        first: u32,
        now: DateTime<Utc>,
    ) -> Result<HelixRequest> {
        let cannot = || unsupported(BackendKind::Helix, query);
        let first = Some(first);
        let request: std::result::Result<HelixRequest, ProviderClientError> = match query {
            LogicalQuery::TopGames { tags } if tags.is_empty() => Ok(helix::top_games(first, cursor)),
            LogicalQuery::TopStreams { tags } if tags.is_empty() => Ok(helix::streams(None, &[], first, cursor)),
            LogicalQuery::GameStreams { game, sort: StreamSort::ViewerCount, tags } if tags.is_empty() => {
                Ok(helix::streams(Some(game.id().ok_or_else(cannot)?), &[], first, cursor))
            }
            LogicalQuery::GameVideos { game, sort, period, broadcast_type, language } => helix::videos(
                VideoOwner::Game(game.id().ok_or_else(cannot)?),
                *sort,
                *period,
                *broadcast_type,
                language.as_deref(),
                first,
                cursor,
            ),
            LogicalQuery::GameClips { game, period } => helix::clips(
                ClipOwner::Game(game.id().ok_or_else(cannot)?),
                *period,
                now,
                first,
                cursor,
            ),
            LogicalQuery::ChannelVideos { channel, sort, period, broadcast_type } => helix::videos(
                VideoOwner::User(channel.id().ok_or_else(cannot)?),
                *sort,
                *period,
                *broadcast_type,
                None,
                first,
                cursor,
            ),
            LogicalQuery::ChannelClips { channel, period } => helix::clips(
                ClipOwner::Broadcaster(channel.id().ok_or_else(cannot)?),
                *period,
                now,
                first,
                cursor,
            ),
            LogicalQuery::SearchChannels { query } => helix::search_channels(query, false, first, cursor),
            LogicalQuery::SearchGames { query } => helix::search_categories(query, first, cursor),
            LogicalQuery::FollowedStreams { user_id } => {
                helix::followed_streams(user_id.as_deref().ok_or_else(cannot)?, first, cursor)
            }
            LogicalQuery::FollowedChannels { user_id } => {
                helix::followed_channels(user_id.as_deref().ok_or_else(cannot)?, first, cursor)
            }
            LogicalQuery::TopGames { .. }
            | LogicalQuery::TopStreams { .. }
            | LogicalQuery::GameStreams { .. }
            | LogicalQuery::SearchVideos { .. }
            | LogicalQuery::FollowedVideos
            | LogicalQuery::FollowedGames => return Err(cannot()),
        };
        request.map_err(|e| match e {
            // a blank user id is a missing capability, not bad input
            ProviderClientError::Validation(_)
                if matches!(query, LogicalQuery::FollowedStreams { .. } | LogicalQuery::FollowedChannels { .. }) =>
            {
                cannot()
            }
            e => Error::from_provider(BackendKind::Helix, e),
        })
    }
}

#[async_trait]
impl PageSource for HelixSource {
    fn kind(&self) -> BackendKind {
        BackendKind::Helix
    }

    async fn fetch(&self, query: &LogicalQuery, cursor: Option<&Cursor>, page_size: u32) -> Result<Page<DomainRecord>> {
        let windowed = is_clip_query(query);
        let (now, after) = match cursor.map(Cursor::as_str) {
            Some(token) if windowed => match split_window_cursor(token) {
                Some((anchor, after)) => (anchor, Some(after)),
                None => (Utc::now(), Some(token)),
            },
            after => (Utc::now(), after),
        };
        let request = Self::build_request(query, after, page_size, now)?;
        let credentials = self.credentials.credentials(BackendKind::Helix);
        debug!(
            backend = %BackendKind::Helix,
            path = request.path,
            has_cursor = cursor.is_some(),
            "Sending Helix request"
        );
        let body = self
            .client
            .send(&request, &credentials)
            .await
            .map_err(|e| Error::from_provider(BackendKind::Helix, e))?;
        let mut page =
            normalize::helix::normalize(query, body).map_err(|e| Error::from_provider(BackendKind::Helix, e))?;
        if windowed {
            page.cursor = page.cursor.and_then(|after| join_window_cursor(now, after.as_str()));
        }
        Ok(page)
    }
}

fn is_clip_query(query: &LogicalQuery) -> bool {
    matches!(query, LogicalQuery::GameClips { .. } | LogicalQuery::ChannelClips { .. })
}

// Helix only honors `after` for the exact window that issued it, so clip
// cursors carry the window end as `<unix seconds>|<upstream cursor>`.
const WINDOW_SEPARATOR: char = '|';

fn join_window_cursor(now: DateTime<Utc>, after: &str) -> Option<Cursor> {
    Cursor::new(format!("{}{WINDOW_SEPARATOR}{after}", now.timestamp()))
}

fn split_window_cursor(token: &str) -> Option<(DateTime<Utc>, &str)> {
    let (secs, after) = token.split_once(WINDOW_SEPARATOR)?;
    let anchor = DateTime::from_timestamp(secs.parse().ok()?, 0)?;
    Some((anchor, after))
}
