//! Helix → domain records

use serde::de::DeserializeOwned;
use serde_json::Value;
use xtra_media_providers::helix::types::{
    HelixChannel, HelixClip, HelixFollowedChannel, HelixGame, HelixPage, HelixStream, HelixVideo,
};
use xtra_media_providers::{BroadcastType, ProviderClientError};

use super::{collect, non_blank, page};
use crate::backend::BackendKind;
use crate::models::{Channel, Clip, DomainRecord, Game, LogicalQuery, Page, Stream, Video};

const BACKEND: BackendKind = BackendKind::Helix;

/// Normalize a Helix response body for `query`.
///
/// Queries Helix has no endpoint for never reach this point; the source
/// rejects them before dispatch.
pub fn normalize(query: &LogicalQuery, body: Value) -> Result<Page<DomainRecord>, ProviderClientError> {
    match query {
        LogicalQuery::TopGames { .. } | LogicalQuery::SearchGames { .. } => list::<HelixGame, _>(body, game),
        LogicalQuery::TopStreams { .. } | LogicalQuery::GameStreams { .. } | LogicalQuery::FollowedStreams { .. } => {
            list::<HelixStream, _>(body, stream)
        }
        LogicalQuery::GameVideos { .. } | LogicalQuery::ChannelVideos { .. } => list::<HelixVideo, _>(body, video),
        LogicalQuery::GameClips { .. } | LogicalQuery::ChannelClips { .. } => list::<HelixClip, _>(body, clip),
        LogicalQuery::SearchChannels { .. } => list::<HelixChannel, _>(body, search_channel),
        LogicalQuery::FollowedChannels { .. } => list::<HelixFollowedChannel, _>(body, followed_channel),
        LogicalQuery::SearchVideos { .. } | LogicalQuery::FollowedVideos | LogicalQuery::FollowedGames => Err(
            ProviderClientError::Malformed(format!("no Helix response shape for {}", query.describe())),
        ),
    }
}

fn list<T, R>(body: Value, f: impl FnMut(T) -> Option<R>) -> Result<Page<DomainRecord>, ProviderClientError>
where
    T: DeserializeOwned,
    R: Into<DomainRecord>,
{
    let raw: HelixPage<T> = serde_json::from_value(body)?;
    let cursor = raw.cursor().map(str::to_string);
    let has_more = cursor.is_some();
    Ok(page(BACKEND, collect(raw.data, f), cursor.as_deref(), has_more))
}

/// Parse Helix durations such as `"1h2m3s"`, `"45m"` or `"12s"`.
///
/// Values that overflow `u64` seconds are `None`.
#[must_use]
pub fn parse_duration(value: &str) -> Option<u64> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    let mut total = 0u64;
    let mut digits = String::new();
    for ch in value.chars() {
        if ch.is_ascii_digit() {
            digits.push(ch);
            continue;
        }
        let amount: u64 = digits.parse().ok()?;
        digits.clear();
        let unit = match ch {
            'h' => 3600,
            'm' => 60,
            's' => 1,
            _ => return None,
        };
        total = total.checked_add(amount.checked_mul(unit)?)?;
    }
    digits.is_empty().then_some(total)
}

fn game(g: HelixGame) -> Option<Game> {
    Some(Game {
        id: non_blank(g.id),
        name: non_blank(g.name)?,
        box_art_url: g.box_art_url,
        viewer_count: None,
        broadcaster_count: None,
        tags: Vec::new(),
    })
}

fn stream(s: HelixStream) -> Option<Stream> {
    Some(Stream {
        channel_login: non_blank(s.user_login)?,
        id: non_blank(s.id),
        channel_id: s.user_id,
        channel_name: s.user_name,
        game_id: non_blank(s.game_id),
        game_name: non_blank(s.game_name),
        title: s.title,
        viewer_count: s.viewer_count,
        started_at: s.started_at,
        language: s.language,
        thumbnail_url: s.thumbnail_url,
        profile_image_url: None,
        tags: s.tags,
    })
}

fn video(v: HelixVideo) -> Option<Video> {
    Some(Video {
        id: non_blank(v.id)?,
        channel_id: v.user_id,
        channel_login: v.user_login,
        channel_name: v.user_name,
        title: v.title,
        view_count: v.view_count,
        created_at: v.published_at.or(v.created_at),
        duration_seconds: v.duration.as_deref().and_then(parse_duration),
        thumbnail_url: non_blank(v.thumbnail_url),
        broadcast_type: v.video_type.as_deref().and_then(BroadcastType::parse),
        game_id: None,
        game_name: None,
    })
}

fn clip(c: HelixClip) -> Option<Clip> {
    Some(Clip {
        id: non_blank(c.id)?,
        channel_id: c.broadcaster_id,
        channel_login: None,
        channel_name: c.broadcaster_name,
        title: c.title,
        view_count: c.view_count,
        created_at: c.created_at,
        duration_seconds: c.duration,
        thumbnail_url: c.thumbnail_url,
        video_id: non_blank(c.video_id),
        video_offset_seconds: c.vod_offset,
        game_id: non_blank(c.game_id),
        game_name: None,
    })
}

fn search_channel(c: HelixChannel) -> Option<Channel> {
    Some(Channel {
        login: non_blank(c.broadcaster_login)?,
        id: non_blank(c.id),
        display_name: c.display_name,
        profile_image_url: c.thumbnail_url,
        followers: None,
        is_live: c.is_live,
        followed_at: None,
    })
}

fn followed_channel(c: HelixFollowedChannel) -> Option<Channel> {
    Some(Channel {
        login: non_blank(c.broadcaster_login)?,
        id: non_blank(c.broadcaster_id),
        display_name: c.broadcaster_name,
        profile_image_url: None,
        followers: None,
        is_live: None,
        followed_at: c.followed_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ChannelRef;
    use serde_json::json;
    use xtra_media_providers::{VideoPeriod, VideoSort};

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("1h2m3s"), Some(3723));
        assert_eq!(parse_duration("45m"), Some(2700));
        assert_eq!(parse_duration("12s"), Some(12));
        assert_eq!(parse_duration(""), None);
        assert_eq!(parse_duration("12"), None);
        assert_eq!(parse_duration("1x"), None);
        assert_eq!(parse_duration("9999999999999999h"), None);
        assert_eq!(parse_duration("18446744073709551615s1s"), None);
        assert_eq!(parse_duration("99999999999999999999s"), None);
    }

    #[test]
    fn test_oversized_duration_is_absent() {
        let query = LogicalQuery::ChannelVideos {
            channel: ChannelRef::by_id("1"),
            sort: VideoSort::Time,
            period: VideoPeriod::All,
            broadcast_type: None,
        };
        let body = json!({"data": [{"id": "v1", "duration": "9999999999999999h"}]});
        let page = normalize(&query, body).unwrap();
        let DomainRecord::Video(v) = &page.items[0] else { panic!("expected video") };
        assert_eq!(v.duration_seconds, None);
    }

    #[test]
    fn test_videos_page() {
        let query = LogicalQuery::ChannelVideos {
            channel: ChannelRef::by_id("1"),
            sort: VideoSort::Time,
            period: VideoPeriod::All,
            broadcast_type: None,
        };
        let body = json!({
            "data": [
                {"id": "v1", "user_login": "a", "duration": "1h0m0s", "type": "highlight", "view_count": 3},
                {"user_login": "b"}
            ],
            "pagination": {"cursor": "eyJiIjpudWxsfQ"}
        });
        let page = normalize(&query, body).unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.skipped, 1);
        assert!(page.has_more);
        let DomainRecord::Video(v) = &page.items[0] else { panic!("expected video") };
        assert_eq!(v.duration_seconds, Some(3600));
        assert_eq!(v.broadcast_type, Some(BroadcastType::Highlight));
    }

    #[test]
    fn test_missing_pagination_ends_listing() {
        let body = json!({"data": [{"id": "1", "name": "Chess"}]});
        let page = normalize(&LogicalQuery::TopGames { tags: vec![] }, body).unwrap();
        assert!(!page.has_more);
        assert!(page.cursor.is_none());
        let DomainRecord::Game(g) = &page.items[0] else { panic!("expected game") };
        assert_eq!(g.viewer_count, None);
    }

    #[test]
    fn test_followed_channels() {
        let body = json!({"data": [
            {"broadcaster_id": "1", "broadcaster_login": "a", "followed_at": "2024-01-01T00:00:00Z"}
        ]});
        let page = normalize(&LogicalQuery::FollowedChannels { user_id: Some("9".into()) }, body).unwrap();
        let DomainRecord::Channel(c) = &page.items[0] else { panic!("expected channel") };
        assert_eq!(c.login, "a");
        assert!(c.followed_at.is_some());
    }
}
