//! GraphQL request builders
//!
//! Pure functions: typed parameters in, persisted-query envelope out.
//! Absent optional variables are omitted unless an operation's contract
//! says otherwise (see `playback_access_token` and the tag searches, which
//! send `""`).

use serde::Serialize;
use serde_json::{Map, Value, json};

use super::operation::Operation;
use crate::error::ProviderClientError;
use crate::filters::{BroadcastType, StreamSort, VideoPeriod, VideoSort};

/// `extensions.persistedQuery` block
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PersistedQuery {
    pub version: u8,
    #[serde(rename = "sha256Hash")]
    pub sha256_hash: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Extensions {
    #[serde(rename = "persistedQuery")]
    pub persisted_query: PersistedQuery,
}

/// A persisted-query request ready to be sent
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GqlRequest {
    #[serde(rename = "operationName")]
    pub operation_name: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variables: Option<Map<String, Value>>,
    pub extensions: Extensions,
    #[serde(skip)]
    pub operation: Operation,
    /// Sent as a one-element JSON array instead of a bare object
    #[serde(skip)]
    pub batched: bool,
}

impl GqlRequest {
    /// Build and validate the envelope for `operation`.
    pub fn new(operation: Operation, variables: Option<Map<String, Value>>) -> Result<Self, ProviderClientError> {
        operation.validate(variables.as_ref())?;
        Ok(Self {
            operation_name: operation.name(),
            variables,
            extensions: Extensions {
                persisted_query: PersistedQuery {
                    version: 1,
                    sha256_hash: operation.sha256_hash(),
                },
            },
            operation,
            batched: false,
        })
    }

    #[must_use]
    pub const fn is_mutating(&self) -> bool {
        self.operation.is_mutating()
    }

    /// JSON body as it goes on the wire
    pub fn body(&self) -> Result<Value, ProviderClientError> {
        let envelope = serde_json::to_value(self)?;
        Ok(if self.batched { Value::Array(vec![envelope]) } else { envelope })
    }
}

/// Small helper over `serde_json::Map` for the omit-vs-empty rules.
#[derive(Default)]
struct Vars(Map<String, Value>);

impl Vars {
    fn new() -> Self {
        Self::default()
    }

    fn put(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.0.insert(key.to_string(), value.into());
        self
    }

    /// Omitted when `None`
    fn put_opt<V: Into<Value>>(mut self, key: &str, value: Option<V>) -> Self {
        if let Some(value) = value {
            self.0.insert(key.to_string(), value.into());
        }
        self
    }

    /// `""` when `None`
    fn put_or_empty(mut self, key: &str, value: Option<&str>) -> Self {
        self.0.insert(key.to_string(), Value::from(value.unwrap_or("")));
        self
    }

    fn build(self) -> Option<Map<String, Value>> {
        Some(self.0)
    }

    fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

fn tags_array(tags: &[String]) -> Value {
    Value::Array(tags.iter().cloned().map(Value::from).collect())
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

// ========== Playback ==========

pub fn playback_access_token(
    login: Option<&str>,
    vod_id: Option<&str>,
    player_type: Option<&str>,
) -> Result<GqlRequest, ProviderClientError> {
    let login = non_blank(login);
    let vod_id = non_blank(vod_id);
    if login.is_none() && vod_id.is_none() {
        return Err(ProviderClientError::Validation(
            "PlaybackAccessToken requires a channel login or a video id".to_string(),
        ));
    }
    let vars = Vars::new()
        .put("isLive", login.is_some())
        .put_or_empty("login", login)
        .put("isVod", vod_id.is_some())
        .put_or_empty("vodID", vod_id)
        .put_opt("playerType", player_type);
    GqlRequest::new(Operation::PlaybackAccessToken, vars.build())
}

pub fn clip_access_token(slug: &str) -> Result<GqlRequest, ProviderClientError> {
    GqlRequest::new(Operation::ClipAccessToken, Vars::new().put("slug", slug).build())
}

pub fn clip_data(slug: &str) -> Result<GqlRequest, ProviderClientError> {
    GqlRequest::new(Operation::ChannelClipCore, Vars::new().put("clipSlug", slug).build())
}

pub fn clip_video(slug: &str) -> Result<GqlRequest, ProviderClientError> {
    GqlRequest::new(Operation::ChatClip, Vars::new().put("clipSlug", slug).build())
}

// ========== Directory listings ==========

pub fn top_games(tags: &[String], limit: Option<u32>, cursor: Option<&str>) -> Result<GqlRequest, ProviderClientError> {
    let vars = Vars::new()
        .put_opt("cursor", cursor)
        .put_opt("limit", limit)
        .put("options", json!({
            "sort": "VIEWER_COUNT",
            "tags": tags_array(tags),
        }));
    GqlRequest::new(Operation::TopGames, vars.build())
}

pub fn top_streams(tags: &[String], limit: Option<u32>, cursor: Option<&str>) -> Result<GqlRequest, ProviderClientError> {
    let vars = Vars::new()
        .put_opt("cursor", cursor)
        .put_opt("limit", limit)
        .put("platformType", "all")
        .put("sortTypeIsRecency", false)
        .put("options", json!({
            "freeformTags": tags_array(tags),
            "sort": StreamSort::ViewerCount.gql_value(),
        }));
    GqlRequest::new(Operation::TopStreams, vars.build())
}

pub fn game_streams(
    game_name: &str,
    sort: StreamSort,
    tags: &[String],
    limit: Option<u32>,
    cursor: Option<&str>,
) -> Result<GqlRequest, ProviderClientError> {
    let vars = Vars::new()
        .put_opt("cursor", cursor)
        .put_opt("limit", limit)
        .put("name", game_name)
        .put("sortTypeIsRecency", false)
        .put("options", json!({
            "freeformTags": tags_array(tags),
            "sort": sort.gql_value(),
        }));
    GqlRequest::new(Operation::GameStreams, vars.build())
}

pub fn game_videos(
    game_name: &str,
    broadcast_type: Option<BroadcastType>,
    sort: VideoSort,
    limit: Option<u32>,
    cursor: Option<&str>,
) -> Result<GqlRequest, ProviderClientError> {
    let vars = Vars::new()
        .put_opt("broadcastTypes", broadcast_type.map(|t| t.gql_value()))
        .put_opt("followedCursor", cursor)
        .put("gameName", game_name)
        .put_opt("videoLimit", limit)
        .put("videoSort", sort.gql_value());
    GqlRequest::new(Operation::GameVideos, vars.build())
}

pub fn game_clips(
    game_name: &str,
    period: VideoPeriod,
    limit: Option<u32>,
    cursor: Option<&str>,
) -> Result<GqlRequest, ProviderClientError> {
    let vars = Vars::new()
        .put("criteria", json!({ "filter": period.gql_clip_filter() }))
        .put_opt("cursor", cursor)
        .put("gameName", game_name)
        .put_opt("limit", limit);
    GqlRequest::new(Operation::GameClips, vars.build())
}

pub fn channel_videos(
    channel_login: &str,
    broadcast_type: Option<BroadcastType>,
    sort: VideoSort,
    limit: Option<u32>,
    cursor: Option<&str>,
) -> Result<GqlRequest, ProviderClientError> {
    let vars = Vars::new()
        .put_opt("broadcastType", broadcast_type.map(|t| t.gql_value()))
        .put_opt("cursor", cursor)
        .put("channelOwnerLogin", channel_login)
        .put_opt("limit", limit)
        .put("videoSort", sort.gql_value());
    GqlRequest::new(Operation::ChannelVideos, vars.build())
}

pub fn channel_clips(
    channel_login: &str,
    period: VideoPeriod,
    limit: Option<u32>,
    cursor: Option<&str>,
) -> Result<GqlRequest, ProviderClientError> {
    let vars = Vars::new()
        .put("criteria", json!({ "filter": period.gql_clip_filter() }))
        .put_opt("cursor", cursor)
        .put("login", channel_login)
        .put_opt("limit", limit);
    GqlRequest::new(Operation::ChannelClips, vars.build())
}

pub fn channel_viewer_list(channel_login: &str) -> Result<GqlRequest, ProviderClientError> {
    GqlRequest::new(Operation::ChatViewers, Vars::new().put("channelLogin", channel_login).build())
}

// ========== Search ==========

/// Index searched by `SearchResultsPage_SearchResults`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchIndex {
    Channel,
    Game,
    Vod,
}

impl SearchIndex {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Channel => "CHANNEL",
            Self::Game => "GAME",
            Self::Vod => "VOD",
        }
    }
}

pub fn search(index: SearchIndex, query: &str, cursor: Option<&str>) -> Result<GqlRequest, ProviderClientError> {
    let target = Vars::new().put_opt("cursor", cursor).put("index", index.as_str());
    let vars = Vars::new()
        .put("options", json!({ "targets": [target.into_value()] }))
        .put("query", query);
    GqlRequest::new(Operation::SearchResults, vars.build())
}

pub fn search_freeform_tags(query: Option<&str>) -> Result<GqlRequest, ProviderClientError> {
    let vars = Vars::new().put("first", 100).put_or_empty("userQuery", query);
    GqlRequest::new(Operation::SearchFreeformTags, vars.build())
}

pub fn search_category_tags(query: Option<&str>) -> Result<GqlRequest, ProviderClientError> {
    let vars = Vars::new().put("limit", 100).put_or_empty("userQuery", query);
    GqlRequest::new(Operation::SearchCategoryTags, vars.build())
}

// ========== Chat ==========

pub fn chat_badges(channel_login: &str) -> Result<GqlRequest, ProviderClientError> {
    GqlRequest::new(Operation::ChatBadges, Vars::new().put("channelLogin", channel_login).build())
}

/// The global bits catalogue takes no variables at all
pub fn global_cheer_config() -> Result<GqlRequest, ProviderClientError> {
    GqlRequest::new(Operation::GlobalCheerConfig, None)
}

pub fn channel_cheer_config(channel_login: &str) -> Result<GqlRequest, ProviderClientError> {
    GqlRequest::new(Operation::ChannelCheerConfig, Vars::new().put("login", channel_login).build())
}

pub fn video_comments(
    video_id: &str,
    offset_seconds: Option<u32>,
    cursor: Option<&str>,
) -> Result<GqlRequest, ProviderClientError> {
    let vars = Vars::new()
        .put_opt("cursor", cursor)
        .put_opt("contentOffsetSeconds", offset_seconds)
        .put("videoID", video_id);
    GqlRequest::new(Operation::VideoComments, vars.build())
}

pub fn video_chapters(video_id: &str) -> Result<GqlRequest, ProviderClientError> {
    GqlRequest::new(Operation::VideoChapters, Vars::new().put("videoID", video_id).build())
}

pub fn viewer_count(channel_login: &str) -> Result<GqlRequest, ProviderClientError> {
    GqlRequest::new(Operation::ViewerCount, Vars::new().put("channelLogin", channel_login).build())
}

pub fn emote_card(emote_id: &str) -> Result<GqlRequest, ProviderClientError> {
    let vars = Vars::new()
        .put("emoteID", emote_id)
        .put("octaneEnabled", true)
        .put("artistEnabled", true);
    GqlRequest::new(Operation::EmoteCard, vars.build())
}

pub fn user_emotes(channel_id: &str) -> Result<GqlRequest, ProviderClientError> {
    let vars = Vars::new().put("channelID", channel_id).put("withOwner", true);
    GqlRequest::new(Operation::UserEmotes, vars.build())
}

pub fn channel_panels(channel_id: &str) -> Result<GqlRequest, ProviderClientError> {
    let mut request = GqlRequest::new(Operation::ChannelPanels, Vars::new().put("id", channel_id).build())?;
    request.batched = true;
    Ok(request)
}

// ========== Followed (current user) ==========

pub fn followed_streams(limit: Option<u32>, cursor: Option<&str>) -> Result<GqlRequest, ProviderClientError> {
    let vars = Vars::new().put_opt("cursor", cursor).put_opt("limit", limit);
    GqlRequest::new(Operation::FollowedStreams, vars.build())
}

pub fn followed_videos(limit: Option<u32>, cursor: Option<&str>) -> Result<GqlRequest, ProviderClientError> {
    let vars = Vars::new().put_opt("cursor", cursor).put_opt("limit", limit);
    GqlRequest::new(Operation::FollowedVideos, vars.build())
}

pub fn followed_channels(limit: Option<u32>, cursor: Option<&str>) -> Result<GqlRequest, ProviderClientError> {
    let vars = Vars::new()
        .put_opt("cursor", cursor)
        .put_opt("limit", limit)
        .put("order", "DESC");
    GqlRequest::new(Operation::FollowedChannels, vars.build())
}

pub fn followed_games(limit: Option<u32>) -> Result<GqlRequest, ProviderClientError> {
    let vars = Vars::new().put_opt("limit", limit).put("type", "ALL");
    GqlRequest::new(Operation::FollowedGames, vars.build())
}

pub fn following_user(channel_login: &str) -> Result<GqlRequest, ProviderClientError> {
    GqlRequest::new(Operation::FollowingUser, Vars::new().put("channelLogin", channel_login).build())
}

pub fn following_game(game_name: &str) -> Result<GqlRequest, ProviderClientError> {
    GqlRequest::new(Operation::FollowingGame, Vars::new().put("name", game_name).build())
}

pub fn channel_points_context(channel_login: &str) -> Result<GqlRequest, ProviderClientError> {
    GqlRequest::new(Operation::ChannelPointsContext, Vars::new().put("channelLogin", channel_login).build())
}

// ========== Moderation lists ==========

pub fn moderators(channel_login: &str) -> Result<GqlRequest, ProviderClientError> {
    GqlRequest::new(Operation::Moderators, Vars::new().put("login", channel_login).build())
}

pub fn vips(channel_login: &str) -> Result<GqlRequest, ProviderClientError> {
    GqlRequest::new(Operation::Vips, Vars::new().put("login", channel_login).build())
}

// ========== Mutations ==========

fn mutation(operation: Operation, input: Vars) -> Result<GqlRequest, ProviderClientError> {
    GqlRequest::new(operation, Vars::new().put("input", input.into_value()).build())
}

pub fn follow_user(user_id: &str) -> Result<GqlRequest, ProviderClientError> {
    mutation(
        Operation::FollowUser,
        Vars::new().put("disableNotifications", false).put("targetID", user_id),
    )
}

pub fn unfollow_user(user_id: &str) -> Result<GqlRequest, ProviderClientError> {
    mutation(Operation::UnfollowUser, Vars::new().put("targetID", user_id))
}

pub fn follow_game(game_id: &str) -> Result<GqlRequest, ProviderClientError> {
    mutation(Operation::FollowGame, Vars::new().put("gameID", game_id))
}

pub fn unfollow_game(game_id: &str) -> Result<GqlRequest, ProviderClientError> {
    mutation(Operation::UnfollowGame, Vars::new().put("gameID", game_id))
}

pub fn claim_points(channel_id: &str, claim_id: &str) -> Result<GqlRequest, ProviderClientError> {
    mutation(
        Operation::ClaimPoints,
        Vars::new().put("channelID", channel_id).put("claimID", claim_id),
    )
}

pub fn join_raid(raid_id: &str) -> Result<GqlRequest, ProviderClientError> {
    mutation(Operation::JoinRaid, Vars::new().put("raidID", raid_id))
}

pub fn send_announcement(channel_id: &str, message: &str, color: Option<&str>) -> Result<GqlRequest, ProviderClientError> {
    mutation(
        Operation::SendAnnouncement,
        Vars::new()
            .put("channelID", channel_id)
            .put("message", message)
            .put_opt("color", color),
    )
}

pub fn ban_user(
    channel_id: &str,
    target_login: &str,
    duration: Option<&str>,
    reason: Option<&str>,
) -> Result<GqlRequest, ProviderClientError> {
    mutation(
        Operation::BanUser,
        Vars::new()
            .put("channelID", channel_id)
            .put("bannedUserLogin", target_login)
            .put_opt("expiresIn", duration)
            .put_opt("reason", reason),
    )
}

pub fn unban_user(channel_id: &str, target_login: &str) -> Result<GqlRequest, ProviderClientError> {
    mutation(
        Operation::UnbanUser,
        Vars::new().put("channelID", channel_id).put("bannedUserLogin", target_login),
    )
}

pub fn update_chat_color(color: &str) -> Result<GqlRequest, ProviderClientError> {
    mutation(Operation::UpdateChatColor, Vars::new().put("color", color))
}

pub fn create_stream_marker(channel_login: &str) -> Result<GqlRequest, ProviderClientError> {
    GqlRequest::new(
        Operation::CreateStreamMarker,
        Vars::new().put("channelLogin", channel_login).build(),
    )
}

pub fn add_moderator(channel_id: &str, target_login: &str) -> Result<GqlRequest, ProviderClientError> {
    mutation(
        Operation::AddModerator,
        Vars::new().put("channelID", channel_id).put("targetLogin", target_login),
    )
}

pub fn remove_moderator(channel_id: &str, target_login: &str) -> Result<GqlRequest, ProviderClientError> {
    mutation(
        Operation::RemoveModerator,
        Vars::new().put("channelID", channel_id).put("targetLogin", target_login),
    )
}

pub fn start_raid(channel_id: &str, target_id: &str) -> Result<GqlRequest, ProviderClientError> {
    mutation(
        Operation::StartRaid,
        Vars::new().put("sourceID", channel_id).put("targetID", target_id),
    )
}

pub fn cancel_raid(channel_id: &str) -> Result<GqlRequest, ProviderClientError> {
    mutation(Operation::CancelRaid, Vars::new().put("sourceID", channel_id))
}

pub fn add_vip(channel_id: &str, target_login: &str) -> Result<GqlRequest, ProviderClientError> {
    mutation(
        Operation::AddVip,
        Vars::new().put("channelID", channel_id).put("granteeLogin", target_login),
    )
}

pub fn remove_vip(channel_id: &str, target_login: &str) -> Result<GqlRequest, ProviderClientError> {
    mutation(
        Operation::RemoveVip,
        Vars::new().put("channelID", channel_id).put("revokeeLogin", target_login),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_shape() {
        let request = channel_videos("shroud", Some(BroadcastType::Archive), VideoSort::Time, Some(30), None).unwrap();
        let body = request.body().unwrap();
        assert_eq!(
            body,
            json!({
                "operationName": "FilterableVideoTower_Videos",
                "variables": {
                    "broadcastType": "ARCHIVE",
                    "channelOwnerLogin": "shroud",
                    "limit": 30,
                    "videoSort": "TIME",
                },
                "extensions": {
                    "persistedQuery": {
                        "version": 1,
                        "sha256Hash": "a937f1d22e269e39a03b509f65a7490f9fc247d7f83d6ac1421523e3b68042cb",
                    }
                }
            })
        );
    }

    #[test]
    fn test_missing_channel_is_validation_error() {
        let err = channel_videos("", None, VideoSort::Views, None, None).unwrap_err();
        assert!(err.is_validation());
        let err = channel_clips("   ", VideoPeriod::Week, None, None).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_playback_access_token_uses_empty_strings() {
        let request = playback_access_token(Some("shroud"), None, None).unwrap();
        let vars = request.variables.unwrap();
        assert_eq!(vars["isLive"], json!(true));
        assert_eq!(vars["login"], json!("shroud"));
        assert_eq!(vars["isVod"], json!(false));
        assert_eq!(vars["vodID"], json!(""));
        assert!(!vars.contains_key("playerType"));
    }

    #[test]
    fn test_playback_access_token_requires_one_id() {
        assert!(playback_access_token(None, Some(" "), Some("site")).unwrap_err().is_validation());
    }

    #[test]
    fn test_tag_search_sends_empty_query() {
        let vars = search_freeform_tags(None).unwrap().variables.unwrap();
        assert_eq!(vars["userQuery"], json!(""));
        assert_eq!(vars["first"], json!(100));
        let vars = search_category_tags(Some("rpg")).unwrap().variables.unwrap();
        assert_eq!(vars["userQuery"], json!("rpg"));
        assert_eq!(vars["limit"], json!(100));
    }

    #[test]
    fn test_game_videos_omits_absent_broadcast_type() {
        let vars = game_videos("Just Chatting", None, VideoSort::Views, Some(10), Some("abc"))
            .unwrap()
            .variables
            .unwrap();
        assert!(!vars.contains_key("broadcastTypes"));
        assert_eq!(vars["followedCursor"], json!("abc"));
        assert_eq!(vars["videoSort"], json!("VIEWS"));
    }

    #[test]
    fn test_cursor_omitted_on_first_page() {
        let vars = top_streams(&[], Some(30), None).unwrap().variables.unwrap();
        assert!(!vars.contains_key("cursor"));
        assert_eq!(vars["platformType"], json!("all"));
        assert_eq!(vars["options"]["sort"], json!("VIEWER_COUNT"));
    }

    #[test]
    fn test_search_target() {
        let vars = search(SearchIndex::Vod, "speedrun", Some("c1")).unwrap().variables.unwrap();
        assert_eq!(vars["options"]["targets"][0], json!({"cursor": "c1", "index": "VOD"}));
        assert!(search(SearchIndex::Game, "", None).is_err());
    }

    #[test]
    fn test_global_cheer_config_has_no_variables() {
        let body = global_cheer_config().unwrap().body().unwrap();
        assert!(body.get("variables").is_none());
    }

    #[test]
    fn test_channel_panels_is_batched() {
        let body = channel_panels("123").unwrap().body().unwrap();
        assert!(body.is_array());
        assert_eq!(body[0]["operationName"], json!("ChannelPanels"));
    }

    #[test]
    fn test_mutation_input() {
        let request = follow_user("42").unwrap();
        assert!(request.is_mutating());
        let vars = request.variables.unwrap();
        assert_eq!(vars["input"], json!({"disableNotifications": false, "targetID": "42"}));
        assert!(ban_user("1", "", None, None).unwrap_err().is_validation());
    }
}
