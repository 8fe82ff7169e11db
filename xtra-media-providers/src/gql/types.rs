//! Raw GraphQL response shapes
//!
//! Every field is optional: the upstream schema is undocumented and drops
//! fields freely, so absence is modelled explicitly and left to the
//! normalizers to interpret.

use serde::{Deserialize, Deserializer};

/// Treat an explicit `null` like a missing field.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// ========== Pagination envelope ==========

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub has_next_page: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Edge<N> {
    pub node: Option<N>,
    pub cursor: Option<String>,
    /// Only on follow edges
    #[serde(rename = "followedAt")]
    pub followed_at: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", bound(deserialize = "N: Deserialize<'de>"))]
pub struct Connection<N> {
    #[serde(default, deserialize_with = "null_as_default")]
    pub edges: Vec<Edge<N>>,
    pub page_info: Option<PageInfo>,
}

impl<N> Connection<N> {
    /// Cursor of the last edge, the continuation token for the next page
    #[must_use]
    pub fn last_cursor(&self) -> Option<&str> {
        self.edges.last().and_then(|edge| edge.cursor.as_deref())
    }

    #[must_use]
    pub fn has_next_page(&self) -> bool {
        self.page_info
            .as_ref()
            .and_then(|info| info.has_next_page)
            .unwrap_or(false)
    }
}

// ========== Entities ==========

#[derive(Debug, Clone, Deserialize)]
pub struct Count {
    #[serde(rename = "totalCount")]
    pub total_count: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GqlTag {
    pub id: Option<String>,
    pub name: Option<String>,
    pub tag_name: Option<String>,
    pub localized_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GqlGame {
    pub id: Option<String>,
    pub name: Option<String>,
    pub display_name: Option<String>,
    #[serde(rename = "boxArtURL")]
    pub box_art_url: Option<String>,
    pub viewers_count: Option<u64>,
    pub broadcasters_count: Option<u64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<GqlTag>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GqlUser {
    pub id: Option<String>,
    pub login: Option<String>,
    pub display_name: Option<String>,
    #[serde(rename = "profileImageURL")]
    pub profile_image_url: Option<String>,
    pub followers: Option<Count>,
    pub stream: Option<Box<GqlStream>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GqlStream {
    pub id: Option<String>,
    pub title: Option<String>,
    pub viewers_count: Option<u64>,
    #[serde(rename = "previewImageURL")]
    pub preview_image_url: Option<String>,
    #[serde(rename = "type")]
    pub stream_type: Option<String>,
    pub created_at: Option<String>,
    pub broadcaster: Option<GqlUser>,
    pub game: Option<GqlGame>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub freeform_tags: Vec<GqlTag>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GqlVideo {
    pub id: Option<String>,
    pub title: Option<String>,
    pub view_count: Option<u64>,
    pub published_at: Option<String>,
    pub created_at: Option<String>,
    pub length_seconds: Option<u64>,
    #[serde(rename = "previewThumbnailURL")]
    pub preview_thumbnail_url: Option<String>,
    pub broadcast_type: Option<String>,
    pub owner: Option<GqlUser>,
    pub game: Option<GqlGame>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClipVideoRef {
    pub id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GqlClip {
    pub id: Option<String>,
    pub slug: Option<String>,
    pub title: Option<String>,
    pub view_count: Option<u64>,
    pub created_at: Option<String>,
    pub duration_seconds: Option<f64>,
    #[serde(rename = "thumbnailURL")]
    pub thumbnail_url: Option<String>,
    pub broadcaster: Option<GqlUser>,
    pub game: Option<GqlGame>,
    pub video: Option<ClipVideoRef>,
    pub video_offset_seconds: Option<u64>,
}

// ========== Directory responses ==========

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopGamesData {
    pub directories_with_tags: Option<Connection<GqlGame>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TopStreamsData {
    pub streams: Option<Connection<GqlStream>>,
}

/// `data.game.{streams,videos,clips}`
#[derive(Debug, Clone, Deserialize)]
pub struct GameData {
    pub game: Option<GameListings>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GameListings {
    pub streams: Option<Connection<GqlStream>>,
    pub videos: Option<Connection<GqlVideo>>,
    pub clips: Option<Connection<GqlClip>>,
}

/// `data.user.{videos,clips,follows,mods,vips,stream}`
#[derive(Debug, Clone, Deserialize)]
pub struct UserData {
    pub user: Option<UserListings>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserListings {
    pub videos: Option<Connection<GqlVideo>>,
    pub clips: Option<Connection<GqlClip>>,
    pub follows: Option<Connection<GqlUser>>,
    pub mods: Option<Connection<GqlUser>>,
    pub vips: Option<Connection<GqlUser>>,
    pub stream: Option<GqlStream>,
}

// ========== Search ==========

#[derive(Debug, Clone, Deserialize)]
pub struct SearchEdge<N> {
    pub item: Option<N>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", bound(deserialize = "N: Deserialize<'de>"))]
pub struct SearchSection<N> {
    #[serde(default, deserialize_with = "null_as_default")]
    pub edges: Vec<SearchEdge<N>>,
    pub cursor: Option<String>,
    pub page_info: Option<PageInfo>,
}

impl<N> SearchSection<N> {
    #[must_use]
    pub fn has_next_page(&self) -> bool {
        self.page_info
            .as_ref()
            .and_then(|info| info.has_next_page)
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchFor {
    pub channels: Option<SearchSection<GqlUser>>,
    pub games: Option<SearchSection<GqlGame>>,
    pub videos: Option<SearchSection<GqlVideo>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchData {
    pub search_for: Option<SearchFor>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FreeformTagsData {
    pub search_freeform_tags: Option<Connection<GqlTag>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryTagsData {
    #[serde(default, deserialize_with = "null_as_default")]
    pub search_category_tags: Vec<GqlTag>,
}

// ========== Current user ==========

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentUser {
    pub followed_live_users: Option<Connection<GqlUser>>,
    pub followed_videos: Option<Connection<GqlVideo>>,
    pub followed_games: Option<FollowedGames>,
    pub follows: Option<Connection<GqlUser>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FollowedGames {
    #[serde(default, deserialize_with = "null_as_default")]
    pub nodes: Vec<GqlGame>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentUserData {
    pub current_user: Option<CurrentUser>,
}

// ========== Cheer configuration ==========

#[derive(Debug, Clone, Deserialize)]
pub struct CheerColor {
    pub bits: Option<u64>,
    pub color: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CheerType {
    pub animation: Option<String>,
    pub extension: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CheerDisplayConfig {
    #[serde(default, deserialize_with = "null_as_default")]
    pub backgrounds: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub colors: Vec<CheerColor>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub scales: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub types: Vec<CheerType>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CheerTierBits {
    pub bits: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CheerNode {
    pub prefix: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tiers: Vec<CheerTierBits>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CheerGroup {
    #[serde(rename = "templateURL")]
    pub template_url: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub nodes: Vec<CheerNode>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheerConfig {
    pub display_config: Option<CheerDisplayConfig>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub groups: Vec<CheerGroup>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalCheerData {
    pub cheer_config: Option<CheerConfig>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelCheer {
    #[serde(default, deserialize_with = "null_as_default")]
    pub cheer_groups: Vec<CheerGroup>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChannelCheerChannel {
    pub cheer: Option<ChannelCheer>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChannelCheerData {
    pub channel: Option<ChannelCheerChannel>,
}

// ========== Single-shot lookups ==========

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClipQuality {
    pub quality: Option<String>,
    pub frame_rate: Option<f64>,
    #[serde(rename = "sourceURL")]
    pub source_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClipUrls {
    #[serde(default, deserialize_with = "null_as_default")]
    pub video_qualities: Vec<ClipQuality>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClipUrlsData {
    pub clip: Option<ClipUrls>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MomentDetails {
    pub game: Option<GqlGame>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Moment {
    pub description: Option<String>,
    pub position_milliseconds: Option<u64>,
    pub duration_milliseconds: Option<u64>,
    pub details: Option<MomentDetails>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VideoMoments {
    pub moments: Option<Connection<Moment>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VideoMomentsData {
    pub video: Option<VideoMoments>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_connection_cursor_and_has_next() {
        let conn: Connection<GqlGame> = serde_json::from_value(json!({
            "edges": [
                {"node": {"id": "1", "name": "A"}, "cursor": "c1"},
                {"node": {"id": "2"}, "cursor": "c2"}
            ],
            "pageInfo": {"hasNextPage": true}
        }))
        .unwrap();
        assert_eq!(conn.last_cursor(), Some("c2"));
        assert!(conn.has_next_page());
        assert!(conn.edges[1].node.as_ref().unwrap().name.is_none());
    }

    #[test]
    fn test_connection_missing_page_info() {
        let conn: Connection<GqlGame> = serde_json::from_value(json!({"edges": []})).unwrap();
        assert!(!conn.has_next_page());
        assert!(conn.last_cursor().is_none());
    }

    #[test]
    fn test_global_cheer_config_shape() {
        let data: GlobalCheerData = serde_json::from_value(json!({
            "cheerConfig": {
                "displayConfig": {
                    "backgrounds": ["light", "dark"],
                    "colors": [{"bits": 100, "color": "#ff0000"}],
                    "scales": ["1", "2"],
                    "types": [{"animation": "static", "extension": "png"}]
                },
                "groups": [{
                    "templateURL": "https://x/PREFIX-BACKGROUND-ANIMATION-TIER.EXTENSION",
                    "nodes": [{"prefix": "Cheer", "tiers": [{"bits": 100}]}]
                }]
            }
        }))
        .unwrap();
        let config = data.cheer_config.unwrap();
        assert_eq!(config.display_config.unwrap().backgrounds, vec!["light", "dark"]);
        assert_eq!(config.groups[0].nodes[0].tiers[0].bits, Some(100));
    }

    #[test]
    fn test_null_lists_are_empty() {
        let stream: GqlStream = serde_json::from_value(json!({"id": "1", "freeformTags": null})).unwrap();
        assert!(stream.freeform_tags.is_empty());
        let conn: Connection<GqlStream> = serde_json::from_value(json!({"edges": null})).unwrap();
        assert!(conn.edges.is_empty());
    }
}
