//! Raw Helix response shapes

use serde::Deserialize;

use crate::gql::types::null_as_default;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Pagination {
    pub cursor: Option<String>,
}

/// `{ "data": [...], "pagination": { "cursor": ... } }`
#[derive(Debug, Clone, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct HelixPage<T> {
    #[serde(default, deserialize_with = "null_as_default")]
    pub data: Vec<T>,
    pub pagination: Option<Pagination>,
}

impl<T> HelixPage<T> {
    /// Non-empty continuation cursor, if any
    #[must_use]
    pub fn cursor(&self) -> Option<&str> {
        self.pagination
            .as_ref()
            .and_then(|p| p.cursor.as_deref())
            .filter(|c| !c.is_empty())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct HelixGame {
    pub id: Option<String>,
    pub name: Option<String>,
    pub box_art_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HelixStream {
    pub id: Option<String>,
    pub user_id: Option<String>,
    pub user_login: Option<String>,
    pub user_name: Option<String>,
    pub game_id: Option<String>,
    pub game_name: Option<String>,
    #[serde(rename = "type")]
    pub stream_type: Option<String>,
    pub title: Option<String>,
    pub viewer_count: Option<u64>,
    pub started_at: Option<String>,
    pub language: Option<String>,
    pub thumbnail_url: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HelixVideo {
    pub id: Option<String>,
    pub user_id: Option<String>,
    pub user_login: Option<String>,
    pub user_name: Option<String>,
    pub title: Option<String>,
    pub created_at: Option<String>,
    pub published_at: Option<String>,
    pub thumbnail_url: Option<String>,
    pub view_count: Option<u64>,
    #[serde(rename = "type")]
    pub video_type: Option<String>,
    /// `"1h2m3s"` style
    pub duration: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HelixClip {
    pub id: Option<String>,
    pub url: Option<String>,
    pub broadcaster_id: Option<String>,
    pub broadcaster_name: Option<String>,
    pub video_id: Option<String>,
    pub game_id: Option<String>,
    pub title: Option<String>,
    pub view_count: Option<u64>,
    pub created_at: Option<String>,
    pub thumbnail_url: Option<String>,
    pub duration: Option<f64>,
    pub vod_offset: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HelixChannel {
    pub id: Option<String>,
    pub broadcaster_login: Option<String>,
    pub display_name: Option<String>,
    pub thumbnail_url: Option<String>,
    pub is_live: Option<bool>,
    pub game_name: Option<String>,
    pub title: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HelixFollowedChannel {
    pub broadcaster_id: Option<String>,
    pub broadcaster_login: Option<String>,
    pub broadcaster_name: Option<String>,
    pub followed_at: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_page_cursor() {
        let page: HelixPage<HelixGame> = serde_json::from_value(json!({
            "data": [{"id": "1", "name": "Chess", "box_art_url": "https://x/{width}x{height}.jpg"}],
            "pagination": {"cursor": "abc"}
        }))
        .unwrap();
        assert_eq!(page.cursor(), Some("abc"));
        assert_eq!(page.data.len(), 1);
    }

    #[test]
    fn test_empty_pagination_is_end() {
        let page: HelixPage<HelixGame> = serde_json::from_value(json!({"data": [], "pagination": {}})).unwrap();
        assert!(page.cursor().is_none());
        let page: HelixPage<HelixGame> = serde_json::from_value(json!({"data": [], "pagination": {"cursor": ""}})).unwrap();
        assert!(page.cursor().is_none());
    }
}
