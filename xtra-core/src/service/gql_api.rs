//! Single-shot GraphQL operations
//!
//! Lookups and mutations that are not listings: no pagination, no backend
//! fallback. Mutations need a token, device id and integrity token; the
//! client rejects them before dispatch otherwise.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use tracing::debug;
use xtra_media_providers::gql::client::decode;
use xtra_media_providers::gql::request as gql;
use xtra_media_providers::gql::types::{
    CategoryTagsData, ClipQuality, ClipUrlsData, Connection, FreeformTagsData, GqlUser, UserData, VideoMomentsData,
};
use xtra_media_providers::{GqlRequest, GraphClient, ProviderClientError};

use crate::backend::BackendKind;
use crate::credentials::CredentialProvider;
use crate::error::{Error, Result};
use crate::models::{Channel, ClipUrl, Tag, VideoChapter};
use crate::normalize::gql::{channel, game, tag};

#[derive(Clone)]
pub struct GqlApi {
    client: Arc<dyn GraphClient>,
    credentials: Arc<dyn CredentialProvider>,
}

impl GqlApi {
    pub fn new(client: Arc<dyn GraphClient>, credentials: Arc<dyn CredentialProvider>) -> Self {
        Self { client, credentials }
    }

    async fn send(&self, request: std::result::Result<GqlRequest, ProviderClientError>) -> Result<serde_json::Value> {
        let request = request.map_err(|e| Error::from_provider(BackendKind::Gql, e))?;
        debug!(operation = request.operation_name, mutating = request.is_mutating(), "Sending persisted query");
        let credentials = self.credentials.credentials(BackendKind::Gql);
        self.client
            .send(&request, &credentials)
            .await
            .map_err(|e| Error::from_provider(BackendKind::Gql, e))
    }

    async fn query<T: DeserializeOwned>(&self, request: std::result::Result<GqlRequest, ProviderClientError>) -> Result<T> {
        let data = self.send(request).await?;
        decode(data).map_err(|e| Error::from_provider(BackendKind::Gql, e))
    }

    async fn mutate(&self, request: std::result::Result<GqlRequest, ProviderClientError>) -> Result<()> {
        self.send(request).await.map(|_| ())
    }

    /// Current viewers of a live channel; `None` when offline or unknown
    pub async fn viewer_count(&self, channel_login: &str) -> Result<Option<u64>> {
        let data: UserData = self.query(gql::viewer_count(channel_login)).await?;
        Ok(data.user.and_then(|u| u.stream).and_then(|s| s.viewers_count))
    }

    /// Playback URLs of a clip, one per rendition
    pub async fn clip_urls(&self, slug: &str) -> Result<Vec<ClipUrl>> {
        let data: ClipUrlsData = self.query(gql::clip_access_token(slug)).await?;
        let qualities = data.clip.map(|c| c.video_qualities).unwrap_or_default();
        Ok(clip_urls(qualities))
    }

    /// Games played during a past broadcast
    pub async fn video_chapters(&self, video_id: &str) -> Result<Vec<VideoChapter>> {
        let data: VideoMomentsData = self.query(gql::video_chapters(video_id)).await?;
        let moments = data.video.and_then(|v| v.moments);
        Ok(nodes(moments)
            .map(|m| VideoChapter {
                description: m.description,
                position_ms: m.position_milliseconds,
                duration_ms: m.duration_milliseconds,
                game: m.details.and_then(|d| d.game).and_then(game),
            })
            .collect())
    }

    pub async fn moderators(&self, channel_login: &str) -> Result<Vec<Channel>> {
        let data: UserData = self.query(gql::moderators(channel_login)).await?;
        Ok(users(data.user.and_then(|u| u.mods)))
    }

    pub async fn vips(&self, channel_login: &str) -> Result<Vec<Channel>> {
        let data: UserData = self.query(gql::vips(channel_login)).await?;
        Ok(users(data.user.and_then(|u| u.vips)))
    }

    pub async fn search_freeform_tags(&self, query: Option<&str>) -> Result<Vec<Tag>> {
        let data: FreeformTagsData = self.query(gql::search_freeform_tags(query)).await?;
        Ok(nodes(data.search_freeform_tags).filter_map(tag).collect())
    }

    pub async fn search_category_tags(&self, query: Option<&str>) -> Result<Vec<Tag>> {
        let data: CategoryTagsData = self.query(gql::search_category_tags(query)).await?;
        Ok(data.search_category_tags.into_iter().filter_map(tag).collect())
    }

    // ========== Mutations ==========

    pub async fn follow_user(&self, user_id: &str) -> Result<()> {
        self.mutate(gql::follow_user(user_id)).await
    }

    pub async fn unfollow_user(&self, user_id: &str) -> Result<()> {
        self.mutate(gql::unfollow_user(user_id)).await
    }

    pub async fn follow_game(&self, game_id: &str) -> Result<()> {
        self.mutate(gql::follow_game(game_id)).await
    }

    pub async fn unfollow_game(&self, game_id: &str) -> Result<()> {
        self.mutate(gql::unfollow_game(game_id)).await
    }

    pub async fn claim_points(&self, channel_id: &str, claim_id: &str) -> Result<()> {
        self.mutate(gql::claim_points(channel_id, claim_id)).await
    }

    pub async fn join_raid(&self, raid_id: &str) -> Result<()> {
        self.mutate(gql::join_raid(raid_id)).await
    }

    pub async fn send_announcement(&self, channel_id: &str, message: &str, color: Option<&str>) -> Result<()> {
        self.mutate(gql::send_announcement(channel_id, message, color)).await
    }

    pub async fn ban_user(
        &self,
        channel_id: &str,
        target_login: &str,
        duration: Option<&str>,
        reason: Option<&str>,
    ) -> Result<()> {
        self.mutate(gql::ban_user(channel_id, target_login, duration, reason)).await
    }

    pub async fn unban_user(&self, channel_id: &str, target_login: &str) -> Result<()> {
        self.mutate(gql::unban_user(channel_id, target_login)).await
    }

    pub async fn update_chat_color(&self, color: &str) -> Result<()> {
        self.mutate(gql::update_chat_color(color)).await
    }

    pub async fn create_stream_marker(&self, channel_login: &str) -> Result<()> {
        self.mutate(gql::create_stream_marker(channel_login)).await
    }

    pub async fn add_moderator(&self, channel_id: &str, target_login: &str) -> Result<()> {
        self.mutate(gql::add_moderator(channel_id, target_login)).await
    }

    pub async fn remove_moderator(&self, channel_id: &str, target_login: &str) -> Result<()> {
        self.mutate(gql::remove_moderator(channel_id, target_login)).await
    }

    pub async fn start_raid(&self, channel_id: &str, target_id: &str) -> Result<()> {
        self.mutate(gql::start_raid(channel_id, target_id)).await
    }

    pub async fn cancel_raid(&self, channel_id: &str) -> Result<()> {
        self.mutate(gql::cancel_raid(channel_id)).await
    }

    pub async fn add_vip(&self, channel_id: &str, target_login: &str) -> Result<()> {
        self.mutate(gql::add_vip(channel_id, target_login)).await
    }

    pub async fn remove_vip(&self, channel_id: &str, target_login: &str) -> Result<()> {
        self.mutate(gql::remove_vip(channel_id, target_login)).await
    }
}

fn nodes<N>(conn: Option<Connection<N>>) -> impl Iterator<Item = N> {
    conn.into_iter().flat_map(|c| c.edges).filter_map(|edge| edge.node)
}

fn users(conn: Option<Connection<GqlUser>>) -> Vec<Channel> {
    nodes(conn).filter_map(channel).collect()
}

/// `"720p"` below 60 fps, `"1080p60"` at 60 fps and above, the rendition
/// index when quality is unknown. Renditions without a URL are skipped.
fn clip_urls(qualities: Vec<ClipQuality>) -> Vec<ClipUrl> {
    qualities
        .into_iter()
        .enumerate()
        .filter_map(|(index, q)| {
            let url = q.source_url.filter(|u| !u.is_empty())?;
            let label = match q.quality.as_deref().map(str::trim) {
                Some(quality) if !quality.is_empty() => match q.frame_rate {
                    Some(fps) if fps >= 60.0 => format!("{quality}p{}", fps.round()),
                    _ => format!("{quality}p"),
                },
                _ => index.to_string(),
            };
            Some(ClipUrl { label, url })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::StaticCredentials;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{body_partial_json, header, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};
    use xtra_media_providers::{Credentials, GqlClient, TransportErrorKind};

    fn quality(quality: Option<&str>, fps: Option<f64>, url: &str) -> ClipQuality {
        serde_json::from_value(json!({"quality": quality, "frameRate": fps, "sourceURL": url})).unwrap()
    }

    #[test]
    fn test_clip_url_labels() {
        let urls = clip_urls(vec![
            quality(Some("1080"), Some(60.0), "https://c/1080"),
            quality(Some("720"), Some(30.0), "https://c/720"),
            quality(None, None, "https://c/x"),
            quality(Some("480"), None, ""),
        ]);
        let labels: Vec<_> = urls.iter().map(|u| u.label.as_str()).collect();
        assert_eq!(labels, vec!["1080p60", "720p", "2"]);
    }

    async fn api(server: &MockServer, creds: Credentials) -> GqlApi {
        let client = GqlClient::new(server.uri(), Duration::from_secs(5), Duration::from_secs(5)).unwrap();
        GqlApi::new(Arc::new(client), StaticCredentials::shared(creds, Credentials::default()))
    }

    #[tokio::test]
    async fn test_viewer_count() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("Client-ID", "web"))
            .and(body_partial_json(json!({"operationName": "UseViewCount"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {"user": {"stream": {"viewersCount": 1234}}}
            })))
            .mount(&server)
            .await;

        let api = api(&server, Credentials::new("web")).await;
        assert_eq!(api.viewer_count("shroud").await.unwrap(), Some(1234));
    }

    #[tokio::test]
    async fn test_offline_channel_has_no_viewer_count() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {"user": {"stream": null}}})))
            .mount(&server)
            .await;
        let api = api(&server, Credentials::new("web")).await;
        assert_eq!(api.viewer_count("shroud").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_mutation_without_integrity_is_auth_error() {
        let server = MockServer::start().await;
        let api = api(&server, Credentials::new("web").with_token("tok").with_device_id("dev")).await;
        let err = api.follow_user("123").await.unwrap_err();
        assert_eq!(err.transport_kind(), Some(TransportErrorKind::Auth));
        assert!(server.received_requests().await.unwrap_or_default().is_empty());
    }

    #[tokio::test]
    async fn test_blank_identifier_is_validation() {
        let server = MockServer::start().await;
        let api = api(&server, Credentials::new("web")).await;
        assert!(matches!(api.moderators(" ").await, Err(Error::Validation(_))));
    }

    #[tokio::test]
    async fn test_moderators() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({"operationName": "Mods", "variables": {"login": "shroud"}})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {"user": {"mods": {
                    "edges": [{"node": {"id": "1", "login": "mod_a"}}, {"node": {"id": "2"}}],
                    "pageInfo": {"hasNextPage": false}
                }}}
            })))
            .mount(&server)
            .await;
        let api = api(&server, Credentials::new("web")).await;
        let mods = api.moderators("shroud").await.unwrap();
        assert_eq!(mods.len(), 1);
        assert_eq!(mods[0].login, "mod_a");
    }
}
