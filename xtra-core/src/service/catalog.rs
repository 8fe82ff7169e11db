//! Catalog browsing entry point

use std::sync::Arc;

use tracing::debug;
use xtra_media_providers::{GqlClient, GraphClient, HelixClient, RestClient};

use crate::backend::{BackendKind, BackendPreference};
use crate::cheer::CheerEmoteService;
use crate::config::Config;
use crate::credentials::{has_rest_token, CredentialProvider};
use crate::error::{Error, Result};
use crate::listing::{GqlSource, HelixSource, ListingHandle, PageSource};
use crate::models::{CheerEmote, GameRef, LogicalQuery};
use crate::preferences::{load_video_sort, PreferenceStore};

use super::GqlApi;

/// Opens listings and serves cheer emotes over shared backend clients.
///
/// Clients and the cheer cache are shared by every listing opened here;
/// listings themselves share nothing.
pub struct CatalogService {
    gql: Arc<GqlSource>,
    helix: Arc<HelixSource>,
    api: GqlApi,
    cheer: CheerEmoteService,
    credentials: Arc<dyn CredentialProvider>,
    page_size: u32,
    default_preference: BackendPreference,
}

impl CatalogService {
    pub fn new(
        gql: Arc<dyn GraphClient>,
        helix: Arc<dyn RestClient>,
        credentials: Arc<dyn CredentialProvider>,
        page_size: u32,
        default_preference: BackendPreference,
    ) -> Self {
        Self {
            gql: Arc::new(GqlSource::new(Arc::clone(&gql), Arc::clone(&credentials))),
            helix: Arc::new(HelixSource::new(helix, Arc::clone(&credentials))),
            api: GqlApi::new(Arc::clone(&gql), Arc::clone(&credentials)),
            cheer: CheerEmoteService::new(gql, Arc::clone(&credentials)),
            credentials,
            page_size,
            default_preference,
        }
    }

    /// Build HTTP clients and credentials from configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        let problems = config.validate();
        if !problems.is_empty() {
            return Err(Error::Configuration(problems.join("; ")));
        }
        let gql = GqlClient::new(&config.gql.url, config.gql.timeout(), config.gql.connect_timeout())
            .map_err(|e| Error::Configuration(format!("gql client: {e}")))?;
        let helix = HelixClient::new(&config.helix.url, config.helix.timeout(), config.helix.connect_timeout())
            .map_err(|e| Error::Configuration(format!("helix client: {e}")))?;
        Ok(Self::new(
            Arc::new(gql),
            Arc::new(helix),
            Arc::new(config.credentials()),
            config.listing.page_size,
            config.listing.default_preference.clone(),
        ))
    }

    fn source(&self, kind: BackendKind) -> Arc<dyn PageSource> {
        match kind {
            BackendKind::Gql => Arc::clone(&self.gql) as Arc<dyn PageSource>,
            BackendKind::Helix => Arc::clone(&self.helix) as Arc<dyn PageSource>,
        }
    }

    /// Open a listing for `query`, trying backends in `preference` order.
    pub fn open_listing(&self, query: LogicalQuery, preference: &BackendPreference) -> Result<ListingHandle> {
        debug!(query = %query.describe(), preference = ?preference.as_slice(), "Opening listing");
        let sources = preference.iter().map(|kind| self.source(kind)).collect();
        ListingHandle::open(query, sources, self.page_size)
    }

    /// Open a listing with the configured default preference.
    pub fn open_default(&self, query: LogicalQuery) -> Result<ListingHandle> {
        self.open_listing(query, &self.default_preference)
    }

    /// Game videos listing using the saved sort defaults for `game`.
    ///
    /// `languages` is the caller's language list; the saved language index
    /// selects from it, index 0 meaning any language.
    pub fn open_game_videos(
        &self,
        game: GameRef,
        store: &dyn PreferenceStore,
        languages: &[String],
        preference: &BackendPreference,
    ) -> Result<ListingHandle> {
        let filter = load_video_sort(store, game.id(), has_rest_token(self.credentials.as_ref()));
        let language = match filter.language_index {
            0 => None,
            index => languages.get(index).cloned(),
        };
        self.open_listing(filter.game_videos(game, language), preference)
    }

    #[must_use]
    pub fn default_preference(&self) -> &BackendPreference {
        &self.default_preference
    }

    /// Single-shot GraphQL operations
    #[must_use]
    pub fn api(&self) -> &GqlApi {
        &self.api
    }

    /// Load cheer emotes for a channel, caching the result
    pub async fn load_cheer_emotes(&self, channel_login: &str, animated: bool) -> Result<Arc<Vec<CheerEmote>>> {
        self.cheer.load(channel_login, animated).await
    }

    /// Cheer emotes already loaded for a channel
    #[must_use]
    pub fn cheer_emotes(&self, channel_login: &str, animated: bool) -> Option<Arc<Vec<CheerEmote>>> {
        self.cheer.cached(channel_login, animated)
    }
}
