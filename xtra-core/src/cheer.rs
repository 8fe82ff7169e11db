//! Cheer emotes
//!
//! Resolution merges the global and channel tier catalogs against the
//! global display configuration:
//!
//! - background: `"dark"` if declared, else the last declared one
//! - type: first `animated` when animation is wanted, else first `static`,
//!   else the first declared type
//! - a tier survives only if a color bucket has exactly its bits
//! - the template's `PREFIX`, `BACKGROUND`, `ANIMATION`, `TIER` and
//!   `EXTENSION` placeholders are replaced once each, in that order, then
//!   `SCALE` once per size
//!
//! [`resolve`] is pure. [`CheerEmoteService`] fetches the catalogs and keeps
//! resolved sets in memory per (channel, animated).

use std::sync::Arc;

use dashmap::DashMap;
use tracing::{debug, warn};
use xtra_media_providers::gql::client::decode;
use xtra_media_providers::gql::request as gql;
use xtra_media_providers::gql::types::{
    ChannelCheerData, CheerDisplayConfig, CheerGroup, GlobalCheerData,
};
use xtra_media_providers::GraphClient;

use crate::backend::BackendKind;
use crate::credentials::CredentialProvider;
use crate::error::{Error, Result};
use crate::models::CheerEmote;
use crate::singleflight::SingleFlight;

const ANIMATED: &str = "animated";
const STATIC: &str = "static";
const DARK: &str = "dark";

/// One bits tier of a cheer prefix
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheerTier {
    pub prefix: String,
    pub template_url: String,
    pub tier_bits: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmoteType {
    pub animation: String,
    pub extension: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorBucket {
    pub bits: u64,
    pub color: Option<String>,
}

/// Display configuration shared by every tier
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmoteConfig {
    pub backgrounds: Vec<String>,
    pub scales: Vec<String>,
    pub types: Vec<EmoteType>,
    pub colors: Vec<ColorBucket>,
}

impl From<CheerDisplayConfig> for EmoteConfig {
    fn from(raw: CheerDisplayConfig) -> Self {
        Self {
            backgrounds: raw.backgrounds,
            scales: raw.scales,
            types: raw
                .types
                .into_iter()
                .filter_map(|t| {
                    Some(EmoteType {
                        animation: t.animation?,
                        extension: t.extension?,
                    })
                })
                .collect(),
            colors: raw
                .colors
                .into_iter()
                .filter_map(|c| Some(ColorBucket { bits: c.bits?, color: c.color }))
                .collect(),
        }
    }
}

/// Flatten catalog groups into tiers, in declaration order.
///
/// Tiers missing a prefix, template or bits value are left out.
#[must_use]
pub fn tiers_from_groups(groups: &[CheerGroup]) -> Vec<CheerTier> {
    let mut tiers = Vec::new();
    for group in groups {
        let Some(template_url) = group.template_url.as_deref() else {
            continue;
        };
        for node in &group.nodes {
            let Some(prefix) = node.prefix.as_deref() else {
                continue;
            };
            tiers.extend(node.tiers.iter().filter_map(|t| t.bits).map(|tier_bits| CheerTier {
                prefix: prefix.to_string(),
                template_url: template_url.to_string(),
                tier_bits,
            }));
        }
    }
    tiers
}

fn pick_background(backgrounds: &[String]) -> Option<&str> {
    backgrounds
        .iter()
        .find(|b| b.as_str() == DARK)
        .or_else(|| backgrounds.last())
        .map(String::as_str)
}

fn pick_type(types: &[EmoteType], animated: bool) -> Option<&EmoteType> {
    let by_animation = |tag: &str| types.iter().find(|t| t.animation == tag);
    let preferred = if animated { by_animation(ANIMATED) } else { None };
    preferred.or_else(|| by_animation(STATIC)).or_else(|| types.first())
}

fn scaled(url: &str, scales: &[String], leading: char) -> Option<String> {
    scales
        .iter()
        .find(|s| s.starts_with(leading))
        .map(|scale| url.replacen("SCALE", scale, 1))
}

/// Resolve `global` then `channel` tiers against `config`.
///
/// Fails only when the configuration has no background or no type to
/// choose from.
pub fn resolve(
    global: &[CheerTier],
    channel: &[CheerTier],
    config: &EmoteConfig,
    animated: bool,
) -> Result<Vec<CheerEmote>> {
    let background = pick_background(&config.backgrounds)
        .ok_or_else(|| Error::Configuration("cheer configuration declares no backgrounds".to_string()))?;
    let emote_type = pick_type(&config.types, animated)
        .ok_or_else(|| Error::Configuration("cheer configuration declares no types".to_string()))?;
    let is_animated = emote_type.animation == ANIMATED;

    let mut emotes = Vec::new();
    for tier in global.iter().chain(channel) {
        let Some(bucket) = config.colors.iter().find(|c| c.bits == tier.tier_bits) else {
            debug!(prefix = %tier.prefix, bits = tier.tier_bits, "No color bucket for cheer tier, dropping");
            continue;
        };
        let url = tier
            .template_url
            .replacen("PREFIX", &tier.prefix, 1)
            .replacen("BACKGROUND", background, 1)
            .replacen("ANIMATION", &emote_type.animation, 1)
            .replacen("TIER", &bucket.bits.to_string(), 1)
            .replacen("EXTENSION", &emote_type.extension, 1);

        let url1x = scaled(&url, &config.scales, '1')
            .or_else(|| config.scales.last().map(|scale| url.replacen("SCALE", scale, 1)));
        emotes.push(CheerEmote {
            name: tier.prefix.clone(),
            url1x,
            url2x: scaled(&url, &config.scales, '2'),
            url3x: scaled(&url, &config.scales, '3'),
            url4x: scaled(&url, &config.scales, '4'),
            emote_type: is_animated.then(|| "gif".to_string()),
            is_animated,
            min_bits: bucket.bits,
            color: bucket.color.clone(),
        });
    }
    Ok(emotes)
}

/// Loads, resolves and keeps cheer emotes per (channel, animated)
pub struct CheerEmoteService {
    client: Arc<dyn GraphClient>,
    credentials: Arc<dyn CredentialProvider>,
    resolved: DashMap<(String, bool), Arc<Vec<CheerEmote>>>,
    loads: SingleFlight<(String, bool), Arc<Vec<CheerEmote>>>,
}

impl CheerEmoteService {
    pub fn new(client: Arc<dyn GraphClient>, credentials: Arc<dyn CredentialProvider>) -> Self {
        Self {
            client,
            credentials,
            resolved: DashMap::new(),
            loads: SingleFlight::new(),
        }
    }

    fn key(channel_login: &str, animated: bool) -> (String, bool) {
        (channel_login.trim().to_ascii_lowercase(), animated)
    }

    /// Resolved emotes from a previous [`load`](Self::load), if any
    #[must_use]
    pub fn cached(&self, channel_login: &str, animated: bool) -> Option<Arc<Vec<CheerEmote>>> {
        self.resolved
            .get(&Self::key(channel_login, animated))
            .map(|entry| Arc::clone(entry.value()))
    }

    /// Fetch both catalogs and resolve them. Concurrent loads for the same
    /// key share one fetch.
    ///
    /// A blank `channel_login` resolves the global catalog only.
    pub async fn load(&self, channel_login: &str, animated: bool) -> Result<Arc<Vec<CheerEmote>>> {
        let key = Self::key(channel_login, animated);
        let emotes = self
            .loads
            .do_work(key.clone(), self.fetch_and_resolve(key.0.clone(), animated))
            .await?;
        self.resolved.insert(key, Arc::clone(&emotes));
        Ok(emotes)
    }

    /// Drop cached sets for `channel_login`
    pub fn invalidate(&self, channel_login: &str) {
        let login = channel_login.trim().to_ascii_lowercase();
        self.resolved.retain(|(channel, _), _| *channel != login);
    }

    async fn fetch_and_resolve(&self, channel_login: String, animated: bool) -> Result<Arc<Vec<CheerEmote>>> {
        let credentials = self.credentials.credentials(BackendKind::Gql);

        let request = gql::global_cheer_config().map_err(|e| Error::from_provider(BackendKind::Gql, e))?;
        let global: GlobalCheerData = self
            .client
            .send(&request, &credentials)
            .await
            .and_then(decode)
            .map_err(|e| Error::Configuration(format!("global cheer catalog unavailable: {e}")))?;
        let config = global
            .cheer_config
            .ok_or_else(|| Error::Configuration("global cheer catalog is empty".to_string()))?;
        let display = config
            .display_config
            .ok_or_else(|| Error::Configuration("global cheer catalog has no display configuration".to_string()))?;
        let global_tiers = tiers_from_groups(&config.groups);

        let channel_tiers = if channel_login.is_empty() {
            Vec::new()
        } else {
            self.channel_tiers(&channel_login, &credentials).await
        };

        let emotes = resolve(&global_tiers, &channel_tiers, &EmoteConfig::from(display), animated)?;
        debug!(
            channel = %channel_login,
            animated,
            global = global_tiers.len(),
            channel_tiers = channel_tiers.len(),
            resolved = emotes.len(),
            "Resolved cheer emotes"
        );
        Ok(Arc::new(emotes))
    }

    /// Channel catalog tiers; a failed fetch contributes none.
    async fn channel_tiers(&self, channel_login: &str, credentials: &xtra_media_providers::Credentials) -> Vec<CheerTier> {
        let result = match gql::channel_cheer_config(channel_login) {
            Ok(request) => self.client.send(&request, credentials).await.and_then(decode::<ChannelCheerData>),
            Err(e) => Err(e),
        };
        match result {
            Ok(data) => data
                .channel
                .and_then(|c| c.cheer)
                .map(|cheer| tiers_from_groups(&cheer.cheer_groups))
                .unwrap_or_default(),
            Err(e) => {
                warn!(channel = %channel_login, error = %e, "Channel cheer catalog unavailable, using global tiers only");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicU32, Ordering};
    use xtra_media_providers::{Credentials, GqlRequest, ProviderClientError};

    use crate::credentials::StaticCredentials;

    fn tier(prefix: &str, bits: u64) -> CheerTier {
        CheerTier {
            prefix: prefix.to_string(),
            template_url: "https://x/PREFIX-BACKGROUND-ANIMATION-TIER.EXTENSION".to_string(),
            tier_bits: bits,
        }
    }

    fn config() -> EmoteConfig {
        EmoteConfig {
            backgrounds: vec!["light".into(), "dark".into()],
            scales: vec!["1".into(), "2".into()],
            types: vec![EmoteType { animation: "static".into(), extension: "png".into() }],
            colors: vec![ColorBucket { bits: 100, color: Some("#ff0000".into()) }],
        }
    }

    #[test]
    fn test_single_global_tier() {
        let emotes = resolve(&[tier("Cheer", 100)], &[], &config(), false).unwrap();
        assert_eq!(emotes.len(), 1);
        let emote = &emotes[0];
        assert_eq!(emote.name, "Cheer");
        assert_eq!(emote.url1x.as_deref(), Some("https://x/Cheer-dark-static-100.png"));
        assert_eq!(emote.min_bits, 100);
        assert_eq!(emote.color.as_deref(), Some("#ff0000"));
        assert!(!emote.is_animated);
        assert_eq!(emote.emote_type, None);
        assert_eq!(emote.url3x, None);
    }

    #[test]
    fn test_unmatched_tier_dropped() {
        let emotes = resolve(&[tier("Cheer", 100), tier("Cheer", 1000)], &[tier("Kappa", 5)], &config(), false).unwrap();
        assert_eq!(emotes.len(), 1);
        assert!(emotes.iter().all(|e| e.min_bits == 100));
    }

    #[test]
    fn test_channel_tiers_follow_global() {
        let emotes = resolve(&[tier("Cheer", 100)], &[tier("Cheer", 100)], &config(), false).unwrap();
        assert_eq!(emotes.len(), 2);
    }

    #[test]
    fn test_background_falls_back_to_last() {
        let mut cfg = config();
        cfg.backgrounds = vec!["light".into(), "grey".into()];
        let emotes = resolve(&[tier("Cheer", 100)], &[], &cfg, false).unwrap();
        assert_eq!(emotes[0].url1x.as_deref(), Some("https://x/Cheer-grey-static-100.png"));
    }

    #[test]
    fn test_animated_selection() {
        let mut cfg = config();
        cfg.types.insert(0, EmoteType { animation: "animated".into(), extension: "gif".into() });
        let emotes = resolve(&[tier("Cheer", 100)], &[], &cfg, true).unwrap();
        assert!(emotes[0].is_animated);
        assert_eq!(emotes[0].emote_type.as_deref(), Some("gif"));
        assert_eq!(emotes[0].url1x.as_deref(), Some("https://x/Cheer-dark-animated-100.gif"));

        // not wanted: static even though animated is declared first
        let emotes = resolve(&[tier("Cheer", 100)], &[], &cfg, false).unwrap();
        assert!(!emotes[0].is_animated);
    }

    #[test]
    fn test_type_falls_back_to_first_declared() {
        let mut cfg = config();
        cfg.types = vec![EmoteType { animation: "shiny".into(), extension: "webp".into() }];
        let emotes = resolve(&[tier("Cheer", 100)], &[], &cfg, true).unwrap();
        assert_eq!(emotes[0].url1x.as_deref(), Some("https://x/Cheer-dark-shiny-100.webp"));
        assert!(!emotes[0].is_animated);
    }

    #[test]
    fn test_scale_substitution() {
        let mut cfg = config();
        cfg.scales = vec!["1.5".into(), "2".into(), "4".into()];
        let mut t = tier("Cheer", 100);
        t.template_url = "https://x/PREFIX/BACKGROUND/ANIMATION/TIER/SCALE.EXTENSION".into();
        let emote = &resolve(&[t.clone()], &[], &cfg, false).unwrap()[0];
        assert_eq!(emote.url1x.as_deref(), Some("https://x/Cheer/dark/static/100/1.5.png"));
        assert_eq!(emote.url2x.as_deref(), Some("https://x/Cheer/dark/static/100/2.png"));
        assert_eq!(emote.url3x, None);
        assert_eq!(emote.url4x.as_deref(), Some("https://x/Cheer/dark/static/100/4.png"));

        // no "1" scale: last declared one stands in
        cfg.scales = vec!["2".into(), "3".into()];
        let emote = &resolve(&[t], &[], &cfg, false).unwrap()[0];
        assert_eq!(emote.url1x.as_deref(), Some("https://x/Cheer/dark/static/100/3.png"));
    }

    #[test]
    fn test_placeholders_replaced_once() {
        let mut t = tier("TIER", 100);
        t.template_url = "PREFIX-TIER-TIER".into();
        let emote = &resolve(&[t], &[], &config(), false).unwrap()[0];
        // PREFIX becomes "TIER", then the first TIER (the prefix) is replaced
        assert_eq!(emote.url1x.as_deref(), Some("100-TIER-TIER"));
    }

    #[test]
    fn test_deterministic() {
        let a = resolve(&[tier("Cheer", 100)], &[tier("Kappa", 100)], &config(), true).unwrap();
        let b = resolve(&[tier("Cheer", 100)], &[tier("Kappa", 100)], &config(), true).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_missing_config_parts() {
        let mut cfg = config();
        cfg.types.clear();
        assert!(matches!(resolve(&[], &[], &cfg, false), Err(Error::Configuration(_))));
        let mut cfg = config();
        cfg.backgrounds.clear();
        assert!(matches!(resolve(&[], &[], &cfg, false), Err(Error::Configuration(_))));
    }

    /// Answers the two catalog operations; channel fails when asked to
    struct Catalogs {
        channel_fails: bool,
        global_fails: bool,
        calls: AtomicU32,
    }

    #[async_trait]
    impl GraphClient for Catalogs {
        async fn send(&self, request: &GqlRequest, _credentials: &Credentials) -> std::result::Result<Value, ProviderClientError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            match request.operation_name {
                "BitsConfigContext_Global" if self.global_fails => Err(ProviderClientError::Network("reset".into())),
                "BitsConfigContext_Global" => Ok(json!({
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
                })),
                _ if self.channel_fails => Err(ProviderClientError::Auth("401".into())),
                _ => Ok(json!({
                    "channel": {"cheer": {"cheerGroups": [{
                        "templateURL": "https://y/PREFIX-TIER.EXTENSION",
                        "nodes": [{"prefix": "Pog", "tiers": [{"bits": 100}, {"bits": 7}]}]
                    }]}}
                })),
            }
        }
    }

    fn service(channel_fails: bool, global_fails: bool) -> (CheerEmoteService, Arc<Catalogs>) {
        let client = Arc::new(Catalogs { channel_fails, global_fails, calls: AtomicU32::new(0) });
        let creds = StaticCredentials::shared(Credentials::new("web"), Credentials::default());
        (CheerEmoteService::new(client.clone(), creds), client)
    }

    #[tokio::test]
    async fn test_service_loads_and_caches() {
        let (svc, _) = service(false, false);
        assert!(svc.cached("Streamer", false).is_none());
        let emotes = svc.load("Streamer", false).await.unwrap();
        assert_eq!(emotes.iter().map(|e| e.name.as_str()).collect::<Vec<_>>(), vec!["Cheer", "Pog"]);
        assert_eq!(emotes[1].url1x.as_deref(), Some("https://y/Pog-100.png"));
        assert_eq!(svc.cached("streamer", false).unwrap().len(), 2);
        assert!(svc.cached("streamer", true).is_none());

        svc.invalidate("STREAMER");
        assert!(svc.cached("streamer", false).is_none());
    }

    #[tokio::test]
    async fn test_channel_failure_is_not_fatal() {
        let (svc, _) = service(true, false);
        let emotes = svc.load("streamer", false).await.unwrap();
        assert_eq!(emotes.len(), 1);
    }

    #[tokio::test]
    async fn test_global_failure_is_configuration_error() {
        let (svc, _) = service(false, true);
        assert!(matches!(svc.load("streamer", false).await, Err(Error::Configuration(_))));
    }

    #[tokio::test]
    async fn test_concurrent_loads_coalesce() {
        let (svc, client) = service(false, false);
        let (a, b) = tokio::join!(svc.load("streamer", true), svc.load("streamer", true));
        assert_eq!(a.unwrap(), b.unwrap());
        assert_eq!(client.calls.load(Ordering::SeqCst), 2);
    }
}
