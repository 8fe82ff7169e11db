//! Saved sort defaults
//!
//! The preference store belongs to the caller; the core only reads it.
//! Resolution is layered: the entity's own record (when it asked to keep
//! its sort), else the global `"default"` record, else built-in values.

use serde::{Deserialize, Serialize};
use xtra_media_providers::{BroadcastType, VideoPeriod, VideoSort};

use crate::models::{GameRef, LogicalQuery};

/// Key of the process-wide record
pub const GLOBAL_KEY: &str = "default";

/// A stored sort record, as persisted by the caller.
///
/// Values are kept as stored strings; unknown values fall back to the
/// built-in defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortRecord {
    #[serde(default)]
    pub save_sort: bool,
    pub video_sort: Option<String>,
    pub video_period: Option<String>,
    pub video_type: Option<String>,
    pub video_language_index: Option<usize>,
}

#[cfg_attr(test, mockall::automock)]
pub trait PreferenceStore: Send + Sync {
    fn sort_record(&self, key: &str) -> Option<SortRecord>;
}

/// Effective video filter for an entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VideoFilter {
    pub save_sort: bool,
    pub sort: VideoSort,
    pub period: VideoPeriod,
    /// `None` lists every broadcast type
    pub broadcast_type: Option<BroadcastType>,
    /// Index into the caller's language list; 0 means any language
    pub language_index: usize,
}

impl Default for VideoFilter {
    fn default() -> Self {
        Self {
            save_sort: false,
            sort: VideoSort::Views,
            period: VideoPeriod::Week,
            broadcast_type: None,
            language_index: 0,
        }
    }
}

impl VideoFilter {
    /// Game videos query using this filter
    #[must_use]
    pub fn game_videos(&self, game: GameRef, language: Option<String>) -> LogicalQuery {
        LogicalQuery::GameVideos {
            game,
            sort: self.sort,
            period: self.period,
            broadcast_type: self.broadcast_type,
            language,
        }
    }
}

/// Resolve the filter from an entity record and the global record.
///
/// Without a REST token the period is always a week: the GraphQL backend
/// cannot filter by period.
#[must_use]
pub fn resolve_video_sort(entity: Option<&SortRecord>, global: Option<&SortRecord>, has_rest_token: bool) -> VideoFilter {
    let Some(record) = entity.filter(|r| r.save_sort).or(global) else {
        return VideoFilter::default();
    };
    let defaults = VideoFilter::default();
    VideoFilter {
        save_sort: record.save_sort,
        sort: record.video_sort.as_deref().and_then(VideoSort::parse).unwrap_or(defaults.sort),
        period: if has_rest_token {
            record.video_period.as_deref().and_then(VideoPeriod::parse).unwrap_or(defaults.period)
        } else {
            VideoPeriod::Week
        },
        broadcast_type: record.video_type.as_deref().and_then(BroadcastType::parse),
        language_index: record.video_language_index.unwrap_or(defaults.language_index),
    }
}

/// Read both layers from `store` and resolve them.
pub fn load_video_sort(store: &dyn PreferenceStore, entity_id: Option<&str>, has_rest_token: bool) -> VideoFilter {
    let entity = entity_id.and_then(|id| store.sort_record(id));
    if entity.as_ref().is_some_and(|r| r.save_sort) {
        return resolve_video_sort(entity.as_ref(), None, has_rest_token);
    }
    let global = store.sort_record(GLOBAL_KEY);
    resolve_video_sort(entity.as_ref(), global.as_ref(), has_rest_token)
}
