//! Typed query filters shared by both backends
//!
//! Each filter knows the exact string it serializes to on each backend;
//! GraphQL uses upper-case enum names, Helix uses lower-case query values.

use serde::{Deserialize, Serialize};

/// Video sort order
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoSort {
    Time,
    #[default]
    Views,
}

impl VideoSort {
    #[must_use]
    pub const fn gql_value(&self) -> &'static str {
        match self {
            Self::Time => "TIME",
            Self::Views => "VIEWS",
        }
    }

    #[must_use]
    pub const fn helix_value(&self) -> &'static str {
        match self {
            Self::Time => "time",
            Self::Views => "views",
        }
    }

    /// Parse a stored preference value (case-insensitive)
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "time" => Some(Self::Time),
            "views" => Some(Self::Views),
            _ => None,
        }
    }
}

/// Time window for video and clip listings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoPeriod {
    Day,
    #[default]
    Week,
    Month,
    All,
}

impl VideoPeriod {
    #[must_use]
    pub const fn helix_value(&self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
            Self::All => "all",
        }
    }

    /// Clip filter used by the `ClipsCards__*` operations
    #[must_use]
    pub const fn gql_clip_filter(&self) -> &'static str {
        match self {
            Self::Day => "LAST_DAY",
            Self::Week => "LAST_WEEK",
            Self::Month => "LAST_MONTH",
            Self::All => "ALL_TIME",
        }
    }

    /// Length of the window, `None` for all time
    #[must_use]
    pub fn duration(&self) -> Option<chrono::Duration> {
        match self {
            Self::Day => Some(chrono::Duration::days(1)),
            Self::Week => Some(chrono::Duration::weeks(1)),
            Self::Month => Some(chrono::Duration::days(30)),
            Self::All => None,
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "day" => Some(Self::Day),
            "week" => Some(Self::Week),
            "month" => Some(Self::Month),
            "all" => Some(Self::All),
            _ => None,
        }
    }
}

/// Broadcast type of a video. Absent filter means all types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BroadcastType {
    Archive,
    Highlight,
    Upload,
}

impl BroadcastType {
    #[must_use]
    pub const fn gql_value(&self) -> &'static str {
        match self {
            Self::Archive => "ARCHIVE",
            Self::Highlight => "HIGHLIGHT",
            Self::Upload => "UPLOAD",
        }
    }

    #[must_use]
    pub const fn helix_value(&self) -> &'static str {
        match self {
            Self::Archive => "archive",
            Self::Highlight => "highlight",
            Self::Upload => "upload",
        }
    }

    /// Parse either backend's spelling; `"all"` and unknown values yield `None`
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "archive" => Some(Self::Archive),
            "highlight" => Some(Self::Highlight),
            "upload" => Some(Self::Upload),
            _ => None,
        }
    }
}

/// Stream directory sort
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamSort {
    #[default]
    ViewerCount,
    Recent,
}

impl StreamSort {
    #[must_use]
    pub const fn gql_value(&self) -> &'static str {
        match self {
            Self::ViewerCount => "VIEWER_COUNT",
            Self::Recent => "RECENT",
        }
    }
}
