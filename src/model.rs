use crate::error::FetchError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Identifier of a track within one fetched collection.
///
/// The service may send either numbers or strings. Numeric ids order before text
/// ids and compare numerically, so `2` sorts ahead of `10`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TrackId {
    Numeric(u64),
    Text(String),
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Numeric(value) => write!(f, "{value}"),
            Self::Text(value) => f.write_str(value),
        }
    }
}

impl From<u64> for TrackId {
    fn from(value: u64) -> Self {
        Self::Numeric(value)
    }
}

impl From<&str> for TrackId {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// One track's listening statistics for the current month.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackRecord {
    pub id: TrackId,
    pub album_art_url: String,
    pub title: String,
    pub listen_count: u64,
    pub time_listened_seconds: u64,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WireId {
    Number(u64),
    Text(String),
}

#[derive(Debug, Deserialize)]
struct WireTrackRecord {
    id: WireId,
    #[serde(default)]
    album_art_url: Option<String>,
    title: String,
    listen_count: u64,
    time_listened: u64,
}

impl From<WireTrackRecord> for TrackRecord {
    fn from(wire: WireTrackRecord) -> Self {
        Self {
            id: match wire.id {
                WireId::Number(value) => TrackId::Numeric(value),
                WireId::Text(value) => TrackId::Text(value),
            },
            album_art_url: wire.album_art_url.unwrap_or_default(),
            title: wire.title,
            listen_count: wire.listen_count,
            time_listened_seconds: wire.time_listened,
        }
    }
}

/// Decodes the `/api/listen-data` body into typed records, preserving order.
///
/// Every record must carry an id, a title and both non-negative counters; ids must
/// be unique within the payload.
pub fn decode_listen_data(body: &[u8]) -> Result<Vec<TrackRecord>, FetchError> {
    let values: Vec<serde_json::Value> = serde_json::from_slice(body)
        .map_err(|err| FetchError::Parse(format!("expected a JSON array of tracks: {err}")))?;

    let mut seen = HashSet::with_capacity(values.len());
    let mut records = Vec::with_capacity(values.len());
    for (index, value) in values.into_iter().enumerate() {
        let wire: WireTrackRecord = serde_json::from_value(value)
            .map_err(|err| FetchError::Parse(format!("record {index}: {err}")))?;
        let record = TrackRecord::from(wire);
        if !seen.insert(record.id.clone()) {
            return Err(FetchError::Parse(format!(
                "record {index}: duplicate id {}",
                record.id
            )));
        }
        records.push(record);
    }
    Ok(records)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Theme {
    #[default]
    Dark,
    PitchBlack,
    Galaxy,
    CottonCandy,
}

impl Theme {
    pub fn next(self) -> Self {
        match self {
            Self::Dark => Self::PitchBlack,
            Self::PitchBlack => Self::Galaxy,
            Self::Galaxy => Self::CottonCandy,
            Self::CottonCandy => Self::Dark,
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "dark" => Some(Self::Dark),
            "black" | "pitchblack" | "pitch-black" => Some(Self::PitchBlack),
            "galaxy" => Some(Self::Galaxy),
            "candy" | "cottoncandy" | "cotton-candy" => Some(Self::CottonCandy),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Settings {
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_display_name")]
    pub display_name: String,
    #[serde(default)]
    pub theme: Theme,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_api_base_url() -> String {
    String::from("http://127.0.0.1:5000")
}

fn default_display_name() -> String {
    String::from("listener")
}

fn default_request_timeout_secs() -> u64 {
    15
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            display_name: default_display_name(),
            theme: Theme::default(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}
