use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Media categories the scraper can collect. The serialized tokens are part of
/// the wire contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Audio,
    Img,
    Pdf,
    Svg,
    Video,
}

impl MediaType {
    /// Canonical order, which is also the tab order.
    pub const ALL: [MediaType; 5] = [
        MediaType::Audio,
        MediaType::Img,
        MediaType::Pdf,
        MediaType::Svg,
        MediaType::Video,
    ];

    pub fn token(self) -> &'static str {
        match self {
            MediaType::Audio => "audio",
            MediaType::Img => "img",
            MediaType::Pdf => "pdf",
            MediaType::Svg => "svg",
            MediaType::Video => "video",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            MediaType::Audio => "Audio",
            MediaType::Img => "Images",
            MediaType::Pdf => "PDF",
            MediaType::Svg => "SVG",
            MediaType::Video => "Video",
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown media type {0:?}")]
pub struct UnknownMediaType(pub String);

impl FromStr for MediaType {
    type Err = UnknownMediaType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim();
        MediaType::ALL
            .into_iter()
            .find(|media_type| media_type.token().eq_ignore_ascii_case(token))
            .ok_or_else(|| UnknownMediaType(s.to_string()))
    }
}

/// A discovered media resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MediaAsset {
    pub url: String,
    #[serde(rename = "type")]
    pub media_type: MediaType,
}

impl MediaAsset {
    pub fn new(url: impl Into<String>, media_type: MediaType) -> Self {
        Self {
            url: url.into(),
            media_type,
        }
    }
}
