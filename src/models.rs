//! Data models and structures
//!
//! Defines the core value types for generation requests, the enumerated
//! size/style settings, and the wire types exchanged with the FusionBrain
//! API.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Allowed output dimensions for a generation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageSize {
    Square,
    Portrait,
    Landscape,
}

impl ImageSize {
    pub fn dimensions(self) -> (u32, u32) {
        match self {
            ImageSize::Square => (1024, 1024),
            ImageSize::Portrait => (1024, 1536),
            ImageSize::Landscape => (1536, 1024),
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            ImageSize::Square => "square",
            ImageSize::Portrait => "portrait",
            ImageSize::Landscape => "landscape",
        }
    }

    /// Parse a settings key as received from the presentation layer.
    pub fn from_key(key: &str) -> Result<Self> {
        match key {
            "square" => Ok(ImageSize::Square),
            "portrait" => Ok(ImageSize::Portrait),
            "landscape" => Ok(ImageSize::Landscape),
            other => Err(Error::Validation(format!("Unknown image size: {}", other))),
        }
    }

    pub const ALL: [ImageSize; 3] = [ImageSize::Square, ImageSize::Portrait, ImageSize::Landscape];
}

impl Default for ImageSize {
    fn default() -> Self {
        ImageSize::Square
    }
}

/// Visual style applied to a prompt via a fixed prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Style {
    Default,
    Anime,
    Cyberpunk,
    Watercolor,
    OilPainting,
    Retro,
}

impl Style {
    /// Fixed prefix concatenated in front of the user's text. Empty for the
    /// default style, so concatenation is a no-op there.
    pub fn prompt_prefix(self) -> &'static str {
        match self {
            Style::Default => "",
            Style::Anime => "anime style, manga art, japanese animation, ",
            Style::Cyberpunk => "cyberpunk style, neon lights, futuristic, high tech, ",
            Style::Watercolor => "watercolor painting style, soft colors, artistic, ",
            Style::OilPainting => "oil painting style, textured, classical art, ",
            Style::Retro => "retro style, vintage aesthetics, old school design, nostalgic feel, ",
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            Style::Default => "default",
            Style::Anime => "anime",
            Style::Cyberpunk => "cyberpunk",
            Style::Watercolor => "watercolor",
            Style::OilPainting => "oil_painting",
            Style::Retro => "retro",
        }
    }

    pub fn from_key(key: &str) -> Result<Self> {
        match key {
            "default" => Ok(Style::Default),
            "anime" => Ok(Style::Anime),
            "cyberpunk" => Ok(Style::Cyberpunk),
            "watercolor" => Ok(Style::Watercolor),
            "oil_painting" => Ok(Style::OilPainting),
            "retro" => Ok(Style::Retro),
            other => Err(Error::Validation(format!("Unknown style: {}", other))),
        }
    }

    pub const ALL: [Style; 6] = [
        Style::Default,
        Style::Anime,
        Style::Cyberpunk,
        Style::Watercolor,
        Style::OilPainting,
        Style::Retro,
    ];
}

impl Default for Style {
    fn default() -> Self {
        Style::Default
    }
}

/// Immutable description of one generation request. Built once per user
/// action; a regeneration constructs a fresh request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub model_id: i64,
    pub size: ImageSize,
    pub style: Style,
}

// FusionBrain API request/response models

#[derive(Debug, Clone, Deserialize)]
pub struct ModelInfo {
    pub id: i64,
    pub name: String,
    pub version: f64,
}

#[derive(Debug, Serialize)]
pub struct GenerateParams {
    pub query: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitParams {
    #[serde(rename = "type")]
    pub kind: String,
    pub num_images: u32,
    pub width: u32,
    pub height: u32,
    pub generate_params: GenerateParams,
}

#[derive(Debug, Deserialize)]
pub struct SubmitResponse {
    pub uuid: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StatusResponse {
    pub status: String,
    #[serde(default)]
    pub images: Option<Vec<String>>,
    #[serde(default)]
    pub error: Option<String>,
}

// Configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: String,
    pub secret_key: String,
    pub base_url: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            api_key: std::env::var("FUSIONBRAIN_API_KEY")
                .map_err(|_| Error::Validation("FUSIONBRAIN_API_KEY not set".to_string()))?,
            secret_key: std::env::var("FUSIONBRAIN_SECRET_KEY")
                .map_err(|_| Error::Validation("FUSIONBRAIN_SECRET_KEY not set".to_string()))?,
            base_url: std::env::var("FUSIONBRAIN_BASE_URL")
                .unwrap_or_else(|_| "https://api-key.fusionbrain.ai".to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_keys_round_trip() {
        for size in ImageSize::ALL {
            assert_eq!(ImageSize::from_key(size.key()).unwrap(), size);
        }
        assert!(matches!(
            ImageSize::from_key("banner"),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn test_style_keys_round_trip() {
        for style in Style::ALL {
            assert_eq!(Style::from_key(style.key()).unwrap(), style);
        }
        assert!(matches!(
            Style::from_key("pixel_art"),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn test_default_style_has_empty_prefix() {
        assert!(Style::Default.prompt_prefix().is_empty());
        assert!(!Style::Anime.prompt_prefix().is_empty());
    }

    #[test]
    fn test_submit_params_serialization() {
        let params = SubmitParams {
            kind: "GENERATE".to_string(),
            num_images: 1,
            width: 1024,
            height: 1024,
            generate_params: GenerateParams {
                query: "a red fox".to_string(),
            },
        };

        let json = serde_json::to_string(&params).unwrap();
        assert!(json.contains("\"type\":\"GENERATE\""));
        assert!(json.contains("\"numImages\":1"));
        assert!(json.contains("\"generateParams\":{\"query\":\"a red fox\"}"));
    }

    #[test]
    fn test_status_response_without_images() {
        let response: StatusResponse =
            serde_json::from_str(r#"{"status": "PROCESSING"}"#).unwrap();
        assert_eq!(response.status, "PROCESSING");
        assert!(response.images.is_none());
        assert!(response.error.is_none());
    }
}
