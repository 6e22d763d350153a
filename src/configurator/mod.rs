//! Assistant configurator: business analysis, voice recommendations and
//! one-shot assistant creation. These back the `/configurator-tools/*`
//! routes that the webhook function-call tools forward to.

pub mod analysis;
pub mod assistant;
pub mod voices;

use serde::Serialize;

pub use self::analysis::{BusinessAnalysis, BusinessSize, SectorTemplate, analyze_business};
pub use self::assistant::{AssistantRequest, CreatedAssistant, create_complete_assistant};
pub use self::voices::{VoiceRecommendations, recommend_voices};

/// Business sectors the configurator knows about. Declaration order is the
/// tie-break order for sector detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Sector {
    Restaurant,
    Salon,
    Ecommerce,
    Artisan,
    Service,
    Medical,
}

impl Sector {
    pub const ALL: [Sector; 6] = [
        Self::Restaurant,
        Self::Salon,
        Self::Ecommerce,
        Self::Artisan,
        Self::Service,
        Self::Medical,
    ];

    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|s| s.as_str().eq_ignore_ascii_case(raw.trim()))
    }

    /// Unknown sectors are treated as generic services.
    pub fn parse_or_default(raw: &str) -> Self {
        Self::parse(raw).unwrap_or(Self::Service)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Restaurant => "restaurant",
            Self::Salon => "salon",
            Self::Ecommerce => "ecommerce",
            Self::Artisan => "artisan",
            Self::Service => "service",
            Self::Medical => "medical",
        }
    }
}

impl std::fmt::Display for Sector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
