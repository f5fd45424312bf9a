//! Render quality tiers.
//!
//! Each tier maps to one renderer flag and one output directory name.
//! Parsing is fail-open: an unrecognized code selects [`QualityTier::Low`].

use std::fmt;

use serde::{Deserialize, Serialize};

/// One of the five render presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum QualityTier {
    /// 854x480, 15 fps.
    #[default]
    Low,
    /// 1280x720, 30 fps.
    Medium,
    /// 1920x1080, 60 fps.
    High,
    /// 2560x1440, 60 fps.
    TwoK,
    /// 3840x2160, 60 fps.
    FourK,
}

impl QualityTier {
    pub const ALL: [QualityTier; 5] = [
        QualityTier::Low,
        QualityTier::Medium,
        QualityTier::High,
        QualityTier::TwoK,
        QualityTier::FourK,
    ];

    /// Parse a quality code, defaulting to `Low` for anything unrecognized.
    ///
    /// Accepts the single-letter codes `l m h p k` and the long names
    /// `low medium high 2k 4k`, case-insensitively.
    pub fn from_code(code: &str) -> Self {
        match code.trim().to_ascii_lowercase().as_str() {
            "l" | "low" => Self::Low,
            "m" | "medium" => Self::Medium,
            "h" | "high" => Self::High,
            "p" | "2k" => Self::TwoK,
            "k" | "4k" => Self::FourK,
            other => {
                tracing::debug!(code = other, "Unrecognized quality code, using low");
                Self::Low
            }
        }
    }

    /// Single-letter code.
    pub fn code(self) -> &'static str {
        match self {
            Self::Low => "l",
            Self::Medium => "m",
            Self::High => "h",
            Self::TwoK => "p",
            Self::FourK => "k",
        }
    }

    /// Renderer command-line flag.
    pub fn flag(self) -> &'static str {
        match self {
            Self::Low => "-ql",
            Self::Medium => "-qm",
            Self::High => "-qh",
            Self::TwoK => "-qp",
            Self::FourK => "-qk",
        }
    }

    /// Directory the renderer writes this tier's videos into.
    pub fn directory(self) -> &'static str {
        match self {
            Self::Low => "480p15",
            Self::Medium => "720p30",
            Self::High => "1080p60",
            Self::TwoK => "1440p60",
            Self::FourK => "2160p60",
        }
    }

    /// Human-readable label.
    pub fn label(self) -> &'static str {
        match self {
            Self::Low => "480P (854x480 15FPS)",
            Self::Medium => "720P (1280x720 30FPS)",
            Self::High => "1080P (1920x1080 60FPS)",
            Self::TwoK => "2K (2560x1440 60FPS)",
            Self::FourK => "4K (3840x2160 60FPS)",
        }
    }
}

/// Flag for a raw quality code; unknown codes get the low-quality flag.
pub fn quality_flag(code: &str) -> &'static str {
    QualityTier::from_code(code).flag()
}

/// Output directory for a raw quality code; unknown codes get the low-quality directory.
pub fn quality_directory(code: &str) -> &'static str {
    QualityTier::from_code(code).directory()
}

impl fmt::Display for QualityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl From<String> for QualityTier {
    fn from(code: String) -> Self {
        Self::from_code(&code)
    }
}

impl From<QualityTier> for String {
    fn from(tier: QualityTier) -> Self {
        tier.code().to_string()
    }
}
