use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StrengthTier {
    #[default]
    Weak,
    Building,
    Moderate,
    Strong,
}

impl fmt::Display for StrengthTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl StrengthTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            StrengthTier::Weak => "WEAK",
            StrengthTier::Building => "BUILDING",
            StrengthTier::Moderate => "MODERATE",
            StrengthTier::Strong => "STRONG",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SetupLabel {
    LongBuildup,
    ShortBuildup,
    LongUnwinding,
    ShortCovering,
    OiBuildupNeutral,
    OiReductionNeutral,
    PriceUpNoOi,
    PriceDownNoOi,
    Neutral,
}

impl fmt::Display for SetupLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl SetupLabel {
    pub const ALL: [SetupLabel; 9] = [
        SetupLabel::LongBuildup,
        SetupLabel::ShortBuildup,
        SetupLabel::LongUnwinding,
        SetupLabel::ShortCovering,
        SetupLabel::OiBuildupNeutral,
        SetupLabel::OiReductionNeutral,
        SetupLabel::PriceUpNoOi,
        SetupLabel::PriceDownNoOi,
        SetupLabel::Neutral,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SetupLabel::LongBuildup => "LONG_BUILDUP",
            SetupLabel::ShortBuildup => "SHORT_BUILDUP",
            SetupLabel::LongUnwinding => "LONG_UNWINDING",
            SetupLabel::ShortCovering => "SHORT_COVERING",
            SetupLabel::OiBuildupNeutral => "OI_BUILDUP_NEUTRAL",
            SetupLabel::OiReductionNeutral => "OI_REDUCTION_NEUTRAL",
            SetupLabel::PriceUpNoOi => "PRICE_UP_NO_OI",
            SetupLabel::PriceDownNoOi => "PRICE_DOWN_NO_OI",
            SetupLabel::Neutral => "NEUTRAL",
        }
    }

    /// Which side of the ranked output this label belongs to.
    pub fn lean(&self) -> Lean {
        match self {
            SetupLabel::LongBuildup | SetupLabel::ShortCovering | SetupLabel::PriceUpNoOi => {
                Lean::Bullish
            }
            SetupLabel::ShortBuildup | SetupLabel::LongUnwinding | SetupLabel::PriceDownNoOi => {
                Lean::Bearish
            }
            SetupLabel::OiBuildupNeutral
            | SetupLabel::OiReductionNeutral
            | SetupLabel::Neutral => Lean::Neutral,
        }
    }

    /// Fresh positions entering in a direction.
    pub fn is_buildup(&self) -> bool {
        matches!(self, SetupLabel::LongBuildup | SetupLabel::ShortBuildup)
    }

    /// Labels backed by an OI move together with a directional price move.
    pub fn is_oi_driven(&self) -> bool {
        matches!(
            self,
            SetupLabel::LongBuildup
                | SetupLabel::ShortBuildup
                | SetupLabel::LongUnwinding
                | SetupLabel::ShortCovering
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lean {
    Bullish,
    Bearish,
    Neutral,
}

impl fmt::Display for Lean {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lean::Bullish => write!(f, "bullish"),
            Lean::Bearish => write!(f, "bearish"),
            Lean::Neutral => write!(f, "neutral"),
        }
    }
}

/// A classified setup. `strong` marks a buildup backed by a STRONG OI trend and a trending ADX.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Setup {
    pub label: SetupLabel,
    #[serde(default)]
    pub strong: bool,
}

impl Setup {
    pub fn new(label: SetupLabel) -> Self {
        Self {
            label,
            strong: false,
        }
    }
}

impl Default for Setup {
    fn default() -> Self {
        Setup::new(SetupLabel::Neutral)
    }
}

impl fmt::Display for Setup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.strong {
            write!(f, "{} (STRONG)", self.label)
        } else {
            write!(f, "{}", self.label)
        }
    }
}

/// Overall market direction read from a benchmark index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarketBias {
    Bullish,
    Bearish,
    Sideways,
}

impl fmt::Display for MarketBias {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarketBias::Bullish => write!(f, "BULLISH"),
            MarketBias::Bearish => write!(f, "BEARISH"),
            MarketBias::Sideways => write!(f, "SIDEWAYS"),
        }
    }
}

impl MarketBias {
    pub fn from_change_pct(change_pct: f64, band_pct: f64) -> Self {
        if change_pct > band_pct {
            MarketBias::Bullish
        } else if change_pct < -band_pct {
            MarketBias::Bearish
        } else {
            MarketBias::Sideways
        }
    }
}
