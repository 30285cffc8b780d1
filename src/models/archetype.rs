//! Archetype Models
//!
//! Persona templates (immutable reference data) and the per-call persona
//! context realised from them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Lowest and highest skepticism levels.
pub const SKEPTICISM_MIN: u8 = 1;
pub const SKEPTICISM_MAX: u8 = 10;

/// A persona template: demographics, psychographics and baseline skepticism.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Archetype {
    pub id: String,
    /// Segment label, e.g. "Budget-Conscious Parent"
    pub name: String,
    /// Free-form demographic facts keyed by attribute ("age", "income", ...)
    #[serde(default)]
    pub demographics: BTreeMap<String, String>,
    #[serde(default)]
    pub psychographics: Psychographics,
    /// Baseline skepticism, 1 (credulous) to 10 (hostile)
    pub baseline_skepticism: u8,
    /// First names a realised persona may be given
    #[serde(default)]
    pub persona_names: Vec<String>,
    /// Memory snippets the context builder can surface
    #[serde(default)]
    pub memories: Vec<ArchetypeMemory>,
}

/// Values, motivations and pain points for an archetype.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Psychographics {
    #[serde(default)]
    pub values: Vec<String>,
    #[serde(default)]
    pub motivations: Vec<String>,
    #[serde(default)]
    pub pain_points: Vec<String>,
}

/// A remembered experience and the words that should bring it to mind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchetypeMemory {
    pub text: String,
    #[serde(default)]
    pub trigger_words: Vec<String>,
}

/// Per-test override of an archetype's skepticism intensity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Calibration {
    /// Friendlier panel: skepticism lowered by two
    Lenient,
    /// Archetype baseline unchanged
    #[default]
    Standard,
    /// Tougher panel: skepticism raised by two
    Skeptical,
}

impl Calibration {
    fn offset(&self) -> i16 {
        match self {
            Calibration::Lenient => -2,
            Calibration::Standard => 0,
            Calibration::Skeptical => 2,
        }
    }

    /// Apply the calibration to a baseline, clamped to 1..=10.
    pub fn apply(&self, baseline: u8) -> u8 {
        let level = baseline as i16 + self.offset();
        level.clamp(SKEPTICISM_MIN as i16, SKEPTICISM_MAX as i16) as u8
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Calibration::Lenient => "lenient",
            Calibration::Standard => "standard",
            Calibration::Skeptical => "skeptical",
        }
    }
}

/// Realised persona for one generation call. Not persisted on its own.
#[derive(Debug, Clone, PartialEq)]
pub struct PersonaContext {
    pub archetype_id: String,
    pub archetype_name: String,
    /// Derived display name, e.g. "Dana (Budget-Conscious Parent)"
    pub persona_name: String,
    /// One-line demographic summary
    pub demographic_summary: String,
    /// One-line psychographic summary
    pub psychographic_summary: String,
    /// Product category under test, may be empty
    pub category: String,
    /// Calibrated skepticism, 1..=10
    pub skepticism: u8,
    /// Memory snippets chosen for this stimulus
    pub memories: Vec<String>,
}

impl PersonaContext {
    /// Prose description of the calibrated skepticism.
    pub fn skepticism_descriptor(&self) -> &'static str {
        match self.skepticism {
            0..=2 => "open and trusting; you give marketing the benefit of the doubt",
            3..=4 => "fairly receptive, though you notice obvious exaggeration",
            5..=6 => "moderately skeptical; claims need to feel believable",
            7..=8 => "highly skeptical; you look for the catch in every claim",
            _ => "deeply cynical about advertising; you assume you are being manipulated",
        }
    }
}
