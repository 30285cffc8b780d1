//! Stimulus Models
//!
//! The marketing content under test: free text or an ordered list of headlines.

use serde::{Deserialize, Serialize};

/// Optional creative brief accompanying a stimulus.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Brief {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_audience: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub objective: Option<String>,
    /// Known literal-interpretation readings the creative team worries about,
    /// e.g. "free means no cost at all"
    #[serde(default)]
    pub red_flag_patterns: Vec<String>,
}

/// Which evaluation flow a stimulus drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StimulusKind {
    Text,
    Headlines,
}

/// Immutable input to a test run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Stimulus {
    Text {
        content: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        brief: Option<Brief>,
    },
    Headlines {
        headlines: Vec<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        brief: Option<Brief>,
    },
}

impl Stimulus {
    pub fn kind(&self) -> StimulusKind {
        match self {
            Stimulus::Text { .. } => StimulusKind::Text,
            Stimulus::Headlines { .. } => StimulusKind::Headlines,
        }
    }

    pub fn brief(&self) -> Option<&Brief> {
        match self {
            Stimulus::Text { brief, .. } | Stimulus::Headlines { brief, .. } => brief.as_ref(),
        }
    }

    /// Red-flag patterns from the brief, empty when there is no brief.
    pub fn red_flag_patterns(&self) -> &[String] {
        self.brief()
            .map(|b| b.red_flag_patterns.as_slice())
            .unwrap_or(&[])
    }

    /// All stimulus text in one string, used for memory keyword matching.
    pub fn searchable_text(&self) -> String {
        match self {
            Stimulus::Text { content, .. } => content.clone(),
            Stimulus::Headlines { headlines, .. } => headlines.join("\n"),
        }
    }

    /// Headline count for tournaments, `None` for free text.
    pub fn headline_count(&self) -> Option<usize> {
        match self {
            Stimulus::Headlines { headlines, .. } => Some(headlines.len()),
            Stimulus::Text { .. } => None,
        }
    }

    /// Check the stimulus is usable before a run starts.
    pub fn validate(&self) -> Result<(), String> {
        match self {
            Stimulus::Text { content, .. } => {
                if content.trim().is_empty() {
                    return Err("stimulus text is empty".to_string());
                }
            }
            Stimulus::Headlines { headlines, .. } => {
                if headlines.is_empty() {
                    return Err("headline list is empty".to_string());
                }
                if let Some(pos) = headlines.iter().position(|h| h.trim().is_empty()) {
                    return Err(format!("headline {} is blank", pos + 1));
                }
            }
        }
        Ok(())
    }
}
