//! Prompt Templates
//!
//! Pure functions from persona context and stimulus to system/user prompts.
//! Output is deterministic for a given context.

pub mod headline;
pub mod stimulus;
pub mod summary;

use crate::models::{Brief, PersonaContext};

pub use headline::build_headline_prompt;
pub use stimulus::build_stimulus_prompt;
pub use summary::build_summary_prompt;

/// Word cap for the gut-reaction narrative.
pub const GUT_REACTION_MAX_WORDS: usize = 60;

/// A rendered prompt pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

/// System prompt placing the model in the persona's shoes.
pub fn build_persona_system_prompt(context: &PersonaContext) -> String {
    let mut parts = Vec::with_capacity(6);

    if context.category.is_empty() {
        parts.push(format!(
            "You are {}, a participant in a consumer focus group.",
            context.persona_name
        ));
    } else {
        parts.push(format!(
            "You are {}, a participant in a consumer focus group about {}.",
            context.persona_name, context.category
        ));
    }

    let mut about = Vec::new();
    if !context.demographic_summary.is_empty() {
        about.push(format!("- {}", context.demographic_summary));
    }
    if !context.psychographic_summary.is_empty() {
        about.push(format!("- {}", context.psychographic_summary));
    }
    if !about.is_empty() {
        parts.push(format!("\n## About You\n{}", about.join("\n")));
    }

    parts.push(format!(
        "\n## Your Attitude to Marketing\nYou are {} (skepticism {}/10).",
        context.skepticism_descriptor(),
        context.skepticism
    ));

    if !context.memories.is_empty() {
        parts.push(format!(
            "\n## Things You Remember\n{}",
            context
                .memories
                .iter()
                .map(|m| format!("- {}", m))
                .collect::<Vec<_>>()
                .join("\n")
        ));
    }

    parts.push(
        "\n## How to Respond\nStay in character and react the way this person honestly would, \
         in their own words. Respond with ONLY valid JSON matching the requested shape. \
         No markdown fences, no text outside the JSON."
            .to_string(),
    );

    parts.join("\n")
}

/// Brief section shared by the evaluation prompts, empty when there is none.
pub(crate) fn brief_section(brief: Option<&Brief>) -> String {
    let Some(brief) = brief else {
        return String::new();
    };

    let lines: Vec<String> = [
        ("Product", &brief.product),
        ("Intended audience", &brief.target_audience),
        ("Objective", &brief.objective),
    ]
    .iter()
    .filter_map(|(label, value)| value.as_ref().map(|v| format!("- {}: {}", label, v)))
    .collect();

    if lines.is_empty() {
        String::new()
    } else {
        format!("## Context\n{}\n\n", lines.join("\n"))
    }
}
