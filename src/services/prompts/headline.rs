//! Headline tournament prompt.
//!
//! Headlines are listed 1-based; every index in the prompt and the expected
//! response refers to that numbering.

use super::{brief_section, build_persona_system_prompt, Prompt, GUT_REACTION_MAX_WORDS};
use crate::models::{Brief, PersonaContext};
use crate::services::generation::validator::REQUIRED_PICKS;

pub fn build_headline_prompt(
    context: &PersonaContext,
    headlines: &[String],
    brief: Option<&Brief>,
) -> Prompt {
    let count = headlines.len();
    let picks = count.min(REQUIRED_PICKS);

    let listing = headlines
        .iter()
        .enumerate()
        .map(|(i, h)| format!("{}. {}", i + 1, h.trim()))
        .collect::<Vec<_>>()
        .join("\n");

    let user = format!(
        "{brief}## The Headlines\n{listing}\n\n\
         ## Your Task\n\
         Read every headline as yourself. Refer to headlines only by their number (1 to {count}).\n\
         - top_3: your {picks} favourite headlines, best first, each with why_it_works\n\
         - bottom_3: your {picks} least favourite headlines, worst first, each with why_it_fails\n\
         - all_ratings: a score from 1 to 10 for EVERY headline, exactly one entry per number\n\
         - overall_winner: the single number you would pick above all others\n\
         - gut_reaction: your overall reaction in your own words, at most {max_words} words\n\n\
         Respond with this JSON shape:\n\
         {{\n  \"top_3\": [{{\"headline_index\": 1, \"why_it_works\": \"...\"}}],\n  \
         \"bottom_3\": [{{\"headline_index\": 2, \"why_it_fails\": \"...\"}}],\n  \
         \"all_ratings\": [{{\"headline_index\": 1, \"score\": 7}}],\n  \
         \"overall_winner\": 1,\n  \"gut_reaction\": \"...\"\n}}",
        brief = brief_section(brief),
        listing = listing,
        count = count,
        picks = picks,
        max_words = GUT_REACTION_MAX_WORDS,
    );

    Prompt {
        system: build_persona_system_prompt(context),
        user,
    }
}
