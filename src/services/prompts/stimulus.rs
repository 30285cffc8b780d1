//! Free-form stimulus evaluation prompt.

use super::{brief_section, build_persona_system_prompt, Prompt, GUT_REACTION_MAX_WORDS};
use crate::models::{Brief, PersonaContext};

pub fn build_stimulus_prompt(
    context: &PersonaContext,
    content: &str,
    brief: Option<&Brief>,
) -> Prompt {
    let user = format!(
        "{brief}## The Marketing Copy\n\"\"\"\n{content}\n\"\"\"\n\n\
         ## Your Task\n\
         Read the copy above as yourself and react honestly.\n\
         - gut_reaction: your first reaction in your own words, at most {max_words} words\n\
         - emotional_response: one or two words for how it makes you feel\n\
         - purchase_intent: how likely you are to buy, 1 (never) to 10 (definitely)\n\
         - credibility_rating: how believable the claims are, 1 (not at all) to 10 (completely)\n\
         - what_works: short phrases for what appeals to you (may be empty)\n\
         - concerns: short phrases for what puts you off or worries you (may be empty)\n\n\
         Respond with this JSON shape:\n\
         {{\n  \"gut_reaction\": \"...\",\n  \"emotional_response\": \"...\",\n  \
         \"purchase_intent\": 5,\n  \"credibility_rating\": 5,\n  \
         \"what_works\": [\"...\"],\n  \"concerns\": [\"...\"]\n}}",
        brief = brief_section(brief),
        content = content.trim(),
        max_words = GUT_REACTION_MAX_WORDS,
    );

    Prompt {
        system: build_persona_system_prompt(context),
        user,
    }
}
