//! Panel summary prompt for free-form stimulus insights.

use super::{brief_section, Prompt};
use crate::models::{Brief, EvaluationPayload, PersonaResponse};

const SUMMARY_SYSTEM_PROMPT: &str = "You are an experienced focus-group moderator writing up a \
panel for a creative team. Base every point strictly on what the participants said; do not \
invent reactions. Respond with ONLY valid JSON matching the requested shape. No markdown fences, \
no text outside the JSON.";

pub fn build_summary_prompt(
    content: &str,
    brief: Option<&Brief>,
    responses: &[PersonaResponse],
) -> Prompt {
    let transcript = responses
        .iter()
        .filter_map(|r| match &r.evaluation {
            EvaluationPayload::Stimulus(eval) => Some((r, eval)),
            EvaluationPayload::Headline(_) => None,
        })
        .map(|(r, eval)| {
            format!(
                "### {}\n- Gut reaction: {}\n- Feeling: {}\n- Purchase intent: {}/10\n\
                 - Credibility: {}/10\n- What works: {}\n- Concerns: {}",
                r.persona_name,
                eval.gut_reaction,
                eval.emotional_response,
                eval.purchase_intent,
                eval.credibility_rating,
                join_or_none(&eval.what_works),
                join_or_none(&eval.concerns),
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    let user = format!(
        "{brief}## The Marketing Copy\n\"\"\"\n{content}\n\"\"\"\n\n\
         ## Panel Responses\n{transcript}\n\n\
         ## Your Task\n\
         Summarise the panel into:\n\
         - strengths: what landed, each with confidence (high, medium or low)\n\
         - weaknesses: what hurt the copy, each with severity (high, medium or low)\n\
         - recommendations: concrete changes, each with priority (high, medium or low)\n\n\
         Respond with this JSON shape:\n\
         {{\n  \"strengths\": [{{\"point\": \"...\", \"confidence\": \"high\"}}],\n  \
         \"weaknesses\": [{{\"point\": \"...\", \"severity\": \"medium\"}}],\n  \
         \"recommendations\": [{{\"action\": \"...\", \"priority\": \"high\"}}]\n}}",
        brief = brief_section(brief),
        content = content.trim(),
        transcript = transcript,
    );

    Prompt {
        system: SUMMARY_SYSTEM_PROMPT.to_string(),
        user,
    }
}

fn join_or_none(items: &[String]) -> String {
    if items.is_empty() {
        "(none)".to_string()
    } else {
        items.join("; ")
    }
}
