//! Memory Selection
//!
//! Picks the archetype memories most relevant to a stimulus by trigger-word
//! overlap, falling back to a random sample when nothing overlaps.

use std::collections::HashSet;

use focus_panel_core::keywords::{extract_keywords, tokenize};
use rand::seq::SliceRandom;
use rand::Rng;

use crate::models::ArchetypeMemory;

/// Number of a memory's trigger words present in `keywords`.
///
/// Multi-word triggers count when every word is present.
pub fn relevance_score(memory: &ArchetypeMemory, keywords: &HashSet<String>) -> usize {
    memory
        .trigger_words
        .iter()
        .filter(|trigger| {
            let words = tokenize(trigger);
            !words.is_empty() && words.iter().all(|w| keywords.contains(w))
        })
        .count()
}

/// Select up to `limit` memory texts for a stimulus.
///
/// Memories with a positive score are returned highest first, ties in their
/// original order. When none scores above zero, a random sample is drawn.
pub fn select_memories<R: Rng + ?Sized>(
    memories: &[ArchetypeMemory],
    stimulus_text: &str,
    limit: usize,
    rng: &mut R,
) -> Vec<String> {
    if limit == 0 || memories.is_empty() {
        return Vec::new();
    }

    let keywords: HashSet<String> = extract_keywords(stimulus_text).into_iter().collect();

    let mut scored: Vec<(usize, &ArchetypeMemory)> = memories
        .iter()
        .map(|m| (relevance_score(m, &keywords), m))
        .filter(|(score, _)| *score > 0)
        .collect();

    if scored.is_empty() {
        return memories
            .choose_multiple(rng, limit)
            .map(|m| m.text.clone())
            .collect();
    }

    // sort_by is stable
    scored.sort_by(|a, b| b.0.cmp(&a.0));
    scored
        .into_iter()
        .take(limit)
        .map(|(_, m)| m.text.clone())
        .collect()
}
