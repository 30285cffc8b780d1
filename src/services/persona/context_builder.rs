//! Persona Context Builder
//!
//! Realises an archetype into the persona voiced for one generation call.

use rand::seq::SliceRandom;
use rand::Rng;

use super::memory_selection::select_memories;
use crate::models::{Archetype, Calibration, PersonaContext, Stimulus};
use crate::storage::Store;
use crate::utils::error::PanelResult;

/// Inputs shared by every persona in a run.
#[derive(Debug, Clone, Copy)]
pub struct ContextRequest<'a> {
    pub stimulus: &'a Stimulus,
    pub category: &'a str,
    pub calibration: Calibration,
    pub memory_limit: usize,
}

/// Build a persona context from a resolved archetype.
pub fn build_context<R: Rng + ?Sized>(
    archetype: &Archetype,
    request: &ContextRequest<'_>,
    rng: &mut R,
) -> PersonaContext {
    let persona_name = match archetype.persona_names.choose(rng) {
        Some(first_name) => format!("{} ({})", first_name, archetype.name),
        None => archetype.name.clone(),
    };

    let mut search_text = request.stimulus.searchable_text();
    if !request.category.is_empty() {
        search_text.push('\n');
        search_text.push_str(request.category);
    }
    let memories = select_memories(&archetype.memories, &search_text, request.memory_limit, rng);

    PersonaContext {
        archetype_id: archetype.id.clone(),
        archetype_name: archetype.name.clone(),
        persona_name,
        demographic_summary: demographic_summary(archetype),
        psychographic_summary: psychographic_summary(archetype),
        category: request.category.to_string(),
        skepticism: request.calibration.apply(archetype.baseline_skepticism),
        memories,
    }
}

/// Resolve an archetype, surfacing `NotFound` from the store.
pub async fn resolve_archetype(store: &dyn Store, archetype_id: &str) -> PanelResult<Archetype> {
    store.get_archetype(archetype_id).await
}

fn demographic_summary(archetype: &Archetype) -> String {
    archetype
        .demographics
        .iter()
        .map(|(key, value)| format!("{}: {}", key, value))
        .collect::<Vec<_>>()
        .join(", ")
}

fn psychographic_summary(archetype: &Archetype) -> String {
    let psych = &archetype.psychographics;
    [
        ("Values", &psych.values),
        ("Motivations", &psych.motivations),
        ("Pain points", &psych.pain_points),
    ]
    .iter()
    .filter(|(_, items)| !items.is_empty())
    .map(|(label, items)| format!("{}: {}.", label, items.join(", ")))
    .collect::<Vec<_>>()
    .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ArchetypeMemory, Psychographics};
    use crate::storage::SqliteStore;
    use crate::utils::error::PanelError;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::BTreeMap;

    fn archetype() -> Archetype {
        let mut demographics = BTreeMap::new();
        demographics.insert("age".to_string(), "38".to_string());
        demographics.insert("household".to_string(), "two kids".to_string());

        Archetype {
            id: "parent".to_string(),
            name: "Budget-Conscious Parent".to_string(),
            demographics,
            psychographics: Psychographics {
                values: vec!["thrift".to_string(), "family time".to_string()],
                motivations: vec![],
                pain_points: vec!["hidden fees".to_string()],
            },
            baseline_skepticism: 6,
            persona_names: vec!["Dana".to_string(), "Marcus".to_string()],
            memories: vec![ArchetypeMemory {
                text: "A meal kit charged me twice".to_string(),
                trigger_words: vec!["meal".to_string(), "kit".to_string()],
            }],
        }
    }

    fn stimulus() -> Stimulus {
        Stimulus::Text {
            content: "The meal kit that pays for itself".to_string(),
            brief: None,
        }
    }

    #[test]
    fn test_build_context() {
        let stimulus = stimulus();
        let request = ContextRequest {
            stimulus: &stimulus,
            category: "meal kits",
            calibration: Calibration::Skeptical,
            memory_limit: 3,
        };
        let mut rng = StdRng::seed_from_u64(3);
        let ctx = build_context(&archetype(), &request, &mut rng);

        assert!(ctx.persona_name.ends_with("(Budget-Conscious Parent)"));
        assert_eq!(ctx.skepticism, 8);
        assert_eq!(ctx.demographic_summary, "age: 38, household: two kids");
        assert_eq!(
            ctx.psychographic_summary,
            "Values: thrift, family time. Pain points: hidden fees."
        );
        assert_eq!(ctx.memories, vec!["A meal kit charged me twice".to_string()]);
        assert_eq!(ctx.category, "meal kits");
    }

    #[test]
    fn test_persona_name_falls_back_to_archetype() {
        let mut bare = archetype();
        bare.persona_names.clear();
        let stimulus = stimulus();
        let request = ContextRequest {
            stimulus: &stimulus,
            category: "",
            calibration: Calibration::Standard,
            memory_limit: 0,
        };
        let ctx = build_context(&bare, &request, &mut StdRng::seed_from_u64(0));
        assert_eq!(ctx.persona_name, "Budget-Conscious Parent");
        assert!(ctx.memories.is_empty());
    }

    #[tokio::test]
    async fn test_resolve_archetype() {
        let store = SqliteStore::new_in_memory().unwrap();
        store.upsert_archetype(&archetype()).await.unwrap();

        let found = resolve_archetype(&store, "parent").await.unwrap();
        assert_eq!(found.name, "Budget-Conscious Parent");

        let err = resolve_archetype(&store, "missing").await.unwrap_err();
        assert!(matches!(err, PanelError::NotFound(_)));
    }
}
