//! Store Interface
//!
//! Persistence collaborator used by the orchestrator. Writes are idempotent by
//! replacement; the engine does not span transactions across them.

use async_trait::async_trait;

use crate::models::{AggregatedResult, Archetype, PersonaResponse, StatusUpdate, TestRun};
use crate::utils::error::PanelResult;

#[async_trait]
pub trait Store: Send + Sync {
    /// Fetch an archetype, `NotFound` when the id does not resolve.
    async fn get_archetype(&self, id: &str) -> PanelResult<Archetype>;

    /// Fetch a test run with its configuration and current status.
    async fn get_test_run(&self, test_id: &str) -> PanelResult<TestRun>;

    /// Write a lifecycle status. `None` fields in the update keep stored values.
    ///
    /// The write is a compare-and-set on the stored status: a transition the
    /// lifecycle does not allow from the current status fails with
    /// `InvalidState`, so at most one caller can move a test out of `draft`.
    async fn set_test_status(&self, test_id: &str, update: StatusUpdate) -> PanelResult<()>;

    /// Replace the persona responses stored for a test.
    async fn insert_persona_responses(
        &self,
        test_id: &str,
        responses: &[PersonaResponse],
    ) -> PanelResult<()>;

    /// Replace the aggregated result stored for a test.
    async fn insert_aggregated_result(
        &self,
        test_id: &str,
        result: &AggregatedResult,
    ) -> PanelResult<()>;

    async fn create_test_run(&self, run: &TestRun) -> PanelResult<()>;

    async fn upsert_archetype(&self, archetype: &Archetype) -> PanelResult<()>;

    /// Responses in the order they were produced.
    async fn list_persona_responses(&self, test_id: &str) -> PanelResult<Vec<PersonaResponse>>;

    async fn get_aggregated_result(&self, test_id: &str) -> PanelResult<Option<AggregatedResult>>;
}
