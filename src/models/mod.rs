//! Data Models
//!
//! Archetypes, stimuli, test runs, persona responses, aggregates and settings.

pub mod aggregate;
pub mod archetype;
pub mod response;
pub mod settings;
pub mod stimulus;
pub mod test_run;

pub use aggregate::*;
pub use archetype::*;
pub use response::*;
pub use settings::*;
pub use stimulus::*;
pub use test_run::*;
