//! Best-effort understanding of a free-text question.
//!
//! Everything here is pure: the same text always yields the same intent and
//! entities, and nothing here fails. Text that matches no rule simply leaves
//! the corresponding slot empty.

mod entities;
mod intent;
mod sentiment;

pub use entities::EntityRecord;
pub use intent::Intent;
#[cfg(test)]
pub use entities::extract_entities;
#[cfg(test)]
pub use intent::classify_intent;
pub use sentiment::{Lexicon, Sentiment};

/// Classifies `question` and extracts its entities.
pub fn extract(question: &str) -> (Intent, EntityRecord) {
    let lowered = question.to_lowercase();
    (
        intent::classify_lowercase(&lowered),
        entities::extract_lowercase(&lowered),
    )
}
