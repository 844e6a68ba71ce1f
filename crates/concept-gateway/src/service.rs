//! Daily-concept flow shared by the HTTP handlers.

use crate::server::AppState;
use chrono::Utc;
use concept_core::{ConceptError, ConceptResult, DailyConcept, ObjectId, User};
use concept_security::Field;
use concept_store::UserUpdate;
use tracing::{debug, info};

/// Today's date key (`YYYY-MM-DD`, UTC).
pub fn today() -> String {
    Utc::now().format("%Y-%m-%d").to_string()
}

/// Run model output through the field's sanitizer.
///
/// Model text that cannot be made safe is a provider failure, not a caller
/// error.
pub fn clean_model_text(field: Field, text: &str) -> ConceptResult<String> {
    let clean = field.sanitize(text).map_err(|e| match e {
        ConceptError::InvalidInput(msg) => {
            ConceptError::Llm(format!("Unusable {field:?} from model: {msg}"))
        }
        other => other,
    })?;
    if clean.is_empty() {
        return Err(ConceptError::Llm(format!("Empty {field:?} from model")));
    }
    Ok(clean)
}

/// The concept for `user_id` on `date`.
///
/// A concept already stored for `date` is returned as is, whatever category
/// it was generated for. Otherwise a new term is generated for `category`,
/// excluding the terms the user has already seen there, and stored as the
/// day's entry. Concurrent requests may each generate a term, but the store
/// keeps the first entry for a date; every caller returns that entry and
/// only its term is added to the history.
pub async fn daily_concept(
    state: &AppState,
    user_id: ObjectId,
    category: &str,
    date: &str,
) -> ConceptResult<DailyConcept> {
    let user = load_user(state, user_id).await?;
    if let Some(concept) = user.daily.get(date) {
        return Ok(concept.clone());
    }

    let draft = state
        .generator
        .generate_specific_concept(category, user.seen_terms(category))
        .await?;

    let concept = DailyConcept {
        category: category.to_string(),
        term: clean_model_text(Field::Term, &draft.term)?,
        explanation: clean_model_text(Field::Explanation, &draft.explanation)?,
    };

    apply(
        state,
        user_id,
        UserUpdate::SetDaily {
            date: date.to_string(),
            concept: concept.clone(),
        },
    )
    .await?;

    let stored = load_user(state, user_id)
        .await?
        .daily
        .remove(date)
        .ok_or_else(|| {
            ConceptError::Store(format!("Daily entry for {date} missing after write"))
        })?;
    if stored != concept {
        debug!(user_id = %user_id, date, "Daily concept already stored by a concurrent request");
        return Ok(stored);
    }

    apply(
        state,
        user_id,
        UserUpdate::AddHistoryTerm {
            category: concept.category.clone(),
            term: concept.term.clone(),
        },
    )
    .await?;

    info!(user_id = %user_id, category = %concept.category, term = %concept.term, "Daily concept stored");
    Ok(concept)
}

async fn load_user(state: &AppState, user_id: ObjectId) -> ConceptResult<User> {
    state
        .store
        .get(user_id)
        .await?
        .ok_or_else(|| ConceptError::NotFound("User not found".to_string()))
}

async fn apply(state: &AppState, user_id: ObjectId, update: UserUpdate) -> ConceptResult<()> {
    if state.store.apply(user_id, update).await? {
        Ok(())
    } else {
        Err(ConceptError::NotFound("User not found".to_string()))
    }
}
