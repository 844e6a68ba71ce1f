use concept_core::{DailyConcept, User};

/// The closed set of mutations a caller may apply to a user document.
///
/// Values are plain strings that have already been through the matching
/// sanitizer; stores copy them into fields and never interpret them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserUpdate {
    /// Add to the interest set (no-op if present).
    AddInterest(String),
    /// Remove from the interest set (no-op if absent).
    RemoveInterest(String),
    /// Add `term` to the history set for `category`.
    AddHistoryTerm {
        /// History key.
        category: String,
        /// Served term.
        term: String,
    },
    /// Set the daily entry for `date` (`YYYY-MM-DD`), keeping other days.
    ///
    /// The first entry stored for a date stays; later ones are ignored.
    SetDaily {
        /// Map key.
        date: String,
        /// Entry to store.
        concept: DailyConcept,
    },
}

fn add_to_set(set: &mut Vec<String>, value: &str) {
    if !set.iter().any(|v| v == value) {
        set.push(value.to_string());
    }
}

impl UserUpdate {
    /// Apply this update to an in-memory document.
    pub fn apply_to(&self, user: &mut User) {
        match self {
            UserUpdate::AddInterest(interest) => add_to_set(&mut user.interests, interest),
            UserUpdate::RemoveInterest(interest) => user.interests.retain(|i| i != interest),
            UserUpdate::AddHistoryTerm { category, term } => {
                add_to_set(user.history.entry(category.clone()).or_default(), term);
            }
            UserUpdate::SetDaily { date, concept } => {
                user.daily
                    .entry(date.clone())
                    .or_insert_with(|| concept.clone());
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use concept_core::ObjectId;
    use std::collections::BTreeMap;

    fn user() -> User {
        User {
            id: ObjectId::generate().unwrap(),
            username: "ada".into(),
            email: "ada@example.com".into(),
            password_hash: None,
            interests: vec!["physics".into()],
            history: BTreeMap::new(),
            daily: BTreeMap::new(),
        }
    }

    #[test]
    fn test_add_interest_is_set_like() {
        let mut u = user();
        UserUpdate::AddInterest("physics".into()).apply_to(&mut u);
        UserUpdate::AddInterest("art".into()).apply_to(&mut u);
        assert_eq!(u.interests, vec!["physics".to_string(), "art".to_string()]);
    }

    #[test]
    fn test_remove_interest() {
        let mut u = user();
        UserUpdate::RemoveInterest("physics".into()).apply_to(&mut u);
        UserUpdate::RemoveInterest("missing".into()).apply_to(&mut u);
        assert!(u.interests.is_empty());
    }

    #[test]
    fn test_history_terms_deduplicated_per_category() {
        let mut u = user();
        for term in ["Entropy", "Entropy", "Enthalpy"] {
            UserUpdate::AddHistoryTerm {
                category: "physics".into(),
                term: term.into(),
            }
            .apply_to(&mut u);
        }
        assert_eq!(u.seen_terms("physics").len(), 2);
    }

    #[test]
    fn test_set_daily_keeps_other_days() {
        let mut u = user();
        let concept = |term: &str| DailyConcept {
            category: "physics".into(),
            term: term.into(),
            explanation: "x".into(),
        };
        UserUpdate::SetDaily {
            date: "2026-10-15".into(),
            concept: concept("Entropy"),
        }
        .apply_to(&mut u);
        UserUpdate::SetDaily {
            date: "2026-10-16".into(),
            concept: concept("Enthalpy"),
        }
        .apply_to(&mut u);
        assert_eq!(u.daily.len(), 2);
        assert_eq!(u.daily["2026-10-16"].term, "Enthalpy");
    }

    #[test]
    fn test_set_daily_first_entry_per_date_wins() {
        let mut u = user();
        for term in ["Entropy", "Enthalpy"] {
            UserUpdate::SetDaily {
                date: "2026-10-16".into(),
                concept: DailyConcept {
                    category: "physics".into(),
                    term: term.into(),
                    explanation: "x".into(),
                },
            }
            .apply_to(&mut u);
        }
        assert_eq!(u.daily.len(), 1);
        assert_eq!(u.daily["2026-10-16"].term, "Entropy");
    }
}
