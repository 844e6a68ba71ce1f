use crate::ObjectId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The concept stored for a user on a given day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyConcept {
    pub category: String,
    pub term: String,
    pub explanation: String,
}

/// A stored user document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: ObjectId,
    pub username: String,
    pub email: String,
    /// PBKDF2 hash; `None` for accounts created without a password.
    #[serde(default)]
    pub password_hash: Option<String>,
    /// Set semantics: insertion order kept, no duplicates.
    #[serde(default)]
    pub interests: Vec<String>,
    /// Terms already served, per category.
    #[serde(default)]
    pub history: BTreeMap<String, Vec<String>>,
    /// Served concepts keyed by `YYYY-MM-DD`.
    #[serde(default)]
    pub daily: BTreeMap<String, DailyConcept>,
}

impl User {
    /// Terms previously served for `category`.
    pub fn seen_terms(&self, category: &str) -> &[String] {
        self.history
            .get(category)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// The public view of this user.
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id.to_hex(),
            username: self.username.clone(),
            email: self.email.clone(),
            interests: self.interests.clone(),
        }
    }
}

/// Registration payload.
#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub interests: Vec<String>,
}

/// Login payload.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// User data safe to return to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub username: String,
    pub email: String,
    pub interests: Vec<String>,
}

/// Successful login response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    #[serde(flatten)]
    pub profile: UserProfile,
    pub access_token: String,
    pub token_type: String,
}

impl LoginResponse {
    /// Wraps a profile and a freshly issued bearer token.
    pub fn bearer(profile: UserProfile, access_token: String) -> Self {
        Self {
            profile,
            access_token,
            token_type: "bearer".to_string(),
        }
    }
}
