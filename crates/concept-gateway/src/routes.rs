use crate::error::ApiError;
use crate::server::AppState;
use crate::service::{self, clean_model_text};
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    response::IntoResponse,
    Extension, Json,
};
use concept_core::{
    ConceptError, ConceptResult, LoginRequest, LoginResponse, NewUser, ObjectId, User,
};
use concept_security::{expect_text, validate_identifier, Claims, Field, PasswordHasher};
use concept_store::UserUpdate;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};

const MIN_USERNAME_CHARS: usize = 3;
const MAX_EMAIL_CHARS: usize = 254;

#[derive(Debug, Deserialize)]
pub struct ConceptQuery {
    pub category: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DailyConceptQuery {
    pub category: Option<String>,
    pub user_id: Option<String>,
}

fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> ConceptResult<T> {
    body.map(|Json(value)| value)
        .map_err(|rejection| ConceptError::InvalidInput(rejection.body_text()))
}

fn required<'a>(value: &'a Option<String>, name: &str) -> ConceptResult<&'a str> {
    value
        .as_deref()
        .ok_or_else(|| ConceptError::InvalidInput(format!("Missing query parameter: {name}")))
}

/// Prefix sanitizer rejections with the field they came from.
fn labelled(label: &str, result: ConceptResult<String>) -> ConceptResult<String> {
    result.map_err(|e| match e {
        ConceptError::InvalidInput(msg) => ConceptError::InvalidInput(format!("Invalid {label}: {msg}")),
        other => other,
    })
}

/// The authenticated caller may only touch their own document.
fn authorize(claims: &Claims, user_id: ObjectId) -> ConceptResult<()> {
    if claims.user_id.eq_ignore_ascii_case(&user_id.to_hex()) {
        Ok(())
    } else {
        warn!(subject = %claims.user_id, target = %user_id, "Cross-user access denied");
        Err(ConceptError::Forbidden("Access denied".to_string()))
    }
}

/// Minimal address shape check: one `@`, a non-empty local part and a
/// dotted domain, no whitespace.
fn validate_email(email: &str) -> ConceptResult<String> {
    let email = email.trim();
    let valid = email.chars().count() <= MAX_EMAIL_CHARS
        && !email.chars().any(char::is_whitespace)
        && match email.split_once('@') {
            Some((local, domain)) => {
                !local.is_empty()
                    && !domain.contains('@')
                    && domain.split('.').count() >= 2
                    && domain.split('.').all(|label| !label.is_empty())
            }
            None => false,
        };
    if valid {
        Ok(email.to_string())
    } else {
        Err(ConceptError::InvalidInput(
            "Invalid email address".to_string(),
        ))
    }
}

// Key derivation is CPU-bound and stays off the async workers.
async fn hash_password(hasher: PasswordHasher, password: String) -> ConceptResult<String> {
    tokio::task::spawn_blocking(move || hasher.hash(&password))
        .await
        .map_err(|e| ConceptError::Io(std::io::Error::other(e)))?
}

async fn verify_password(
    hasher: PasswordHasher,
    password: String,
    stored: String,
) -> ConceptResult<bool> {
    tokio::task::spawn_blocking(move || hasher.verify(&password, &stored))
        .await
        .map_err(|e| ConceptError::Io(std::io::Error::other(e)))
}

pub async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({"status": "ok", "service": "conceptd"}))
}

/// `POST /users`
pub async fn register(
    State(state): State<Arc<AppState>>,
    body: Result<Json<NewUser>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let new_user = json_body(body)?;

    let username = labelled("username", Field::Username.sanitize(&new_user.username))?;
    if username.chars().count() < MIN_USERNAME_CHARS {
        return Err(ConceptError::InvalidInput(format!(
            "Invalid username: must be at least {MIN_USERNAME_CHARS} characters"
        ))
        .into());
    }
    let email = validate_email(&new_user.email)?;

    let mut interests: Vec<String> = Vec::with_capacity(new_user.interests.len());
    for interest in &new_user.interests {
        let clean = labelled("interest", Field::Interest.sanitize(interest))?;
        if !interests.contains(&clean) {
            interests.push(clean);
        }
    }

    let password_hash = match new_user.password {
        Some(password) => Some(hash_password(state.passwords, password).await?),
        None => None,
    };

    let user = User {
        id: ObjectId::generate()?,
        username,
        email,
        password_hash,
        interests,
        history: BTreeMap::new(),
        daily: BTreeMap::new(),
    };
    state.store.create(&user).await?;

    info!(user_id = %user.id, "User registered");
    Ok(Json(serde_json::json!({
        "message": "User created successfully",
        "user_id": user.id.to_hex(),
    })))
}

/// `POST /login`
pub async fn login(
    State(state): State<Arc<AppState>>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, ApiError> {
    let request = json_body(body)?;
    let invalid = || ConceptError::Unauthorized("Invalid email or password".to_string());

    let user = state
        .store
        .find_by_email(request.email.trim())
        .await?
        .ok_or_else(invalid)?;
    let stored = user.password_hash.clone().ok_or_else(invalid)?;
    if !verify_password(state.passwords, request.password, stored).await? {
        return Err(invalid().into());
    }

    let token = state
        .tokens
        .create_access_token(&user.id.to_hex(), &user.email)?;
    info!(user_id = %user.id, "User logged in");
    Ok(Json(LoginResponse::bearer(user.profile(), token)))
}

/// `GET /get-concept?category=`
pub async fn get_concept(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ConceptQuery>,
) -> Result<Json<Value>, ApiError> {
    let category = labelled(
        "category",
        Field::Category.sanitize(required(&query.category, "category")?),
    )?;

    let concept = state.generator.generate_concept(&category).await?;
    let concept = clean_model_text(Field::Explanation, &concept)?;
    Ok(Json(serde_json::json!({
        "category": category,
        "concept": concept,
    })))
}

/// `GET /daily-concept?category=&user_id=`
pub async fn daily_concept(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<DailyConceptQuery>,
) -> Result<Json<Value>, ApiError> {
    let category = labelled(
        "category",
        Field::Category.sanitize(required(&query.category, "category")?),
    )?;
    let user_id = validate_identifier(required(&query.user_id, "user_id")?)?;
    authorize(&claims, user_id)?;

    let concept = service::daily_concept(&state, user_id, &category, &service::today()).await?;
    Ok(Json(serde_json::to_value(concept).map_err(ConceptError::from)?))
}

async fn update_interest(
    state: &AppState,
    claims: &Claims,
    user_id: &str,
    body: Result<Json<Value>, JsonRejection>,
    add: bool,
) -> ConceptResult<Value> {
    let user_id = validate_identifier(user_id)?;
    authorize(claims, user_id)?;
    let body = json_body(body)?;
    let interest = labelled("interest", Field::Interest.sanitize(expect_text(&body)?))?;

    let update = if add {
        UserUpdate::AddInterest(interest.clone())
    } else {
        UserUpdate::RemoveInterest(interest.clone())
    };
    if !state.store.apply(user_id, update).await? {
        return Err(ConceptError::NotFound("User not found".to_string()));
    }

    let user = state
        .store
        .get(user_id)
        .await?
        .ok_or_else(|| ConceptError::NotFound("User not found".to_string()))?;
    info!(user_id = %user_id, interest = %interest, add, "Interests updated");
    let message = if add {
        "Interest added"
    } else {
        "Interest removed"
    };
    Ok(serde_json::json!({
        "message": message,
        "interests": user.interests,
    }))
}

/// `POST /user/{user_id}/interests/add`
pub async fn add_interest(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Path(user_id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    Ok(Json(update_interest(&state, &claims, &user_id, body, true).await?))
}

/// `POST /user/{user_id}/interests/remove`
pub async fn remove_interest(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Path(user_id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    Ok(Json(update_interest(&state, &claims, &user_id, body, false).await?))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_email() {
        assert_eq!(
            validate_email(" ada@example.com ").unwrap(),
            "ada@example.com"
        );
        for bad in [
            "",
            "ada",
            "@example.com",
            "ada@",
            "ada@example",
            "ada@@example.com",
            "ada@exa mple.com",
            "ada@example..com",
        ] {
            assert!(validate_email(bad).is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn test_authorize_matches_subject() {
        let id = ObjectId::parse_str("507f1f77bcf86cd799439011").unwrap();
        let claims = Claims {
            user_id: "507F1F77BCF86CD799439011".into(),
            email: "a@b.c".into(),
            exp: 0,
            iat: 0,
        };
        assert!(authorize(&claims, id).is_ok());

        let other = Claims {
            user_id: "0123456789abcdef01234567".into(),
            ..claims
        };
        assert!(matches!(
            authorize(&other, id),
            Err(ConceptError::Forbidden(_))
        ));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_password_check_leaves_runtime_free() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let hasher = PasswordHasher::new(20_000);
        let stored = hasher.hash("correct horse").unwrap();

        let ticks = Arc::new(AtomicUsize::new(0));
        let ticker = {
            let ticks = Arc::clone(&ticks);
            tokio::spawn(async move {
                loop {
                    ticks.fetch_add(1, Ordering::SeqCst);
                    tokio::task::yield_now().await;
                }
            })
        };

        assert!(verify_password(hasher, "correct horse".into(), stored.clone())
            .await
            .unwrap());
        assert!(!verify_password(hasher, "wrong".into(), stored).await.unwrap());
        ticker.abort();

        // On a single-threaded runtime the ticker only runs if derivation
        // happened elsewhere.
        assert!(ticks.load(Ordering::SeqCst) > 0);
    }

    #[test]
    fn test_labelled_prefixes_input_errors_only() {
        let err = labelled("category", Err(ConceptError::InvalidInput("Input cannot be empty".into())))
            .unwrap_err();
        assert_eq!(err.to_string(), "Invalid input: Invalid category: Input cannot be empty");

        let err = labelled("category", Err(ConceptError::Store("x".into()))).unwrap_err();
        assert!(matches!(err, ConceptError::Store(_)));
    }
}
