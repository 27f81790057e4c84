use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::Json,
    Extension,
};
use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::Utc;
use mongodb::bson::doc;
use mongodb::Collection;
use serde_json::{json, Value};
use uuid::Uuid;
use validator::Validate;

use crate::database::connection::USERS;
use crate::dtos::auth_dtos::{LoginRequest, RegisterRequest};
use crate::errors::{translate_duplicate, AppError, Result};
use crate::middleware::auth::issue_token;
use crate::models::user::{AuthResponse, Claims, ProfilePage, Role, User, UserResponse, UserSummary};
use crate::services::activity::log_activity;
use crate::state::AppState;

const PHONE_IN_USE: &str = "Phone number already in use";

pub async fn register(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<Value>)> {
    payload.validate()?;

    let collection: Collection<User> = state.db.collection(USERS);

    if collection
        .find_one(doc! { "phoneNumber": &payload.phone_number })
        .await?
        .is_some()
    {
        tracing::warn!("registration refused: phone {} already registered", payload.phone_number);
        return Err(AppError::Conflict(PHONE_IN_USE.to_string()));
    }

    let user = User {
        id: None,
        user_id: Uuid::new_v4().to_string(),
        username: payload.username,
        phone_number: payload.phone_number,
        password: hash(&payload.password, DEFAULT_COST)?,
        profile_page: ProfilePage {
            email: payload.email,
            ..ProfilePage::default()
        },
        role: Role::User,
        created_at: Utc::now(),
        phone_number_verified: false,
        pan_card_number: None,
        pan_card_images: Vec::new(),
        pan_card_verified: false,
        referral: payload.referral,
        balance: 0.0,
    };

    // A concurrent signup with the same phone trips the unique index.
    collection
        .insert_one(&user)
        .await
        .map_err(|e| translate_duplicate(e, || AppError::Conflict(PHONE_IN_USE.to_string())))?;

    tracing::info!("registered user {} ({})", user.user_id, user.username);
    log_activity(&state.db, &user.user_id, "register", &headers).await;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "User registered successfully", "userId": user.user_id })),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>> {
    payload.validate()?;

    let collection: Collection<User> = state.db.collection(USERS);
    let user = collection
        .find_one(doc! { "phoneNumber": &payload.phone_number })
        .await?
        .ok_or_else(|| AppError::invalid_data("User not found"))?;

    if !verify(&payload.password, &user.password)? {
        tracing::warn!("failed login for user {}", user.user_id);
        return Err(AppError::invalid_data("Invalid credentials"));
    }

    let token = issue_token(&user.user_id, user.role, &state.config)?;
    log_activity(&state.db, &user.user_id, "login", &headers).await;

    Ok(Json(AuthResponse {
        token,
        user: UserSummary {
            user_id: user.user_id,
            username: user.username,
            role: user.role,
        },
    }))
}

pub async fn profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<UserResponse>> {
    let collection: Collection<User> = state.db.collection(USERS);
    let user = collection
        .find_one(doc! { "userId": &claims.sub })
        .await?
        .ok_or(AppError::NotFound("User"))?;

    Ok(Json(UserResponse::from(user)))
}
