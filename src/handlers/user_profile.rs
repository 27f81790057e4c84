use axum::{extract::State, response::Json, Extension};
use mongodb::bson::{self, doc};
use mongodb::options::ReturnDocument;
use mongodb::Collection;
use validator::Validate;

use crate::database::connection::USERS;
use crate::dtos::auth_dtos::UpdateProfileRequest;
use crate::errors::{AppError, Result};
use crate::models::user::{Claims, User, UserResponse};
use crate::state::AppState;

pub async fn update_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<UserResponse>> {
    payload.validate()?;

    let collection: Collection<User> = state.db.collection(USERS);
    let current = collection
        .find_one(doc! { "userId": &claims.sub })
        .await?
        .ok_or(AppError::NotFound("User"))?;

    let profile = payload.into_profile(&current.profile_page);
    let profile = bson::to_bson(&profile).map_err(|e| AppError::Internal(e.to_string()))?;

    let updated = collection
        .find_one_and_update(
            doc! { "userId": &claims.sub },
            doc! { "$set": { "profilePage": profile } },
        )
        .return_document(ReturnDocument::After)
        .await?
        .ok_or(AppError::NotFound("User"))?;

    tracing::info!("profile updated for user {}", claims.sub);
    Ok(Json(UserResponse::from(updated)))
}
