use axum::{extract::State, http::StatusCode, response::Json};
use chrono::Utc;
use mongodb::bson::doc;
use mongodb::Collection;
use serde_json::{json, Value};
use validator::Validate;

use crate::database::connection::EARLY_ACCESS;
use crate::errors::{is_duplicate_key, Result};
use crate::models::early_access::{CreateEarlyAccess, EarlyAccess, EarlyAccessResponse};
use crate::services::referral::{generate_referral_code, with_unique_code};
use crate::state::AppState;

pub async fn register_early_access(
    State(state): State<AppState>,
    Json(payload): Json<CreateEarlyAccess>,
) -> Result<(StatusCode, Json<Value>)> {
    payload.validate()?;

    let collection: Collection<EarlyAccess> = state.db.collection(EARLY_ACCESS);
    let now = Utc::now();

    let entry = with_unique_code(state.config.referral_max_attempts, generate_referral_code, |code| {
        let collection = collection.clone();
        let entry = EarlyAccess {
            id: None,
            phone_number: payload.phonenumber.clone(),
            name: payload.name.clone(),
            state: payload.state.clone(),
            paid: payload.paid,
            referral: payload.referral.clone(),
            referral_id: code,
            created_at: now,
            updated_at: now,
        };
        async move {
            if collection
                .find_one(doc! { "referralId": &entry.referral_id })
                .await?
                .is_some()
            {
                return Ok(None);
            }
            match collection.insert_one(&entry).await {
                Ok(result) => Ok(Some(EarlyAccess {
                    id: result.inserted_id.as_object_id(),
                    ..entry
                })),
                Err(e) if is_duplicate_key(&e) => Ok(None),
                Err(e) => Err(e.into()),
            }
        }
    })
    .await?;

    tracing::info!("early access registered for {} ({})", entry.name, entry.referral_id);
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Early access registered",
            "data": EarlyAccessResponse::from(entry),
        })),
    ))
}
