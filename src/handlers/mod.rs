use mongodb::bson::oid::ObjectId;

use crate::errors::{AppError, Result};

pub(crate) mod auth;
pub(crate) mod contests;
pub(crate) mod early_access;
pub(crate) mod matches;
pub(crate) mod teams;
pub(crate) mod user_profile;

/// Parses a path or body id, naming the entity in the error.
pub(crate) fn parse_id(raw: &str, what: &str) -> Result<ObjectId> {
    ObjectId::parse_str(raw.trim()).map_err(|_| {
        tracing::warn!("invalid {} id {:?}", what, raw);
        AppError::InvalidObjectId(format!("Invalid {} ID", what))
    })
}
