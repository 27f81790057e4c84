use chrono::{DateTime, Utc};
use mongodb::bson::{self, oid::ObjectId};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EarlyAccess {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    #[serde(rename = "phonenumber")]
    pub phone_number: String,
    pub name: String,
    pub state: String,
    #[serde(default)]
    pub paid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referral: Option<String>,
    pub referral_id: String,

    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,

    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateEarlyAccess {
    #[serde(default)]
    #[validate(length(min = 1, message = "Phone number is required"))]
    pub phonenumber: String,

    #[serde(default)]
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,

    #[serde(default)]
    #[validate(length(min = 1, message = "State is required"))]
    pub state: String,

    #[serde(default)]
    pub paid: bool,

    pub referral: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EarlyAccessResponse {
    pub id: String,
    #[serde(rename = "phonenumber")]
    pub phone_number: String,
    pub name: String,
    pub state: String,
    pub paid: bool,
    pub referral: Option<String>,
    pub referral_id: String,
    pub created_at: DateTime<Utc>,
}

impl From<EarlyAccess> for EarlyAccessResponse {
    fn from(entry: EarlyAccess) -> Self {
        EarlyAccessResponse {
            id: entry.id.map(|id| id.to_hex()).unwrap_or_default(),
            phone_number: entry.phone_number,
            name: entry.name,
            state: entry.state,
            paid: entry.paid,
            referral: entry.referral,
            referral_id: entry.referral_id,
            created_at: entry.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_state_fails_validation() {
        let payload: CreateEarlyAccess =
            serde_json::from_str(r#"{"phonenumber":"9876543210","name":"Asha"}"#).unwrap();
        let errors = payload.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("state"));
        assert!(!payload.paid);
    }
}
