use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use mongodb::bson::oid::ObjectId;
use mongodb::bson;

/// Closed set of account roles carried in the session token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

/// Operations gated on the caller's role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    ManageMatches,
    SubmitPoints,
    ManageContests,
    ViewAnyTeam,
    PlayContests,
}

impl Role {
    pub fn can(self, capability: Capability) -> bool {
        match capability {
            Capability::ManageMatches
            | Capability::SubmitPoints
            | Capability::ManageContests
            | Capability::ViewAnyTeam => self == Role::Admin,
            Capability::PlayContests => true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
    Other,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfilePage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_picture: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub education: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_of_residence: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    // stored as "YYYY-MM-DD"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub user_id: String,
    pub username: String,
    pub phone_number: String,
    pub password: String,
    #[serde(default)]
    pub profile_page: ProfilePage,
    #[serde(default)]
    pub role: Role,

    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,

    #[serde(default)]
    pub phone_number_verified: bool,
    // sparse unique index: must be absent, not null, when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pan_card_number: Option<String>,
    #[serde(default)]
    pub pan_card_images: Vec<String>,
    #[serde(default)]
    pub pan_card_verified: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referral: Option<String>,
    #[serde(default)]
    pub balance: f64,
}

/// Public view of a user; never carries the password hash.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub user_id: String,
    pub username: String,
    pub phone_number: String,
    pub role: Role,
    pub profile_page: ProfilePage,
    pub phone_number_verified: bool,
    pub pan_card_verified: bool,
    pub referral: Option<String>,
    pub balance: f64,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        UserResponse {
            user_id: user.user_id,
            username: user.username,
            phone_number: user.phone_number,
            role: user.role,
            profile_page: user.profile_page,
            phone_number_verified: user.phone_number_verified,
            pan_card_verified: user.pan_card_verified,
            referral: user.referral,
            balance: user.balance,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub user_id: String,
    pub username: String,
    pub role: Role,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserSummary,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,
    pub role: Role,
    pub exp: usize,
}
