use chrono::NaiveDate;
use serde::Deserialize;
use validator::Validate;

use crate::models::user::{Gender, ProfilePage};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[serde(default)]
    #[validate(length(min = 3, message = "Username must be at least 3 characters"))]
    pub username: String,

    #[serde(default)]
    #[validate(length(min = 10, max = 15, message = "Phone number must be 10 to 15 digits"))]
    pub phone_number: String,

    #[serde(default)]
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,

    #[validate(email(message = "Email is invalid"))]
    pub email: Option<String>,

    pub referral: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "Phone number is required"))]
    pub phone_number: String,

    #[serde(default)]
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    #[validate(length(max = 50))]
    pub first_name: Option<String>,
    #[validate(length(max = 50))]
    pub last_name: Option<String>,
    pub profile_picture: Option<String>,
    pub education: Option<String>,
    pub state_of_residence: Option<String>,
    pub gender: Option<Gender>,
    pub date_of_birth: Option<NaiveDate>,
}

impl UpdateProfileRequest {
    /// The update replaces the profile page; the email captured at
    /// registration is the only field carried over.
    pub fn into_profile(self, current: &ProfilePage) -> ProfilePage {
        ProfilePage {
            first_name: self.first_name,
            last_name: self.last_name,
            profile_picture: self.profile_picture,
            education: self.education,
            gender: self.gender,
            state_of_residence: self.state_of_residence,
            email: current.email.clone(),
            date_of_birth: self.date_of_birth,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_password_is_rejected() {
        let req: RegisterRequest = serde_json::from_str(
            r#"{"username":"ravi","phoneNumber":"9876543210","password":"abc"}"#,
        )
        .unwrap();
        let errors = req.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("password"));
    }

    #[test]
    fn bad_email_is_rejected_but_absent_email_is_fine() {
        let bad: RegisterRequest = serde_json::from_str(
            r#"{"username":"ravi","phoneNumber":"9876543210","password":"secret1","email":"nope"}"#,
        )
        .unwrap();
        assert!(bad.validate().is_err());

        let ok: RegisterRequest = serde_json::from_str(
            r#"{"username":"ravi","phoneNumber":"9876543210","password":"secret1"}"#,
        )
        .unwrap();
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn profile_update_keeps_registration_email() {
        let current = ProfilePage {
            email: Some("ravi@example.com".into()),
            first_name: Some("Old".into()),
            ..ProfilePage::default()
        };
        let req: UpdateProfileRequest = serde_json::from_str(
            r#"{"firstName":"Ravi","gender":"Male","dateOfBirth":"1995-04-12"}"#,
        )
        .unwrap();
        let profile = req.into_profile(&current);
        assert_eq!(profile.first_name.as_deref(), Some("Ravi"));
        assert_eq!(profile.email.as_deref(), Some("ravi@example.com"));
        assert_eq!(profile.gender, Some(Gender::Male));
        assert_eq!(profile.date_of_birth, NaiveDate::from_ymd_opt(1995, 4, 12));
    }
}
