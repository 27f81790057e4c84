pub mod auth;
pub mod contests;
pub mod early_access;
pub mod matches;
pub mod teams;
pub mod user_profile;
