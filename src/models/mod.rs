pub mod activity;
pub mod contest;
pub mod early_access;
pub mod matches;
pub mod team;
pub mod user;
