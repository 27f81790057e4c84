pub mod activity;
pub mod ranking;
pub mod referral;
pub mod results;
pub mod roster;
pub mod scoring;
pub mod team_builder;
