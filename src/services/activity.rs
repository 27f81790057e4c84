use axum::http::{header::USER_AGENT, HeaderMap};
use chrono::Utc;
use mongodb::{
    bson::{self, doc},
    Database,
};

use crate::database::connection::ACTIVITIES;
use crate::models::activity::{ActivityDetail, ActivityLog, DeviceInfo};

const UNKNOWN: &str = "Unknown";

/// Coarse device fingerprint from a User-Agent string.
pub fn device_info(user_agent: Option<&str>) -> DeviceInfo {
    let ua = user_agent.unwrap_or_default();
    let lower = ua.to_ascii_lowercase();

    // Mobile platforms first: Android agents also say "Linux", iOS ones "Mac OS X".
    let os = if lower.contains("android") {
        "Android"
    } else if ["iphone", "ipad", "ipod"].iter().any(|d| lower.contains(d)) {
        "iOS"
    } else if lower.contains("windows") {
        "Windows"
    } else if lower.contains("macintosh") || lower.contains("mac os x") {
        "MacOS"
    } else if lower.contains("linux") {
        "Linux"
    } else {
        UNKNOWN
    };

    let device_type = if lower.contains("mobile") {
        "mobile"
    } else if lower.contains("tablet") || lower.contains("ipad") {
        "tablet"
    } else {
        "desktop"
    };

    DeviceInfo {
        browser: ua.split_whitespace().next().unwrap_or(UNKNOWN).to_string(),
        os: os.to_string(),
        device_type: device_type.to_string(),
    }
}

/// First hop of `X-Forwarded-For`, else `X-Real-IP`.
pub fn client_ip(headers: &HeaderMap) -> Option<String> {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());

    forwarded
        .or_else(|| {
            headers
                .get("x-real-ip")
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
        })
        .map(str::to_string)
}

pub fn activity_from_headers(method: &str, headers: &HeaderMap) -> ActivityDetail {
    ActivityDetail {
        method: method.to_string(),
        device_info: device_info(headers.get(USER_AGENT).and_then(|v| v.to_str().ok())),
        ip_address: client_ip(headers),
        timestamp: Utc::now(),
    }
}

/// Appends to the user's activity document, creating it on first use.
/// Failures are logged and swallowed.
pub async fn log_activity(db: &Database, user_id: &str, method: &str, headers: &HeaderMap) {
    let detail = activity_from_headers(method, headers);
    let entry = match bson::to_bson(&detail) {
        Ok(entry) => entry,
        Err(e) => {
            tracing::warn!("could not encode activity for {}: {}", user_id, e);
            return;
        }
    };

    let result = db
        .collection::<ActivityLog>(ACTIVITIES)
        .update_one(
            doc! { "_id": user_id },
            doc! { "$push": { "activityDetails": entry } },
        )
        .upsert(true)
        .await;

    match result {
        Ok(_) => tracing::info!("activity '{}' logged for user {}", method, user_id),
        Err(e) => tracing::warn!("activity logging failed for user {}: {}", user_id, e),
    }
}
