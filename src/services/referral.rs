use std::future::Future;

use rand::{distributions::Alphanumeric, Rng};

use crate::errors::{AppError, Result};

pub const REFERRAL_CODE_LEN: usize = 5;

pub fn generate_referral_code() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(REFERRAL_CODE_LEN)
        .map(char::from)
        .collect()
}

/// Draws codes until `attempt` accepts one, at most `max_attempts` times.
///
/// `attempt` returns `Ok(None)` on a collision (code already taken, or the
/// unique index fired on insert) and `Ok(Some(_))` once the code is stored.
pub async fn with_unique_code<T, G, F, Fut>(
    max_attempts: u32,
    mut generate: G,
    mut attempt: F,
) -> Result<T>
where
    G: FnMut() -> String,
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<Option<T>>>,
{
    for n in 1..=max_attempts {
        let code = generate();
        match attempt(code.clone()).await? {
            Some(stored) => return Ok(stored),
            None => tracing::debug!("referral code {} taken (attempt {}/{})", code, n, max_attempts),
        }
    }
    tracing::error!("no free referral code after {} attempts", max_attempts);
    Err(AppError::ReferralExhausted(max_attempts))
}
