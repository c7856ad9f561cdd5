//! Short-lived anti-forgery tokens bound to an action and a user.
//!
//! A nonce is valid for the tick it was issued in and the one before it, so
//! its effective lifetime is between half and all of [`NONCE_LIFETIME_SECS`].

use axum::http::HeaderMap;
use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, Secret};
use sha3::Digest;

use crate::errors::AppError;

pub const NONCE_LIFETIME_SECS: i64 = 24 * 60 * 60;
pub const NONCE_HEADER: &str = "x-video-seo-nonce";
const NONCE_CHARS: usize = 20;

/// User id nonces are bound to when the caller is anonymous.
pub const ANONYMOUS_USER: i64 = 0;

fn tick(now: DateTime<Utc>) -> i64 {
    let half = NONCE_LIFETIME_SECS / 2;
    let secs = now.timestamp();
    secs.div_euclid(half) + i64::from(secs.rem_euclid(half) != 0)
}

fn digest(tick: i64, action: &str, user_id: i64, secret: &Secret<String>) -> String {
    let mut hasher = sha3::Sha3_256::new();
    hasher.update(format!("{}|{}|{}|", tick, action, user_id).as_bytes());
    hasher.update(secret.expose_secret().as_bytes());
    let mut hex = hex::encode(hasher.finalize());
    hex.truncate(NONCE_CHARS);
    hex
}

pub fn create_nonce(action: &str, user_id: i64, secret: &Secret<String>, now: DateTime<Utc>) -> String {
    digest(tick(now), action, user_id, secret)
}

/// `Some(1)` when issued in the current tick, `Some(2)` for the previous
/// one, `None` otherwise.
pub fn verify_nonce(
    nonce: &str,
    action: &str,
    user_id: i64,
    secret: &Secret<String>,
    now: DateTime<Utc>,
) -> Option<u8> {
    let nonce = nonce.trim();
    if nonce.len() != NONCE_CHARS {
        return None;
    }

    let current = tick(now);
    if digest(current, action, user_id, secret) == nonce {
        return Some(1);
    }
    if digest(current - 1, action, user_id, secret) == nonce {
        return Some(2);
    }
    None
}

/// Rejects the request unless it carries a valid nonce for `action`.
pub fn check_nonce(
    headers: &HeaderMap,
    action: &str,
    user_id: i64,
    secret: &Secret<String>,
    now: DateTime<Utc>,
) -> Result<(), AppError> {
    let nonce = headers
        .get(NONCE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::Permission(anyhow::anyhow!("Missing security token")))?;

    match verify_nonce(nonce, action, user_id, secret, now) {
        Some(_) => Ok(()),
        None => {
            tracing::warn!(action, user_id, "Rejected invalid nonce");
            Err(AppError::Permission(anyhow::anyhow!("Invalid or expired security token")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn secret() -> Secret<String> {
        Secret::new("nonce-secret".to_string())
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 10, 13, 0, 0).unwrap()
    }

    #[test]
    fn fresh_nonce_verifies_in_current_tick() {
        let nonce = create_nonce("save_post", 7, &secret(), now());
        assert_eq!(nonce.len(), 20);
        assert_eq!(verify_nonce(&nonce, "save_post", 7, &secret(), now()), Some(1));
    }

    #[test]
    fn previous_tick_is_still_accepted() {
        let nonce = create_nonce("save_post", 7, &secret(), now());
        let later = now() + Duration::hours(12);
        assert_eq!(verify_nonce(&nonce, "save_post", 7, &secret(), later), Some(2));

        let much_later = now() + Duration::hours(24);
        assert_eq!(verify_nonce(&nonce, "save_post", 7, &secret(), much_later), None);
    }

    #[test]
    fn nonce_is_bound_to_action_user_and_secret() {
        let nonce = create_nonce("save_post", 7, &secret(), now());
        assert_eq!(verify_nonce(&nonce, "save_settings", 7, &secret(), now()), None);
        assert_eq!(verify_nonce(&nonce, "save_post", 8, &secret(), now()), None);
        let other = Secret::new("other".to_string());
        assert_eq!(verify_nonce(&nonce, "save_post", 7, &other, now()), None);
        assert_eq!(verify_nonce("", "save_post", 7, &secret(), now()), None);
    }

    #[test]
    fn check_nonce_reads_the_header() {
        let mut headers = HeaderMap::new();
        let result = check_nonce(&headers, "track_video_view", ANONYMOUS_USER, &secret(), now());
        assert!(matches!(result, Err(AppError::Permission(_))));

        let nonce = create_nonce("track_video_view", ANONYMOUS_USER, &secret(), now());
        headers.insert(NONCE_HEADER, nonce.parse().unwrap());
        assert!(check_nonce(&headers, "track_video_view", ANONYMOUS_USER, &secret(), now()).is_ok());
    }
}
