//! Unverified JWT payload decoding
//!
//! The payload is read without checking the signature. Claims decoded here
//! are only good for expiry checks and as a degraded identity when the
//! profile endpoint cannot be reached.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum ClaimsError {
    #[error("token does not have three period-delimited segments")]
    Malformed,
    #[error("token payload is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("token payload is not a JSON claims object: {0}")]
    Json(#[from] serde_json::Error),
}

/// Claims carried in an access or refresh token
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TokenClaims {
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub phone_number: Option<String>,
    /// Expiry, seconds since the Unix epoch
    #[serde(default)]
    pub exp: Option<i64>,
    #[serde(default)]
    pub date_joined: Option<String>,
}

/// Decode the middle segment of `token`.
pub fn decode_claims(token: &str) -> Result<TokenClaims, ClaimsError> {
    let mut segments = token.split('.');
    let payload = match (segments.next(), segments.next(), segments.next(), segments.next()) {
        (Some(_), Some(payload), Some(_), None) if !payload.is_empty() => payload,
        _ => return Err(ClaimsError::Malformed),
    };

    // Accept the standard alphabet and trailing padding as well.
    let normalized: String = payload
        .trim_end_matches('=')
        .chars()
        .map(|c| match c {
            '+' => '-',
            '/' => '_',
            other => other,
        })
        .collect();

    let bytes = URL_SAFE_NO_PAD.decode(normalized)?;
    Ok(serde_json::from_slice(&bytes)?)
}

pub fn now_secs() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Whether `token` is expired at `now`. Decode failures and a missing
/// `exp` claim count as expired.
pub fn is_token_expired_at(token: &str, now: i64) -> bool {
    match decode_claims(token) {
        Ok(TokenClaims { exp: Some(exp), .. }) => {
            let expired = exp < now;
            tracing::debug!(
                "Token expiry check: exp={} now={} expired={}",
                exp,
                now,
                expired
            );
            expired
        }
        Ok(_) => {
            tracing::debug!("Token has no exp claim, treating as expired");
            true
        }
        Err(e) => {
            tracing::debug!("Token could not be decoded ({}), treating as expired", e);
            true
        }
    }
}

pub fn is_token_expired(token: &str) -> bool {
    is_token_expired_at(token, now_secs())
}

/// Access token expired while the refresh token is still usable.
pub fn needs_token_refresh(access_token: &str, refresh_token: &str) -> bool {
    let now = now_secs();
    let access_expired = is_token_expired_at(access_token, now);
    let refresh_expired = is_token_expired_at(refresh_token, now);
    tracing::debug!(
        "Token refresh check: access_expired={} refresh_expired={}",
        access_expired,
        refresh_expired
    );
    access_expired && !refresh_expired
}

/// Mint an unsigned token around `payload` for tests.
#[cfg(test)]
pub fn encode_test_token(payload: &serde_json::Value) -> String {
    format!(
        "eyJhbGciOiJIUzI1NiJ9.{}.c2lnbmF0dXJl",
        URL_SAFE_NO_PAD.encode(payload.to_string())
    )
}

/// Test token for user 7 expiring `offset` seconds from now.
#[cfg(test)]
pub fn test_token_expiring_in(offset: i64) -> String {
    encode_test_token(&serde_json::json!({
        "user_id": 7,
        "email": "jane@example.com",
        "first_name": "Jane",
        "last_name": "Doe",
        "exp": now_secs() + offset,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_full_claims() {
        let token = encode_test_token(&json!({
            "user_id": 42,
            "email": "a@b.com",
            "first_name": "Ada",
            "last_name": "Lovelace",
            "phone_number": "+15550100",
            "exp": 1_900_000_000,
        }));
        let claims = decode_claims(&token).unwrap();
        assert_eq!(claims.user_id, Some(42));
        assert_eq!(claims.email.as_deref(), Some("a@b.com"));
        assert_eq!(claims.first_name, "Ada");
        assert_eq!(claims.last_name, "Lovelace");
        assert_eq!(claims.phone_number.as_deref(), Some("+15550100"));
        assert_eq!(claims.exp, Some(1_900_000_000));
    }

    #[test]
    fn test_decode_missing_names_default_empty() {
        let token = encode_test_token(&json!({ "user_id": 1, "exp": 10 }));
        let claims = decode_claims(&token).unwrap();
        assert_eq!(claims.first_name, "");
        assert_eq!(claims.last_name, "");
        assert_eq!(claims.email, None);
    }

    #[test]
    fn test_decode_padded_payload() {
        let token = encode_test_token(&json!({ "exp": 5 }));
        let mut parts: Vec<String> = token.split('.').map(String::from).collect();
        while parts[1].len() % 4 != 0 {
            parts[1].push('=');
        }
        let claims = decode_claims(&parts.join(".")).unwrap();
        assert_eq!(claims.exp, Some(5));
    }

    #[test]
    fn test_decode_malformed() {
        assert!(matches!(decode_claims("not-a-jwt"), Err(ClaimsError::Malformed)));
        assert!(matches!(decode_claims("a..c"), Err(ClaimsError::Malformed)));
        assert!(matches!(decode_claims("a.b.c.d"), Err(ClaimsError::Malformed)));
        assert!(matches!(decode_claims("a.!!!.c"), Err(ClaimsError::Base64(_))));

        let not_json = format!("a.{}.c", URL_SAFE_NO_PAD.encode("hello"));
        assert!(matches!(decode_claims(&not_json), Err(ClaimsError::Json(_))));
    }

    #[test]
    fn test_expired_past_exp() {
        let token = encode_test_token(&json!({ "exp": 1_000 }));
        assert!(is_token_expired_at(&token, 2_000));
        assert!(is_token_expired(&test_token_expiring_in(-60)));
    }

    #[test]
    fn test_not_expired_future_exp() {
        let token = encode_test_token(&json!({ "exp": 3_000 }));
        assert!(!is_token_expired_at(&token, 2_000));
        assert!(!is_token_expired(&test_token_expiring_in(3600)));
    }

    #[test]
    fn test_malformed_token_is_expired() {
        assert!(is_token_expired("garbage"));
        assert!(is_token_expired(""));
        assert!(is_token_expired("a.b.c"));
    }

    #[test]
    fn test_missing_exp_is_expired() {
        let token = encode_test_token(&json!({ "user_id": 1 }));
        assert!(is_token_expired_at(&token, 0));
    }

    #[test]
    fn test_needs_token_refresh() {
        let expired = test_token_expiring_in(-60);
        let valid = test_token_expiring_in(3600);

        assert!(needs_token_refresh(&expired, &valid));
        assert!(!needs_token_refresh(&valid, &valid));
        assert!(!needs_token_refresh(&expired, &expired));
        assert!(!needs_token_refresh(&expired, "garbage"));
    }
}
