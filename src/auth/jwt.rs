use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::config::Config;

/// JWT claims carried by a bearer token. Minted only by login; valid for one
/// hour; no server-side session state exists alongside it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// ID of the authenticated user.
    #[serde(rename = "userId")]
    pub user_id: i32,
    /// Whether the user held the admin flag at login time.
    #[serde(rename = "isAdmin")]
    pub is_admin: bool,
    /// Expiration time (Unix timestamp).
    pub exp: i64,
    /// Issued-at time (Unix timestamp).
    pub iat: i64,
}

/// Mint a signed token for the given user.
///
/// # Errors
///
/// Returns an error if JWT encoding fails.
pub fn generate_token(user_id: i32, is_admin: bool, config: &Config) -> anyhow::Result<String> {
    let now = Utc::now();

    #[allow(clippy::cast_possible_wrap)]
    let exp = now.timestamp() + config.jwt_expiration_secs as i64;

    let claims = Claims {
        user_id,
        is_admin,
        exp,
        iat: now.timestamp(),
    };

    let key = EncodingKey::from_secret(config.jwt_secret.as_bytes());
    encode(&Header::default(), &claims, &key)
        .map_err(|e| anyhow::anyhow!("Failed to encode token: {e}"))
}

/// Validate a bearer token's signature and expiry and return its claims.
///
/// # Errors
///
/// Returns an error if the token is invalid or expired.
pub fn validate_token(token: &str, secret: &str) -> anyhow::Result<Claims> {
    let key = DecodingKey::from_secret(secret.as_bytes());
    let validation = Validation::default();

    let token_data = decode::<Claims>(token, &key, &validation)
        .map_err(|e| anyhow::anyhow!("Invalid token: {e}"))?;

    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Environment;
    use std::net::IpAddr;

    fn test_config() -> Config {
        Config {
            database_url: String::new(),
            server_host: IpAddr::from([127, 0, 0, 1]),
            server_port: 0,
            environment: Environment::Development,
            log_level: "warn".to_string(),
            jwt_secret: "test-secret-key-for-testing-only-32chars".to_string(),
            jwt_expiration_secs: 3600,
            mapbox_api_key: None,
            frontend_url: String::new(),
        }
    }

    #[test]
    fn round_trips_claims() {
        let config = test_config();
        let token = generate_token(42, true, &config).unwrap_or_default();
        let claims = validate_token(&token, &config.jwt_secret).unwrap_or_else(|_| Claims {
            user_id: 0,
            is_admin: false,
            exp: 0,
            iat: 0,
        });
        assert_eq!(claims.user_id, 42);
        assert!(claims.is_admin);
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn rejects_wrong_secret() {
        let config = test_config();
        let token = generate_token(1, false, &config).unwrap_or_default();
        assert!(validate_token(&token, "some-other-secret").is_err());
    }
}
