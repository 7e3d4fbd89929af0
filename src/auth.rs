//! Bearer token verification
//!
//! Tokens are issued by the back-office API; the worker only validates them
//! and derives the account whose data a request may touch.

use anyhow::{anyhow, Result};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::Request;

/// JWT claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    #[serde(default)]
    pub email: String,
    /// owner, staff or admin
    pub role: String,
    /// For staff: the bakery owner they work for
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<String>,
    pub iat: usize,
    pub exp: usize,
}

#[derive(Debug, Clone)]
pub struct AuthInfo {
    pub user_id: Uuid,
    pub role: String,
    pub owner_id: Option<Uuid>,
}

impl AuthInfo {
    /// Account that owns imported data. Staff import into their owner's account.
    pub fn account_id(&self) -> Uuid {
        if self.role == "staff" {
            self.owner_id.unwrap_or(self.user_id)
        } else {
            self.user_id
        }
    }
}

/// Validate a JWT token and return claims
pub fn validate_token(token: &str, secret: &str) -> Result<Claims> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| anyhow!("Invalid token: {}", e))?;

    Ok(token_data.claims)
}

/// Extract authentication info from a NATS request
pub fn extract_auth<T>(request: &Request<T>, jwt_secret: &str) -> Result<AuthInfo> {
    let token = request
        .token
        .as_deref()
        .ok_or_else(|| anyhow!("No authentication provided, a JWT token is required"))?;

    let claims = validate_token(token, jwt_secret)?;
    let user_id = Uuid::parse_str(&claims.sub)
        .map_err(|e| anyhow!("Invalid user_id in token: {}", e))?;
    let owner_id = claims
        .owner_id
        .as_deref()
        .map(Uuid::parse_str)
        .transpose()
        .map_err(|e| anyhow!("Invalid owner_id in token: {}", e))?;

    Ok(AuthInfo {
        user_id,
        role: claims.role,
        owner_id,
    })
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use jsonwebtoken::{encode, EncodingKey, Header};

    const TEST_SECRET: &str = "test-secret-key-for-jwt-at-least-32-bytes-long";

    fn token(user_id: Uuid, role: &str, owner_id: Option<Uuid>, secret: &str) -> String {
        let now = Utc::now().timestamp() as usize;
        let claims = Claims {
            sub: user_id.to_string(),
            email: "baker@example.com".to_string(),
            role: role.to_string(),
            owner_id: owner_id.map(|id| id.to_string()),
            iat: now,
            exp: now + 3600,
        };
        encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes())).unwrap()
    }

    fn request(token: Option<String>) -> Request<serde_json::Value> {
        Request {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            token,
            payload: serde_json::Value::Null,
        }
    }

    #[test]
    fn test_owner_imports_into_own_account() {
        let user_id = Uuid::new_v4();
        let owner_request = request(Some(token(user_id, "owner", None, TEST_SECRET)));
        let auth = extract_auth(&owner_request, TEST_SECRET).unwrap();
        assert_eq!(auth.account_id(), user_id);
    }

    #[test]
    fn test_staff_imports_into_owner_account() {
        let user_id = Uuid::new_v4();
        let owner_id = Uuid::new_v4();
        let auth = extract_auth(
            &request(Some(token(user_id, "staff", Some(owner_id), TEST_SECRET))),
            TEST_SECRET,
        )
        .unwrap();
        assert_eq!(auth.user_id, user_id);
        assert_eq!(auth.account_id(), owner_id);
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let signed = token(Uuid::new_v4(), "owner", None, TEST_SECRET);
        assert!(validate_token(&signed, "another-secret-that-is-32-bytes-long!!").is_err());
    }

    #[test]
    fn test_missing_or_malformed_token_is_rejected() {
        assert!(extract_auth(&request(None), TEST_SECRET).is_err());
        assert!(extract_auth(&request(Some("not.a.token".to_string())), TEST_SECRET).is_err());
    }
}
