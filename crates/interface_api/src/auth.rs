//! Authentication and authorization

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use core_kernel::{CustomerId, UserId};
use domain_warranty::{Actor, Role};

/// JWT claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// User's roles, e.g. `SC_STAFF`
    pub roles: Vec<String>,
    /// Present for customer accounts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,
    /// Expiration timestamp
    pub exp: i64,
    /// Issued at timestamp
    pub iat: i64,
}

/// Auth errors
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid token")]
    InvalidToken,
    #[error("Token expired")]
    TokenExpired,
    #[error("Malformed claim {claim}: {value}")]
    MalformedClaim { claim: &'static str, value: String },
}

impl Claims {
    /// Resolves the claims into the caller the services authorize
    pub fn to_actor(&self) -> Result<Actor, AuthError> {
        let user_id: UserId = self.sub.parse().map_err(|_| AuthError::MalformedClaim {
            claim: "sub",
            value: self.sub.clone(),
        })?;

        let roles = self
            .roles
            .iter()
            .map(|r| {
                r.parse::<Role>().map_err(|_| AuthError::MalformedClaim {
                    claim: "roles",
                    value: r.clone(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let actor = Actor::new(user_id, roles);
        match &self.customer_id {
            Some(raw) => {
                let customer_id: CustomerId = raw.parse().map_err(|_| AuthError::MalformedClaim {
                    claim: "customer_id",
                    value: raw.clone(),
                })?;
                Ok(actor.with_customer(customer_id))
            }
            None => Ok(actor),
        }
    }
}

/// Creates a new HS256 token for an actor
///
/// Login is handled elsewhere; the API only verifies tokens. This is used by
/// tooling and tests.
pub fn create_token(actor: &Actor, secret: &str, expiration_secs: u64) -> Result<String, AuthError> {
    let now = Utc::now();
    let exp = now + Duration::seconds(expiration_secs as i64);

    let claims = Claims {
        sub: actor.user_id.as_uuid().to_string(),
        roles: actor.roles.iter().map(|r| r.as_str().to_string()).collect(),
        customer_id: actor.customer_id.map(|c| c.as_uuid().to_string()),
        exp: exp.timestamp(),
        iat: now.timestamp(),
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|_| AuthError::InvalidToken)
}

/// Validates a JWT token
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, AuthError> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => AuthError::TokenExpired,
        _ => AuthError::InvalidToken,
    })?;

    Ok(token_data.claims)
}
