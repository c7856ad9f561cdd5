use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;

/// What a caller may do, as granted by the host that issued the token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    EditPosts,
    ManageOptions,
}

impl Capability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::EditPosts => "edit_posts",
            Capability::ManageOptions => "manage_options",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i64,
    pub exp: usize,
    #[serde(default)]
    pub capabilities: Vec<Capability>,
}

impl Claims {
    pub fn can(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }

    pub fn require(&self, capability: Capability) -> Result<(), AppError> {
        if self.can(capability) {
            Ok(())
        } else {
            tracing::warn!(user_id = self.sub, capability = capability.as_str(), "Capability missing");
            Err(AppError::Permission(anyhow::anyhow!(
                "Insufficient permissions: {} required",
                capability.as_str()
            )))
        }
    }
}

pub fn decode_token(token: &str, secret: &Secret<String>) -> Result<Claims, AppError> {
    let validation = Validation::new(Algorithm::HS256);
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.expose_secret().as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| {
        tracing::error!("JWT validation failed: {:?}", e);
        AppError::Authentication(anyhow::anyhow!("Invalid or expired token"))
    })
}

/// Tokens are issued by the identity provider; this signs them for tests.
#[cfg(test)]
pub(crate) fn encode_token(claims: &Claims, secret: &Secret<String>) -> Result<String, AppError> {
    use jsonwebtoken::{encode, EncodingKey, Header};

    let header = Header::new(Algorithm::HS256);
    encode(&header, claims, &EncodingKey::from_secret(secret.expose_secret().as_bytes())).map_err(|e| {
        AppError::Unexpected(anyhow::Error::new(e).context("Failed to encode JWT token"))
    })
}

#[cfg(test)]
pub(crate) fn token_for(user_id: i64, capabilities: &[Capability], secret: &Secret<String>) -> String {
    let claims = Claims {
        sub: user_id,
        exp: (chrono::Utc::now() + chrono::Duration::hours(1)).timestamp() as usize,
        capabilities: capabilities.to_vec(),
    };
    encode_token(&claims, secret).unwrap()
}
