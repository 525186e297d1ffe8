/// Bearer token validation for identity-provider issued JWTs
///
/// The identity provider signs tokens with RS256; services receive the
/// provider's public key and validate only. An HS256 shared-secret mode exists
/// for local development and tests, where no provider is running.
///
/// ## Usage
///
/// ```rust,ignore
/// use crypto_core::jwt::JwtValidator;
///
/// let public_key = std::env::var("JWT_PUBLIC_KEY_PEM")?;
/// let validator = JwtValidator::from_rsa_pem(&public_key)?;
/// let claims = validator.validate(token)?;
/// println!("caller = {}", claims.sub);
/// ```
use anyhow::{anyhow, Result};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Minimum accepted length for HS256 shared secrets
const MIN_SECRET_LEN: usize = 16;

/// Claims carried by identity-provider tokens.
///
/// `sub` is the stable caller id; the profile fields are optional because
/// providers omit them for accounts that never filled them in.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Claims {
    /// Subject (stable caller id)
    pub sub: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Display name
    #[serde(default)]
    pub name: Option<String>,
    /// Email address
    #[serde(default)]
    pub email: Option<String>,
    /// Avatar URL
    #[serde(default)]
    pub picture: Option<String>,
}

/// Validates bearer tokens against a single, fixed key.
#[derive(Clone)]
pub struct JwtValidator {
    key: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for JwtValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtValidator")
            .field("algorithms", &self.validation.algorithms)
            .field("key", &"[REDACTED]")
            .finish()
    }
}

impl JwtValidator {
    /// Validator for RS256 tokens signed by the identity provider.
    pub fn from_rsa_pem(public_key_pem: &str) -> Result<Self> {
        let key = DecodingKey::from_rsa_pem(public_key_pem.as_bytes())
            .map_err(|e| anyhow!("Failed to parse RSA public key: {e}"))?;

        Ok(Self {
            key,
            validation: strict_validation(Algorithm::RS256),
        })
    }

    /// Validator for HS256 tokens (local development and tests only).
    pub fn from_secret(secret: &[u8]) -> Result<Self> {
        if secret.len() < MIN_SECRET_LEN {
            return Err(anyhow!(
                "JWT shared secret must be at least {MIN_SECRET_LEN} bytes"
            ));
        }

        Ok(Self {
            key: DecodingKey::from_secret(secret),
            validation: strict_validation(Algorithm::HS256),
        })
    }

    /// Validate signature and expiry, returning the decoded claims.
    pub fn validate(&self, token: &str) -> Result<Claims> {
        let data = decode::<Claims>(token, &self.key, &self.validation)
            .map_err(|e| anyhow!("Token validation failed: {e}"))?;

        if data.claims.sub.trim().is_empty() {
            return Err(anyhow!("Token subject is empty"));
        }

        Ok(data.claims)
    }
}

fn strict_validation(algorithm: Algorithm) -> Validation {
    // One algorithm per validator; a token signed with anything else is rejected.
    let mut validation = Validation::new(algorithm);
    validation.validate_exp = true;
    validation.set_required_spec_claims(&["exp", "sub"]);
    validation
}

/// Issue an HS256 token for the given caller.
///
/// Used by local tooling and tests standing in for the identity provider.
pub fn issue_hs256_token(
    secret: &[u8],
    sub: &str,
    name: Option<&str>,
    email: Option<&str>,
    picture: Option<&str>,
    ttl: Duration,
) -> Result<String> {
    let now = Utc::now();
    let claims = Claims {
        sub: sub.to_string(),
        iat: now.timestamp(),
        exp: (now + ttl).timestamp(),
        name: name.map(str::to_string),
        email: email.map(str::to_string),
        picture: picture.map(str::to_string),
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret),
    )
    .map_err(|e| anyhow!("Failed to issue token: {e}"))
}
