use super::model::Claims;
use crate::core::error::AppError;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use std::time::Duration;

/// Validates HS256 bearer tokens issued by the authentication service
pub struct JwtValidator {
    decoding_key: DecodingKey,
    audience: String,
    leeway: u64,
}

impl JwtValidator {
    pub fn new(secret: &str, audience: String, leeway: Duration) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            audience,
            leeway: leeway.as_secs(),
        }
    }

    /// Validate the token and return the user id it was issued for
    pub fn validate_token(&self, token: &str) -> Result<i32, AppError> {
        let header = decode_header(token).map_err(|e| AppError::Unauthorized(e.to_string()))?;

        if header.alg != Algorithm::HS256 {
            return Err(AppError::Unauthorized(format!(
                "Unsupported algorithm: {:?}. Only HS256 is allowed",
                header.alg
            )));
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[&self.audience]);
        validation.leeway = self.leeway;

        let token_data = decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(|e| AppError::Unauthorized(e.to_string()))?;

        token_data
            .claims
            .sub
            .parse::<i32>()
            .map_err(|_| AppError::Unauthorized("Invalid token subject".to_string()))
    }
}
