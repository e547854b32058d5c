//! Stateless HS256 session tokens.
//!
//! A token is a JWT whose claims carry the user id, issue time, expiry and a
//! random token id. Nothing is stored server side: a token is valid exactly
//! when its signature checks out under the process secret and `exp` has not
//! passed.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, AuthError};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Claims {
    pub sub: String,  // User ID
    pub iat: i64,     // Issued at
    pub exp: i64,     // Expiration time
    pub jti: String,  // Token ID
}

impl Claims {
    pub fn user_id(&self) -> Result<i64, AuthError> {
        self.sub.parse().map_err(|_| AuthError::MalformedToken)
    }
}

#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenCodec {
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "iat", "sub"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            ttl,
        }
    }

    pub fn issue(&self, user_id: i64) -> Result<String, AppError> {
        self.issue_at(user_id, Utc::now())
    }

    /// Issues a token as if the current time were `issued_at`.
    pub fn issue_at(&self, user_id: i64, issued_at: DateTime<Utc>) -> Result<String, AppError> {
        let expires_at = issued_at
            .checked_add_signed(self.ttl)
            .ok_or_else(|| AppError::InternalError("token expiry out of range".to_string()))?;
        let claims = Claims {
            sub: user_id.to_string(),
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::InternalError(format!("Failed to encode token: {}", e)))
    }

    pub fn decode_claims(&self, token: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                ErrorKind::InvalidSignature => AuthError::InvalidSignature,
                _ => AuthError::MalformedToken,
            })
    }

    /// Returns the user id embedded in a valid token. No store lookup happens.
    pub fn verify(&self, token: &str) -> Result<i64, AuthError> {
        self.decode_claims(token)?.user_id()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};

    fn codec() -> TokenCodec {
        TokenCodec::new(b"test_secret_key_for_testing_purposes_only", Duration::hours(1))
    }

    fn split(token: &str) -> (String, String, String) {
        let parts: Vec<&str> = token.split('.').collect();
        assert_eq!(parts.len(), 3);
        (parts[0].to_string(), parts[1].to_string(), parts[2].to_string())
    }

    #[test]
    fn test_issue_and_verify_roundtrip() {
        let codec = codec();
        let token = codec.issue(42).unwrap();
        assert_eq!(codec.verify(&token), Ok(42));

        let claims = codec.decode_claims(&token).unwrap();
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_tokens_for_same_user_differ() {
        let codec = codec();
        let now = Utc::now();
        let a = codec.issue_at(1, now).unwrap();
        let b = codec.issue_at(1, now).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_expired_token() {
        let codec = codec();
        let token = codec.issue_at(42, Utc::now() - Duration::hours(2)).unwrap();
        assert_eq!(codec.verify(&token), Err(AuthError::TokenExpired));
    }

    #[test]
    fn test_flipped_signature_bit() {
        let codec = codec();
        let token = codec.issue(42).unwrap();
        let (header, payload, signature) = split(&token);

        let mut bytes = URL_SAFE_NO_PAD.decode(signature).unwrap();
        bytes[0] ^= 0x01;
        let tampered = format!("{}.{}.{}", header, payload, URL_SAFE_NO_PAD.encode(bytes));

        assert_eq!(codec.verify(&tampered), Err(AuthError::InvalidSignature));
    }

    #[test]
    fn test_tampered_payload() {
        let codec = codec();
        let token = codec.issue(42).unwrap();
        let (header, payload, signature) = split(&token);

        let mut claims: Claims =
            serde_json::from_slice(&URL_SAFE_NO_PAD.decode(payload).unwrap()).unwrap();
        claims.sub = "1".to_string();
        let forged = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims).unwrap());

        let tampered = format!("{}.{}.{}", header, forged, signature);
        assert_eq!(codec.verify(&tampered), Err(AuthError::InvalidSignature));
    }

    #[test]
    fn test_wrong_secret() {
        let token = TokenCodec::new(b"secret-A", Duration::hours(1)).issue(42).unwrap();
        let other = TokenCodec::new(b"secret-B", Duration::hours(1));
        assert_eq!(other.verify(&token), Err(AuthError::InvalidSignature));
    }

    #[test]
    fn test_expired_and_tampered_reports_signature() {
        let codec = codec();
        let token = codec.issue_at(42, Utc::now() - Duration::hours(2)).unwrap();
        let (header, payload, signature) = split(&token);
        let mut bytes = URL_SAFE_NO_PAD.decode(signature).unwrap();
        bytes[5] ^= 0x80;
        let tampered = format!("{}.{}.{}", header, payload, URL_SAFE_NO_PAD.encode(bytes));

        assert_eq!(codec.verify(&tampered), Err(AuthError::InvalidSignature));
    }

    #[test]
    fn test_malformed_tokens() {
        let codec = codec();
        for token in ["", "not-a-token", "a.b", "a.b.c", "...."] {
            assert_eq!(codec.verify(token), Err(AuthError::MalformedToken), "token {:?}", token);
        }
    }

    #[test]
    fn test_non_numeric_subject_is_malformed() {
        let secret = b"test_secret_key_for_testing_purposes_only";
        let now = Utc::now();
        let claims = Claims {
            sub: "not-a-number".to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::hours(1)).timestamp(),
            jti: Uuid::new_v4().to_string(),
        };
        let token = encode(&Header::default(), &claims, &EncodingKey::from_secret(secret)).unwrap();

        assert_eq!(codec().verify(&token), Err(AuthError::MalformedToken));
    }

    #[test]
    fn test_unrepresentable_expiry_is_an_error() {
        let codec = TokenCodec::new(b"secret", Duration::seconds(10_000_000_000_000));
        assert!(matches!(codec.issue(42), Err(AppError::InternalError(_))));
    }
}
