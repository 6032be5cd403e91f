//! Access-token codec.
//!
//! Access tokens are HS512-signed JWTs carrying exactly two claims: the
//! expiry timestamp and the id of the session they reference (`jti`). All
//! authority is re-derived by looking that session up; no other claims are
//! trusted.

use chrono::Utc;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::types::SessionId;

/// The signing algorithm every token must use. Tokens signed with anything
/// else are rejected regardless of signature validity.
const ALGORITHM: Algorithm = Algorithm::HS512;

/// Claims embedded in every access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Expiration time (UTC Unix timestamp).
    pub exp: i64,
    /// The referenced session id.
    pub jti: SessionId,
}

/// How strictly [`TokenCodec::decode`] treats the `exp` claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyMode {
    /// Reject expired tokens. Used by the access guard.
    Strict,
    /// Accept an expired but otherwise valid token. Used by refresh, where
    /// only the referenced session's state matters.
    AllowExpired,
}

/// Structured decode result distinguishing a fresh token from an expired
/// one that passed every other check.
#[derive(Debug, Clone)]
pub enum ParsedAccess {
    Valid(AccessClaims),
    /// Only produced in [`VerifyMode::AllowExpired`].
    Expired(AccessClaims),
}

impl ParsedAccess {
    pub fn claims(&self) -> &AccessClaims {
        match self {
            ParsedAccess::Valid(c) | ParsedAccess::Expired(c) => c,
        }
    }
}

/// Codec failures, kept distinct so callers can branch on "expired but
/// otherwise valid" versus everything else.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("token expired")]
    Expired,
    #[error("invalid signature")]
    InvalidSignature,
    #[error("malformed token")]
    Malformed,
    #[error("signing failure: {0}")]
    Signing(String),
}

/// Stateless JWT encoder/decoder bound to a single symmetric key.
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl TokenCodec {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// Mint an access token referencing `session_id`, valid for `ttl`.
    pub fn encode(
        &self,
        session_id: SessionId,
        ttl: chrono::Duration,
    ) -> Result<String, TokenError> {
        let claims = AccessClaims {
            exp: (Utc::now() + ttl).timestamp(),
            jti: session_id,
        };
        encode(&Header::new(ALGORITHM), &claims, &self.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Verify signature and structure, returning the embedded claims.
    ///
    /// Expiry is enforced per `mode`. No leeway: a token is expired the
    /// second its `exp` passes.
    pub fn decode(&self, token: &str, mode: VerifyMode) -> Result<ParsedAccess, TokenError> {
        let mut validation = Validation::new(ALGORITHM);
        validation.leeway = 0;

        match decode::<AccessClaims>(token, &self.decoding, &validation) {
            Ok(data) => Ok(ParsedAccess::Valid(data.claims)),
            Err(e) if matches!(e.kind(), ErrorKind::ExpiredSignature) => match mode {
                VerifyMode::Strict => Err(TokenError::Expired),
                VerifyMode::AllowExpired => {
                    // Signature already held up; re-decode with the exp
                    // check disabled to recover the claims.
                    let mut lenient = Validation::new(ALGORITHM);
                    lenient.leeway = 0;
                    lenient.validate_exp = false;
                    let data = decode::<AccessClaims>(token, &self.decoding, &lenient)
                        .map_err(|_| TokenError::Malformed)?;
                    Ok(ParsedAccess::Expired(data.claims))
                }
            },
            Err(e) => match e.kind() {
                ErrorKind::InvalidSignature
                | ErrorKind::InvalidAlgorithm
                | ErrorKind::InvalidAlgorithmName => Err(TokenError::InvalidSignature),
                _ => Err(TokenError::Malformed),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use uuid::Uuid;

    fn codec() -> TokenCodec {
        TokenCodec::new("test-secret-that-is-long-enough-for-hmac")
    }

    #[test]
    fn encode_then_decode_roundtrips_session_id() {
        let codec = codec();
        let id = Uuid::new_v4();
        let token = codec
            .encode(id, chrono::Duration::minutes(15))
            .expect("encoding should succeed");

        let parsed = codec
            .decode(&token, VerifyMode::Strict)
            .expect("decoding should succeed");
        assert_matches!(parsed, ParsedAccess::Valid(ref c) if c.jti == id);
    }

    #[test]
    fn expired_token_rejected_in_strict_mode() {
        let codec = codec();
        let token = codec
            .encode(Uuid::new_v4(), chrono::Duration::seconds(-300))
            .expect("encoding should succeed");

        let result = codec.decode(&token, VerifyMode::Strict);
        assert_matches!(result, Err(TokenError::Expired));
    }

    #[test]
    fn expired_token_accepted_in_allow_expired_mode() {
        let codec = codec();
        let id = Uuid::new_v4();
        let token = codec
            .encode(id, chrono::Duration::seconds(-300))
            .expect("encoding should succeed");

        let parsed = codec
            .decode(&token, VerifyMode::AllowExpired)
            .expect("expired-but-valid token should parse");
        assert_matches!(parsed, ParsedAccess::Expired(ref c) if c.jti == id);
    }

    #[test]
    fn wrong_key_fails_even_when_expiry_is_bypassed() {
        let token = codec()
            .encode(Uuid::new_v4(), chrono::Duration::minutes(15))
            .expect("encoding should succeed");

        let other = TokenCodec::new("a-completely-different-signing-key");
        assert_matches!(
            other.decode(&token, VerifyMode::AllowExpired),
            Err(TokenError::InvalidSignature)
        );
    }

    #[test]
    fn foreign_algorithm_rejected() {
        // Token signed with HS256 instead of the pinned HS512.
        let claims = AccessClaims {
            exp: (Utc::now() + chrono::Duration::minutes(15)).timestamp(),
            jti: Uuid::new_v4(),
        };
        let secret = "test-secret-that-is-long-enough-for-hmac";
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .expect("encoding should succeed");

        let result = TokenCodec::new(secret).decode(&token, VerifyMode::Strict);
        assert_matches!(result, Err(TokenError::InvalidSignature));
    }

    #[test]
    fn garbage_is_malformed() {
        assert_matches!(
            codec().decode("not-a-jwt", VerifyMode::Strict),
            Err(TokenError::Malformed)
        );
    }
}
