// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Access token issuance and verification.
//!
//! ## Token Format
//!
//! Compact JWS (`header.claims.signature`) signed with an HMAC algorithm
//! (HS256 by default) and the process-wide secret from `JWT_SECRET`.
//! Claims are `sub` (principal FRN), `iat` and `exp`.
//!
//! ## Security
//!
//! - Only the configured algorithm is accepted; anything else is a bad signature
//! - Expiry is checked without clock-skew leeway
//! - Tokens larger than [`MAX_TOKEN_SIZE_BYTES`] are rejected before parsing
//! - Tokens are never persisted and cannot be revoked before `exp`

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::Serialize;
use utoipa::ToSchema;

use super::claims::TokenClaims;
use super::error::TokenError;
use crate::config::Config;
use crate::frn::Frn;

/// Maximum accepted token size in bytes (8KB).
pub const MAX_TOKEN_SIZE_BYTES: usize = 8192;

/// Scheme name reported alongside issued tokens.
pub const TOKEN_TYPE: &str = "Bearer";

/// A freshly signed access token.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IssuedToken {
    /// Compact JWT to send as `Authorization: Bearer <token>`
    pub access_token: String,
    /// Always `Bearer`
    pub token_type: String,
    /// When the token was issued
    pub issued_at: DateTime<Utc>,
    /// When the token stops being accepted
    pub expires_at: DateTime<Utc>,
}

/// Issues and verifies signed, expiring tokens bound to a principal.
///
/// Holds only read-only key material; share it behind an `Arc`.
pub struct TokenManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    algorithm: Algorithm,
    ttl: TimeDelta,
    validation: Validation,
}

impl TokenManager {
    /// Create a manager for an HMAC secret.
    pub fn new(secret: &[u8], algorithm: Algorithm, ttl: Duration) -> Self {
        let mut validation = Validation::new(algorithm);
        validation.leeway = 0;
        validation.validate_aud = false;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            algorithm,
            ttl: TimeDelta::from_std(ttl).unwrap_or(TimeDelta::MAX),
            validation,
        }
    }

    /// Create a manager from the runtime configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.jwt_secret.as_bytes(),
            config.jwt_algorithm,
            config.token_ttl,
        )
    }

    /// Issue a token for `principal_id`, valid from now for the configured TTL.
    pub fn issue(&self, principal_id: &Frn) -> Result<IssuedToken, TokenError> {
        self.issue_at(principal_id, Utc::now())
    }

    /// Issue a token as if the current time were `issued_at`.
    pub fn issue_at(
        &self,
        principal_id: &Frn,
        issued_at: DateTime<Utc>,
    ) -> Result<IssuedToken, TokenError> {
        let expires_at = issued_at
            .checked_add_signed(self.ttl)
            .ok_or_else(|| TokenError::Signing("token expiry out of range".to_string()))?;

        let claims = TokenClaims {
            sub: principal_id.to_string(),
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        };

        let access_token = encode(&Header::new(self.algorithm), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Signing(e.to_string()))?;

        Ok(IssuedToken {
            access_token,
            token_type: TOKEN_TYPE.to_string(),
            issued_at,
            expires_at,
        })
    }

    /// Verify `token` and return the principal it names.
    ///
    /// Does not consult the credential store: the principal may no longer exist.
    pub fn extract_principal(&self, token: &str) -> Result<Frn, TokenError> {
        let claims = self.decode_claims(token)?;
        claims.sub.parse().map_err(|_| TokenError::Malformed)
    }

    /// True iff `token` verifies, is unexpired and names `expected`.
    pub fn validate(&self, token: &str, expected: &Frn) -> bool {
        matches!(self.extract_principal(token), Ok(subject) if subject == *expected)
    }

    fn decode_claims(&self, token: &str) -> Result<TokenClaims, TokenError> {
        if token.is_empty() || token.len() > MAX_TOKEN_SIZE_BYTES {
            return Err(TokenError::Malformed);
        }

        let data = decode::<TokenClaims>(token, &self.decoding_key, &self.validation)?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};

    const SECRET: &[u8] = b"test-secret-test-secret-test-secret!";
    const OTHER_SECRET: &[u8] = b"another-secret-another-secret-another";

    fn manager() -> TokenManager {
        TokenManager::new(SECRET, Algorithm::HS256, Duration::from_secs(3600))
    }

    fn frn(s: &str) -> Frn {
        s.parse().unwrap()
    }

    #[test]
    fn issued_token_validates_for_its_principal() {
        let tokens = manager();
        let alice = frn("frn:flashdash:user:abc123");

        let issued = tokens.issue(&alice).unwrap();
        assert_eq!(issued.token_type, "Bearer");
        assert_eq!(issued.expires_at - issued.issued_at, TimeDelta::hours(1));
        assert_eq!(issued.access_token.split('.').count(), 3);

        assert!(tokens.validate(&issued.access_token, &alice));
        assert_eq!(tokens.extract_principal(&issued.access_token).unwrap(), alice);
    }

    #[test]
    fn token_expires_after_ttl() {
        let tokens = manager();
        let alice = frn("frn:flashdash:user:abc123");

        let fresh_enough = tokens
            .issue_at(&alice, Utc::now() - TimeDelta::minutes(59))
            .unwrap();
        assert!(tokens.validate(&fresh_enough.access_token, &alice));

        let stale = tokens
            .issue_at(&alice, Utc::now() - TimeDelta::minutes(61))
            .unwrap();
        assert!(!tokens.validate(&stale.access_token, &alice));
        assert_eq!(
            tokens.extract_principal(&stale.access_token),
            Err(TokenError::Expired)
        );
    }

    #[test]
    fn token_signed_with_other_key_is_rejected() {
        let tokens = manager();
        let foreign = TokenManager::new(OTHER_SECRET, Algorithm::HS256, Duration::from_secs(3600));
        let alice = frn("frn:flashdash:user:abc123");

        let issued = foreign.issue(&alice).unwrap();
        assert_eq!(
            tokens.extract_principal(&issued.access_token),
            Err(TokenError::BadSignature)
        );
        assert!(!tokens.validate(&issued.access_token, &alice));
    }

    #[test]
    fn expired_token_with_bad_signature_reports_bad_signature() {
        let tokens = manager();
        let foreign = TokenManager::new(OTHER_SECRET, Algorithm::HS256, Duration::from_secs(60));
        let alice = frn("frn:flashdash:user:abc123");

        let issued = foreign
            .issue_at(&alice, Utc::now() - TimeDelta::days(2))
            .unwrap();
        assert_eq!(
            tokens.extract_principal(&issued.access_token),
            Err(TokenError::BadSignature)
        );
    }

    #[test]
    fn other_algorithm_is_rejected() {
        let tokens = manager();
        let hs512 = TokenManager::new(SECRET, Algorithm::HS512, Duration::from_secs(3600));
        let alice = frn("frn:flashdash:user:abc123");

        let issued = hs512.issue(&alice).unwrap();
        assert_eq!(
            tokens.extract_principal(&issued.access_token),
            Err(TokenError::BadSignature)
        );
    }

    #[test]
    fn tampered_subject_is_rejected() {
        let tokens = manager();
        let alice = frn("frn:flashdash:user:abc123");
        let issued = tokens.issue(&alice).unwrap();

        let parts: Vec<&str> = issued.access_token.split('.').collect();
        let payload = String::from_utf8(URL_SAFE_NO_PAD.decode(parts[1]).unwrap()).unwrap();
        let forged_payload = payload.replace("abc123", "mallory");
        let forged = format!(
            "{}.{}.{}",
            parts[0],
            URL_SAFE_NO_PAD.encode(forged_payload.as_bytes()),
            parts[2]
        );

        assert_eq!(
            tokens.extract_principal(&forged),
            Err(TokenError::BadSignature)
        );
    }

    #[test]
    fn garbage_is_malformed() {
        let tokens = manager();
        for raw in ["", "abc", "not.a.jwt", "a.b.c.d"] {
            assert_eq!(
                tokens.extract_principal(raw),
                Err(TokenError::Malformed),
                "input {raw:?}"
            );
        }
    }

    #[test]
    fn oversized_token_is_malformed() {
        let tokens = manager();
        let huge = "a".repeat(MAX_TOKEN_SIZE_BYTES + 1);
        assert_eq!(tokens.extract_principal(&huge), Err(TokenError::Malformed));
    }

    #[test]
    fn unsigned_token_is_rejected() {
        let tokens = manager();
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
        let claims = URL_SAFE_NO_PAD
            .encode(br#"{"sub":"frn:flashdash:user:abc123","iat":1,"exp":9999999999}"#);
        let token = format!("{header}.{claims}.");

        assert!(tokens.extract_principal(&token).is_err());
    }

    #[test]
    fn subject_must_be_an_frn() {
        let tokens = manager();
        let claims = TokenClaims {
            sub: "not-an-frn".to_string(),
            iat: Utc::now().timestamp(),
            exp: (Utc::now() + TimeDelta::hours(1)).timestamp(),
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(SECRET),
        )
        .unwrap();

        assert_eq!(tokens.extract_principal(&token), Err(TokenError::Malformed));
    }

    #[test]
    fn tokens_do_not_validate_across_principals() {
        let tokens = manager();
        let alice = frn("frn:flashdash:user:abc123");
        let bob = frn("frn:flashdash:user:def456");

        let alice_token = tokens.issue(&alice).unwrap().access_token;
        let bob_token = tokens.issue(&bob).unwrap().access_token;

        assert!(tokens.validate(&alice_token, &alice));
        assert!(tokens.validate(&bob_token, &bob));
        assert!(!tokens.validate(&alice_token, &bob));
        assert!(!tokens.validate(&bob_token, &alice));
    }
}
