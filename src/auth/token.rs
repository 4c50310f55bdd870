/// Signed-claim token codec
///
/// Both token kinds of the gateway (session cookie and flow state) are JWTs
/// signed with one process-wide symmetric key. The codec pins the algorithm to
/// HS256, so tokens declaring any other algorithm (including `none`) never
/// verify.
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::error::TokenError;

/// The only algorithm the codec signs with and accepts.
pub const SIGNING_ALGORITHM: Algorithm = Algorithm::HS256;

/// Registered claims shared by every token kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedClaims {
    #[serde(rename = "sub")]
    pub subject: String,

    #[serde(rename = "iat", with = "chrono::serde::ts_seconds")]
    pub issued_at: DateTime<Utc>,

    #[serde(rename = "nbf", with = "chrono::serde::ts_seconds")]
    pub not_before: DateTime<Utc>,

    #[serde(rename = "exp", with = "chrono::serde::ts_seconds")]
    pub expires_at: DateTime<Utc>,
}

impl SignedClaims {
    /// Claims valid from `now` for `lifetime`, truncated to whole seconds.
    pub fn issue(subject: impl Into<String>, lifetime: Duration) -> Self {
        let now = Utc::now();
        let now = DateTime::from_timestamp(now.timestamp(), 0).unwrap_or(now);
        Self {
            subject: subject.into(),
            issued_at: now,
            not_before: now,
            expires_at: now + lifetime,
        }
    }

    /// Moves the whole validity window by `offset`.
    pub fn shift(&mut self, offset: Duration) {
        self.issued_at += offset;
        self.not_before += offset;
        self.expires_at += offset;
    }
}

impl Default for SignedClaims {
    fn default() -> Self {
        Self {
            subject: String::new(),
            issued_at: DateTime::UNIX_EPOCH,
            not_before: DateTime::UNIX_EPOCH,
            expires_at: DateTime::UNIX_EPOCH,
        }
    }
}

/// Sign/verify engine over JSON claim sets.
///
/// Object safe so generators and tests can share one codec behind an `Arc`.
pub trait TokenCodec: Send + Sync {
    /// Signs the claim set and returns the compact token string.
    fn sign(&self, claims: &serde_json::Value) -> Result<String, TokenError>;

    /// Verifies signature, algorithm, validity window and subject.
    fn verify(&self, token: &str) -> Result<serde_json::Value, TokenError>;
}

/// Typed helpers on top of any [`TokenCodec`].
pub trait TokenCodecExt: TokenCodec {
    fn encode_claims<T: Serialize>(&self, claims: &T) -> Result<String, TokenError> {
        let value =
            serde_json::to_value(claims).map_err(|e| TokenError::Encoding(e.to_string()))?;
        self.sign(&value)
    }

    fn decode_claims<T: DeserializeOwned>(&self, token: &str) -> Result<T, TokenError> {
        let value = self.verify(token)?;
        serde_json::from_value(value).map_err(|e| TokenError::Malformed(e.to_string()))
    }
}

impl<C: TokenCodec + ?Sized> TokenCodecExt for C {}

/// HS256 JWT implementation of [`TokenCodec`].
pub struct JwtCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtCodec {
    pub fn new(secret: &[u8]) -> Self {
        let mut validation = Validation::new(SIGNING_ALGORITHM);
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.validate_nbf = true;
        validation.set_required_spec_claims(&["exp", "nbf", "sub"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
        }
    }
}

impl std::fmt::Debug for JwtCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtCodec")
            .field("algorithm", &SIGNING_ALGORITHM)
            .finish_non_exhaustive()
    }
}

impl TokenCodec for JwtCodec {
    fn sign(&self, claims: &serde_json::Value) -> Result<String, TokenError> {
        encode(&Header::new(SIGNING_ALGORITHM), claims, &self.encoding_key)
            .map_err(|e| TokenError::Encoding(e.to_string()))
    }

    fn verify(&self, token: &str) -> Result<serde_json::Value, TokenError> {
        let data = decode::<serde_json::Value>(token, &self.decoding_key, &self.validation)?;

        if data.header.alg != SIGNING_ALGORITHM {
            return Err(TokenError::SignatureMismatch);
        }

        match data.claims.get("sub").and_then(|s| s.as_str()) {
            Some(subject) if !subject.is_empty() => Ok(data.claims),
            _ => Err(TokenError::EmptySubject),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Probe {
        #[serde(flatten)]
        claims: SignedClaims,
        note: String,
    }

    fn probe(subject: &str) -> Probe {
        Probe {
            claims: SignedClaims::issue(subject, Duration::minutes(5)),
            note: "hello".to_string(),
        }
    }

    #[test]
    fn test_sign_and_verify() {
        let codec = JwtCodec::new(b"test-key");
        let original = probe("jdoe@example.com");

        let token = codec.encode_claims(&original).unwrap();
        assert_eq!(token.split('.').count(), 3);

        let decoded: Probe = codec.decode_claims(&token).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn test_wrong_key_is_signature_mismatch() {
        let signer = JwtCodec::new(b"key-one");
        let verifier = JwtCodec::new(b"key-two");

        let token = signer.encode_claims(&probe("jdoe@example.com")).unwrap();
        assert_eq!(
            verifier.verify(&token).unwrap_err(),
            TokenError::SignatureMismatch
        );
    }

    #[test]
    fn test_tampered_payload_is_rejected() {
        let codec = JwtCodec::new(b"test-key");
        let token = codec.encode_claims(&probe("jdoe@example.com")).unwrap();

        let mut forged = probe("admin@example.com");
        forged.note = "forged".to_string();
        let forged_payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&forged).unwrap());

        let parts: Vec<&str> = token.split('.').collect();
        let tampered = format!("{}.{}.{}", parts[0], forged_payload, parts[2]);

        assert_eq!(
            codec.verify(&tampered).unwrap_err(),
            TokenError::SignatureMismatch
        );
    }

    #[test]
    fn test_expired_token() {
        let codec = JwtCodec::new(b"test-key");
        let mut claims = probe("jdoe@example.com");
        claims.claims.shift(-Duration::minutes(10));

        let token = codec.encode_claims(&claims).unwrap();
        assert_eq!(codec.verify(&token).unwrap_err(), TokenError::Expired);
    }

    #[test]
    fn test_not_yet_valid_token() {
        let codec = JwtCodec::new(b"test-key");
        let mut claims = probe("jdoe@example.com");
        claims.claims.shift(Duration::minutes(2));

        let token = codec.encode_claims(&claims).unwrap();
        assert_eq!(codec.verify(&token).unwrap_err(), TokenError::NotYetValid);
    }

    #[test]
    fn test_empty_subject() {
        let codec = JwtCodec::new(b"test-key");
        let token = codec.encode_claims(&probe("")).unwrap();
        assert_eq!(codec.verify(&token).unwrap_err(), TokenError::EmptySubject);
    }

    #[test]
    fn test_missing_subject() {
        let codec = JwtCodec::new(b"test-key");
        let now = Utc::now().timestamp();
        let token = codec
            .sign(&serde_json::json!({ "iat": now, "nbf": now, "exp": now + 60 }))
            .unwrap();
        assert_eq!(codec.verify(&token).unwrap_err(), TokenError::EmptySubject);
    }

    #[test]
    fn test_garbage_is_malformed() {
        let codec = JwtCodec::new(b"test-key");
        assert!(matches!(
            codec.verify("0123456789"),
            Err(TokenError::Malformed(_))
        ));
        assert!(matches!(codec.verify(""), Err(TokenError::Malformed(_))));
    }

    #[test]
    fn test_other_hmac_algorithm_is_rejected() {
        let codec = JwtCodec::new(b"test-key");
        let token = jsonwebtoken::encode(
            &Header::new(Algorithm::HS512),
            &probe("jdoe@example.com"),
            &EncodingKey::from_secret(b"test-key"),
        )
        .unwrap();

        assert_eq!(
            codec.verify(&token).unwrap_err(),
            TokenError::SignatureMismatch
        );
    }

    #[test]
    fn test_unsigned_token_is_rejected() {
        let codec = JwtCodec::new(b"test-key");
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
        let payload =
            URL_SAFE_NO_PAD.encode(serde_json::to_vec(&probe("jdoe@example.com")).unwrap());

        for token in [
            format!("{}.{}.", header, payload),
            format!("{}.{}", header, payload),
        ] {
            let err = codec.verify(&token).unwrap_err();
            assert!(
                matches!(err, TokenError::Malformed(_) | TokenError::SignatureMismatch),
                "unexpected error {:?}",
                err
            );
        }
    }

    #[test]
    fn test_claims_are_whole_seconds() {
        let claims = SignedClaims::issue("jdoe@example.com", Duration::hours(24));
        assert_eq!(claims.issued_at.timestamp_subsec_nanos(), 0);
        assert_eq!(claims.issued_at, claims.not_before);
        assert_eq!(claims.expires_at - claims.issued_at, Duration::hours(24));
    }
}
