//! The identity claims carried inside a bearer token.

use serde_derive::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// The user's role, as issued by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    Admin,
    User,
    /// Anything else the issuer decides to hand out.
    Other(String),
}

impl Role {
    pub fn as_str(&self) -> &str {
        match self {
            Role::Admin => "ADMIN",
            Role::User => "USER",
            Role::Other(other) => other,
        }
    }

    pub fn is_admin(&self) -> bool { *self == Role::Admin }
}

impl From<String> for Role {
    fn from(s: String) -> Role {
        match s.as_str() {
            "ADMIN" => Role::Admin,
            "USER" => Role::User,
            _ => Role::Other(s),
        }
    }
}

impl From<Role> for String {
    fn from(role: Role) -> String { role.as_str().to_string() }
}

impl Display for Role {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The decoded payload of a token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    #[serde(rename = "userId")]
    pub user_id: i64,
    pub username: String,
    pub role: Role,
    /// When the token stops being valid, in seconds since the Unix epoch.
    #[serde(rename = "exp", default, deserialize_with = "whole_seconds")]
    pub expires_at: Option<i64>,
}

/// Some issuers write `exp` as a float, round those down.
fn whole_seconds<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let exp = <Option<serde_json::Number> as serde::Deserialize>::deserialize(
        deserializer,
    )?;

    Ok(exp.and_then(|n| n.as_i64().or_else(|| n.as_f64().map(|f| f.floor() as i64))))
}

impl Claims {
    /// Decode the claims from a JWT's payload segment.
    ///
    /// The signature is *not* verified. The client only reads the identity
    /// the server already vouched for when it issued the token.
    pub fn decode(token: &str) -> Result<Claims, TokenError> {
        let mut segments = token.split('.');
        let payload = match (
            segments.next(),
            segments.next(),
            segments.next(),
            segments.next(),
        ) {
            (Some(_), Some(payload), Some(_), None) if !payload.is_empty() => {
                payload
            },
            _ => return Err(TokenError::Malformed),
        };

        let raw = base64::decode_config(
            payload.trim_end_matches('='),
            base64::URL_SAFE_NO_PAD,
        )?;
        let value: serde_json::Value =
            serde_json::from_slice(&raw).map_err(TokenError::NotJson)?;
        log::trace!("Token payload: {}", value);

        serde_json::from_value(value).map_err(TokenError::InvalidClaims)
    }

    /// A token without an expiry is never trusted.
    pub fn is_expired_at(&self, now: i64) -> bool {
        match self.expires_at {
            Some(exp) => exp <= now,
            None => true,
        }
    }
}

/// Reasons a token can't be turned into [`Claims`].
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("The token should have three dot-separated segments")]
    Malformed,
    #[error("The token payload isn't valid base64")]
    Base64(#[from] base64::DecodeError),
    #[error("The token payload isn't JSON")]
    NotJson(#[source] serde_json::Error),
    #[error("The token payload doesn't match the expected claims")]
    InvalidClaims(#[source] serde_json::Error),
}

/// Build an unsigned token around an arbitrary payload.
#[cfg(test)]
pub(crate) fn forge(payload: &serde_json::Value) -> String {
    let header = base64::encode_config(
        br#"{"alg":"HS256","typ":"JWT"}"#,
        base64::URL_SAFE_NO_PAD,
    );
    let body = base64::encode_config(
        payload.to_string().as_bytes(),
        base64::URL_SAFE_NO_PAD,
    );

    format!("{}.{}.signature", header, body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decode_a_well_formed_token() {
        let token = forge(&json!({
            "userId": 42,
            "username": "alice",
            "role": "ADMIN",
            "exp": 2_000_000_000_i64,
        }));
        let should_be = Claims {
            user_id: 42,
            username: String::from("alice"),
            role: Role::Admin,
            expires_at: Some(2_000_000_000),
        };

        let got = Claims::decode(&token).unwrap();

        assert_eq!(got, should_be);
    }

    #[test]
    fn unknown_roles_are_kept_verbatim() {
        let token = forge(&json!({
            "userId": 7,
            "username": "bob",
            "role": "TEACHER",
            "exp": 1,
        }));

        let got = Claims::decode(&token).unwrap();

        assert_eq!(got.role, Role::Other(String::from("TEACHER")));
        assert!(!got.role.is_admin());
    }

    #[test]
    fn missing_expiry_is_always_expired() {
        let token = forge(&json!({
            "userId": 7,
            "username": "bob",
            "role": "USER",
        }));

        let got = Claims::decode(&token).unwrap();

        assert_eq!(got.expires_at, None);
        assert!(got.is_expired_at(0));
        assert!(got.is_expired_at(i64::MIN));
    }

    #[test]
    fn fractional_expiries_are_rounded_down() {
        let token = forge(&json!({
            "userId": 7,
            "username": "bob",
            "role": "USER",
            "exp": 1_700_000_000.75,
        }));

        let got = Claims::decode(&token).unwrap();

        assert_eq!(got.expires_at, Some(1_700_000_000));
        assert!(!got.is_expired_at(1_699_999_999));
        assert!(got.is_expired_at(1_700_000_000));
    }

    #[test]
    fn a_non_numeric_expiry_is_invalid() {
        let token = forge(&json!({
            "userId": 7,
            "username": "bob",
            "role": "USER",
            "exp": "tomorrow",
        }));

        let got = Claims::decode(&token);

        assert!(matches!(got, Err(TokenError::InvalidClaims(_))));
    }

    #[test]
    fn expiry_is_inclusive() {
        let claims = Claims {
            user_id: 1,
            username: String::new(),
            role: Role::User,
            expires_at: Some(100),
        };

        assert!(!claims.is_expired_at(99));
        assert!(claims.is_expired_at(100));
        assert!(claims.is_expired_at(101));
    }

    #[test]
    fn reject_tokens_with_the_wrong_shape() {
        for token in &["", "abc", "a.b", "a.b.c.d", "a..c"] {
            let got = Claims::decode(token);
            assert!(
                matches!(got, Err(TokenError::Malformed)),
                "{:?} gave {:?}",
                token,
                got
            );
        }
    }

    #[test]
    fn reject_payloads_that_arent_base64() {
        let got = Claims::decode("header.!!!.signature");

        assert!(matches!(got, Err(TokenError::Base64(_))));
    }

    #[test]
    fn reject_payloads_that_arent_json() {
        let payload =
            base64::encode_config(b"not json", base64::URL_SAFE_NO_PAD);
        let token = format!("header.{}.signature", payload);

        let got = Claims::decode(&token);

        assert!(matches!(got, Err(TokenError::NotJson(_))));
    }

    #[test]
    fn reject_payloads_missing_identity_fields() {
        let token = forge(&json!({ "sub": "alice", "exp": 2_000_000_000_i64 }));

        let got = Claims::decode(&token);

        assert!(matches!(got, Err(TokenError::InvalidClaims(_))));
    }

    #[test]
    fn roles_round_trip_through_their_wire_names() {
        assert_eq!(serde_json::to_value(Role::Admin).unwrap(), "ADMIN");
        assert_eq!(
            serde_json::from_value::<Role>(json!("USER")).unwrap(),
            Role::User
        );
    }
}
