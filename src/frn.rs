// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # FlashDash Resource Names (FRN)
//!
//! Every externally visible resource is addressed by an FRN instead of a raw
//! database key:
//!
//! ```text
//! frn:<service>:<resource-type>:<base62-id>
//! frn:flashdash:user:5mYq3rVxk0BzQ1c9HfT2aW
//! ```
//!
//! Generated ids carry 122 bits of randomness (UUID v4) rendered in base62.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;
use uuid::Uuid;

const PREFIX: &str = "frn";

const BASE62_ALPHABET: &[u8; 62] =
    b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// Kinds of resources that can be named by an FRN.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceType {
    User,
    Deck,
    Card,
    Question,
    GameSession,
    Invitation,
}

impl ResourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::User => "user",
            ResourceType::Deck => "deck",
            ResourceType::Card => "card",
            ResourceType::Question => "question",
            ResourceType::GameSession => "game-session",
            ResourceType::Invitation => "invitation",
        }
    }
}

impl FromStr for ResourceType {
    type Err = FrnError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(ResourceType::User),
            "deck" => Ok(ResourceType::Deck),
            "card" => Ok(ResourceType::Card),
            "question" => Ok(ResourceType::Question),
            "game-session" => Ok(ResourceType::GameSession),
            "invitation" => Ok(ResourceType::Invitation),
            other => Err(FrnError::UnknownResourceType(other.to_string())),
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrnError {
    #[error("identifier must start with `frn:`")]
    MissingPrefix,

    #[error("identifier must have 4 `:`-separated segments, got {0}")]
    WrongSegmentCount(usize),

    #[error("invalid service segment `{0}`")]
    InvalidService(String),

    #[error("unknown resource type `{0}`")]
    UnknownResourceType(String),

    #[error("invalid resource id `{0}` (expected base62)")]
    InvalidId(String),
}

/// A parsed FlashDash Resource Name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Frn {
    service: String,
    resource_type: ResourceType,
    id: String,
}

impl Frn {
    /// Generate a fresh, globally unique FRN.
    ///
    /// `service` must already be validated (lowercase ASCII alphanumerics);
    /// configuration loading enforces this for the process-wide value.
    pub fn generate(service: &str, resource_type: ResourceType) -> Self {
        Self {
            service: service.to_string(),
            resource_type,
            id: encode_base62(Uuid::new_v4().as_u128()),
        }
    }

    /// Build an FRN from its parts, validating each one.
    pub fn new(
        service: impl Into<String>,
        resource_type: ResourceType,
        id: impl Into<String>,
    ) -> Result<Self, FrnError> {
        let service = service.into();
        let id = id.into();
        validate_service(&service)?;
        validate_id(&id)?;
        Ok(Self {
            service,
            resource_type,
            id,
        })
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    pub fn resource_type(&self) -> ResourceType {
        self.resource_type
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

impl fmt::Display for Frn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{PREFIX}:{}:{}:{}",
            self.service, self.resource_type, self.id
        )
    }
}

impl FromStr for Frn {
    type Err = FrnError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let segments: Vec<&str> = s.split(':').collect();
        match segments.as_slice() {
            [prefix, service, resource_type, id] => {
                if *prefix != PREFIX {
                    return Err(FrnError::MissingPrefix);
                }
                let resource_type: ResourceType = resource_type.parse()?;
                Frn::new(*service, resource_type, *id)
            }
            [prefix, ..] if *prefix != PREFIX => Err(FrnError::MissingPrefix),
            other => Err(FrnError::WrongSegmentCount(other.len())),
        }
    }
}

impl Serialize for Frn {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Frn {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

fn validate_service(service: &str) -> Result<(), FrnError> {
    if service.is_empty()
        || !service
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
    {
        return Err(FrnError::InvalidService(service.to_string()));
    }
    Ok(())
}

fn validate_id(id: &str) -> Result<(), FrnError> {
    if id.is_empty() || !id.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(FrnError::InvalidId(id.to_string()));
    }
    Ok(())
}

fn encode_base62(mut value: u128) -> String {
    if value == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::with_capacity(22);
    while value > 0 {
        let index = (value % 62) as usize;
        digits.push(BASE62_ALPHABET.get(index).copied().unwrap_or(b'0'));
        value /= 62;
    }
    digits.reverse();
    String::from_utf8(digits).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn parses_canonical_user_frn() {
        let frn: Frn = "frn:flashdash:user:abc123".parse().unwrap();
        assert_eq!(frn.service(), "flashdash");
        assert_eq!(frn.resource_type(), ResourceType::User);
        assert_eq!(frn.id(), "abc123");
        assert_eq!(frn.to_string(), "frn:flashdash:user:abc123");
    }

    #[test]
    fn parses_hyphenated_resource_type() {
        let frn: Frn = "frn:flashdash:game-session:Zz9".parse().unwrap();
        assert_eq!(frn.resource_type(), ResourceType::GameSession);
    }

    #[test]
    fn rejects_malformed_identifiers() {
        assert_eq!(
            "urn:flashdash:user:abc".parse::<Frn>(),
            Err(FrnError::MissingPrefix)
        );
        assert_eq!(
            "frn:flashdash:user".parse::<Frn>(),
            Err(FrnError::WrongSegmentCount(3))
        );
        assert_eq!(
            "frn:flashdash:user:abc:extra".parse::<Frn>(),
            Err(FrnError::WrongSegmentCount(5))
        );
        assert!(matches!(
            "frn:Flash:user:abc".parse::<Frn>(),
            Err(FrnError::InvalidService(_))
        ));
        assert!(matches!(
            "frn:flashdash:robot:abc".parse::<Frn>(),
            Err(FrnError::UnknownResourceType(_))
        ));
        assert!(matches!(
            "frn:flashdash:user:ab-c".parse::<Frn>(),
            Err(FrnError::InvalidId(_))
        ));
        assert!(matches!(
            "frn:flashdash:user:".parse::<Frn>(),
            Err(FrnError::InvalidId(_))
        ));
    }

    #[test]
    fn generated_frns_are_unique_and_parse_back() {
        let mut seen = HashSet::new();
        for _ in 0..1000 {
            let frn = Frn::generate("flashdash", ResourceType::Deck);
            let reparsed: Frn = frn.to_string().parse().unwrap();
            assert_eq!(reparsed, frn);
            assert!(seen.insert(frn));
        }
    }

    #[test]
    fn base62_encoding() {
        assert_eq!(encode_base62(0), "0");
        assert_eq!(encode_base62(61), "z");
        assert_eq!(encode_base62(62), "10");
        assert_eq!(encode_base62(u128::MAX).len(), 22);
    }

    #[test]
    fn serde_uses_textual_form() {
        let frn: Frn = "frn:flashdash:user:abc123".parse().unwrap();
        let json = serde_json::to_string(&frn).unwrap();
        assert_eq!(json, r#""frn:flashdash:user:abc123""#);

        let back: Frn = serde_json::from_str(&json).unwrap();
        assert_eq!(back, frn);

        assert!(serde_json::from_str::<Frn>(r#""not-an-frn""#).is_err());
    }
}
