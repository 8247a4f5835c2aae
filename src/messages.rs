// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Localized error message catalog.
//!
//! Catalogs live in `messages/<locale>.json` and are embedded at build time.
//! Each maps an error code (`E401001`, ...) to a `cause` and an `action`.
//! The default locale must cover every [`ErrorCode`]; other locales may be
//! partial and fall back to it.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::OnceLock;

use serde::Deserialize;
use thiserror::Error;

use crate::error::ErrorCode;

pub const DEFAULT_LOCALE: &str = "en";

const EMBEDDED_CATALOGS: &[(&str, &str)] = &[
    ("en", include_str!("../messages/en.json")),
    ("es", include_str!("../messages/es.json")),
];

/// Text shown to the caller for one error code.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Message {
    pub cause: String,
    pub action: String,
}

impl Message {
    fn generic() -> Self {
        Self {
            cause: "An unexpected error occurred.".to_string(),
            action: "Try again later.".to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog for locale `{locale}` is not valid JSON: {source}")]
    Parse {
        locale: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("catalog for locale `{locale}` has unknown code `{code}`")]
    UnknownCode { locale: String, code: String },

    #[error("default catalog `{locale}` has no entry for `{code}`")]
    MissingEntry { locale: String, code: String },
}

/// Error messages per locale.
#[derive(Debug, Default)]
pub struct MessageCatalog {
    locales: HashMap<String, HashMap<ErrorCode, Message>>,
}

impl MessageCatalog {
    /// Parse catalogs from `(locale, json)` pairs.
    pub fn from_sources(sources: &[(&str, &str)]) -> Result<Self, CatalogError> {
        let mut locales = HashMap::new();

        for (locale, json) in sources {
            let raw: HashMap<String, Message> =
                serde_json::from_str(json).map_err(|source| CatalogError::Parse {
                    locale: locale.to_string(),
                    source,
                })?;

            let mut messages = HashMap::with_capacity(raw.len());
            for (code, message) in raw {
                let error_code =
                    ErrorCode::from_code(&code).ok_or_else(|| CatalogError::UnknownCode {
                        locale: locale.to_string(),
                        code: code.clone(),
                    })?;
                messages.insert(error_code, message);
            }
            locales.insert(locale.to_lowercase(), messages);
        }

        let default = locales.get(DEFAULT_LOCALE);
        for code in ErrorCode::ALL {
            if !default.is_some_and(|m| m.contains_key(&code)) {
                return Err(CatalogError::MissingEntry {
                    locale: DEFAULT_LOCALE.to_string(),
                    code: code.code().to_string(),
                });
            }
        }

        Ok(Self { locales })
    }

    /// Load the catalogs compiled into the binary.
    pub fn load_embedded() -> Result<Self, CatalogError> {
        Self::from_sources(EMBEDDED_CATALOGS)
    }

    /// Shared embedded catalog, for rendering outside a request pipeline.
    pub fn builtin() -> &'static MessageCatalog {
        static BUILTIN: OnceLock<MessageCatalog> = OnceLock::new();
        BUILTIN.get_or_init(|| {
            Self::load_embedded().unwrap_or_else(|e| {
                tracing::error!(error = %e, "Embedded message catalog is invalid");
                Self::default()
            })
        })
    }

    /// Message for `code` in `locale`, falling back to the default locale.
    pub fn lookup(&self, code: ErrorCode, locale: &str) -> Message {
        self.locales
            .get(locale)
            .and_then(|m| m.get(&code))
            .or_else(|| self.locales.get(DEFAULT_LOCALE).and_then(|m| m.get(&code)))
            .cloned()
            .unwrap_or_else(Message::generic)
    }

    /// Pick the best supported locale for an `Accept-Language` header value.
    pub fn negotiate(&self, accept_language: Option<&str>) -> &str {
        let Some(header) = accept_language else {
            return DEFAULT_LOCALE;
        };

        let mut candidates: Vec<(f32, usize, String)> = header
            .split(',')
            .enumerate()
            .filter_map(|(position, part)| {
                let mut pieces = part.trim().split(';');
                let tag = pieces.next()?.trim();
                if tag.is_empty() {
                    return None;
                }
                let quality = pieces
                    .find_map(|p| p.trim().strip_prefix("q="))
                    .and_then(|q| q.parse::<f32>().ok())
                    .unwrap_or(1.0);
                let primary = tag.split('-').next()?.to_lowercase();
                Some((quality, position, primary))
            })
            .collect();

        candidates.sort_by(|a, b| {
            b.0.partial_cmp(&a.0)
                .unwrap_or(Ordering::Equal)
                .then(a.1.cmp(&b.1))
        });

        candidates
            .into_iter()
            .filter(|(quality, _, _)| *quality > 0.0)
            .find_map(|(_, _, lang)| self.locales.get_key_value(&lang).map(|(k, _)| k.as_str()))
            .unwrap_or(DEFAULT_LOCALE)
    }
}
