// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! FlashDash - Flashcard Learning Service (authentication core)
//!
//! Stateless JWT authentication for the FlashDash HTTP API: principals are
//! identified by FRNs, every request gets a request-scoped security context,
//! and every failure is answered with a structured, localized error body.
//!
//! ## Modules
//!
//! - `api` - HTTP handlers, OpenAPI document and the middleware stack (Axum)
//! - `auth` - Token manager, authentication filter, authorization gate
//! - `bootstrap` - Store selection and admin seeding at startup
//! - `config` - Environment configuration
//! - `error` - Error codes and the error responder
//! - `frn` - FlashDash resource names
//! - `messages` - Localized error message catalog
//! - `storage` - Credential store (in-memory or redb)

pub mod api;
pub mod auth;
pub mod bootstrap;
pub mod config;
pub mod error;
pub mod frn;
pub mod messages;
pub mod models;
pub mod state;
pub mod storage;
