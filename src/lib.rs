// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Relational Mini-App Auth - Session Gateway for Messaging Mini-Apps
//!
//! This crate verifies platform-signed init data sent by embedded mini-apps
//! and issues first-party session tokens for subsequent API calls.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - Init data verification, session tokens and request guards
//! - `config` - Environment configuration
//! - `store` - In-memory user directory

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod state;
pub mod store;
