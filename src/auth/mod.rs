// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! This module verifies mini-app callers and manages their sessions.
//!
//! ## Auth Flow
//!
//! 1. The mini-app receives signed init data from the messaging platform
//! 2. It sends the init data as `Authorization: tma <init data>` (or in the
//!    `initData` body field) to `/v1/auth/miniapp`
//! 3. The server:
//!    - Verifies the HMAC-SHA256 signature against the bot token
//!    - Rejects init data older than the configured maximum age
//!    - Extracts the platform user into an `IdentityClaim`
//!    - Issues a session token (HS256 JWT, own secret)
//! 4. Later calls send `Authorization: Bearer <session token>`
//!
//! ## Security
//!
//! - Platform secret and session secret are independent
//! - Signatures are compared in constant time
//! - Expired tokens are reported separately so clients can re-authenticate
//! - Secrets, signatures and tokens are never logged

pub mod claims;
pub mod error;
pub mod extractor;
pub mod init_data;
pub mod middleware;
pub mod session;

pub use claims::{IdentityClaim, SessionClaims};
pub use error::{AuthError, AuthRejection, SessionError, VerificationError};
pub use extractor::{Auth, InitDataAuth, OptionalAuth};
pub use init_data::InitDataVerifier;
pub use session::{extract_bearer, SessionManager, SessionToken};
