//! ClassHub GitHub infrastructure adapter.
//!
//! Implements the platform-facing ports defined in the [`classroom`] crate
//! ([`classroom::PlatformClient`], [`classroom::UserPlatformClient`]) over
//! the GitHub REST API with [`reqwest`].
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** This crate must not contain domain rules. All GitHub
//! API details — endpoints, authentication headers, status-code
//! classification, rate-limit handling — live here; the [`classroom`] crate
//! never sees them.
//!
//! ## Credentials
//!
//! Two clients, two credentials: [`GithubRestClient`] carries the
//! application's administrative token and serves every capability except
//! invitation acceptance, which GitHub only permits with the invitee's own
//! token — that one call lives on [`GithubUserClient`].

mod client;
mod wire;

pub use client::{GithubRestClient, GithubUserClient, DEFAULT_API_URL};
