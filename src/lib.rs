//! # notescope
//!
//! A scope-aware client library for a remote notebook service.
//!
//! An account's content is split across several **authorization
//! domains**: the user's own notebooks, notebooks other people shared to
//! them, notebooks linked from an organization ("business") account, and
//! app-scoped notebooks. Each domain may need its own credential and its
//! own backend endpoint. This crate presents one logical surface over all
//! of them and does the scope resolution transparently:
//!
//! - [`Client::list_notebooks`] merges the personal, shared, linked and
//!   business listings into one deduplicated catalog (the same notebook
//!   often appears in several domains at once).
//! - [`Client::get_note`] / [`Client::get_notebook`] try the personal
//!   store first and, only on a not-found outcome, walk the linked
//!   notebooks, minting a per-notebook credential for each.
//! - [`Client::delete_note`] / [`Client::share_note`] reuse the
//!   credential a note was fetched through, falling back to the same
//!   scope walk when it has none or it went stale.
//!
//! Lookups keep "does not exist" and "call failed" apart: a guid that
//! exists nowhere yields `Ok(None)`, never an error.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │  Client (client.rs)                                        │
//! │  - session caches: user, stores, business auth             │
//! │  - note upload, share URLs                                 │
//! └────────────────────────────────────────────────────────────┘
//!          │                    │                    │
//!          ▼                    ▼                    ▼
//! ┌───────────────┐   ┌──────────────────┐   ┌───────────────┐
//! │  catalog.rs   │   │  scope.rs        │   │  auth.rs      │
//! │  aggregation  │   │  scope fallback  │   │  credentials  │
//! └───────────────┘   └──────────────────┘   └───────────────┘
//!          │                    │                    │
//!          ▼                    ▼                    ▼
//! ┌────────────────────────────────────────────────────────────┐
//! │  store/ (Gateway + NoteStore traits)                       │
//! │  - production transport lives outside this crate           │
//! │  - memory.rs: in-process fake service for tests            │
//! └────────────────────────────────────────────────────────────┘
//! ```
//!
//! All calls are blocking and issued sequentially; a [`Client`] instance
//! is meant for one thread. Remote failures are translated once, at the
//! call site, into the [`Error`] taxonomy (see `error.rs`).
//!
//! ## Example
//!
//! ```
//! use notescope::store::memory::fixtures::ServiceFixture;
//!
//! let fixture = ServiceFixture::new();
//! let client = fixture.client();
//! assert!(client.list_notebooks().unwrap().is_empty());
//! ```
//!
//! ## Module Overview
//!
//! - [`client`]: the session facade, entry point for all operations
//! - `catalog.rs`: the notebook-aggregation algorithm (attaches
//!   `list_notebooks` to the client)
//! - [`scope`]: the personal-then-linked fallback protocol
//! - [`auth`]: per-notebook credential resolution and token predicates
//! - [`model`]: the merged [`Notebook`] and [`Note`] domain objects
//! - [`store`]: the remote-gateway boundary and the in-memory service
//! - [`error`]: error taxonomy and translation

pub mod auth;
mod catalog;
pub mod client;
pub mod error;
pub mod model;
pub mod scope;
pub mod store;

pub use client::Client;
pub use error::{Error, Result};
pub use model::{Note, Notebook};
pub use scope::Scope;
