//! Opsdesk E2E Harness Support Layer
//!
//! This crate provides the pieces of the Opsdesk acceptance suite with real
//! state and failure-handling design:
//! - Tracks ephemeral resources a test creates on the dashboard and
//!   guarantees each one a best-effort cleanup call after the test
//! - Stands up a short-lived local listener that captures the CLI-login
//!   redirect callback and exposes it as an awaitable result with timeout
//!   semantics
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      Test execution                          │
//! ├──────────────────────────────────────────────────────────────┤
//! │  TestResources (one tracker per resource kind, per test)     │
//! │    └── track(kind, id)  ── ids extracted from page URLs      │
//! │                             (extract::*_id_from_url)         │
//! │  CleanupCoordinator (finally-style hook)                     │
//! │    └── run(resources) ─► DashboardClient                     │
//! │          close_session / delete_issue, one call per id,      │
//! │          failures isolated ─► CleanupReport                  │
//! │  CallbackCaptureServer                                       │
//! │    ├── start()            bind first free port, serve axum   │
//! │    ├── callback_url()     http://localhost:<port>/callback   │
//! │    ├── wait_for_callback  record-or-timeout race             │
//! │    └── cleanup()          stop + clear captured record       │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Browser driving, dashboard business logic, and assertion vocabulary live
//! elsewhere in the suite; this layer only owns resource bookkeeping and
//! callback capture.

pub mod callback;
pub mod cleanup;
pub mod client;
pub mod error;
pub mod extract;
pub mod tracker;

pub use callback::{CallbackCaptureServer, CallbackRecord, CallbackServerConfig};
pub use cleanup::{CleanupCoordinator, CleanupOutcome, CleanupReport};
pub use client::{DashboardClient, DashboardConfig};
pub use error::{HarnessError, HarnessResult};
pub use tracker::{ResourceKind, ResourceTracker, TestResources};
