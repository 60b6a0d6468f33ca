//! Breed data layer: fetch breed records from one of two upstream
//! integrations and hand a uniform list to a display layer.
//!
//! # Overview
//! `HttpClient` builds requests, executes them through a `Transport` and
//! classifies the responses. A `BreedRepository` turns upstream payloads
//! into `BreedRecord`s: `DirectRecordRepository` for the breeds REST API,
//! `RunLogRepository` for a workflow orchestrator's per-run value store.
//! `Dashboard` keeps the current list for a refresh loop.
//!
//! # Design
//! - The client is parameterized by `UpstreamProfile` (base URL and optional
//!   basic credential) so both integrations share one request path.
//! - Upstream DTOs are lenient; `BreedRecord` is strict (non-empty name).
//! - Per-item failures are collected into `BreedBatch::skipped`, top-level
//!   failures are returned as `ApiError`.

pub mod client;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod http;
pub mod repository;
pub mod transport;
pub mod types;

#[cfg(test)]
mod test_support;

pub use client::HttpClient;
pub use config::{BasicAuth, Config, Integration, UpstreamProfile};
pub use dashboard::{Dashboard, DashboardStats};
pub use error::{ApiError, ConfigError, LookupError, TransportError};
pub use http::{HttpMethod, HttpRequest, HttpResponse, RequestOptions};
pub use repository::{
    repository_for, repository_with, BreedRepository, DirectRecordRepository, RunLogRepository, DEFAULT_LIMIT,
    DEFAULT_WORKFLOW_ID,
};
pub use transport::{Transport, UreqTransport};
pub use types::{BreedBatch, BreedRecord, BreedStats, HealthCheck, RunDescriptor, SkippedItem};
