//! Core services for the VALORA valuation platform.
//!
//! The crate hosts the valuation orchestrator (pipelines, dispatch, job tracking and
//! image uploads), the cached and rate limited data feeds, the marketplace domain, and
//! the gateway client that fronts the orchestrator. Each module exposes a router builder
//! so the service binary can compose them.

pub mod config;
pub mod error;
pub mod feeds;
pub mod gateway;
pub mod marketplace;
pub mod telemetry;
pub mod valuation;
