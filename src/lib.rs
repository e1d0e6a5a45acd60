//! Metrics, deadline alerts and dashboard layouts for user-defined services.
//!
//! A service is a table whose columns are authored by users. This crate
//! infers which columns hold the deadline, the amount and the workflow
//! status, aggregates the live rows into a `MetricsSnapshot`, and keeps the
//! per-user widget layout that displays it. Rows, schemas and persistence of
//! anything but layouts and alert windows belong to the host application.

pub mod alerts;
pub mod config;
pub mod db;
pub mod error;
pub mod fields;
pub mod layout;
pub mod metrics;
mod migrations;
pub mod roles;
pub mod schema;
pub mod services;
pub mod status;
pub mod store;

pub use alerts::{bucket, AlertBucket, AlertDigest, AlertWindowConfig};
pub use config::EngineConfig;
pub use error::{ConfigError, StoreError};
pub use layout::{LayoutManager, LayoutOutcome, WidgetKey, WidgetLayout, WidgetView};
pub use metrics::{aggregate, aggregate_with, MetricsSnapshot, StatusGroup, TimelineSpan};
pub use roles::{resolve, ResolvedRoles, RoleCache};
pub use schema::{ColumnDefinition, ColumnOption, Row, Schema, SemanticType};
pub use services::{AlertWindowSettings, DashboardData, DashboardService};
pub use status::{categorize, StatusCategory};
pub use store::{AlertConfigStore, LayoutScope, LayoutStore, LayoutUpdate, MemoryStore};

/// Install `env_logger` as the `log` backend. Honors `RUST_LOG`; defaults to `info`.
/// Safe to call more than once.
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();
}
