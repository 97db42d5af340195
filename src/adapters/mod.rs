//! Adapters Layer - Hexagonal Architecture Outer Ring
//!
//! Implements the port traits defined in `crate::ports` with concrete
//! external dependencies (HTTP clients, file I/O). Each sub-module
//! groups adapters by infrastructure concern.
//!
//! Adapter categories:
//! - `feeds`: HTTP and file payload sources
//! - `metrics`: Prometheus run metrics export
//! - `persistence`: atomic JSON snapshot storage

pub mod feeds;
pub mod metrics;
pub mod persistence;
