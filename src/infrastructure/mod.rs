//! Infrastructure Layer
//!
//! Contains implementations for external services including:
//! - Database repositories (PostgreSQL and in-memory)
//! - JWT token validation
//! - Local file storage
//! - Prometheus metrics

pub mod auth;
pub mod database;
pub mod metrics;
pub mod repositories;
pub mod storage;
