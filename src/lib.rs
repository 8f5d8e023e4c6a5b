//! # Chat Backend Library
//!
//! Messaging core for a chat application:
//! - Private (1:1, deduplicated) and group rooms with membership rules
//! - Messages with edits, tombstones, emoji reactions and read receipts
//! - A WebSocket relay for call signaling (offer/answer/ICE/end)
//! - PostgreSQL storage, or an in-memory store when no database is configured
//!
//! ## Architecture
//!
//! - **Domain Layer**: entities, repository traits, access guard
//! - **Application Layer**: room directory and message store services, DTOs
//! - **Infrastructure Layer**: database, token validation, file storage, metrics
//! - **Presentation Layer**: HTTP handlers and the signaling WebSocket
//!
//! ## Module Structure
//!
//! ```text
//! chat_backend/
//! +-- config/         Configuration management
//! +-- domain/         Entities, repository traits, access guard
//! +-- application/    Services and DTOs
//! +-- infrastructure/ PostgreSQL, in-memory store, JWT, uploads, metrics
//! +-- presentation/   HTTP routes, middleware, signaling relay
//! +-- shared/         Errors, snowflake ids, validation helpers
//! ```

// Configuration module
pub mod config;

// Domain layer - Core business logic
pub mod domain;

// Application layer - Business services
pub mod application;

// Infrastructure layer - External implementations
pub mod infrastructure;

// Presentation layer - HTTP and WebSocket handlers
pub mod presentation;

// Shared utilities
pub mod shared;

// Application startup and state management
pub mod startup;

// Telemetry and observability
pub mod telemetry;
