//! Keystone Core - Shared configuration for the Keystone runtime
//!
//! This crate provides the foundational types used by the ECS and its clients:
//! - Capacity configuration for an entity manager
//! - TOML loading and saving of that configuration
//! - Configuration error types

pub mod config;

pub use config::{ConfigError, EcsConfig};
