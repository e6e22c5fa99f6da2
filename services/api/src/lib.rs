//! services/api/src/lib.rs
//!
//! The HTTP service around `triathlon_core`: adapters, configuration and routes.

pub mod adapters;
pub mod config;
pub mod error;
pub mod web;
