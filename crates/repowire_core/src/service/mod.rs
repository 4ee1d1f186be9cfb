//! Core use-case services.
//!
//! # Responsibility
//! - Act as owning objects whose repositories are wired at construction.
//! - Keep callers decoupled from storage details.

pub mod settings_service;
