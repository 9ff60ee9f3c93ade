//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate tree mutations and repository writes into note use-cases.
//! - Keep editing surfaces decoupled from storage details.

pub mod note_service;
