//! Service layer for use-case orchestration.
//!
//! # Responsibility
//! - Expose the record operations consumed by transport layers.
//! - Keep transport code independent from storage details.

pub mod record_service;
