//! Core use-case services layered over the repositories.
//!
//! # Responsibility
//! - Enforce rules that span more than one table.
//! - Keep repositories free of cross-entity sequencing.

pub mod consistency;
