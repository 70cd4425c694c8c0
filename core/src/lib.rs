//! Shared types for the govdesk services and tools.

pub mod directory;
pub mod error;
pub mod turn;
