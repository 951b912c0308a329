//! Tool definitions, execution, and lookup.
//!
//! The module follows the hexagonal layout used across the crate:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]

pub mod adapters;
pub mod domain;
pub mod ports;
