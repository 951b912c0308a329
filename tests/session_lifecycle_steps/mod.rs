//! Step definitions for session lifecycle scenarios.

mod given;
mod then;
mod when;
pub mod world;
