//! Domain models for Tessera.
//!
//! These are the core types shared across all crates.

pub mod audit;
pub mod context;
pub mod principal;
pub mod project;
pub mod project_access;
pub mod resource_share;
pub mod tenant;
pub mod work_item;
