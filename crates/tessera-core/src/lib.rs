//! Tessera Core: domain models, error taxonomy and the traits the access
//! services consume from their collaborators (stores, audit sink, clock).

pub mod clock;
pub mod error;
pub mod models;
pub mod repository;
