//! Foundation types for cmdroute.
//!
//! This crate contains the types shared by every cmdroute crate: the error
//! taxonomy, type tags and type-erased argument values, and the dispatcher
//! configuration model.

pub mod config;
pub mod error;
pub mod value;
