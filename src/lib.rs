//! Authorize requests against a hierarchical resource tree, and propagate
//! configuration changes from the tree up to the deployment unit that owns
//! them.
//!
//! The decision engine lives in [`policy`]; the tree classification and the
//! configuration propagator live in [`tree`] and [`deploy`].

pub mod config;
pub mod deploy;
pub mod logs;
pub mod policy;
pub mod tree;
pub mod types;
