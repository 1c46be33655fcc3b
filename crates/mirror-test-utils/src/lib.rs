//! Shared test utilities for the tree-mirror workspace.
//!
//! Dev-dependency only, never published.
//!
//! - [`project`]: [`TestProject`] with a project tree and a host directory
//!   side by side in one temp dir

pub mod project;

pub use project::TestProject;
