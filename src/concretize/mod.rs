//! concretize
//!
//! The external concretizer seam and the adaptive retry engine driving it.
//!
//! # Design
//!
//! Concretization resolves a merged, possibly under-constrained spec into
//! one fully pinned build specification. The resolver itself is an
//! external collaborator behind the [`Concretizer`] trait; this module
//! owns the contract and the retry policy around it.
//!
//! Failures come back as structured [`ConcretizeError`] values carrying
//! the offending identifiers as typed fields. The retry engine never
//! scrapes message text: it attributes reported dependency or variant
//! names to concrete constraint fragments, drops them, and retries (see
//! [`retry`]).
//!
//! # Modules
//!
//! - [`retry`]: per-constraint-list retry loop
//! - [`mock`]: deterministic in-memory concretizer for testing
//!
//! # Error Handling
//!
//! Only the two recoverable kinds (`InfeasibleDependencies`,
//! `UnknownVariants`) are ever caught, and only by the retry engine.
//! Every other kind propagates unchanged.

use thiserror::Error;

use crate::spec::Spec;

pub mod mock;
pub mod retry;

pub use retry::{concretize_all, concretize_list};

/// Structured errors from the external concretizer.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConcretizeError {
    /// One or more requested dependencies cannot be satisfied.
    /// Recoverable: the retry engine drops the requesting fragments.
    #[error("cannot satisfy dependency request(s): {}", .0.join(", "))]
    InfeasibleDependencies(Vec<String>),

    /// One or more requested variants are unknown to the package.
    /// Recoverable: the retry engine drops the requesting fragments.
    #[error("unknown variant(s): {}", .0.join(", "))]
    UnknownVariants(Vec<String>),

    /// The spec names a package the concretizer does not know.
    #[error("unknown package: {0}")]
    UnknownPackage(String),

    /// Any other resolver failure. Never retried.
    #[error("concretization failed: {0}")]
    Internal(String),
}

/// The external concretizer collaborator.
///
/// Implementations may be arbitrarily expensive; calls are blocking and
/// this layer provides no timeout or cancellation.
pub trait Concretizer<S: Spec> {
    /// Resolve a merged spec into a fully pinned build specification.
    ///
    /// # Errors
    ///
    /// Structured [`ConcretizeError`] kinds; the recoverable ones must
    /// carry every offending identifier so the caller can attribute the
    /// failure to removable constraint fragments.
    fn concretize(&self, spec: &S) -> Result<S, ConcretizeError>;
}
