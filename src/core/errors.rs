//! core::errors
//!
//! Error taxonomy for spec-list expansion and concretization.
//!
//! # Propagation Policy
//!
//! Everything here is fatal and propagates unchanged to the caller. The
//! only failures ever caught and acted upon locally are the recoverable
//! concretization kinds (see `concretize::retry`); once attribution fails
//! they surface here as [`SpecListError::Concretize`].

use thiserror::Error;

use crate::concretize::ConcretizeError;
use crate::spec::SpecError;

/// Errors from spec-list expansion, merging, and mutation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SpecListError {
    /// A `$name` marker names a list absent from the reference table.
    #[error(
        "spec list `{list}` refers to named list `{reference}` \
         which does not appear in its reference table"
    )]
    UndefinedReference {
        /// Name of the list owning the marker.
        list: String,
        /// The missing reference name.
        reference: String,
    },

    /// Expanding a reference re-entered a list already being expanded.
    #[error("spec list `{list}` participates in a reference cycle through `{reference}`")]
    CircularReference {
        /// Name of the list whose expansion hit the cycle.
        list: String,
        /// The reference that closed the cycle.
        reference: String,
    },

    /// A reference table entry's lock was poisoned by an earlier panic.
    #[error("reference table entry `{reference}` is unusable (poisoned by an earlier panic)")]
    PoisonedReference {
        /// The unusable reference name.
        reference: String,
    },

    /// A reference inside a matrix axis expanded to a matrix, which
    /// cannot be spliced into an axis of plain spec strings.
    #[error(
        "spec list `{list}`: reference `{reference}` expands to a matrix \
         and cannot be used inside a matrix axis"
    )]
    NestedMatrix {
        /// Name of the list owning the matrix.
        list: String,
        /// The offending reference name.
        reference: String,
    },

    /// The constraint builder received a sequence still containing a
    /// reference marker (the sequence was not expanded first).
    #[error("unexpanded reference `${0}` in constraint builder input")]
    UnexpandedReference(String),

    /// A constraint list lacks exactly one fragment naming a package.
    #[error(
        "`{expr}` is not a valid concretization target: concretization \
         requires exactly one named spec per constraint list, found {named}"
    )]
    InvalidSpecConstraint {
        /// Rendered form of the constraint list.
        expr: String,
        /// How many named fragments were found.
        named: usize,
    },

    /// `remove` did not match exactly one raw element.
    #[error("cannot remove `{spec}`: expected exactly one matching element, found {count}")]
    RemoveMatch {
        /// The spec expression given to `remove`.
        spec: String,
        /// Number of structural matches found.
        count: usize,
    },

    /// A spec expression failed to parse, or a merge hit an
    /// irreconcilable conflict.
    #[error(transparent)]
    Spec(#[from] SpecError),

    /// A non-recoverable (or unattributable) concretization failure.
    #[error(transparent)]
    Concretize(#[from] ConcretizeError),
}
