//! spec
//!
//! The external Spec collaborator seam.
//!
//! # Design
//!
//! The spec-list core never interprets spec expressions itself. Parsing,
//! the satisfies predicate, and constraint merging all belong to an
//! external spec implementation; this module defines the [`Spec`] trait
//! that implementation must provide. The core treats specs as opaque
//! beyond this surface: it parses fragments, sorts and merges them, and
//! asks structured questions (name, dependency names, variant names) when
//! recovering from concretization failures.
//!
//! # Modules
//!
//! - [`mock`]: deterministic in-memory implementation for testing
//!
//! # Error Handling
//!
//! [`SpecError`] carries the two failure modes of the seam: an expression
//! that does not parse, and a constrain call against an irreconcilable
//! constraint.

use thiserror::Error;

pub mod mock;

/// Errors from the spec collaborator.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SpecError {
    /// The expression is not a valid spec.
    #[error("invalid spec expression `{expr}`: {reason}")]
    Parse {
        /// The offending expression.
        expr: String,
        /// What made it invalid.
        reason: String,
    },

    /// Two specs carry constraints that cannot be merged.
    #[error("cannot constrain `{left}` with `{right}`: {reason}")]
    Conflict {
        /// Rendered form of the spec being constrained.
        left: String,
        /// Rendered form of the constraint being applied.
        right: String,
        /// The conflicting field.
        reason: String,
    },
}

/// One build specification, possibly anonymous and under-constrained.
///
/// A fragment like `%gcc@4.9.3` parses to an anonymous spec (no package
/// name); `zlib ~shared` parses to a named one. Constraining folds one
/// spec's requirements into another, failing on irreconcilable conflicts.
///
/// # Contract
///
/// - `parse` followed by `to_string` must round-trip structurally:
///   `parse(&s.to_string()) == s`.
/// - `constrain` is cumulative: constraints already present are kept, new
///   ones merge in, and a contradiction is an error rather than a silent
///   overwrite.
/// - `dependency_names` / `variant_names` expose the identifiers the
///   concretizer may report in structured errors, so that failures can be
///   attributed back to fragments without scraping message text.
pub trait Spec: Clone + PartialEq + std::fmt::Debug + std::fmt::Display + Sized {
    /// Parse a spec expression.
    fn parse(expr: &str) -> Result<Self, SpecError>;

    /// The package name this spec constrains, if any. Anonymous constraint
    /// fragments (a bare compiler or variant) have none.
    fn name(&self) -> Option<&str>;

    /// Whether this spec meets every constraint `other` carries.
    fn satisfies(&self, other: &Self) -> bool;

    /// Merge `other`'s constraints into `self`.
    ///
    /// Returns `true` if `self` changed.
    ///
    /// # Errors
    ///
    /// `SpecError::Conflict` if any constraint is irreconcilable.
    fn constrain(&mut self, other: &Self) -> Result<bool, SpecError>;

    /// Names of the dependencies this spec requests.
    fn dependency_names(&self) -> Vec<&str>;

    /// Names of the variants and flags this spec sets.
    fn variant_names(&self) -> Vec<&str>;
}
