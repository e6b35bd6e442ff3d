//! speclist - Spec-list expansion and concretization for package build
//! configurations
//!
//! A project declares the build configurations it wants as a list whose
//! elements can be plain spec expressions, `$name` references to other
//! named lists, or matrices (cartesian products of constraint axes with
//! exclusion rules). This crate turns that declaration into a concrete,
//! ordered set of fully resolved build specifications.
//!
//! # Architecture
//!
//! The pipeline runs in four lazily cached tiers:
//!
//! 1. **Reference expansion** - `$name` markers are spliced with the
//!    referenced list's own expansion, recursively
//! 2. **Constraint building** - matrices expand to ordered
//!    constraint-fragment lists, exclusions filter combinations
//! 3. **Merging** - each fragment list folds into one merged spec
//! 4. **Concretization** - an adaptive retry loop drives the external
//!    concretizer, dropping fragments that make a combination infeasible
//!
//! Parsing spec expressions, the satisfies/constrain semantics, and the
//! concretizer itself are external collaborators behind the
//! [`spec::Spec`] and [`concretize::Concretizer`] traits.
//!
//! # Correctness Invariants
//!
//! 1. Fragments merge in canonical category order, so conflict detection
//!    does not depend on how a combination was written
//! 2. Excluded matrix combinations leave no trace in any derived view
//! 3. Mutations invalidate exactly the cache tiers they can affect
//! 4. Only the two recoverable concretization failure kinds are ever
//!    caught; everything else propagates unchanged
//!
//! # Example
//!
//! ```
//! use speclist::{Element, SpecList};
//! use speclist::spec::mock::MockSpec;
//!
//! let mut list = SpecList::<MockSpec>::with_elements(
//!     "specs",
//!     vec![
//!         Element::from_expr("mpileaks"),
//!         Element::from_expr("libelf ~shared"),
//!     ],
//! );
//! let specs = list.specs().unwrap();
//! assert_eq!(specs.len(), 2);
//! ```

pub mod concretize;
pub mod core;
pub mod spec;

pub use crate::concretize::{ConcretizeError, Concretizer};
pub use crate::core::constraint::{Constraint, ConstraintList};
pub use crate::core::element::{Element, Matrix};
pub use crate::core::errors::SpecListError;
pub use crate::core::list::{ReferenceTable, SpecList, Tier};
pub use crate::core::ordering::ordering_key;
pub use crate::spec::{Spec, SpecError};
