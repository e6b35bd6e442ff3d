//! core
//!
//! Domain logic for spec-list expansion.
//!
//! # Modules
//!
//! - [`element`] - Tagged raw elements: plain spec, reference, matrix
//! - [`ordering`] - Canonical merge priority for constraint fragments
//! - [`constraint`] - Ordered constraint lists and matrix expansion
//! - [`list`] - Named lists, reference expansion, and the tiered cache
//! - [`errors`] - Error taxonomy for the whole pipeline
//!
//! # Data Flow
//!
//! raw declared list → expanded elements → ordered constraint lists →
//! merged specs → concrete specs. Each arrow is a lazily computed,
//! memoized tier on [`list::SpecList`].

pub mod constraint;
pub mod element;
pub mod errors;
pub mod list;
pub mod ordering;
