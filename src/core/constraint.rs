//! core::constraint
//!
//! Ordered constraint lists and the matrix expansion that produces them.
//!
//! # Design
//!
//! The expanded element sequence is lowered into one ordered constraint
//! list per eventual spec:
//!
//! - A plain element becomes a one-fragment list.
//! - A matrix element becomes one list per surviving cell of the
//!   cartesian product of its axes: each combination is sorted into
//!   canonical merge order, probed against the matrix's exclude patterns,
//!   and discarded entirely if any pattern is satisfied.
//!
//! Fragments keep their raw expression alongside the parsed spec: the
//! expression is what ordering and rendering work on, the spec is what
//! merging and retry attribution work on.
//!
//! # Invariants
//!
//! - Fragments appear in canonical category order
//!   (name < variant/flag < compiler < hash < dependency)
//! - Excluded combinations leave no trace in the output
//! - Merging requires exactly one fragment naming a package

use itertools::Itertools;

use super::element::Element;
use super::errors::SpecListError;
use super::ordering::sort_fragments;
use crate::spec::Spec;

/// One constraint fragment: the raw expression and its parsed spec.
#[derive(Debug, Clone, PartialEq)]
pub struct Constraint<S> {
    /// The fragment as written (post-sorting position in the list).
    pub expr: String,
    /// The fragment parsed by the spec collaborator.
    pub spec: S,
}

/// An ordered sequence of constraint fragments destined for one spec.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstraintList<S> {
    fragments: Vec<Constraint<S>>,
}

impl<S: Spec> ConstraintList<S> {
    /// Build a list from fragment expressions, parsing each one. The
    /// expressions are expected to already be in canonical order.
    pub fn from_exprs<I>(exprs: I) -> Result<Self, SpecListError>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let fragments = exprs
            .into_iter()
            .map(|expr| {
                let expr = expr.as_ref().to_string();
                let spec = S::parse(&expr)?;
                Ok(Constraint { expr, spec })
            })
            .collect::<Result<Vec<_>, SpecListError>>()?;
        Ok(Self { fragments })
    }

    /// A single-fragment list for a plain spec element.
    pub fn single(expr: &str) -> Result<Self, SpecListError> {
        Self::from_exprs([expr])
    }

    /// The fragments, in canonical order.
    pub fn fragments(&self) -> &[Constraint<S>] {
        &self.fragments
    }

    /// The fragment expressions, in canonical order.
    pub fn exprs(&self) -> Vec<&str> {
        self.fragments.iter().map(|c| c.expr.as_str()).collect()
    }

    /// Render the whole list as one space-joined expression.
    pub fn to_expr(&self) -> String {
        self.exprs().join(" ")
    }

    /// Index of the single fragment naming a package.
    ///
    /// # Errors
    ///
    /// `InvalidSpecConstraint` unless exactly one fragment carries a
    /// package name. Concretization needs a single unambiguous root.
    pub fn root_index(&self) -> Result<usize, SpecListError> {
        let named: Vec<usize> = self
            .fragments
            .iter()
            .enumerate()
            .filter(|(_, c)| c.spec.name().is_some())
            .map(|(idx, _)| idx)
            .collect();
        match named.as_slice() {
            [root] => Ok(*root),
            _ => Err(SpecListError::InvalidSpecConstraint {
                expr: self.to_expr(),
                named: named.len(),
            }),
        }
    }

    /// Fold the fragments into one merged spec via sequential constrain
    /// calls, starting from the first fragment.
    ///
    /// # Errors
    ///
    /// `InvalidSpecConstraint` if the list is empty or does not carry
    /// exactly one named fragment; `Spec` on an irreconcilable conflict.
    pub fn merge(&self) -> Result<S, SpecListError> {
        self.root_index()?;
        let Some((first, rest)) = self.fragments.split_first() else {
            return Err(SpecListError::InvalidSpecConstraint {
                expr: String::new(),
                named: 0,
            });
        };
        let mut spec = first.spec.clone();
        for fragment in rest {
            spec.constrain(&fragment.spec)?;
        }
        Ok(spec)
    }
}

/// Lower an expanded element sequence into ordered constraint lists.
///
/// The input must already be reference-expanded; a remaining marker is
/// an error.
pub fn build_constraint_lists<S: Spec>(
    elements: &[Element],
) -> Result<Vec<ConstraintList<S>>, SpecListError> {
    let mut lists = Vec::new();
    for element in elements {
        match element {
            Element::Spec(expr) => lists.push(ConstraintList::single(expr)?),
            Element::Reference(name) => {
                return Err(SpecListError::UnexpandedReference(name.clone()));
            }
            Element::Matrix(matrix) => {
                let excludes = matrix
                    .excludes
                    .iter()
                    .map(|pattern| S::parse(pattern))
                    .collect::<Result<Vec<_>, _>>()?;
                for combo in matrix
                    .axes
                    .iter()
                    .map(|axis| axis.iter().cloned())
                    .multi_cartesian_product()
                {
                    let mut ordered = combo;
                    if ordered.is_empty() {
                        continue;
                    }
                    sort_fragments(&mut ordered);
                    // One merged probe spec decides exclusion for the
                    // whole combination.
                    let probe = S::parse(&ordered.join(" "))?;
                    if excludes.iter().any(|pattern| probe.satisfies(pattern)) {
                        continue;
                    }
                    lists.push(ConstraintList::from_exprs(ordered)?);
                }
            }
        }
    }
    Ok(lists)
}
