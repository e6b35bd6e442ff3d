//! core::list
//!
//! Named spec lists: reference expansion, derived views, and the tiered
//! cache behind them.
//!
//! # Design
//!
//! A [`SpecList`] owns its raw declared elements and a non-owning handle
//! to a reference table mapping list names to other lists. Four derived
//! views are computed lazily and memoized:
//!
//! | tier | view              | computed from            |
//! |------|-------------------|--------------------------|
//! | 1    | expanded elements | raw list + references    |
//! | 2    | constraint lists  | tier 1                   |
//! | 3    | merged specs      | tier 2                   |
//! | 4    | concrete specs    | tier 2 (not tier 3)      |
//!
//! Tier 4 re-derives its own merged spec per attempt because the retry
//! engine may drop fragments; the tier 3 result would be wrong for it.
//!
//! Every mutation invalidates exactly the downstream tiers it can affect:
//! `add` appends into tier 1 in place and clears tiers 2-4; `remove` and
//! `update_reference` clear everything.
//!
//! # Concurrency
//!
//! Reference table entries are `Arc<Mutex<SpecList>>` so referenced
//! lists can be lazily expanded (and their caches filled) through shared
//! handles. Expansion takes each entry's lock with `try_lock`: re-entry
//! on a list currently being expanded means the reference graph has a
//! cycle, which is reported as an error instead of recursing forever.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, TryLockError};

use super::constraint::{build_constraint_lists, ConstraintList};
use super::element::{Element, Matrix};
use super::errors::SpecListError;
use crate::concretize::{concretize_all, Concretizer};
use crate::spec::Spec;

/// Shared table of named lists, looked up during reference expansion.
pub type ReferenceTable<S> = HashMap<String, Arc<Mutex<SpecList<S>>>>;

/// Cache tiers, ordered by data flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Tier {
    /// Expanded elements (references spliced in).
    Expanded,
    /// Ordered constraint lists.
    Constraints,
    /// Merged specs.
    Merged,
    /// Concrete specs.
    Concrete,
}

/// One optional slot per tier, cleared explicitly by mutators.
#[derive(Debug)]
struct CacheTiers<S> {
    expanded: Option<Vec<Element>>,
    constraints: Option<Vec<ConstraintList<S>>>,
    merged: Option<Vec<S>>,
    concrete: Option<Vec<S>>,
}

impl<S> Default for CacheTiers<S> {
    fn default() -> Self {
        Self {
            expanded: None,
            constraints: None,
            merged: None,
            concrete: None,
        }
    }
}

impl<S> CacheTiers<S> {
    /// Clear `tier` and everything downstream of it.
    fn invalidate_from(&mut self, tier: Tier) {
        if tier <= Tier::Expanded {
            self.expanded = None;
        }
        if tier <= Tier::Constraints {
            self.constraints = None;
        }
        if tier <= Tier::Merged {
            self.merged = None;
        }
        self.concrete = None;
    }
}

/// A declared, named sequence of spec elements, possibly containing
/// references and matrices.
#[derive(Debug)]
pub struct SpecList<S: Spec> {
    name: String,
    raw: Vec<Element>,
    reference: Arc<ReferenceTable<S>>,
    cache: CacheTiers<S>,
}

impl<S: Spec> SpecList<S> {
    /// Construct a list over an existing reference table.
    pub fn new(
        name: impl Into<String>,
        elements: Vec<Element>,
        reference: Arc<ReferenceTable<S>>,
    ) -> Self {
        Self {
            name: name.into(),
            raw: elements,
            reference,
            cache: CacheTiers::default(),
        }
    }

    /// Construct a list with a fresh, empty reference table.
    pub fn with_elements(name: impl Into<String>, elements: Vec<Element>) -> Self {
        Self::new(name, elements, Arc::new(ReferenceTable::new()))
    }

    /// Construct a list by classifying plain expressions.
    pub fn from_exprs(name: impl Into<String>, exprs: &[&str]) -> Self {
        Self::with_elements(name, exprs.iter().map(|e| Element::from_expr(e)).collect())
    }

    /// Ingest a list from already-parsed values (strings and matrix
    /// mappings), e.g. the contents of a configuration file.
    pub fn from_values(
        name: impl Into<String>,
        values: &[serde_json::Value],
        reference: Arc<ReferenceTable<S>>,
    ) -> Result<Self, serde_json::Error> {
        let elements = values
            .iter()
            .map(Element::from_value)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(name, elements, reference))
    }

    /// The list's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The raw declared elements, unexpanded.
    pub fn raw_elements(&self) -> &[Element] {
        &self.raw
    }

    /// Tier 1: elements with every reference marker spliced out.
    pub fn expanded_elements(&mut self) -> Result<&[Element], SpecListError> {
        self.ensure_expanded()?;
        Ok(self.cache.expanded.as_deref().unwrap_or_default())
    }

    /// Tier 2: one ordered constraint list per eventual spec.
    pub fn constraint_lists(&mut self) -> Result<&[ConstraintList<S>], SpecListError> {
        self.ensure_constraints()?;
        Ok(self.cache.constraints.as_deref().unwrap_or_default())
    }

    /// Tier 3: merged specs, in expansion order.
    pub fn specs(&mut self) -> Result<&[S], SpecListError> {
        self.ensure_constraints()?;
        if self.cache.merged.is_none() {
            let lists = self.cache.constraints.as_deref().unwrap_or_default();
            let merged = lists
                .iter()
                .map(ConstraintList::merge)
                .collect::<Result<Vec<_>, _>>()?;
            self.cache.merged = Some(merged);
        }
        Ok(self.cache.merged.as_deref().unwrap_or_default())
    }

    /// Tier 4: concrete specs, driving the external concretizer through
    /// the retry engine.
    pub fn concrete_specs<C>(&mut self, concretizer: &C) -> Result<&[S], SpecListError>
    where
        C: Concretizer<S>,
    {
        self.ensure_constraints()?;
        if self.cache.concrete.is_none() {
            let lists = self.cache.constraints.as_deref().unwrap_or_default();
            let concrete = concretize_all(lists, concretizer)?;
            self.cache.concrete = Some(concrete);
        }
        Ok(self.cache.concrete.as_deref().unwrap_or_default())
    }

    /// Number of merged specs.
    pub fn len(&mut self) -> Result<usize, SpecListError> {
        Ok(self.specs()?.len())
    }

    /// Whether the list produces no specs at all.
    pub fn is_empty(&mut self) -> Result<bool, SpecListError> {
        Ok(self.specs()?.is_empty())
    }

    /// Indexed access into the merged-specs view, in expansion order.
    pub fn get(&mut self, index: usize) -> Result<Option<&S>, SpecListError> {
        Ok(self.specs()?.get(index))
    }

    /// Append a spec expression to the list.
    ///
    /// The expanded view is patched in place when already computed:
    /// appending cannot affect earlier reference expansions. Downstream
    /// tiers are cleared. Appending a reference marker clears the
    /// expanded view too, since the marker needs expansion.
    pub fn add(&mut self, expr: &str) {
        let element = Element::from_expr(expr);
        self.raw.push(element.clone());
        if matches!(element, Element::Reference(_)) {
            self.cache.expanded = None;
        } else if let Some(expanded) = self.cache.expanded.as_mut() {
            expanded.push(element);
        }
        self.cache.invalidate_from(Tier::Constraints);
    }

    /// Remove the one raw element structurally equal to `expr`.
    ///
    /// Structural equality means both parse to equal specs; reference
    /// markers and matrices are never candidates. All tiers are cleared:
    /// the removed element may have changed what a marker spliced.
    ///
    /// # Errors
    ///
    /// `RemoveMatch` unless exactly one element matches.
    pub fn remove(&mut self, expr: &str) -> Result<(), SpecListError> {
        let target = S::parse(expr)?;
        let matches: Vec<usize> = self
            .raw
            .iter()
            .enumerate()
            .filter(|(_, element)| match element {
                Element::Spec(raw_expr) => S::parse(raw_expr)
                    .map(|parsed| parsed == target)
                    .unwrap_or(false),
                _ => false,
            })
            .map(|(idx, _)| idx)
            .collect();

        let [index] = matches.as_slice() else {
            return Err(SpecListError::RemoveMatch {
                spec: expr.to_string(),
                count: matches.len(),
            });
        };
        self.raw.remove(*index);
        self.cache.invalidate_from(Tier::Expanded);
        Ok(())
    }

    /// Swap the reference table. All tiers are cleared.
    pub fn update_reference(&mut self, reference: Arc<ReferenceTable<S>>) {
        self.reference = reference;
        self.cache.invalidate_from(Tier::Expanded);
    }

    fn ensure_expanded(&mut self) -> Result<(), SpecListError> {
        if self.cache.expanded.is_some() {
            return Ok(());
        }
        let mut expanded = Vec::new();
        let raw = self.raw.clone();
        for element in &raw {
            match element {
                Element::Spec(_) => expanded.push(element.clone()),
                Element::Reference(name) => expanded.extend(self.referenced_elements(name)?),
                Element::Matrix(matrix) => {
                    expanded.push(Element::Matrix(self.expand_matrix(matrix)?));
                }
            }
        }
        self.cache.expanded = Some(expanded);
        Ok(())
    }

    fn ensure_constraints(&mut self) -> Result<(), SpecListError> {
        self.ensure_expanded()?;
        if self.cache.constraints.is_none() {
            let expanded = self.cache.expanded.as_deref().unwrap_or_default();
            let lists = build_constraint_lists(expanded)?;
            self.cache.constraints = Some(lists);
        }
        Ok(())
    }

    /// Resolve a `$name` marker to the referenced list's expanded
    /// elements, triggering that list's own lazy expansion.
    fn referenced_elements(&self, name: &str) -> Result<Vec<Element>, SpecListError> {
        let entry = self
            .reference
            .get(name)
            .ok_or_else(|| SpecListError::UndefinedReference {
                list: self.name.clone(),
                reference: name.to_string(),
            })?;
        match entry.try_lock() {
            Ok(mut referenced) => Ok(referenced.expanded_elements()?.to_vec()),
            Err(TryLockError::WouldBlock) => Err(SpecListError::CircularReference {
                list: self.name.clone(),
                reference: name.to_string(),
            }),
            Err(TryLockError::Poisoned(_)) => Err(SpecListError::PoisonedReference {
                reference: name.to_string(),
            }),
        }
    }

    /// Expand references inside a matrix's axes and exclude patterns.
    /// Axis entries splice as plain spec strings; a referenced matrix
    /// cannot be flattened into an axis and is an error.
    fn expand_matrix(&self, matrix: &Matrix) -> Result<Matrix, SpecListError> {
        let mut axes = Vec::with_capacity(matrix.axes.len());
        for axis in &matrix.axes {
            axes.push(self.expand_entries(axis)?);
        }
        let excludes = self.expand_entries(&matrix.excludes)?;
        Ok(Matrix { axes, excludes })
    }

    fn expand_entries(&self, entries: &[String]) -> Result<Vec<String>, SpecListError> {
        let mut out = Vec::with_capacity(entries.len());
        for entry in entries {
            match Element::from_expr(entry) {
                Element::Reference(name) => {
                    for element in self.referenced_elements(&name)? {
                        match element {
                            Element::Spec(expr) => out.push(expr),
                            Element::Matrix(_) => {
                                return Err(SpecListError::NestedMatrix {
                                    list: self.name.clone(),
                                    reference: name.clone(),
                                });
                            }
                            Element::Reference(_) => {
                                // Referenced lists are returned fully
                                // expanded; a marker cannot survive.
                                return Err(SpecListError::UnexpandedReference(name.clone()));
                            }
                        }
                    }
                }
                _ => out.push(entry.clone()),
            }
        }
        Ok(out)
    }
}
