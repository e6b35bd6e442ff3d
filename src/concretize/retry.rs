//! concretize::retry
//!
//! Adaptive retry loop around the external concretizer.
//!
//! # Design
//!
//! A matrix can produce combinations whose fragments are individually
//! fine but jointly infeasible for one package: a compiler or variant a
//! particular dependency does not support, a dependency request the
//! package cannot take. Rather than failing the whole declared list, the
//! retry engine salvages the combination by dropping exactly the
//! offending fragments and concretizing the rest.
//!
//! Per constraint list:
//!
//! 1. Re-apply every fragment not yet marked invalid onto a fresh clone
//!    of the root fragment's spec and call the concretizer.
//! 2. On success, done.
//! 3. On a recoverable failure, attribute every reported identifier to
//!    fragments via structured introspection (`dependency_names` /
//!    `variant_names`, exact name match). If every identifier maps to at
//!    least one fragment and the invalid set grows, retry; otherwise the
//!    failure cannot be fixed here and the original error propagates.
//! 4. Any other failure kind propagates immediately.
//!
//! # Termination
//!
//! The invalid set only grows and is bounded by the number of non-root
//! fragments, so at most that many retries happen. A fragment already
//! marked invalid is never re-applied, so attribution that makes no
//! progress is treated as unattributable rather than looping.

use std::collections::HashSet;

use super::{ConcretizeError, Concretizer};
use crate::core::constraint::{Constraint, ConstraintList};
use crate::core::errors::SpecListError;
use crate::spec::Spec;

/// Concretize every constraint list, in order.
pub fn concretize_all<S, C>(
    lists: &[ConstraintList<S>],
    concretizer: &C,
) -> Result<Vec<S>, SpecListError>
where
    S: Spec,
    C: Concretizer<S>,
{
    lists
        .iter()
        .map(|list| concretize_list(list, concretizer))
        .collect()
}

/// Concretize one constraint list, dropping recoverable-infeasible
/// fragments as needed.
pub fn concretize_list<S, C>(
    list: &ConstraintList<S>,
    concretizer: &C,
) -> Result<S, SpecListError>
where
    S: Spec,
    C: Concretizer<S>,
{
    let root_index = list.root_index()?;
    let root = &list.fragments()[root_index];
    let others: Vec<&Constraint<S>> = list
        .fragments()
        .iter()
        .enumerate()
        .filter(|(idx, _)| *idx != root_index)
        .map(|(_, fragment)| fragment)
        .collect();

    let mut invalid: HashSet<usize> = HashSet::new();
    loop {
        let mut spec = root.spec.clone();
        for (idx, fragment) in others.iter().enumerate() {
            if invalid.contains(&idx) {
                continue;
            }
            spec.constrain(&fragment.spec)?;
        }

        let error = match concretizer.concretize(&spec) {
            Ok(concrete) => return Ok(concrete),
            Err(error) => error,
        };

        let attributed = match &error {
            ConcretizeError::InfeasibleDependencies(names) => {
                attribute(&others, &invalid, names, |fragment, name| {
                    fragment.spec.dependency_names().contains(&name)
                })
            }
            ConcretizeError::UnknownVariants(names) => {
                attribute(&others, &invalid, names, |fragment, name| {
                    fragment.spec.variant_names().contains(&name)
                })
            }
            _ => None,
        };

        match attributed {
            Some(fresh) => invalid.extend(fresh),
            None => return Err(error.into()),
        }
    }
}

/// Map every reported identifier to the fragments that request it.
///
/// Returns the matched fragment indices not yet marked invalid, or
/// `None` when the failure is unattributable: some identifier matches no
/// fragment, or attribution would not grow the invalid set.
fn attribute<S, F>(
    others: &[&Constraint<S>],
    invalid: &HashSet<usize>,
    names: &[String],
    matches: F,
) -> Option<Vec<usize>>
where
    S: Spec,
    F: Fn(&Constraint<S>, &str) -> bool,
{
    let mut matched = Vec::new();
    for name in names {
        let mut hits = Vec::new();
        for (idx, fragment) in others.iter().enumerate() {
            if matches(fragment, name.as_str()) {
                hits.push(idx);
            }
        }
        if hits.is_empty() {
            return None;
        }
        matched.extend(hits);
    }
    let fresh: Vec<usize> = matched
        .into_iter()
        .filter(|idx| !invalid.contains(idx))
        .collect();
    if fresh.is_empty() {
        None
    } else {
        Some(fresh)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::concretize::mock::{MockConcretizer, PackageEntry};
    use crate::spec::mock::MockSpec;
    use crate::spec::Spec as _;

    fn list(exprs: &[&str]) -> ConstraintList<MockSpec> {
        ConstraintList::from_exprs(exprs.iter().copied()).unwrap()
    }

    #[test]
    fn succeeds_first_attempt_when_feasible() {
        let concretizer = MockConcretizer::new();
        let concrete = concretize_list(&list(&["zlib", "~shared"]), &concretizer).unwrap();
        assert_eq!(concrete.name(), Some("zlib"));
        assert!(concrete.is_concrete());
        assert_eq!(concretizer.calls(), 1);
    }

    #[test]
    fn drops_infeasible_dependency_fragment_and_retries() {
        let concretizer = MockConcretizer::new();
        concretizer.define_package(
            "mpileaks",
            PackageEntry::new().with_dependencies(&["callpath"]),
        );
        concretizer.define_package("zlib", PackageEntry::new());

        let concrete =
            concretize_list(&list(&["mpileaks", "^mvapich2"]), &concretizer).unwrap();
        assert_eq!(concrete.name(), Some("mpileaks"));
        assert!(concrete.dependency_names().is_empty());
        assert_eq!(concretizer.calls(), 2);
    }

    #[test]
    fn drops_unknown_variant_fragment_and_retries() {
        let concretizer = MockConcretizer::new();
        concretizer.define_package("zlib", PackageEntry::new().with_variants(&["shared"]));

        let concrete =
            concretize_list(&list(&["zlib", "~shared", "+bogus"]), &concretizer).unwrap();
        assert_eq!(concrete.name(), Some("zlib"));
        assert!(concrete.variant_names().contains(&"shared"));
        assert!(!concrete.variant_names().contains(&"bogus"));
        assert_eq!(concretizer.calls(), 2);
    }

    #[test]
    fn drops_multiple_offenders_reported_together() {
        let concretizer = MockConcretizer::new();
        concretizer.define_package("mpileaks", PackageEntry::new().with_dependencies(&[]));

        let concrete =
            concretize_list(&list(&["mpileaks", "^mvapich2", "^zlib"]), &concretizer).unwrap();
        assert!(concrete.dependency_names().is_empty());
        // Both offenders are reported in one structured error, so one
        // retry suffices.
        assert_eq!(concretizer.calls(), 2);
    }

    #[test]
    fn unattributable_failure_reraises_original_error() {
        let concretizer = MockConcretizer::new();
        // The failure names a dependency no fragment requests.
        concretizer.fail_with(
            "mpileaks",
            ConcretizeError::InfeasibleDependencies(vec!["callpath".into()]),
        );

        let err = concretize_list(&list(&["mpileaks", "~shared"]), &concretizer).unwrap_err();
        assert_eq!(
            err,
            SpecListError::Concretize(ConcretizeError::InfeasibleDependencies(vec![
                "callpath".into()
            ]))
        );
        assert_eq!(concretizer.calls(), 1);
    }

    #[test]
    fn scripted_recoverable_failure_never_oscillates() {
        let concretizer = MockConcretizer::new();
        // The concretizer keeps reporting the same variant even after the
        // fragment is dropped; the second attribution makes no progress
        // and the error surfaces instead of looping.
        concretizer.fail_with(
            "zlib",
            ConcretizeError::UnknownVariants(vec!["shared".into()]),
        );

        let err = concretize_list(&list(&["zlib", "~shared"]), &concretizer).unwrap_err();
        assert_eq!(
            err,
            SpecListError::Concretize(ConcretizeError::UnknownVariants(vec!["shared".into()]))
        );
        assert_eq!(concretizer.calls(), 2);
    }

    #[test]
    fn non_recoverable_kinds_propagate_immediately() {
        let concretizer = MockConcretizer::new();
        concretizer.fail_with("zlib", ConcretizeError::Internal("solver crashed".into()));

        let err = concretize_list(&list(&["zlib", "~shared"]), &concretizer).unwrap_err();
        assert_eq!(
            err,
            SpecListError::Concretize(ConcretizeError::Internal("solver crashed".into()))
        );
        assert_eq!(concretizer.calls(), 1);
    }

    #[test]
    fn requires_exactly_one_named_root() {
        let concretizer = MockConcretizer::new();
        assert!(matches!(
            concretize_list(&list(&["%gcc@4.9.3"]), &concretizer),
            Err(SpecListError::InvalidSpecConstraint { named: 0, .. })
        ));
        assert!(matches!(
            concretize_list(&list(&["zlib", "libelf"]), &concretizer),
            Err(SpecListError::InvalidSpecConstraint { named: 2, .. })
        ));
        assert_eq!(concretizer.calls(), 0);
    }

    #[test]
    fn concretizes_all_lists_in_order() {
        let concretizer = MockConcretizer::new();
        let lists = vec![list(&["mpileaks"]), list(&["zlib", "%gcc@4.9.3"])];
        let concrete = concretize_all(&lists, &concretizer).unwrap();
        assert_eq!(concrete.len(), 2);
        assert_eq!(concrete[0].name(), Some("mpileaks"));
        assert_eq!(concrete[1].name(), Some("zlib"));
    }
}
