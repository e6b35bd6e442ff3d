//! Integration tests for the concretization tier.
//!
//! These drive `SpecList::concrete_specs` end to end against the mock
//! concretizer: caching, invalidation, and the adaptive retry loop that
//! salvages matrix combinations by dropping infeasible fragments.

use std::sync::Arc;

use pretty_assertions::assert_eq;
use serde_json::json;

use speclist::concretize::mock::{MockConcretizer, PackageEntry};
use speclist::concretize::ConcretizeError;
use speclist::spec::mock::MockSpec;
use speclist::spec::Spec;
use speclist::{ReferenceTable, SpecList, SpecListError};

fn list_of(values: &[serde_json::Value]) -> SpecList<MockSpec> {
    SpecList::from_values("specs", values, Arc::new(ReferenceTable::new())).unwrap()
}

#[test]
fn concretizes_every_spec_in_expansion_order() {
    let mut list = list_of(&[
        json!("mpileaks"),
        json!({"matrix": [["zlib", "libelf"], ["%gcc@4.9.3"]]}),
    ]);
    let concretizer = MockConcretizer::new();

    let concrete = list.concrete_specs(&concretizer).unwrap().to_vec();
    let names: Vec<&str> = concrete.iter().filter_map(|s| s.name()).collect();
    assert_eq!(names, vec!["mpileaks", "zlib", "libelf"]);
    assert!(concrete.iter().all(|s| s.is_concrete()));
    assert_eq!(concretizer.calls(), 3);
}

#[test]
fn concrete_view_is_cached_until_invalidated() {
    let mut list = list_of(&[json!("mpileaks"), json!("zlib")]);
    let concretizer = MockConcretizer::new();

    list.concrete_specs(&concretizer).unwrap();
    list.concrete_specs(&concretizer).unwrap();
    assert_eq!(concretizer.calls(), 2);

    list.add("libdwarf");
    list.concrete_specs(&concretizer).unwrap();
    assert_eq!(concretizer.calls(), 5);
}

#[test]
fn infeasible_matrix_cells_are_salvaged_not_fatal() {
    // mpileaks only takes callpath; the mvapich2 cell is salvaged by
    // dropping its dependency fragment rather than failing the list.
    let mut list = list_of(&[json!({
        "matrix": [["mpileaks"], ["^callpath", "^mvapich2"]],
    })]);
    let concretizer = MockConcretizer::new();
    concretizer.define_package(
        "mpileaks",
        PackageEntry::new().with_dependencies(&["callpath"]),
    );

    let concrete = list.concrete_specs(&concretizer).unwrap().to_vec();
    assert_eq!(concrete.len(), 2);
    assert_eq!(concrete[0].dependency_names(), vec!["callpath"]);
    assert!(concrete[1].dependency_names().is_empty());
    // Cell one succeeds first try; cell two needs one retry.
    assert_eq!(concretizer.calls(), 3);
}

#[test]
fn unknown_variant_cells_are_salvaged() {
    let mut list = list_of(&[json!({
        "matrix": [["zlib"], ["~shared", "+bogus"]],
    })]);
    let concretizer = MockConcretizer::new();
    concretizer.define_package("zlib", PackageEntry::new().with_variants(&["shared"]));

    let concrete = list.concrete_specs(&concretizer).unwrap().to_vec();
    assert_eq!(concrete.len(), 2);
    assert!(concrete[0].variant_names().contains(&"shared"));
    assert!(concrete[1].variant_names().is_empty());
}

#[test]
fn merged_view_is_unaffected_by_dropped_fragments() {
    // Tier 3 keeps the full merge even when tier 4 had to drop a
    // fragment to concretize.
    let mut list = list_of(&[json!("mpileaks ^mvapich2")]);
    let concretizer = MockConcretizer::new();
    concretizer.define_package("mpileaks", PackageEntry::new().with_dependencies(&[]));

    // A plain element is a single fragment; its dependency cannot be
    // dropped, so concretization fails...
    assert!(list.concrete_specs(&concretizer).is_err());
    // ...while the merged view still carries the dependency.
    assert_eq!(
        list.specs().unwrap()[0].dependency_names(),
        vec!["mvapich2"]
    );
}

#[test]
fn non_recoverable_failures_surface_unchanged() {
    let mut list = list_of(&[json!("zlib")]);
    let concretizer = MockConcretizer::new();
    concretizer.fail_with("zlib", ConcretizeError::Internal("solver crashed".into()));

    assert_eq!(
        list.concrete_specs(&concretizer).unwrap_err(),
        SpecListError::Concretize(ConcretizeError::Internal("solver crashed".into()))
    );
}

#[test]
fn constraint_list_without_named_root_is_rejected() {
    let mut list = list_of(&[json!({"matrix": [["%gcc@4.9.3"], ["~shared"]]})]);
    let concretizer = MockConcretizer::new();

    assert!(matches!(
        list.concrete_specs(&concretizer).unwrap_err(),
        SpecListError::InvalidSpecConstraint { named: 0, .. }
    ));
    assert_eq!(concretizer.calls(), 0);
}

#[test]
fn failed_concretization_is_not_cached() {
    let mut list = list_of(&[json!("zlib")]);
    let concretizer = MockConcretizer::new();
    concretizer.define_package("libelf", PackageEntry::new());

    // zlib is unknown to the strict universe.
    assert!(list.concrete_specs(&concretizer).is_err());

    // Widening the universe lets the same view succeed.
    concretizer.define_package("zlib", PackageEntry::new());
    let concrete = list.concrete_specs(&concretizer).unwrap();
    assert_eq!(concrete.len(), 1);
}
