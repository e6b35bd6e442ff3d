//! concretize::mock
//!
//! Mock concretizer implementation for deterministic testing.
//!
//! # Design
//!
//! [`MockConcretizer`] resolves [`MockSpec`]s against a small in-memory
//! package universe. It stores state behind `Arc<Mutex<...>>` so tests
//! can keep configuring and inspecting it through shared handles, records
//! every concretize call for cache and retry assertions, and supports
//! scripted per-package failures for exercising error paths.
//!
//! With an empty universe the concretizer is permissive: every package,
//! variant, and dependency is accepted. Defining any package switches it
//! to strict mode, where unknown packages are rejected and each package's
//! declared variants and allowed dependencies are enforced - producing
//! the structured recoverable errors the retry engine acts on.
//!
//! # Example
//!
//! ```
//! use speclist::concretize::mock::{MockConcretizer, PackageEntry};
//! use speclist::concretize::Concretizer;
//! use speclist::spec::mock::MockSpec;
//! use speclist::spec::Spec;
//!
//! let concretizer = MockConcretizer::new();
//! concretizer.define_package("zlib", PackageEntry::new().with_variants(&["shared"]));
//!
//! let spec = MockSpec::parse("zlib ~shared").unwrap();
//! let concrete = concretizer.concretize(&spec).unwrap();
//! assert!(concrete.is_concrete());
//! assert_eq!(concretizer.calls(), 1);
//! ```

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex};

use super::{ConcretizeError, Concretizer};
use crate::spec::mock::MockSpec;
use crate::spec::Spec;

/// Version pinned when a package declares no default.
const FALLBACK_VERSION: &str = "1.0";
/// Compiler pinned when the spec requests none.
const DEFAULT_COMPILER: (&str, &str) = ("gcc", "11.2.0");

/// What the mock universe knows about one package.
#[derive(Debug, Clone, Default)]
pub struct PackageEntry {
    variants: BTreeSet<String>,
    dependencies: Option<BTreeSet<String>>,
    default_version: Option<String>,
}

impl PackageEntry {
    /// A package accepting any dependency and no variants.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare the variant and flag names this package knows.
    pub fn with_variants(mut self, names: &[&str]) -> Self {
        self.variants = names.iter().map(|n| n.to_string()).collect();
        self
    }

    /// Restrict the dependencies this package accepts. An empty slice
    /// means the package takes no dependencies at all.
    pub fn with_dependencies(mut self, names: &[&str]) -> Self {
        self.dependencies = Some(names.iter().map(|n| n.to_string()).collect());
        self
    }

    /// Version to pin when the spec leaves it open.
    pub fn with_default_version(mut self, version: &str) -> Self {
        self.default_version = Some(version.to_string());
        self
    }
}

/// Mock concretizer for testing.
///
/// Thread-safe via internal `Arc<Mutex<...>>` wrapping; clones share
/// state.
#[derive(Debug, Clone, Default)]
pub struct MockConcretizer {
    inner: Arc<Mutex<MockConcretizerInner>>,
}

#[derive(Debug, Default)]
struct MockConcretizerInner {
    /// Known packages. Empty means permissive mode.
    packages: HashMap<String, PackageEntry>,
    /// Scripted failures by package name.
    fail_with: HashMap<String, ConcretizeError>,
    /// Rendered form of every spec handed to `concretize`.
    attempts: Vec<String>,
}

impl MockConcretizer {
    /// A permissive concretizer with an empty universe.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a package to the universe, switching to strict mode.
    pub fn define_package(&self, name: &str, entry: PackageEntry) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.packages.insert(name.to_string(), entry);
        }
    }

    /// Script a failure for every concretization of `package`.
    pub fn fail_with(&self, package: &str, error: ConcretizeError) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.fail_with.insert(package.to_string(), error);
        }
    }

    /// Number of concretize calls made so far.
    pub fn calls(&self) -> usize {
        self.inner.lock().map(|inner| inner.attempts.len()).unwrap_or(0)
    }

    /// Rendered form of every attempted spec, in call order.
    pub fn attempts(&self) -> Vec<String> {
        self.inner
            .lock()
            .map(|inner| inner.attempts.clone())
            .unwrap_or_default()
    }
}

impl Concretizer<MockSpec> for MockConcretizer {
    fn concretize(&self, spec: &MockSpec) -> Result<MockSpec, ConcretizeError> {
        let mut inner = self
            .inner
            .lock()
            .map_err(|_| ConcretizeError::Internal("mock concretizer state poisoned".into()))?;
        inner.attempts.push(spec.to_string());

        let Some(name) = spec.name() else {
            return Err(ConcretizeError::Internal(format!(
                "`{spec}` has no package name to concretize"
            )));
        };

        if let Some(error) = inner.fail_with.get(name) {
            return Err(error.clone());
        }

        let mut default_version = None;
        if !inner.packages.is_empty() {
            let entry = inner
                .packages
                .get(name)
                .ok_or_else(|| ConcretizeError::UnknownPackage(name.to_string()))?;

            let unknown: Vec<String> = spec
                .variant_names()
                .into_iter()
                .filter(|v| !entry.variants.contains(*v))
                .map(str::to_string)
                .collect();
            if !unknown.is_empty() {
                return Err(ConcretizeError::UnknownVariants(unknown));
            }

            if let Some(allowed) = &entry.dependencies {
                let infeasible: Vec<String> = spec
                    .dependency_names()
                    .into_iter()
                    .filter(|d| !allowed.contains(*d))
                    .map(str::to_string)
                    .collect();
                if !infeasible.is_empty() {
                    return Err(ConcretizeError::InfeasibleDependencies(infeasible));
                }
            }

            default_version = entry.default_version.clone();
        }

        let mut concrete = spec.clone();
        if concrete.version().is_none() {
            concrete.set_version(default_version.as_deref().unwrap_or(FALLBACK_VERSION));
        }
        if concrete.compiler().is_none() {
            concrete.set_compiler(DEFAULT_COMPILER.0, Some(DEFAULT_COMPILER.1.to_string()));
        }
        concrete.set_concrete(true);
        Ok(concrete)
    }
}
