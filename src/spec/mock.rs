//! spec::mock
//!
//! Mock spec implementation for deterministic testing.
//!
//! # Design
//!
//! [`MockSpec`] models enough of a real spec expression for the core to
//! be exercised end to end: a package name, a version, a compiler, bool
//! variants, flag assignments, a hash pin, and dependency requests. The
//! grammar is sigil-driven and mirrors the fragment categories the
//! ordering key recognizes:
//!
//! - `name@version` - package name, optional version
//! - `%compiler@version` - compiler requirement
//! - `+variant` / `~variant` / `-variant` - bool variant on/off
//! - `flag=value` - flag assignment; double quotes group multi-word values
//! - `/hash` - hash pin
//! - `^dep...` - dependency request, itself a spec
//!
//! Sigils split inside a whitespace-separated word too, so concatenated
//! forms like `zlib%gcc@4.9.3` parse the same as `zlib %gcc@4.9.3`.
//!
//! `satisfies` is containment (every constraint of the pattern is present
//! and equal), `constrain` is a field-wise merge that errors on
//! contradiction. Both are intentionally simpler than a real package
//! manager's semantics; the core only relies on the trait contract.

use std::collections::BTreeMap;

use super::{Spec, SpecError};

/// A compiler requirement: name plus optional version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerReq {
    /// Compiler name, e.g. `gcc`.
    pub name: String,
    /// Compiler version, if pinned.
    pub version: Option<String>,
}

/// Value of a variant setting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VariantValue {
    /// `+variant` / `~variant`.
    Bool(bool),
    /// `flag=value`.
    Value(String),
}

/// Deterministic in-memory spec for tests.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MockSpec {
    name: Option<String>,
    version: Option<String>,
    compiler: Option<CompilerReq>,
    variants: BTreeMap<String, VariantValue>,
    hash: Option<String>,
    dependencies: BTreeMap<String, MockSpec>,
    concrete: bool,
}

impl MockSpec {
    /// The version constraint, if any.
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// The compiler requirement, if any.
    pub fn compiler(&self) -> Option<&CompilerReq> {
        self.compiler.as_ref()
    }

    /// The dependency request for `name`, if present.
    pub fn dependency(&self, name: &str) -> Option<&MockSpec> {
        self.dependencies.get(name)
    }

    /// The value of variant `name`, if set.
    pub fn variant(&self, name: &str) -> Option<&VariantValue> {
        self.variants.get(name)
    }

    /// Whether this spec has been fully pinned by a concretizer.
    pub fn is_concrete(&self) -> bool {
        self.concrete
    }

    /// Pin the version. Used by concretizer implementations.
    pub fn set_version(&mut self, version: impl Into<String>) {
        self.version = Some(version.into());
    }

    /// Pin the compiler. Used by concretizer implementations.
    pub fn set_compiler(&mut self, name: impl Into<String>, version: Option<String>) {
        self.compiler = Some(CompilerReq {
            name: name.into(),
            version,
        });
    }

    /// Mark this spec fully resolved. Used by concretizer implementations.
    pub fn set_concrete(&mut self, concrete: bool) {
        self.concrete = concrete;
    }

    fn parse_error(expr: &str, reason: impl Into<String>) -> SpecError {
        SpecError::Parse {
            expr: expr.to_string(),
            reason: reason.into(),
        }
    }

    /// Split an expression into whitespace-separated words, keeping
    /// double-quoted runs (flag values) intact.
    fn split_words(expr: &str) -> Vec<String> {
        let mut words = Vec::new();
        let mut current = String::new();
        let mut in_quotes = false;
        for ch in expr.chars() {
            match ch {
                '"' => {
                    in_quotes = !in_quotes;
                    current.push(ch);
                }
                c if c.is_whitespace() && !in_quotes => {
                    if !current.is_empty() {
                        words.push(std::mem::take(&mut current));
                    }
                }
                c => current.push(c),
            }
        }
        if !current.is_empty() {
            words.push(current);
        }
        words
    }

    /// Split a `^`-free part into sigil-delimited segments. `%`, `/`,
    /// `+`, and `~` start a new segment anywhere; `-` only word-initially
    /// (so `cflags=-O3` and hyphenated names survive).
    fn split_segments(part: &str) -> Vec<String> {
        let mut segments = Vec::new();
        let mut current = String::new();
        let mut in_quotes = false;
        for (idx, ch) in part.chars().enumerate() {
            if ch == '"' {
                in_quotes = !in_quotes;
                current.push(ch);
                continue;
            }
            let splits = !in_quotes
                && (matches!(ch, '%' | '/' | '+' | '~') || (ch == '-' && idx == 0));
            if splits && !current.is_empty() {
                segments.push(std::mem::take(&mut current));
            }
            current.push(ch);
        }
        if !current.is_empty() {
            segments.push(current);
        }
        segments
    }

    /// Parse one word (no whitespace outside quotes) into a spec.
    fn parse_word(word: &str) -> Result<MockSpec, SpecError> {
        let mut parts = word.split('^');
        let anchor = parts.next().unwrap_or_default();
        let mut spec = Self::parse_anchor(anchor, word)?;
        for dep_part in parts {
            let dep = Self::parse_anchor(dep_part, word)?;
            let Some(dep_name) = dep.name.clone() else {
                return Err(Self::parse_error(word, "dependency request without a name"));
            };
            match spec.dependencies.get_mut(&dep_name) {
                Some(existing) => {
                    existing.constrain(&dep)?;
                }
                None => {
                    spec.dependencies.insert(dep_name, dep);
                }
            }
        }
        Ok(spec)
    }

    /// Parse a `^`-free part into a spec.
    fn parse_anchor(part: &str, expr: &str) -> Result<MockSpec, SpecError> {
        let mut spec = MockSpec::default();
        for segment in Self::split_segments(part) {
            match segment.chars().next() {
                Some('%') => {
                    if spec.compiler.is_some() {
                        return Err(Self::parse_error(expr, "duplicate compiler requirement"));
                    }
                    let (name, version) = Self::split_version(&segment[1..]);
                    if name.is_empty() {
                        return Err(Self::parse_error(expr, "empty compiler name"));
                    }
                    spec.compiler = Some(CompilerReq {
                        name: name.to_string(),
                        version: version.map(str::to_string),
                    });
                }
                Some('/') => {
                    let hash = &segment[1..];
                    if hash.is_empty() {
                        return Err(Self::parse_error(expr, "empty hash pin"));
                    }
                    spec.hash = Some(hash.to_string());
                }
                Some('+') => {
                    let name = &segment[1..];
                    if name.is_empty() {
                        return Err(Self::parse_error(expr, "empty variant name"));
                    }
                    spec.variants
                        .insert(name.to_string(), VariantValue::Bool(true));
                }
                Some('~') | Some('-') => {
                    let name = &segment[1..];
                    if name.is_empty() {
                        return Err(Self::parse_error(expr, "empty variant name"));
                    }
                    spec.variants
                        .insert(name.to_string(), VariantValue::Bool(false));
                }
                Some(_) => {
                    if let Some((key, value)) = segment.split_once('=') {
                        if key.is_empty() {
                            return Err(Self::parse_error(expr, "empty flag name"));
                        }
                        spec.variants.insert(
                            key.to_string(),
                            VariantValue::Value(Self::unquote(value).to_string()),
                        );
                    } else {
                        let (name, version) = Self::split_version(&segment);
                        if !name.is_empty() {
                            if spec.name.is_some() {
                                return Err(Self::parse_error(expr, "more than one package name"));
                            }
                            spec.name = Some(name.to_string());
                        }
                        if let Some(v) = version {
                            if v.is_empty() {
                                return Err(Self::parse_error(expr, "empty version"));
                            }
                            spec.version = Some(v.to_string());
                        }
                    }
                }
                None => {}
            }
        }
        Ok(spec)
    }

    fn split_version(segment: &str) -> (&str, Option<&str>) {
        match segment.split_once('@') {
            Some((name, version)) => (name, Some(version)),
            None => (segment, None),
        }
    }

    fn unquote(value: &str) -> &str {
        value
            .strip_prefix('"')
            .and_then(|v| v.strip_suffix('"'))
            .unwrap_or(value)
    }

    fn quote(value: &str) -> String {
        if value.chars().any(char::is_whitespace) {
            format!("\"{value}\"")
        } else {
            value.to_string()
        }
    }
}

impl std::fmt::Display for MockSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut out = String::new();
        if let Some(name) = &self.name {
            out.push_str(name);
        }
        if let Some(version) = &self.version {
            out.push('@');
            out.push_str(version);
        }
        for (name, value) in &self.variants {
            match value {
                VariantValue::Bool(true) => {
                    out.push('+');
                    out.push_str(name);
                }
                VariantValue::Bool(false) => {
                    out.push('~');
                    out.push_str(name);
                }
                VariantValue::Value(v) => {
                    out.push(' ');
                    out.push_str(name);
                    out.push('=');
                    out.push_str(&Self::quote(v));
                }
            }
        }
        if let Some(compiler) = &self.compiler {
            out.push('%');
            out.push_str(&compiler.name);
            if let Some(version) = &compiler.version {
                out.push('@');
                out.push_str(version);
            }
        }
        if let Some(hash) = &self.hash {
            out.push('/');
            out.push_str(hash);
        }
        for dep in self.dependencies.values() {
            out.push_str(" ^");
            out.push_str(&dep.to_string());
        }
        write!(f, "{}", out.trim_start())
    }
}

impl Spec for MockSpec {
    fn parse(expr: &str) -> Result<Self, SpecError> {
        let mut spec = MockSpec::default();
        for word in Self::split_words(expr) {
            let fragment = Self::parse_word(&word)?;
            spec.constrain(&fragment)?;
        }
        Ok(spec)
    }

    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn satisfies(&self, other: &Self) -> bool {
        if let Some(name) = &other.name {
            if self.name.as_ref() != Some(name) {
                return false;
            }
        }
        if let Some(version) = &other.version {
            if self.version.as_ref() != Some(version) {
                return false;
            }
        }
        if let Some(needed) = &other.compiler {
            let Some(have) = &self.compiler else {
                return false;
            };
            if have.name != needed.name {
                return false;
            }
            if let Some(version) = &needed.version {
                if have.version.as_ref() != Some(version) {
                    return false;
                }
            }
        }
        for (name, value) in &other.variants {
            if self.variants.get(name) != Some(value) {
                return false;
            }
        }
        if let Some(hash) = &other.hash {
            if self.hash.as_ref() != Some(hash) {
                return false;
            }
        }
        for (name, dep) in &other.dependencies {
            match self.dependencies.get(name) {
                Some(have) => {
                    if !have.satisfies(dep) {
                        return false;
                    }
                }
                None => return false,
            }
        }
        true
    }

    fn constrain(&mut self, other: &Self) -> Result<bool, SpecError> {
        let left = self.to_string();
        let conflict = |reason: &str| SpecError::Conflict {
            left: left.clone(),
            right: other.to_string(),
            reason: reason.to_string(),
        };

        let mut changed = false;
        match (&self.name, &other.name) {
            (Some(a), Some(b)) if a != b => return Err(conflict("package name")),
            (None, Some(b)) => {
                self.name = Some(b.clone());
                changed = true;
            }
            _ => {}
        }
        match (&self.version, &other.version) {
            (Some(a), Some(b)) if a != b => return Err(conflict("version")),
            (None, Some(b)) => {
                self.version = Some(b.clone());
                changed = true;
            }
            _ => {}
        }
        match (&mut self.compiler, &other.compiler) {
            (Some(a), Some(b)) => {
                if a.name != b.name {
                    return Err(conflict("compiler"));
                }
                match (&a.version, &b.version) {
                    (Some(av), Some(bv)) if av != bv => {
                        return Err(conflict("compiler version"));
                    }
                    (None, Some(bv)) => {
                        a.version = Some(bv.clone());
                        changed = true;
                    }
                    _ => {}
                }
            }
            (None, Some(b)) => {
                self.compiler = Some(b.clone());
                changed = true;
            }
            _ => {}
        }
        for (name, value) in &other.variants {
            match self.variants.get(name) {
                Some(have) if have != value => {
                    return Err(conflict(&format!("variant `{name}`")));
                }
                Some(_) => {}
                None => {
                    self.variants.insert(name.clone(), value.clone());
                    changed = true;
                }
            }
        }
        match (&self.hash, &other.hash) {
            (Some(a), Some(b)) if a != b => return Err(conflict("hash pin")),
            (None, Some(b)) => {
                self.hash = Some(b.clone());
                changed = true;
            }
            _ => {}
        }
        for (name, dep) in &other.dependencies {
            match self.dependencies.get_mut(name) {
                Some(existing) => {
                    changed |= existing.constrain(dep)?;
                }
                None => {
                    self.dependencies.insert(name.clone(), dep.clone());
                    changed = true;
                }
            }
        }
        Ok(changed)
    }

    fn dependency_names(&self) -> Vec<&str> {
        self.dependencies.keys().map(String::as_str).collect()
    }

    fn variant_names(&self) -> Vec<&str> {
        self.variants.keys().map(String::as_str).collect()
    }
}
