//! core::element
//!
//! Tagged representation of raw spec-list elements.
//!
//! # Design
//!
//! A declared list arrives as an already-parsed structure: strings and
//! mappings. Rather than re-checking "is this a string starting with `$`,
//! or a mapping with a `matrix` key" at every use site, the shape of each
//! element is decided exactly once at ingestion time and carried as a
//! tagged variant:
//!
//! - [`Element::Spec`] - a plain spec expression
//! - [`Element::Reference`] - a `$name` marker splicing another named list
//! - [`Element::Matrix`] - a cartesian product of constraint axes with
//!   exclusion rules
//!
//! Elements round-trip through serde in their declared form (strings and
//! `{matrix: ..., exclude: ...}` mappings), so a list parsed from JSON or
//! YAML ingests directly via [`Element::from_value`].

use serde::{Deserialize, Serialize};

/// One raw element of a declared spec list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "ElementRepr", into = "ElementRepr")]
pub enum Element {
    /// A plain spec expression, e.g. `zlib@1.2.11`.
    Spec(String),
    /// A reference to another named list. The stored name excludes the
    /// leading `$`.
    Reference(String),
    /// A matrix block expanding to multiple constraint combinations.
    Matrix(Matrix),
}

impl Element {
    /// Classify a string element: a leading `$` marks a reference,
    /// anything else is a plain spec expression.
    pub fn from_expr(expr: &str) -> Self {
        match expr.strip_prefix('$') {
            Some(name) => Element::Reference(name.to_string()),
            None => Element::Spec(expr.to_string()),
        }
    }

    /// Ingest one element from an already-parsed value (string or
    /// `{matrix: ..., exclude: ...}` mapping).
    pub fn from_value(value: &serde_json::Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value.clone())
    }
}

impl std::fmt::Display for Element {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Element::Spec(expr) => write!(f, "{expr}"),
            Element::Reference(name) => write!(f, "${name}"),
            Element::Matrix(m) => write!(f, "matrix[{} axes]", m.axes.len()),
        }
    }
}

/// A matrix block: the cartesian product of its axes, minus any
/// combination satisfying one of the exclude patterns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Matrix {
    /// Constraint axes, in declaration order. Axis 0 varies slowest
    /// during expansion.
    #[serde(rename = "matrix")]
    pub axes: Vec<Vec<String>>,
    /// Spec expressions vetoing combinations via the satisfies predicate.
    #[serde(rename = "exclude", default, skip_serializing_if = "Vec::is_empty")]
    pub excludes: Vec<String>,
}

/// Declared wire form of an element: a bare string or a matrix mapping.
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum ElementRepr {
    Expr(String),
    Matrix(Matrix),
}

impl From<ElementRepr> for Element {
    fn from(repr: ElementRepr) -> Self {
        match repr {
            ElementRepr::Expr(expr) => Element::from_expr(&expr),
            ElementRepr::Matrix(m) => Element::Matrix(m),
        }
    }
}

impl From<Element> for ElementRepr {
    fn from(element: Element) -> Self {
        match element {
            Element::Spec(expr) => ElementRepr::Expr(expr),
            Element::Reference(name) => ElementRepr::Expr(format!("${name}")),
            Element::Matrix(m) => ElementRepr::Matrix(m),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn classifies_plain_and_reference() {
        assert_eq!(Element::from_expr("zlib"), Element::Spec("zlib".into()));
        assert_eq!(
            Element::from_expr("$mpis"),
            Element::Reference("mpis".into())
        );
    }

    #[test]
    fn ingests_string_value() {
        let element = Element::from_value(&json!("mpileaks")).unwrap();
        assert_eq!(element, Element::Spec("mpileaks".into()));

        let element = Element::from_value(&json!("$gccs")).unwrap();
        assert_eq!(element, Element::Reference("gccs".into()));
    }

    #[test]
    fn ingests_matrix_value() {
        let element = Element::from_value(&json!({
            "matrix": [["zlib"], ["%gcc@4.9.3", "%intel@18"]],
            "exclude": ["zlib%intel@18"],
        }))
        .unwrap();

        assert_eq!(
            element,
            Element::Matrix(Matrix {
                axes: vec![
                    vec!["zlib".into()],
                    vec!["%gcc@4.9.3".into(), "%intel@18".into()],
                ],
                excludes: vec!["zlib%intel@18".into()],
            })
        );
    }

    #[test]
    fn exclude_defaults_to_empty() {
        let element = Element::from_value(&json!({"matrix": [["zlib"]]})).unwrap();
        match element {
            Element::Matrix(m) => assert!(m.excludes.is_empty()),
            other => panic!("expected matrix, got {other:?}"),
        }
    }

    #[test]
    fn rejects_unknown_matrix_keys() {
        assert!(Element::from_value(&json!({"matrix": [["zlib"]], "bogus": 1})).is_err());
    }

    #[test]
    fn serializes_back_to_declared_form() {
        let reference = Element::Reference("mpis".into());
        assert_eq!(serde_json::to_value(&reference).unwrap(), json!("$mpis"));

        let matrix = Element::Matrix(Matrix {
            axes: vec![vec!["zlib".into()]],
            excludes: vec![],
        });
        assert_eq!(
            serde_json::to_value(&matrix).unwrap(),
            json!({"matrix": [["zlib"]]})
        );
    }

    #[test]
    fn display_forms() {
        assert_eq!(Element::from_expr("$mpis").to_string(), "$mpis");
        assert_eq!(Element::from_expr("zlib@1.2").to_string(), "zlib@1.2");
    }
}
