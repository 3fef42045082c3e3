//! Built-in senior high school mathematics topic table.
//!
//! Weights are the share of exam marks (%), difficulty is the composite
//! star rating. The prerequisite edges form a DAG rooted at
//! "Sets and Logic".

use super::{Catalog, ReferenceTopic};

/// `(name, weight %, difficulty stars)` in table order.
const TABLE: &[(&str, f64, f64)] = &[
    ("Derivatives and Applications", 13.5, 4.5),
    ("Plane Analytic Geometry", 17.0, 4.5),
    ("Trigonometric Functions", 14.5, 3.5),
    ("Sequences", 9.5, 4.0),
    ("Space Vectors and Solid Geometry", 8.5, 3.5),
    ("Function Concepts and Properties", 7.0, 3.5),
    ("Probability", 7.5, 3.0),
    ("Statistics", 6.0, 3.0),
    ("Plane Vectors and Applications", 3.0, 2.5),
    ("Exponential Functions", 4.0, 2.5),
    ("Logarithmic Functions", 4.0, 3.0),
    ("Introductory Solid Geometry", 6.5, 2.5),
    ("Power Functions", 3.0, 2.0),
    ("Function Applications", 2.0, 2.5),
    ("Counting Principles", 2.0, 2.5),
    ("Complex Numbers", 3.0, 1.0),
    ("Sets and Logic", 3.0, 1.0),
];

const PREREQUISITES: &[(&str, &[&str])] = &[
    ("Sets and Logic", &[]),
    ("Function Concepts and Properties", &["Sets and Logic"]),
    ("Power Functions", &["Function Concepts and Properties"]),
    ("Exponential Functions", &["Function Concepts and Properties"]),
    ("Logarithmic Functions", &["Function Concepts and Properties"]),
    ("Function Applications", &["Function Concepts and Properties"]),
    ("Trigonometric Functions", &["Function Concepts and Properties"]),
    ("Plane Vectors and Applications", &["Trigonometric Functions"]),
    (
        "Plane Analytic Geometry",
        &["Plane Vectors and Applications", "Function Concepts and Properties"],
    ),
    ("Introductory Solid Geometry", &["Sets and Logic"]),
    (
        "Space Vectors and Solid Geometry",
        &["Plane Vectors and Applications", "Introductory Solid Geometry"],
    ),
    ("Sequences", &["Function Concepts and Properties"]),
    ("Derivatives and Applications", &["Function Concepts and Properties"]),
    ("Counting Principles", &["Sets and Logic"]),
    ("Probability", &["Counting Principles"]),
    ("Statistics", &["Sets and Logic"]),
    ("Complex Numbers", &["Sets and Logic"]),
];

/// Default prerequisite names of a topic in the built-in table.
pub fn default_prerequisites(name: &str) -> &'static [&'static str] {
    PREREQUISITES
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, pre)| *pre)
        .unwrap_or(&[])
}

pub(super) fn build(base_unit: f64) -> Catalog {
    Catalog::new(TABLE.iter().map(|&(name, weight, difficulty)| ReferenceTopic {
        name: name.to_string(),
        weight,
        difficulty,
        base_time: base_unit * difficulty,
        prerequisites: default_prerequisites(name)
            .iter()
            .map(|p| p.to_string())
            .collect(),
    }))
}
