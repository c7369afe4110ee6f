//! Structural Equality
//!
//! Generated `equals` routines return `Ok(())` or an `Unequal` describing
//! where the values first differ. Properties are compared in declaration
//! order, inherited first, and comparison stops at the first difference.

use std::fmt::Debug;

use thiserror::Error;

/// Located description of an inequality
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Unequal {
    #[error("property {property}: {inner}")]
    Property {
        property: &'static str,
        inner: Box<Unequal>,
    },

    #[error("sequence lengths differ ({left} vs {right})")]
    SequenceLength { left: usize, right: usize },

    #[error("left element {left_index} matches no right element")]
    SequenceElement {
        left_index: usize,
        /// One entry per attempted right element
        mismatches: Vec<Unequal>,
    },

    #[error("{left} != {right}")]
    Scalar { left: String, right: String },

    #[error("value present on {} side only", side(.left_present))]
    Presence { left_present: bool },

    #[error("discriminator {left} != {right}")]
    Discriminator { left: String, right: String },
}

impl Unequal {
    /// Name of the outermost property that differed
    pub fn property_name(&self) -> Option<&'static str> {
        match self {
            Self::Property { property, .. } => Some(*property),
            _ => None,
        }
    }
}

/// Result of a structural comparison
pub type EqualsResult = Result<(), Unequal>;

/// Tag a comparison result with the property it came from
pub fn property(name: &'static str, result: EqualsResult) -> EqualsResult {
    result.map_err(|inner| Unequal::Property {
        property: name,
        inner: Box::new(inner),
    })
}

/// Compare with `PartialEq`
pub fn strict_equals<T: PartialEq + Debug + ?Sized>(left: &T, right: &T) -> EqualsResult {
    if left == right {
        Ok(())
    } else {
        Err(Unequal::Scalar {
            left: format!("{:?}", left),
            right: format!("{:?}", right),
        })
    }
}

/// Compare two optional values; absence on one side only is a mismatch
pub fn option_equals<T>(
    left: Option<T>,
    right: Option<T>,
    equals: impl FnOnce(&T, &T) -> EqualsResult,
) -> EqualsResult {
    match (left, right) {
        (Some(left), Some(right)) => equals(&left, &right),
        (None, None) => Ok(()),
        (Some(_), None) => Err(Unequal::Presence { left_present: true }),
        (None, Some(_)) => Err(Unequal::Presence { left_present: false }),
    }
}

/// Multiset-style comparison: every left element must equal some right
/// element. Lengths are checked first.
pub fn sequence_equals<T>(
    left: &[T],
    right: &[T],
    equals: impl Fn(&T, &T) -> EqualsResult,
) -> EqualsResult {
    if left.len() != right.len() {
        return Err(Unequal::SequenceLength {
            left: left.len(),
            right: right.len(),
        });
    }

    for (left_index, left_element) in left.iter().enumerate() {
        let mut mismatches = Vec::with_capacity(right.len());
        let mut matched = false;
        for right_element in right {
            match equals(left_element, right_element) {
                Ok(()) => {
                    matched = true;
                    break;
                }
                Err(unequal) => mismatches.push(unequal),
            }
        }
        if !matched {
            return Err(Unequal::SequenceElement {
                left_index,
                mismatches,
            });
        }
    }
    Ok(())
}

fn side(left_present: &bool) -> &'static str {
    if *left_present {
        "left"
    } else {
        "right"
    }
}
