extern crate alloc;

use alloc::vec::Vec;
use core::fmt;

/// Build-time failure while constructing a discrimination tree.
///
/// Both variants are unrecoverable for the affected label set and stop code
/// generation for it; unrelated label sets are unaffected. The error only
/// carries label indices and offsets; file and source-position context
/// belongs to the schema or template collaborator that supplied the labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    /// The label set was empty; a dispatcher over zero labels is a
    /// configuration bug rather than a valid degenerate tree.
    EmptyLabelSet,
    /// Two or more labels are byte-identical and equal length, making
    /// dispatch ambiguous. Carries the indices of every conflicting label.
    DuplicateLabels {
        /// Indices into the originating label set, in set order.
        indices: Vec<usize>,
    },
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildError::EmptyLabelSet => f.write_str("label set is empty"),
            BuildError::DuplicateLabels { indices } => {
                f.write_str("duplicate labels make dispatch ambiguous: ")?;
                for (i, index) in indices.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "#{index}")?;
                }
                Ok(())
            }
        }
    }
}

impl core::error::Error for BuildError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_lists_conflicting_indices() {
        let err = BuildError::DuplicateLabels {
            indices: alloc::vec![1, 4],
        };
        assert_eq!(
            alloc::format!("{err}"),
            "duplicate labels make dispatch ambiguous: #1, #4"
        );
    }
}
