extern crate alloc;

use alloc::vec::Vec;
use core::fmt;

/// Whether a label's payload dispatches once or repeatedly.
///
/// `Repeated` marks array-typed payloads: the lowering stage wraps their
/// terminal action in a loop that re-enters per element until a terminator
/// byte is seen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PayloadKind {
    /// Single dispatch once the label is matched.
    #[default]
    Scalar,
    /// Array-typed payload; the action runs once per element.
    Repeated,
}

/// A fixed byte sequence associated with an opaque payload.
///
/// Labels are the input to discrimination-tree construction: one of the
/// finite, fully known-at-build-time set of sequences the generated matcher
/// must discriminate among. The byte sequence is typically a UTF-8 encoded
/// `"VERB URI-prefix"` template or a property name; the tree never
/// interprets it beyond byte comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label<P> {
    bytes: Vec<u8>,
    payload: P,
    kind: PayloadKind,
}

impl<P> Label<P> {
    /// Create a scalar label from a byte sequence and its payload.
    pub fn new(bytes: impl Into<Vec<u8>>, payload: P) -> Self {
        Self {
            bytes: bytes.into(),
            payload,
            kind: PayloadKind::Scalar,
        }
    }

    /// Create a label whose payload is array-typed.
    pub fn repeated(bytes: impl Into<Vec<u8>>, payload: P) -> Self {
        Self {
            bytes: bytes.into(),
            payload,
            kind: PayloadKind::Repeated,
        }
    }

    /// The template bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// The payload reference handed back through terminal actions.
    pub fn payload(&self) -> &P {
        &self.payload
    }

    /// Scalar or repeated dispatch.
    pub fn kind(&self) -> PayloadKind {
        self.kind
    }
}

impl<P> From<(&str, P)> for Label<P> {
    fn from((template, payload): (&str, P)) -> Self {
        Label::new(template.as_bytes().to_vec(), payload)
    }
}

/// The ordered set of labels a single tree discriminates among.
///
/// A label's position in the set is its label index; terminal tree nodes and
/// lowered actions refer back to labels by that index. The set is supplied
/// once and treated as immutable while building.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelSet<P> {
    labels: Vec<Label<P>>,
}

impl<P> LabelSet<P> {
    /// Create an empty label set.
    pub fn new() -> Self {
        Self { labels: Vec::new() }
    }

    /// Append a label; its index is the set's length before the push.
    pub fn push(&mut self, label: Label<P>) -> usize {
        let index = self.labels.len();
        self.labels.push(label);
        index
    }

    /// Number of labels.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// True when the set holds no labels.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// The label at `index`, if any.
    pub fn get(&self, index: usize) -> Option<&Label<P>> {
        self.labels.get(index)
    }

    /// Template bytes of the label at `index`.
    ///
    /// Panics if `index` is out of bounds; indices handed out by this set
    /// and by tree nodes are always valid.
    pub fn bytes(&self, index: usize) -> &[u8] {
        self.labels[index].bytes()
    }

    /// Payload of the label at `index`.
    pub fn payload(&self, index: usize) -> &P {
        self.labels[index].payload()
    }

    /// Payload kind of the label at `index`.
    pub fn kind(&self, index: usize) -> PayloadKind {
        self.labels[index].kind()
    }

    /// Iterate over `(index, label)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &Label<P>)> {
        self.labels.iter().enumerate()
    }
}

impl<P> Default for LabelSet<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> FromIterator<Label<P>> for LabelSet<P> {
    fn from_iter<I: IntoIterator<Item = Label<P>>>(iter: I) -> Self {
        Self {
            labels: iter.into_iter().collect(),
        }
    }
}

impl<P: fmt::Debug> fmt::Display for LabelSet<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, label) in self.iter() {
            writeln!(
                f,
                "{index:4}: {:?} {:?} -> {:?}",
                DisplayBytes(label.bytes()),
                label.kind(),
                label.payload()
            )?;
        }
        Ok(())
    }
}

/// Renders template bytes as text where possible, escaping the rest.
///
/// Wraps a byte slice for `{:?}` formatting in logs, dumps, and error
/// messages.
#[derive(Clone, Copy)]
pub struct DisplayBytes<'a>(pub &'a [u8]);

impl fmt::Debug for DisplayBytes<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("\"")?;
        for &b in self.0 {
            if (0x20..0x7f).contains(&b) && b != b'"' && b != b'\\' {
                write!(f, "{}", b as char)?;
            } else {
                write!(f, "\\x{b:02x}")?;
            }
        }
        f.write_str("\"")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indices_follow_push_order() {
        let mut set = LabelSet::new();
        assert_eq!(set.push(Label::new("GET /a", 'a')), 0);
        assert_eq!(set.push(Label::repeated("Items", 'b')), 1);
        assert_eq!(set.bytes(0), b"GET /a");
        assert_eq!(set.kind(1), PayloadKind::Repeated);
        assert_eq!(*set.payload(1), 'b');
    }

    #[test]
    fn display_escapes_non_printable() {
        let rendered = alloc::format!("{:?}", DisplayBytes(b"a\"b\x01"));
        assert_eq!(rendered, "\"a\\x22b\\x01\"");
    }
}
