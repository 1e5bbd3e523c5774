extern crate alloc;

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;
use core::fmt::Write;

/// A node of the discrimination tree.
///
/// Each branch in the tree compares exactly one byte position; runs of
/// agreement between the remaining candidate labels are compacted away and
/// create no nodes. A node either has children (a branch over the next
/// differing byte) or is terminal and uniquely identifies one label.
///
/// Example, for the templates
///
/// ```text
/// "GET /mydemo/foo"
/// "GET /mydemo/barx"
/// "GET /mydemo/bary"
/// ```
///
/// the root forks at offset 12 into `'f'` (terminal) and `'b'`, and the
/// `'b'` node forks again at offset 15 into `'x'` and `'y'`. Offsets 0–11
/// are compacted; the lowering stage emits a single verification over them.
///
/// Ownership is arena-style: every parent owns its children outright and
/// parentage never changes after construction. Absolute offsets are
/// memoized when a node is created, so no parent back-pointer is needed for
/// position arithmetic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeNode {
    /// The byte this node matched relative to its parent's fork position.
    /// `None` for the root and for end-of-input terminals (labels that ran
    /// out exactly at a fork point).
    match_byte: Option<u8>,
    /// Owned children, end-of-input child first, then ascending by byte.
    children: Vec<TreeNode>,
    /// Set iff this node uniquely identifies one label.
    terminal: Option<usize>,
    /// Absolute offset of `match_byte` in the template (0 for the root).
    offset: usize,
    /// Offset relative to the parent node's position.
    rel_offset: usize,
    /// One-shot flag: the compacted prefix leading to this node has had its
    /// verification emitted. Set during lowering, never reset.
    verified: bool,
}

impl TreeNode {
    /// The tree root: matches nothing, positioned at offset zero.
    pub(crate) fn root() -> Self {
        Self {
            match_byte: None,
            children: Vec::new(),
            terminal: None,
            offset: 0,
            rel_offset: 0,
            verified: false,
        }
    }

    /// A fork arm matching `byte` at absolute position `offset`.
    pub(crate) fn arm(byte: u8, offset: usize, parent_offset: usize) -> Self {
        Self {
            match_byte: Some(byte),
            children: Vec::new(),
            terminal: None,
            offset,
            rel_offset: offset - parent_offset,
            verified: false,
        }
    }

    /// A terminal for a label whose bytes ended at `end` (the offset one
    /// past its last byte). Created both for plain exhaustion and for
    /// labels that are strict prefixes of a sibling.
    pub(crate) fn end_terminal(label: usize, end: usize, parent_offset: usize) -> Self {
        let offset = end.saturating_sub(1);
        Self {
            match_byte: None,
            children: Vec::new(),
            terminal: Some(label),
            offset,
            rel_offset: offset.saturating_sub(parent_offset),
            verified: false,
        }
    }

    pub(crate) fn set_terminal(&mut self, label: usize) {
        self.terminal = Some(label);
    }

    pub(crate) fn push_child(&mut self, child: TreeNode) {
        self.children.push(child);
    }

    /// The byte this node matches, or `None` for the root and for
    /// end-of-input terminals.
    pub fn match_byte(&self) -> Option<u8> {
        self.match_byte
    }

    /// The node's children; empty iff the node is terminal.
    pub fn children(&self) -> &[TreeNode] {
        &self.children
    }

    /// Mutable access to the children. The lowering stage uses this to
    /// record verification emission on the nodes it visits.
    pub fn children_mut(&mut self) -> &mut [TreeNode] {
        &mut self.children
    }

    /// The label index this node uniquely identifies, if terminal.
    pub fn terminal(&self) -> Option<usize> {
        self.terminal
    }

    /// Absolute byte offset of `match_byte` in the original template.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Offset relative to the parent node's position.
    pub fn rel_offset(&self) -> usize {
        self.rel_offset
    }

    /// Whether this node's compacted prefix already has a verification.
    pub fn verified(&self) -> bool {
        self.verified
    }

    /// Mark the compacted prefix as verified. Returns `false` when the flag
    /// was already set, so callers emit at most one verification per node.
    pub fn mark_verified(&mut self) -> bool {
        if self.verified {
            return false;
        }
        self.verified = true;
        true
    }

    /// The absolute position the node's children fork at: the offset of any
    /// byte-matching child. `None` for terminals and for nodes whose only
    /// child is an end-of-input terminal.
    pub fn fork_offset(&self) -> Option<usize> {
        self.children
            .iter()
            .find(|c| c.match_byte.is_some())
            .map(|c| c.offset)
    }

    /// Any label reachable from this node. Terminals return their own
    /// label; branches descend into the first child. Useful wherever the
    /// candidates' shared prefix bytes are needed, since every label below
    /// a node agrees on them.
    pub fn any_label(&self) -> Option<usize> {
        if let Some(label) = self.terminal {
            return Some(label);
        }
        self.children.first().and_then(TreeNode::any_label)
    }

    /// Indented textual rendering of the subtree, for tests and logs.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        self.dump_into(&mut out, 0);
        out
    }

    fn dump_into(&self, out: &mut String, depth: usize) {
        for _ in 0..depth {
            out.push_str("  ");
        }
        match self.match_byte {
            Some(b) if (0x20..0x7f).contains(&b) => {
                let _ = write!(out, "'{}'@{}", b as char, self.offset);
            }
            Some(b) => {
                let _ = write!(out, "0x{b:02x}@{}", self.offset);
            }
            None if self.terminal.is_some() => {
                let _ = write!(out, "end@{}", self.offset);
            }
            None => out.push_str("root"),
        }
        if let Some(label) = self.terminal {
            let _ = write!(out, " -> label {label}");
        }
        out.push('\n');
        for child in &self.children {
            child.dump_into(out, depth + 1);
        }
    }
}

impl fmt::Display for TreeNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.dump())
    }
}
