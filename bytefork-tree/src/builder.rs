//! Discrimination-tree construction.
//!
//! The builder scans the label set one byte offset at a time and classifies
//! each offset into one of three outcomes:
//!
//! - **Agree**: every remaining candidate has the same byte here. No node
//!   is created; the cursor advances. This is the compaction optimization:
//!   runs of agreement cost nothing in tree size.
//! - **Fork**: candidates disagree (or one candidate ran out while others
//!   continue). One child per distinct byte value, plus an end-of-input
//!   terminal for a candidate that ended exactly here.
//! - **Exhausted**: every remaining candidate has ended. One candidate
//!   becomes a terminal; more than one means byte-identical duplicates and
//!   is a configuration error.

extern crate alloc;

#[cfg(feature = "tracing")]
use tracing::trace;

#[cfg(not(feature = "tracing"))]
macro_rules! trace {
    ($($arg:tt)*) => {};
}

use alloc::collections::BTreeMap;
use alloc::vec::Vec;

use crate::error::BuildError;
use crate::label::LabelSet;
use crate::node::TreeNode;

/// Build the discrimination tree for a label set.
///
/// The returned root matches no byte itself; its children fork on the first
/// offset where the labels disagree. Arm order is deterministic: the
/// end-of-input child (if any) first, then ascending byte value.
///
/// # Errors
///
/// - [`BuildError::EmptyLabelSet`] when `labels` holds nothing.
/// - [`BuildError::DuplicateLabels`] when two or more labels are
///   byte-identical and equal length. The error carries the conflicting
///   label indices so the calling tool can point at both definitions.
pub fn build<P>(labels: &LabelSet<P>) -> Result<TreeNode, BuildError> {
    if labels.is_empty() {
        return Err(BuildError::EmptyLabelSet);
    }
    let subset: Vec<usize> = (0..labels.len()).collect();
    let mut root = TreeNode::root();
    grow(&mut root, labels, &subset, 0)?;
    trace!(labels = labels.len(), "discrimination tree built");
    Ok(root)
}

/// Fill `node` with the subtree discriminating `subset`, starting the scan
/// at byte offset `at`. Terminates because `at` strictly increases on every
/// iteration and recursion, bounded by the longest label.
fn grow<P>(
    node: &mut TreeNode,
    labels: &LabelSet<P>,
    subset: &[usize],
    mut at: usize,
) -> Result<(), BuildError> {
    loop {
        // Scan: group contributing labels by their byte at `at`. Labels
        // shorter than the cursor no longer contribute bytes.
        let mut groups: BTreeMap<u8, Vec<usize>> = BTreeMap::new();
        let mut ended: Vec<usize> = Vec::new();
        for &index in subset {
            match labels.bytes(index).get(at) {
                Some(&byte) => groups.entry(byte).or_default().push(index),
                None => ended.push(index),
            }
        }

        if groups.is_empty() {
            // Exhausted: all candidates ended at exactly this offset, so
            // they are byte-identical up to `at` and equal in length.
            if ended.len() > 1 {
                return Err(BuildError::DuplicateLabels { indices: ended });
            }
            trace!(label = ended[0], offset = at, "terminal (exhausted)");
            node.push_child(TreeNode::end_terminal(ended[0], at, node.offset()));
            return Ok(());
        }

        if groups.len() == 1 && ended.is_empty() {
            // Agree: a compacted byte. The lowering stage will verify the
            // whole run at once.
            at += 1;
            continue;
        }

        // Fork. A candidate that ended here is a strict prefix of the ones
        // that continue; it keeps a terminal at the fork point so matching
        // input that stops at this offset still dispatches to it.
        if ended.len() > 1 {
            return Err(BuildError::DuplicateLabels { indices: ended });
        }
        if let Some(&short) = ended.first() {
            trace!(label = short, offset = at, "prefix terminal at fork");
            node.push_child(TreeNode::end_terminal(short, at, node.offset()));
        }
        trace!(offset = at, arms = groups.len(), "fork");
        for (byte, members) in groups {
            let mut child = TreeNode::arm(byte, at, node.offset());
            if let [only] = members[..] {
                child.set_terminal(only);
            } else {
                grow(&mut child, labels, &members, at + 1)?;
            }
            node.push_child(child);
        }
        return Ok(());
    }
}
