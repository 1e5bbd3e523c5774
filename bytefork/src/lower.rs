//! Lowering from the discrimination tree to the instruction tree.
//!
//! Tree construction compacts runs of agreeing bytes for performance; no
//! node exists for them. Lowering restores correctness by threading the
//! "checked up to" offset along every path and emitting one verification
//! over each compacted gap before the single-byte branch decisions that
//! follow. Every node is verified at most once: the node's one-shot
//! `verified` flag guards emission even when several lowering passes touch
//! shared structure.

extern crate alloc;

#[cfg(feature = "tracing")]
use tracing::trace;

#[cfg(not(feature = "tracing"))]
macro_rules! trace {
    ($($arg:tt)*) => {};
}

use alloc::boxed::Box;
use alloc::vec::Vec;

use bytefork_tree::{LabelSet, PayloadKind, TreeNode};

use crate::inst::{FailReason, Inst};

/// Per-invocation lowering configuration.
///
/// Replaces the global caches of the original design: everything lowering
/// needs is carried here or on the nodes, scoped to one tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LowerOptions {
    /// Byte that terminates the element run of an array-typed payload.
    /// Defaults to `b']'`, the JSON array closer.
    pub array_terminator: u8,
}

impl Default for LowerOptions {
    fn default() -> Self {
        Self {
            array_terminator: b']',
        }
    }
}

/// Lower a discrimination tree into an instruction tree, using default
/// [`LowerOptions`].
///
/// Takes the tree mutably to record per-node verification emission; the
/// tree is otherwise unchanged and may be dumped or inspected afterwards.
pub fn lower<P: Clone>(tree: &mut TreeNode, labels: &LabelSet<P>) -> Inst<P> {
    lower_with(tree, labels, &LowerOptions::default())
}

/// Lower a discrimination tree into an instruction tree.
pub fn lower_with<P: Clone>(
    tree: &mut TreeNode,
    labels: &LabelSet<P>,
    opts: &LowerOptions,
) -> Inst<P> {
    let program = lower_node(tree, labels, opts, 0);
    trace!("lowering complete");
    program
}

/// Lower `node` with bytes below `checked` already confirmed on this path.
fn lower_node<P: Clone>(
    node: &mut TreeNode,
    labels: &LabelSet<P>,
    opts: &LowerOptions,
    checked: usize,
) -> Inst<P> {
    if node.terminal().is_some() {
        return lower_terminal(node, labels, opts, checked);
    }

    // A node with a single child never forks: the child is an exhausted
    // terminal (single-label set). Lower it in place so the whole fixed
    // sequence gets one verification followed directly by its action.
    if node.children().len() == 1 {
        return lower_node(&mut node.children_mut()[0], labels, opts, checked);
    }

    lower_fork(node, labels, opts, checked)
}

fn lower_fork<P: Clone>(
    node: &mut TreeNode,
    labels: &LabelSet<P>,
    opts: &LowerOptions,
    checked: usize,
) -> Inst<P> {
    // Every fork has at least one byte arm; an end-of-input terminal can
    // only appear alongside continuing siblings.
    let fork_at = node.fork_offset().unwrap_or(checked);
    let mut steps: Vec<Inst<P>> = Vec::new();

    if let Some(verify) = verify_gap(node, labels, checked, fork_at) {
        steps.push(verify);
    }

    let mut arms: Vec<(u8, Inst<P>)> = Vec::new();
    let mut end: Option<Box<Inst<P>>> = None;
    for child in node.children_mut() {
        match child.match_byte() {
            Some(byte) => {
                let subtree = lower_node(child, labels, opts, fork_at + 1);
                arms.push((byte, subtree));
            }
            None => {
                // The strict-prefix label: taken when input ends at the
                // fork offset, consuming no byte.
                let subtree = lower_node(child, labels, opts, fork_at);
                end = Some(Box::new(subtree));
            }
        }
    }
    trace!(
        offset = fork_at,
        arms = arms.len(),
        has_end = end.is_some(),
        "lowered fork"
    );

    steps.push(Inst::Branch {
        offset: fork_at,
        arms,
        end,
        default: Box::new(Inst::Fail {
            reason: FailReason::UnmatchedByte,
        }),
    });
    finish(steps)
}

fn lower_terminal<P: Clone>(
    node: &mut TreeNode,
    labels: &LabelSet<P>,
    opts: &LowerOptions,
    checked: usize,
) -> Inst<P> {
    // Terminal nodes always carry a label index.
    let Some(label) = node.terminal() else {
        return Inst::Fail {
            reason: FailReason::UnmatchedByte,
        };
    };

    let len = labels.bytes(label).len();
    let mut steps: Vec<Inst<P>> = Vec::new();
    if let Some(verify) = verify_gap(node, labels, checked, len) {
        steps.push(verify);
    }

    let action = Inst::Action {
        payload: labels.payload(label).clone(),
        label,
    };
    let action = match labels.kind(label) {
        PayloadKind::Scalar => action,
        PayloadKind::Repeated => Inst::Loop {
            terminator: opts.array_terminator,
            body: Box::new(action),
        },
    };
    trace!(label, checked, "lowered terminal");
    steps.push(action);
    finish(steps)
}

/// Emit the verification covering `checked..upto` of the path's template,
/// unless the range is empty or `node` already had its verification. Sets
/// the node's one-shot flag on emission.
fn verify_gap<P>(
    node: &mut TreeNode,
    labels: &LabelSet<P>,
    checked: usize,
    upto: usize,
) -> Option<Inst<P>> {
    if upto <= checked {
        return None;
    }
    if !node.mark_verified() {
        return None;
    }
    // All labels below this node agree on the compacted range, so any of
    // them supplies the expected bytes.
    let sample = node.any_label()?;
    let expected = labels.bytes(sample)[checked..upto].to_vec();
    trace!(offset = checked, len = expected.len(), "verify compacted run");
    Some(Inst::Verify {
        offset: checked,
        expected,
    })
}

fn finish<P>(mut steps: Vec<Inst<P>>) -> Inst<P> {
    if steps.len() == 1 {
        // Use the lone instruction directly rather than a one-element
        // sequence, matching what a renderer would want to emit.
        steps.remove(0)
    } else {
        Inst::Seq(steps)
    }
}
