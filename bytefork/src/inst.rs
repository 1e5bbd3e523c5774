extern crate alloc;

use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;
use core::fmt::Write;

/// Why a generated matcher rejects its input.
///
/// Both reasons are recoverable-by-rejection conditions at the call site,
/// never programming errors; the renderer decides their surfaced form
/// (exception, error code, ...) in the target language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailReason {
    /// The observed byte matched no branch arm.
    UnmatchedByte,
    /// The input ended before the expected bytes did.
    Truncated,
}

/// One node of the renderer-agnostic instruction tree.
///
/// The instruction tree is what an external renderer consumes to emit
/// literal source text performing single-pass, switch-based matching. It is
/// a strict hierarchy: every node owns its children outright, with no
/// sharing and no cycles.
///
/// The original design expressed these as a class hierarchy with virtual
/// code-emission methods per node type; a closed tagged variant keeps one
/// case per behavior while letting renderers match exhaustively.
#[derive(Debug, Clone, PartialEq)]
pub enum Inst<P> {
    /// Single-byte switch at an absolute input offset.
    Branch {
        /// Absolute byte offset the switch reads.
        offset: usize,
        /// `(byte, subtree)` arms, ascending by byte value.
        arms: Vec<(u8, Inst<P>)>,
        /// Arm taken when the input ends exactly at `offset`; present when
        /// a label is a strict prefix of its siblings.
        end: Option<Box<Inst<P>>>,
        /// Arm taken when no byte arm matches. Always a [`Inst::Fail`]
        /// as lowered; renderers may substitute their own rejection path.
        default: Box<Inst<P>>,
    },
    /// Compare input `[offset, offset + expected.len())` against literal
    /// bytes. Restores correctness for compacted runs: tree construction
    /// skips byte comparisons across agreement runs, so each path checks
    /// its skipped range exactly once before trusting the single-byte
    /// branch decisions that follow.
    Verify {
        /// Absolute offset the comparison starts at.
        offset: usize,
        /// The literal bytes the input must contain there.
        expected: Vec<u8>,
    },
    /// Terminal dispatch to a label's payload.
    Action {
        /// The opaque payload supplied with the matched label.
        payload: P,
        /// Index of the matched label in the originating set.
        label: usize,
    },
    /// Per-element loop around the action of an array-typed payload. The
    /// body runs once per element until the terminator byte is observed;
    /// observing it immediately runs the body zero times.
    Loop {
        /// Byte that ends the element run (`b']'` for JSON arrays).
        terminator: u8,
        /// The looped instruction, an [`Inst::Action`] as lowered.
        body: Box<Inst<P>>,
    },
    /// Ordered instruction sequence (verification steps followed by a
    /// branch or action).
    Seq(Vec<Inst<P>>),
    /// Rejection template. Carries no byte or offset values: those are
    /// runtime observations the renderer plugs into its diagnostic.
    Fail {
        /// Which rejection diagnostic to template.
        reason: FailReason,
    },
}

impl<P> Inst<P> {
    /// Indented textual rendering of the instruction tree, for tests and
    /// logs.
    pub fn dump(&self) -> String
    where
        P: fmt::Debug,
    {
        let mut out = String::new();
        // Writing into a String never fails.
        let _ = self.dump_into(&mut out, 0);
        out
    }

    fn dump_into(&self, out: &mut String, depth: usize) -> fmt::Result
    where
        P: fmt::Debug,
    {
        let pad = |out: &mut String, depth: usize| {
            for _ in 0..depth {
                out.push_str("  ");
            }
        };
        pad(out, depth);
        match self {
            Inst::Branch {
                offset,
                arms,
                end,
                default,
            } => {
                writeln!(out, "branch @{offset}")?;
                for (byte, subtree) in arms {
                    pad(out, depth + 1);
                    if (0x20..0x7f).contains(byte) {
                        writeln!(out, "'{}' =>", *byte as char)?;
                    } else {
                        writeln!(out, "0x{byte:02x} =>")?;
                    }
                    subtree.dump_into(out, depth + 2)?;
                }
                if let Some(end) = end {
                    pad(out, depth + 1);
                    out.push_str("end =>\n");
                    end.dump_into(out, depth + 2)?;
                }
                pad(out, depth + 1);
                out.push_str("_ =>\n");
                default.dump_into(out, depth + 2)
            }
            Inst::Verify { offset, expected } => {
                writeln!(
                    out,
                    "verify @{offset} {:?}",
                    crate::DisplayBytes(expected)
                )
            }
            Inst::Action { payload, label } => {
                writeln!(out, "action label {label} ({payload:?})")
            }
            Inst::Loop { terminator, body } => {
                writeln!(out, "loop until 0x{terminator:02x}")?;
                body.dump_into(out, depth + 1)
            }
            Inst::Seq(steps) => {
                out.push_str("seq\n");
                for step in steps {
                    step.dump_into(out, depth + 1)?;
                }
                Ok(())
            }
            Inst::Fail { reason } => writeln!(out, "fail ({reason:?})"),
        }
    }
}
