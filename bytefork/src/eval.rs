//! Reference evaluator for instruction trees.
//!
//! Rendering is a collaborator concern, but validating a lowered tree
//! should not require one: this module interprets the instructions directly
//! against input bytes, applying the same branch decisions and verification
//! checks the generated source would. Tests use it to check that every
//! label's own bytes reach that label's action and nothing else's.
//!
//! Element payload parsing inside loops belongs to the renderer's target
//! language; the evaluator only distinguishes "terminator seen immediately,
//! zero body passes" from "at least one element present, one body pass".

use core::fmt;

use crate::inst::{FailReason, Inst};

/// A successful dispatch through an instruction tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dispatch<'t, P> {
    /// Index of the matched label in the originating set.
    pub label: usize,
    /// The matched label's payload.
    pub payload: &'t P,
    /// How many times the terminal action ran: 1 for scalar payloads, 0
    /// for a repeated payload whose terminator appeared immediately.
    pub invocations: usize,
}

/// Rejection while evaluating an instruction tree against input bytes.
///
/// This is the runtime shape of the tree's [`Inst::Fail`] templates: the
/// generated code surfaces the same two conditions in its target language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchError {
    /// A byte disagreed with a verification or matched no branch arm.
    ByteMismatch {
        /// The offending input byte.
        byte: u8,
        /// Its absolute offset in the input.
        offset: usize,
    },
    /// The input ended before the match procedure did.
    Truncated {
        /// The offset at which more input was expected.
        offset: usize,
    },
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchError::ByteMismatch { byte, offset } => {
                write!(f, "unexpected byte 0x{byte:02x} at offset {offset}")
            }
            DispatchError::Truncated { offset } => {
                write!(f, "input ended at offset {offset} before the match completed")
            }
        }
    }
}

impl core::error::Error for DispatchError {}

/// Evaluate an instruction tree against `input`.
///
/// Returns the dispatch the generated matcher would take, or the rejection
/// it would surface. Input bytes past the matched template are ignored, as
/// they are by generated code (a URI continues after its matched prefix).
pub fn evaluate<'t, P>(program: &'t Inst<P>, input: &[u8]) -> Result<Dispatch<'t, P>, DispatchError> {
    let mut cursor = 0usize;
    match step(program, input, &mut cursor)? {
        Some(dispatch) => Ok(dispatch),
        // A well-formed program always ends in an action or fail; an
        // instruction tree that runs out of steps is malformed.
        None => Err(DispatchError::Truncated { offset: cursor }),
    }
}

/// Execute one instruction. `Ok(None)` means the instruction completed
/// without dispatching (a verification) and evaluation continues.
fn step<'t, P>(
    inst: &'t Inst<P>,
    input: &[u8],
    cursor: &mut usize,
) -> Result<Option<Dispatch<'t, P>>, DispatchError> {
    match inst {
        Inst::Verify { offset, expected } => {
            for (i, &want) in expected.iter().enumerate() {
                let at = offset + i;
                match input.get(at) {
                    Some(&got) if got == want => {}
                    Some(&got) => {
                        return Err(DispatchError::ByteMismatch {
                            byte: got,
                            offset: at,
                        });
                    }
                    None => return Err(DispatchError::Truncated { offset: at }),
                }
            }
            *cursor = (*cursor).max(offset + expected.len());
            Ok(None)
        }
        Inst::Branch {
            offset,
            arms,
            end,
            default,
        } => {
            match input.get(*offset) {
                None => match end {
                    Some(end_arm) => {
                        *cursor = *offset;
                        step(end_arm, input, cursor)
                    }
                    None => Err(DispatchError::Truncated { offset: *offset }),
                },
                Some(&byte) => {
                    if let Some((_, subtree)) = arms.iter().find(|(b, _)| *b == byte) {
                        *cursor = offset + 1;
                        step(subtree, input, cursor)
                    } else {
                        *cursor = *offset;
                        step(default, input, cursor)
                    }
                }
            }
        }
        Inst::Action { payload, label } => Ok(Some(Dispatch {
            label: *label,
            payload,
            invocations: 1,
        })),
        Inst::Loop { terminator, body } => {
            // The terminator directly after the template means an empty
            // element run: exit without invoking the action.
            if input.get(*cursor) == Some(terminator)
                && let Inst::Action { payload, label } = body.as_ref()
            {
                *cursor += 1;
                return Ok(Some(Dispatch {
                    label: *label,
                    payload,
                    invocations: 0,
                }));
            }
            step(body, input, cursor)
        }
        Inst::Seq(steps) => {
            for inst in steps {
                if let Some(dispatch) = step(inst, input, cursor)? {
                    return Ok(Some(dispatch));
                }
            }
            Ok(None)
        }
        Inst::Fail { reason } => match reason {
            FailReason::UnmatchedByte => match input.get(*cursor) {
                Some(&byte) => Err(DispatchError::ByteMismatch {
                    byte,
                    offset: *cursor,
                }),
                None => Err(DispatchError::Truncated { offset: *cursor }),
            },
            FailReason::Truncated => Err(DispatchError::Truncated { offset: *cursor }),
        },
    }
}
