#![cfg_attr(not(feature = "std"), no_std)]
#![deny(unsafe_code)]
#![deny(missing_docs, rustdoc::broken_intra_doc_links)]
#![doc = include_str!("../README.md")]

extern crate alloc;

mod eval;
mod inst;
mod lower;

pub use bytefork_tree::{
    BuildError, DisplayBytes, Label, LabelSet, PayloadKind, TreeNode, build,
};
pub use eval::{Dispatch, DispatchError, evaluate};
pub use inst::{FailReason, Inst};
pub use lower::{LowerOptions, lower, lower_with};
