#![cfg_attr(not(feature = "std"), no_std)]
#![deny(unsafe_code)]
#![deny(missing_docs, rustdoc::broken_intra_doc_links)]
#![doc = include_str!("../README.md")]

extern crate alloc;

mod builder;
mod error;
mod label;
mod node;

pub use builder::build;
pub use error::BuildError;
pub use label::{DisplayBytes, Label, LabelSet, PayloadKind};
pub use node::TreeNode;
