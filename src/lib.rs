//! Conservative resource and memory analysis of generated syscall programs.
//!
//! Given a program and a call in it, [`analyze`] reports which resources
//! earlier calls may have produced, which strings and file names they
//! passed in and which pages they may have mapped. [`assign_sizes_call`]
//! repairs length fields after a call was reshaped and [`sanitize_call`]
//! rewrites argument values that would make a program irreproducible or
//! harmful to the machine running it.

pub mod analysis;
pub mod auxiliary;
pub mod fault;
pub mod prog;
pub mod report;
pub mod sanitize;
pub mod sizes;
pub mod traverse;
pub mod types;

pub use analysis::{analyze, analyze_with, ChoiceTable, State};
pub use auxiliary::{TargetConsts, HOST_CONSTS};
pub use fault::Fault;
pub use prog::{Arg, ArgKind, Call, Prog};
pub use sanitize::{sanitize_call, sanitize_call_with};
pub use sizes::{assign_sizes, assign_sizes_call};
pub use traverse::{foreach_arg, foreach_arg_array, foreach_subarg};
pub use types::{BufferKind, Dir, Syscall, Type, TypeKind};
