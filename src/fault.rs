use thiserror::Error;

/// A broken contract between the generator and the descriptors it builds
/// programs from.
///
/// A `Fault` means the program handed to the engine does not match its own
/// declared types, so whatever produced it has a bug. It aborts the current
/// operation and must not be retried: callers should fail the test or stop
/// the worker that produced the program.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Fault {
    #[error("{call}: argument {index} ({what}) is {found}, expected {expected}")]
    ArgKind {
        call: String,
        index: usize,
        what: &'static str,
        expected: &'static str,
        found: &'static str,
    },

    #[error("{call}: argument {index} is missing, call has {len} arguments")]
    MissingArg {
        call: String,
        index: usize,
        len: usize,
    },

    #[error("{call}: mapping arguments are not pages: address is {addr}, size is {size}")]
    NotPages {
        call: String,
        addr: &'static str,
        size: &'static str,
    },

    #[error("address is out of bounds: page={page} len={count} (pages={pages}, offset={offset}) bound={bound}")]
    PageOutOfBounds {
        page: u64,
        count: u64,
        pages: u64,
        offset: i64,
        bound: usize,
    },

    #[error("len field '{field}' references non existent field '{target}', fields: {known:?}")]
    UnresolvedLen {
        field: String,
        target: String,
        known: Vec<String>,
    },

    #[error("pointer '{field}' is not optional but has no pointee")]
    MissingPointee { field: String },
}
