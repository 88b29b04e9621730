//! Crate-wide error type.
//!
//! The storage layer never aborts the process itself. Conditions that the
//! reference design this engine is modeled on treats as fatal (corrupt file,
//! page index out of bounds, ...) are modeled here as `Error` variants and
//! propagated through `Result`; it's up to `main` whether to print and exit.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Internal(#[from] InternalError),

    #[error("string too long for column '{column}': got {got} bytes, max {max}")]
    StringTooLong {
        column: &'static str,
        got: usize,
        max: usize,
    },

    #[error("syntax error: {0}")]
    Syntax(String),
}

/// Conditions that would `exit()` the process in the reference design this
/// engine is modeled on. Kept as a distinct sub-enum so callers can match on
/// "this is a programming error / unsupported structural case" separately
/// from ordinary I/O or user-input failures.
#[derive(Error, Debug)]
pub enum InternalError {
    #[error("page number {page_num} is out of bounds (max {max})")]
    PageOutOfBounds { page_num: u32, max: u32 },

    #[error(
        "database file is corrupt: length {len} is not a multiple of the page size {page_size}"
    )]
    CorruptFile { len: u64, page_size: usize },

    #[error("attempted to flush an empty page slot {0}")]
    FlushEmptySlot(u32),

    #[error("cell {cell_num} is out of bounds (num_cells {num_cells})")]
    CellOutOfBounds { cell_num: u32, num_cells: u32 },

    #[error("splitting a leaf that is not the root is not implemented by this core")]
    NonRootSplitUnsupported,

    #[error("searching an internal root node is not implemented by this core")]
    InternalNodeSearchUnsupported,

    #[error("invalid node type byte {0}")]
    InvalidNodeType(u8),
}
