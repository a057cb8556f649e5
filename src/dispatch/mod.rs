//! Operations on channeled columns.
//!
//! Everything here works on the value channel and carries the reason channel
//! through untouched: an absent operand yields an absent result with the same
//! reason, never a collapsed marker. No function mutates its operands.

mod arith;
mod compare;
mod format;
mod probe;
mod reduce;

pub use arith::{BinaryOp, add, binary, binary_scalar, div, mul, sub};
pub use compare::{CompareOp, compare_columns, compare_value, eq_value};
pub use format::{format_cell, format_column, format_dataset, format_plain};
pub use probe::{ReasonProbe, probe};
pub use reduce::{count_absent, count_present, max, mean, min, reason_counts, sum};
