use itoa::Buffer as ItoaBuffer;
use ryu::Buffer as RyuBuffer;

use crate::column::Column;
use crate::element::{Cell, Channeled, Reason};
use crate::scalar::Scalar;

use super::PlainColumn;
use super::tokens::MissingTokens;

/// Inverse of the column decoder: renders cells back to raw text.
///
/// Present values use the scalar text encoding. Reason codes use the first
/// configured token standing for them, or the code's own text when no token
/// maps to it. Failure markers and plain absents render as `empty_text`.
#[derive(Debug, Clone, Copy)]
pub struct ColumnEncoder<'a> {
    tokens: Option<&'a MissingTokens>,
    empty_text: &'a str,
    float_suffix: bool,
}

impl<'a> ColumnEncoder<'a> {
    #[must_use]
    pub const fn new(tokens: Option<&'a MissingTokens>) -> Self {
        Self {
            tokens,
            empty_text: "",
            float_suffix: false,
        }
    }

    /// Writes integral floats with their `.0`, so a column whose floats are
    /// all whole numbers is not inferred as `Int` when read back.
    #[must_use]
    pub const fn with_float_suffix(mut self, keep: bool) -> Self {
        self.float_suffix = keep;
        self
    }

    #[must_use]
    pub const fn with_empty_text(mut self, text: &'a str) -> Self {
        self.empty_text = text;
        self
    }

    pub fn encode_cell_into(
        &self,
        cell: &Cell,
        out: &mut String,
        ryu: &mut RyuBuffer,
        itoa: &mut ItoaBuffer,
    ) {
        out.clear();
        match cell {
            Channeled::Present(value) => self.encode_value_into(value, out, ryu, itoa),
            Channeled::Absent(Reason::Code(code)) => {
                match self.tokens.and_then(|tokens| tokens.canonical_token(code)) {
                    Some(token) => out.push_str(token),
                    None => code.encode_into(out, ryu, itoa),
                }
            }
            Channeled::Absent(Reason::ParseFailure | Reason::CastFailure) => {
                out.push_str(self.empty_text);
            }
        }
    }

    fn encode_value_into(
        &self,
        value: &Scalar,
        out: &mut String,
        ryu: &mut RyuBuffer,
        itoa: &mut ItoaBuffer,
    ) {
        match value {
            Scalar::Float(v) if self.float_suffix => out.push_str(ryu.format(*v)),
            other => other.encode_into(out, ryu, itoa),
        }
    }

    #[must_use]
    pub fn encode(&self, column: &Column) -> Vec<String> {
        let mut ryu = RyuBuffer::new();
        let mut itoa = ItoaBuffer::new();
        column
            .data()
            .iter()
            .map(|cell| {
                let mut out = String::new();
                self.encode_cell_into(cell, &mut out, &mut ryu, &mut itoa);
                out
            })
            .collect()
    }

    #[must_use]
    pub fn encode_plain(&self, column: &PlainColumn) -> Vec<String> {
        let mut ryu = RyuBuffer::new();
        let mut itoa = ItoaBuffer::new();
        column
            .values()
            .iter()
            .map(|value| {
                let mut out = String::new();
                match value {
                    Some(value) => self.encode_value_into(value, &mut out, &mut ryu, &mut itoa),
                    None => out.push_str(self.empty_text),
                }
                out
            })
            .collect()
    }
}

/// True when every value is a finite whole float (and there is at least
/// one), i.e. the shortest encoding would read back as integers.
#[allow(clippy::float_cmp)]
pub fn floats_look_integral<'v>(values: impl IntoIterator<Item = &'v Scalar>) -> bool {
    let mut seen = false;
    for value in values {
        match value {
            Scalar::Float(v) if v.is_finite() && v.fract() == 0.0 => seen = true,
            _ => return false,
        }
    }
    seen
}
