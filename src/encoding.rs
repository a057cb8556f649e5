use std::borrow::Cow;

use encoding_rs::{Encoding, UTF_8};
use simdutf8::basic;

use crate::error::{Error, Result};

/// Resolves an input encoding label; `None` or a blank label means UTF-8.
///
/// # Errors
///
/// Returns [`Error::Encoding`] when the label names no known encoding.
pub fn resolve_encoding(label: Option<&str>) -> Result<&'static Encoding> {
    match label.map(str::trim) {
        None | Some("") => Ok(UTF_8),
        Some(name) => resolve_label(name).ok_or_else(|| Error::Encoding {
            encoding: Cow::Owned(name.to_owned()),
            details: Cow::from("unknown encoding label"),
        }),
    }
}

fn resolve_label(name: &str) -> Option<&'static Encoding> {
    try_encoding_label(name).or_else(|| {
        let lower = name.to_ascii_lowercase();
        try_encoding_label(&lower)
            .or_else(|| try_encoding_label(&lower.replace('_', "-")))
            .or_else(|| mac_compat_encoding(&lower))
    })
}

fn try_encoding_label(label: &str) -> Option<&'static Encoding> {
    Encoding::for_label(label.as_bytes())
}

fn mac_compat_encoding(lower_label: &str) -> Option<&'static Encoding> {
    match lower_label {
        "macroman" => Encoding::for_label(b"macintosh"),
        "maccyrillic" => Encoding::for_label(b"x-mac-cyrillic"),
        _ => None,
    }
}

/// Decodes one raw field. UTF-8 input borrows when valid.
///
/// # Errors
///
/// Returns [`Error::Encoding`] for bytes that are malformed in `encoding`.
pub fn decode_field<'a>(bytes: &'a [u8], encoding: &'static Encoding) -> Result<Cow<'a, str>> {
    if encoding == UTF_8 || (encoding.is_ascii_compatible() && bytes.is_ascii()) {
        return basic::from_utf8(bytes)
            .map(Cow::Borrowed)
            .map_err(|_| malformed(encoding, bytes));
    }
    let (decoded, had_errors) = encoding.decode_without_bom_handling(bytes);
    if had_errors {
        return Err(malformed(encoding, bytes));
    }
    Ok(decoded)
}

fn malformed(encoding: &'static Encoding, bytes: &[u8]) -> Error {
    Error::Encoding {
        encoding: Cow::Borrowed(encoding.name()),
        details: Cow::Owned(format!("malformed field {:?}", String::from_utf8_lossy(bytes))),
    }
}
