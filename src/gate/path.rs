//! Request path canonicalisation
//!
//! The gate and the renderer must name the same resource. Every path is
//! reduced to a single spelling before classification, and that spelling
//! is what gets forwarded.

use crate::error::PathError;

/// Reduce a raw request path to its canonical form
///
/// - percent-encoded unreserved characters are decoded (`%61` becomes `a`)
/// - runs of `/` collapse to one
/// - `.` and `..` segments are rejected in any spelling (`%2e%2e` included)
/// - encoded separators (`%2f`, `%5c`) and literal `\` are rejected
///
/// Other percent-escapes are kept as written.
pub fn canonicalize(raw: &str) -> Result<String, PathError> {
    if !raw.starts_with('/') {
        return Err(PathError::NotAbsolute);
    }

    let mut out = String::with_capacity(raw.len());
    for segment in raw.split('/').filter(|s| !s.is_empty()) {
        let segment = decode_unreserved(segment)?;
        if segment == "." || segment == ".." {
            return Err(PathError::DotSegment);
        }
        out.push('/');
        out.push_str(&segment);
    }

    if out.is_empty() {
        out.push('/');
    } else if raw.ends_with('/') {
        out.push('/');
    }

    Ok(out)
}

fn decode_unreserved(segment: &str) -> Result<String, PathError> {
    let bytes = segment.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'\\' => return Err(PathError::Backslash),
            b'%' => {
                let decoded = bytes
                    .get(i + 1..i + 3)
                    .and_then(|hex| std::str::from_utf8(hex).ok())
                    .and_then(|hex| u8::from_str_radix(hex, 16).ok())
                    .ok_or(PathError::MalformedEncoding)?;

                match decoded {
                    b'/' | b'\\' => return Err(PathError::EncodedSeparator),
                    b if is_unreserved(b) => out.push(b),
                    _ => out.extend_from_slice(&bytes[i..i + 3]),
                }
                i += 3;
            }
            b => {
                out.push(b);
                i += 1;
            }
        }
    }

    String::from_utf8(out).map_err(|_| PathError::MalformedEncoding)
}

const fn is_unreserved(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'-' | b'.' | b'_' | b'~')
}
