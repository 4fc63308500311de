//! Byte-level built-in transforms.
//!
//! Language-level transforms (transpilers, preprocessors) are plugins; these
//! only touch encoding details every text pipeline needs.

use super::{PluginError, Transform};

/// Returns the input unchanged.
#[derive(Debug, Clone, Copy)]
pub struct Passthrough;

impl Transform for Passthrough {
    fn apply(&self, input: &[u8]) -> Result<Vec<u8>, PluginError> {
        Ok(input.to_vec())
    }
}

/// Removes a leading UTF-8 byte order mark.
#[derive(Debug, Clone, Copy)]
pub struct StripBom;

const BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

impl Transform for StripBom {
    fn apply(&self, input: &[u8]) -> Result<Vec<u8>, PluginError> {
        Ok(input.strip_prefix(BOM).unwrap_or(input).to_vec())
    }
}

/// Rewrites `\r\n` and lone `\r` to `\n`. Rejects non-UTF-8 input.
#[derive(Debug, Clone, Copy)]
pub struct NormalizeEol;

impl Transform for NormalizeEol {
    fn apply(&self, input: &[u8]) -> Result<Vec<u8>, PluginError> {
        let text = std::str::from_utf8(input)?;
        Ok(text.replace("\r\n", "\n").replace('\r', "\n").into_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_bom() {
        assert_eq!(StripBom.apply(b"\xEF\xBB\xBFbody{}").unwrap(), b"body{}");
        assert_eq!(StripBom.apply(b"body{}").unwrap(), b"body{}");
    }

    #[test]
    fn test_normalize_eol() {
        assert_eq!(NormalizeEol.apply(b"a\r\nb\rc\n").unwrap(), b"a\nb\nc\n");
        assert!(NormalizeEol.apply(&[0xff, 0xfe]).is_err());
    }

    #[test]
    fn test_passthrough() {
        assert_eq!(Passthrough.apply(b"x").unwrap(), b"x");
    }
}
