use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::utils::mime;

/// Base64 data URI for `bytes`, typed by the extension of `path`.
pub fn data_uri(path: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime::from_path(path), STANDARD.encode(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_uri() {
        assert_eq!(data_uri("a.png", b"abc"), "data:image/png;base64,YWJj");
        assert_eq!(data_uri("f.woff2?v=2", b""), "data:font/woff2;base64,");
    }
}
