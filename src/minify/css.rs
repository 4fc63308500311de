use lightningcss::stylesheet::{ParserOptions, PrinterOptions, StyleSheet};

use super::{ArtifactClass, MinifyError, Minimizer};

/// Stylesheet minimizer backed by lightningcss.
#[derive(Debug, Clone, Copy)]
pub struct CssMinimizer;

impl Minimizer for CssMinimizer {
    fn name(&self) -> &'static str {
        "lightningcss"
    }

    fn class(&self) -> ArtifactClass {
        ArtifactClass::Style
    }

    fn minimize(&self, _path: &str, input: &[u8]) -> Result<Vec<u8>, MinifyError> {
        let source = std::str::from_utf8(input).map_err(|e| MinifyError::Parse(e.to_string()))?;
        let stylesheet = StyleSheet::parse(source, ParserOptions::default())
            .map_err(|e| MinifyError::Parse(e.to_string()))?;
        let result = stylesheet
            .to_css(PrinterOptions {
                minify: true,
                ..PrinterOptions::default()
            })
            .map_err(|e| MinifyError::Print(e.to_string()))?;
        Ok(result.code.into_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minify_css() {
        let out = CssMinimizer
            .minimize("a.css", b"body {\n  color: #ff0000;\n  margin: 0px;\n}\n")
            .unwrap();
        let out = String::from_utf8(out).unwrap();
        assert!(out.len() < 30);
        assert!(out.contains("body{"));
    }

    #[test]
    fn test_invalid_utf8_is_error() {
        assert!(CssMinimizer.minimize("a.css", &[0xff, 0xfe]).is_err());
    }
}
