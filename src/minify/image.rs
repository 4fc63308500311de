//! Lossless image recompression: PNG re-encode, SVG re-serialization.

use image::ImageFormat;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};

use super::{ArtifactClass, MinifyError, Minimizer};
use crate::naming::dotted_ext;

#[derive(Debug, Clone, Copy)]
pub struct ImageMinimizer;

impl Minimizer for ImageMinimizer {
    fn name(&self) -> &'static str {
        "image"
    }

    fn class(&self) -> ArtifactClass {
        ArtifactClass::Image
    }

    fn accepts(&self, path: &str) -> bool {
        matches!(dotted_ext(path).to_ascii_lowercase().as_str(), ".png" | ".svg")
    }

    fn minimize(&self, path: &str, input: &[u8]) -> Result<Vec<u8>, MinifyError> {
        if dotted_ext(path).eq_ignore_ascii_case(".svg") {
            optimize_svg(input)
        } else {
            recompress_png(input)
        }
    }
}

fn recompress_png(input: &[u8]) -> Result<Vec<u8>, MinifyError> {
    let decoded = image::load_from_memory_with_format(input, ImageFormat::Png)?;
    let mut out = Vec::with_capacity(input.len());
    let encoder = PngEncoder::new_with_quality(&mut out, CompressionType::Best, FilterType::Adaptive);
    decoded.write_with_encoder(encoder)?;
    Ok(out)
}

fn optimize_svg(input: &[u8]) -> Result<Vec<u8>, MinifyError> {
    let tree = usvg::Tree::from_data(input, &usvg::Options::default())?;
    let write_options = usvg::WriteOptions {
        indent: usvg::Indent::None,
        ..Default::default()
    };
    Ok(tree.to_string(&write_options).into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgba};
    use std::io::Cursor;

    fn png() -> Vec<u8> {
        let img = ImageBuffer::from_pixel(16, 16, Rgba([255u8, 0, 0, 255]));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn test_png_roundtrips_losslessly() {
        let original = png();
        let out = ImageMinimizer.minimize("a.png", &original).unwrap();
        let a = image::load_from_memory(&original).unwrap().to_rgba8();
        let b = image::load_from_memory(&out).unwrap().to_rgba8();
        assert_eq!(a, b);
    }

    #[test]
    fn test_svg_reserialized() {
        let svg = br#"<svg xmlns="http://www.w3.org/2000/svg" width="10" height="10">
            <!-- comment -->
            <rect x="0" y="0" width="10" height="10" fill="red"/>
        </svg>"#;
        let out = ImageMinimizer.minimize("icon.svg", svg).unwrap();
        let out = String::from_utf8(out).unwrap();
        assert!(!out.contains("comment"));
        assert!(out.contains("<svg"));
    }

    #[test]
    fn test_accepts() {
        assert!(ImageMinimizer.accepts("a.PNG"));
        assert!(ImageMinimizer.accepts("b.svg?v=1"));
        assert!(!ImageMinimizer.accepts("c.jpg"));
    }

    #[test]
    fn test_garbage_is_error() {
        assert!(ImageMinimizer.minimize("a.png", b"not a png").is_err());
    }
}
