use oxc::allocator::Allocator;
use oxc::codegen::{Codegen, CodegenOptions, CommentOptions};
use oxc::mangler::MangleOptions;
use oxc::minifier::{CompressOptions, Minifier, MinifierOptions};
use oxc::parser::Parser;
use oxc::span::SourceType;

use super::{ArtifactClass, MinifyError, Minimizer};

/// Script minimizer backed by oxc.
#[derive(Debug, Clone, Copy)]
pub struct ScriptMinimizer {
    /// Remove `console.*` calls.
    pub drop_console: bool,
}

impl Minimizer for ScriptMinimizer {
    fn name(&self) -> &'static str {
        "oxc"
    }

    fn class(&self) -> ArtifactClass {
        ArtifactClass::Script
    }

    fn minimize(&self, _path: &str, input: &[u8]) -> Result<Vec<u8>, MinifyError> {
        let source = std::str::from_utf8(input).map_err(|e| MinifyError::Parse(e.to_string()))?;
        let allocator = Allocator::default();
        let ret = Parser::new(&allocator, source, SourceType::mjs()).parse();
        if !ret.errors.is_empty() {
            return Err(MinifyError::Parse(format!(
                "{} syntax error(s)",
                ret.errors.len()
            )));
        }
        let mut program = ret.program;
        let options = MinifierOptions {
            mangle: Some(MangleOptions::default()),
            compress: Some(CompressOptions {
                drop_console: self.drop_console,
                ..CompressOptions::smallest()
            }),
        };
        let ret = Minifier::new(options).minify(&allocator, &mut program);
        let code = Codegen::new()
            .with_options(CodegenOptions {
                minify: true,
                comments: CommentOptions::disabled(),
                ..CodegenOptions::default()
            })
            .with_scoping(ret.scoping)
            .build(&program)
            .code;
        Ok(code.into_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minify_shrinks() {
        let source = b"function add(first, second) {\n    return first + second;\n}\nself.add = add;\n";
        let out = ScriptMinimizer { drop_console: false }
            .minimize("a.js", source)
            .unwrap();
        assert!(out.len() < source.len());
    }

    #[test]
    fn test_drop_console() {
        let source = b"console.log(\"debug\");\nself.x = 1;\n";
        let kept = ScriptMinimizer { drop_console: false }.minimize("a.js", source).unwrap();
        let dropped = ScriptMinimizer { drop_console: true }.minimize("a.js", source).unwrap();
        assert!(String::from_utf8(kept).unwrap().contains("console"));
        assert!(!String::from_utf8(dropped).unwrap().contains("console"));
    }

    #[test]
    fn test_syntax_error() {
        assert!(
            ScriptMinimizer { drop_console: true }
                .minimize("a.js", b"function (")
                .is_err()
        );
    }
}
