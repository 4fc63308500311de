//! Filename templates.
//!
//! Supported tokens:
//!
//! | Token              | Expands to                                   |
//! |--------------------|----------------------------------------------|
//! | `[name]`           | chunk name, or the asset's file stem         |
//! | `[contenthash:N]`  | first N hex chars of the artifact's hash     |
//! | `[hash:N]`         | same as `[contenthash:N]`                    |
//! | `[ext]`            | extension including the dot (`.png`)         |
//! | `[query]`          | resource query including `?`, or empty       |
//!
//! `N` defaults to 20 and must lie within `8..=64`.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use super::ContentHash;

pub const DEFAULT_HASH_LEN: usize = 20;
pub const MIN_HASH_LEN: usize = 8;
pub const MAX_HASH_LEN: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("unknown token `[{0}]`")]
    UnknownToken(String),

    #[error("unclosed `[` in template")]
    Unclosed,

    #[error("empty template")]
    Empty,

    #[error("invalid hash length `{0}`")]
    InvalidLength(String),

    #[error("hash length {0} is outside 8..=64")]
    LengthOutOfRange(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Name,
    Hash(usize),
    Ext,
    Query,
}

/// Values substituted into a template.
#[derive(Debug, Clone, Copy)]
pub struct NameFields<'a> {
    pub name: &'a str,
    /// Extension including the leading dot, or empty.
    pub ext: &'a str,
    pub query: &'a str,
    pub hash: ContentHash,
}

/// Parsed filename template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilenameTemplate {
    source: String,
    segments: Vec<Segment>,
}

impl FilenameTemplate {
    pub fn parse(source: &str) -> Result<Self, TemplateError> {
        if source.is_empty() {
            return Err(TemplateError::Empty);
        }

        let mut segments = Vec::new();
        let mut rest = source;
        while let Some(open) = rest.find('[') {
            if open > 0 {
                segments.push(Segment::Literal(rest[..open].to_string()));
            }
            let after = &rest[open + 1..];
            let close = after.find(']').ok_or(TemplateError::Unclosed)?;
            segments.push(parse_token(&after[..close])?);
            rest = &after[close + 1..];
        }
        if !rest.is_empty() {
            segments.push(Segment::Literal(rest.to_string()));
        }

        Ok(Self {
            source: source.to_string(),
            segments,
        })
    }

    /// Whether the template includes a content hash token.
    #[cfg(test)]
    pub fn is_hashed(&self) -> bool {
        self.segments.iter().any(|s| matches!(s, Segment::Hash(_)))
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Expand the template. Pure function of its inputs.
    pub fn render(&self, fields: &NameFields<'_>) -> String {
        let mut out = String::with_capacity(self.source.len() + 16);
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Name => out.push_str(fields.name),
                Segment::Hash(len) => out.push_str(&fields.hash.short(*len)),
                Segment::Ext => out.push_str(fields.ext),
                Segment::Query => out.push_str(fields.query),
            }
        }
        out
    }
}

fn parse_token(token: &str) -> Result<Segment, TemplateError> {
    let (key, len) = match token.split_once(':') {
        Some((key, len)) => (key, Some(len)),
        None => (token, None),
    };

    match (key, len) {
        ("name", None) => Ok(Segment::Name),
        ("ext", None) => Ok(Segment::Ext),
        ("query", None) => Ok(Segment::Query),
        ("contenthash" | "hash", None) => Ok(Segment::Hash(DEFAULT_HASH_LEN)),
        ("contenthash" | "hash", Some(len)) => {
            let len: usize = len
                .parse()
                .map_err(|_| TemplateError::InvalidLength(len.to_string()))?;
            if !(MIN_HASH_LEN..=MAX_HASH_LEN).contains(&len) {
                return Err(TemplateError::LengthOutOfRange(len));
            }
            Ok(Segment::Hash(len))
        }
        _ => Err(TemplateError::UnknownToken(token.to_string())),
    }
}

impl FromStr for FilenameTemplate {
    type Err = TemplateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for FilenameTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}
