//! # Globalize Source Maps
//!
//! Source Map revision 3 support: the JSON model, the base64 VLQ codec for
//! the `mappings` field, a builder for emitting maps, and a decoder used for
//! merging maps and looking up original positions.

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod builder;
pub mod vlq;

pub use builder::SourceMapBuilder;

#[derive(Debug, Error)]
pub enum SourceMapError {
    #[error("invalid source map JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported source map version {0}")]
    UnsupportedVersion(u32),
    #[error("invalid base64 VLQ digit {0:?}")]
    InvalidBase64(char),
    #[error("truncated VLQ value")]
    TruncatedVlq,
    #[error("mapping segment with {0} fields")]
    InvalidSegment(usize),
    #[error("mapping field out of range: {0}")]
    OutOfRange(&'static str),
}

/// A decoded original location (all fields zero-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OriginalLocation {
    pub source: u32,
    pub line: u32,
    pub column: u32,
    pub name: Option<u32>,
}

/// One mapping segment on a generated line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    pub generated_column: u32,
    pub original: Option<OriginalLocation>,
}

/// Result of [`SourceMap::original_position_for`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OriginalPosition<'a> {
    pub source: &'a str,
    pub line: u32,
    pub column: u32,
    pub name: Option<&'a str>,
}

/// Source Map v3 document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceMap {
    pub version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_root: Option<String>,
    #[serde(default)]
    pub sources: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources_content: Vec<Option<String>>,
    #[serde(default)]
    pub names: Vec<String>,
    #[serde(default)]
    pub mappings: String,
}

impl SourceMap {
    pub fn from_json(json: &str) -> Result<Self, SourceMapError> {
        let map: SourceMap = serde_json::from_str(json)?;
        if map.version != 3 {
            return Err(SourceMapError::UnsupportedVersion(map.version));
        }
        Ok(map)
    }

    pub fn to_json(&self) -> Result<String, SourceMapError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Content of source `index`, if embedded.
    pub fn source_content(&self, index: usize) -> Option<&str> {
        self.sources_content.get(index).and_then(|c| c.as_deref())
    }

    /// Decodes `mappings` into one segment list per generated line.
    pub fn decode_mappings(&self) -> Result<Vec<Vec<Segment>>, SourceMapError> {
        decode_mappings(&self.mappings, self.sources.len(), self.names.len())
    }

    /// Finds the original position of a generated line/column (zero-based),
    /// using the closest segment at or before the column.
    pub fn original_position_for(
        &self,
        line: u32,
        column: u32,
    ) -> Result<Option<OriginalPosition<'_>>, SourceMapError> {
        let lines = self.decode_mappings()?;
        let Some(segments) = lines.get(line as usize) else {
            return Ok(None);
        };

        let found = segments
            .iter()
            .take_while(|segment| segment.generated_column <= column)
            .last()
            .and_then(|segment| segment.original);

        Ok(found.map(|original| OriginalPosition {
            source: &self.sources[original.source as usize],
            line: original.line,
            column: original.column,
            name: original.name.map(|n| self.names[n as usize].as_str()),
        }))
    }
}

/// Decodes a `mappings` string. Source and name indices are validated
/// against the given table sizes.
pub fn decode_mappings(
    mappings: &str,
    source_count: usize,
    name_count: usize,
) -> Result<Vec<Vec<Segment>>, SourceMapError> {
    let mut lines = Vec::new();
    let mut source = 0i64;
    let mut original_line = 0i64;
    let mut original_column = 0i64;
    let mut name = 0i64;

    for line in mappings.split(';') {
        let mut segments = Vec::new();
        let mut generated_column = 0i64;

        for text in line.split(',').filter(|s| !s.is_empty()) {
            let fields = vlq::decode_segment(text)?;
            generated_column += fields[0];
            let column = non_negative(generated_column, "generated column")?;

            let original = match fields.len() {
                1 => None,
                4 | 5 => {
                    source += fields[1];
                    original_line += fields[2];
                    original_column += fields[3];
                    let source_index = non_negative(source, "source index")?;
                    if source_index as usize >= source_count {
                        return Err(SourceMapError::OutOfRange("source index"));
                    }
                    let name_index = if fields.len() == 5 {
                        name += fields[4];
                        let index = non_negative(name, "name index")?;
                        if index as usize >= name_count {
                            return Err(SourceMapError::OutOfRange("name index"));
                        }
                        Some(index)
                    } else {
                        None
                    };
                    Some(OriginalLocation {
                        source: source_index,
                        line: non_negative(original_line, "original line")?,
                        column: non_negative(original_column, "original column")?,
                        name: name_index,
                    })
                }
                n => return Err(SourceMapError::InvalidSegment(n)),
            };

            segments.push(Segment {
                generated_column: column,
                original,
            });
        }

        lines.push(segments);
    }

    Ok(lines)
}

fn non_negative(value: i64, field: &'static str) -> Result<u32, SourceMapError> {
    u32::try_from(value).map_err(|_| SourceMapError::OutOfRange(field))
}
