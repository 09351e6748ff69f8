//! Incremental construction of a [`SourceMap`]

use std::collections::HashMap;

use crate::{vlq, OriginalLocation, Segment, SourceMap};

#[derive(Debug, Default)]
pub struct SourceMapBuilder {
    file: Option<String>,
    sources: Vec<String>,
    source_ids: HashMap<String, u32>,
    contents: Vec<Option<String>>,
    names: Vec<String>,
    name_ids: HashMap<String, u32>,
    lines: Vec<Vec<Segment>>,
}

impl SourceMapBuilder {
    pub fn new(file: Option<String>) -> Self {
        Self {
            file,
            ..Self::default()
        }
    }

    /// Registers a source, returning the existing index for a known name.
    pub fn add_source(&mut self, name: &str) -> u32 {
        if let Some(&id) = self.source_ids.get(name) {
            return id;
        }
        let id = self.sources.len() as u32;
        self.sources.push(name.to_string());
        self.contents.push(None);
        self.source_ids.insert(name.to_string(), id);
        id
    }

    pub fn set_source_content(&mut self, source: u32, content: Option<String>) {
        if let Some(slot) = self.contents.get_mut(source as usize) {
            *slot = content;
        }
    }

    pub fn add_name(&mut self, name: &str) -> u32 {
        if let Some(&id) = self.name_ids.get(name) {
            return id;
        }
        let id = self.names.len() as u32;
        self.names.push(name.to_string());
        self.name_ids.insert(name.to_string(), id);
        id
    }

    pub fn add_mapping(&mut self, generated_line: u32, generated_column: u32, original: Option<OriginalLocation>) {
        let line = generated_line as usize;
        if self.lines.len() <= line {
            self.lines.resize_with(line + 1, Vec::new);
        }
        self.lines[line].push(Segment {
            generated_column,
            original,
        });
    }

    pub fn into_source_map(mut self) -> SourceMap {
        let mut mappings = String::new();
        let mut source = 0i64;
        let mut original_line = 0i64;
        let mut original_column = 0i64;
        let mut name = 0i64;

        for (index, segments) in self.lines.iter_mut().enumerate() {
            if index > 0 {
                mappings.push(';');
            }
            segments.sort_by_key(|segment| segment.generated_column);
            segments.dedup();

            let mut generated_column = 0i64;
            for (i, segment) in segments.iter().enumerate() {
                if i > 0 {
                    mappings.push(',');
                }
                vlq::encode(segment.generated_column as i64 - generated_column, &mut mappings);
                generated_column = segment.generated_column as i64;

                let Some(original) = segment.original else {
                    continue;
                };
                vlq::encode(original.source as i64 - source, &mut mappings);
                vlq::encode(original.line as i64 - original_line, &mut mappings);
                vlq::encode(original.column as i64 - original_column, &mut mappings);
                source = original.source as i64;
                original_line = original.line as i64;
                original_column = original.column as i64;

                if let Some(n) = original.name {
                    vlq::encode(n as i64 - name, &mut mappings);
                    name = n as i64;
                }
            }
        }

        let sources_content = if self.contents.iter().any(Option::is_some) {
            self.contents
        } else {
            Vec::new()
        };

        SourceMap {
            version: 3,
            file: self.file,
            source_root: None,
            sources: self.sources,
            sources_content,
            names: self.names,
            mappings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(source: u32, line: u32, column: u32) -> Option<OriginalLocation> {
        Some(OriginalLocation {
            source,
            line,
            column,
            name: None,
        })
    }

    #[test]
    fn test_sources_are_deduplicated() {
        let mut builder = SourceMapBuilder::new(None);
        assert_eq!(builder.add_source("a.js"), 0);
        assert_eq!(builder.add_source("b.js"), 1);
        assert_eq!(builder.add_source("a.js"), 0);
        assert_eq!(builder.into_source_map().sources, vec!["a.js", "b.js"]);
    }

    #[test]
    fn test_encodes_lines_and_segments() {
        let mut builder = SourceMapBuilder::new(Some("out.js".into()));
        let src = builder.add_source("a.js");
        builder.add_mapping(0, 4, at(src, 0, 4));
        builder.add_mapping(0, 0, at(src, 0, 0));
        builder.add_mapping(2, 0, at(src, 1, 0));

        let map = builder.into_source_map();
        assert_eq!(map.mappings, "AAAA,IAAI;;AACJ");
        assert!(map.sources_content.is_empty());
        assert_eq!(map.file.as_deref(), Some("out.js"));
    }

    #[test]
    fn test_encoding_decodes_back() {
        let mut builder = SourceMapBuilder::new(None);
        let a = builder.add_source("a.js");
        let b = builder.add_source("b.js");
        builder.set_source_content(b, Some("let b;".into()));
        let name = builder.add_name("b");
        builder.add_mapping(0, 0, at(a, 3, 2));
        builder.add_mapping(1, 7, None);
        builder.add_mapping(1, 9, Some(OriginalLocation { source: b, line: 0, column: 4, name: Some(name) }));

        let map = builder.into_source_map();
        assert_eq!(map.sources_content, vec![None, Some("let b;".to_string())]);

        let lines = map.decode_mappings().unwrap();
        assert_eq!(lines[0][0].original, at(a, 3, 2));
        assert_eq!(lines[1][0].original, None);
        assert_eq!(lines[1][1].generated_column, 9);
        assert_eq!(lines[1][1].original.unwrap().name, Some(name));
    }
}
