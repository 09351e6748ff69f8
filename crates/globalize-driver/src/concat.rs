//! Concatenating code fragments while merging their source maps

use globalize_sourcemap::{OriginalLocation, SourceMap, SourceMapBuilder, SourceMapError};

const SEPARATOR: &str = "\n";

/// Joins fragments with a newline and builds one source map for the result.
///
/// A fragment with a map has its mappings shifted to where it lands. A named
/// fragment without a map is mapped line by line to a source of that name.
/// Unnamed fragments are not mapped.
pub struct Concat {
    content: String,
    line: u32,
    column: u32,
    builder: SourceMapBuilder,
    fragments: Vec<String>,
    empty: bool,
}

impl Concat {
    pub fn new(file: impl Into<String>) -> Self {
        Self {
            content: String::new(),
            line: 0,
            column: 0,
            builder: SourceMapBuilder::new(Some(file.into())),
            fragments: Vec::new(),
            empty: true,
        }
    }

    pub fn add(&mut self, name: Option<&str>, content: &str, map: Option<&SourceMap>) -> Result<(), SourceMapError> {
        if !self.empty {
            self.push(SEPARATOR);
        }
        self.empty = false;

        let (start_line, start_column) = (self.line, self.column);
        match (map, name) {
            (Some(map), _) => self.merge_map(map, start_line, start_column)?,
            (None, Some(name)) if !content.is_empty() => {
                let source = self.builder.add_source(name);
                self.builder.set_source_content(source, Some(content.to_string()));
                for (i, _) in content.split('\n').enumerate() {
                    let i = i as u32;
                    let column = if i == 0 { start_column } else { 0 };
                    self.builder.add_mapping(
                        start_line + i,
                        column,
                        Some(OriginalLocation {
                            source,
                            line: i,
                            column: 0,
                            name: None,
                        }),
                    );
                }
            }
            _ => {}
        }

        if let Some(name) = name {
            self.fragments.push(name.to_string());
        }
        self.push(content);
        Ok(())
    }

    /// Content, merged map, and the fragment names in the order added
    pub fn finish(self) -> (String, SourceMap, Vec<String>) {
        (self.content, self.builder.into_source_map(), self.fragments)
    }

    fn merge_map(&mut self, map: &SourceMap, start_line: u32, start_column: u32) -> Result<(), SourceMapError> {
        let sources: Vec<u32> = map
            .sources
            .iter()
            .enumerate()
            .map(|(i, source)| {
                let id = self.builder.add_source(source);
                if let Some(content) = map.source_content(i) {
                    self.builder.set_source_content(id, Some(content.to_string()));
                }
                id
            })
            .collect();
        let names: Vec<u32> = map.names.iter().map(|name| self.builder.add_name(name)).collect();

        for (i, segments) in map.decode_mappings()?.into_iter().enumerate() {
            let line = start_line + i as u32;
            for segment in segments {
                let column = if i == 0 {
                    start_column + segment.generated_column
                } else {
                    segment.generated_column
                };
                let original = segment.original.map(|original| OriginalLocation {
                    source: sources[original.source as usize],
                    line: original.line,
                    column: original.column,
                    name: original.name.map(|n| names[n as usize]),
                });
                self.builder.add_mapping(line, column, original);
            }
        }

        Ok(())
    }

    fn push(&mut self, text: &str) {
        for ch in text.chars() {
            if ch == '\n' {
                self.line += 1;
                self.column = 0;
            } else {
                self.column += ch.len_utf16() as u32;
            }
        }
        self.content.push_str(text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fragment_map(source: &str) -> SourceMap {
        let mut builder = SourceMapBuilder::new(None);
        let id = builder.add_source(source);
        builder.set_source_content(id, Some("original".into()));
        builder.add_mapping(0, 0, Some(OriginalLocation { source: id, line: 0, column: 0, name: None }));
        builder.add_mapping(1, 2, Some(OriginalLocation { source: id, line: 3, column: 1, name: None }));
        builder.into_source_map()
    }

    #[test]
    fn test_joins_with_newline() {
        let mut concat = Concat::new("out.js");
        concat.add(None, "(function () {", None).unwrap();
        concat.add(Some("a.js"), "a();", None).unwrap();
        concat.add(None, "}).call(this);", None).unwrap();

        let (content, map, fragments) = concat.finish();
        assert_eq!(content, "(function () {\na();\n}).call(this);");
        assert_eq!(fragments, vec!["a.js"]);
        assert_eq!(map.file.as_deref(), Some("out.js"));
        assert_eq!(map.sources, vec!["a.js"]);
    }

    #[test]
    fn test_unmapped_fragment_maps_each_line() {
        let mut concat = Concat::new("out.js");
        concat.add(Some("init.js"), "var a;\nvar b;", None).unwrap();
        let (_, map, _) = concat.finish();

        let position = map.original_position_for(1, 3).unwrap().unwrap();
        assert_eq!(position.source, "init.js");
        assert_eq!(position.line, 1);
        assert_eq!(map.source_content(0), Some("var a;\nvar b;"));
    }

    #[test]
    fn test_mapped_fragment_is_shifted() {
        let mut concat = Concat::new("bundle.js");
        concat.add(Some("first.js"), "one\ntwo", None).unwrap();
        concat.add(Some("/src/m.js"), "x\n  y", Some(&fragment_map("/src/m.js"))).unwrap();

        let (content, map, fragments) = concat.finish();
        assert_eq!(content, "one\ntwo\nx\n  y");
        assert_eq!(fragments, vec!["first.js", "/src/m.js"]);
        assert_eq!(map.sources, vec!["first.js", "/src/m.js"]);
        assert_eq!(map.source_content(1), Some("original"));

        let position = map.original_position_for(3, 2).unwrap().unwrap();
        assert_eq!(position.source, "/src/m.js");
        assert_eq!((position.line, position.column), (3, 1));
        let position = map.original_position_for(2, 0).unwrap().unwrap();
        assert_eq!((position.source, position.line), ("/src/m.js", 0));
    }

    #[test]
    fn test_empty_named_fragment_adds_no_source() {
        let mut concat = Concat::new("bundle.js");
        concat.add(Some("helpers.js"), "", None).unwrap();
        let (content, map, fragments) = concat.finish();
        assert_eq!(content, "");
        assert!(map.sources.is_empty());
        assert_eq!(fragments, vec!["helpers.js"]);
    }
}
