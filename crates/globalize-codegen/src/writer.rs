//! Output buffer that records source mappings as it is written

use globalize_ast::line_index::LineIndex;
use globalize_sourcemap::{OriginalLocation, SourceMap, SourceMapBuilder};

pub(crate) struct CodeWriter<'a> {
    source: &'a str,
    index: LineIndex,
    out: String,
    line: u32,
    column: u32,
    builder: SourceMapBuilder,
    source_id: u32,
}

impl<'a> CodeWriter<'a> {
    pub(crate) fn new(source: &'a str, filename: &str, sources_content: bool) -> Self {
        let mut builder = SourceMapBuilder::new(None);
        let source_id = builder.add_source(filename);
        if sources_content {
            builder.set_source_content(source_id, Some(source.to_string()));
        }

        Self {
            source,
            index: LineIndex::new(source),
            out: String::with_capacity(source.len() + 64),
            line: 0,
            column: 0,
            builder,
            source_id,
        }
    }

    /// Generated text with no counterpart in the source.
    pub(crate) fn write_generated(&mut self, text: &str) {
        self.push(text);
    }

    /// Generated text standing in for the source at `offset`.
    pub(crate) fn write_mapped(&mut self, text: &str, offset: usize) {
        if text.is_empty() {
            return;
        }
        self.map_to(offset);
        self.push(text);
    }

    /// Copies `source[start..end]` unchanged, mapping the start of the run and
    /// the start of every line inside it.
    pub(crate) fn copy_verbatim(&mut self, start: usize, end: usize) {
        if start >= end {
            return;
        }
        self.map_to(start);

        let text = &self.source[start..end];
        let mut offset = start;
        for (i, line) in text.split_inclusive('\n').enumerate() {
            if i > 0 {
                self.map_to(offset);
            }
            self.push(line);
            offset += line.len();
        }
    }

    pub(crate) fn ends_with_newline(&self) -> bool {
        self.out.is_empty() || self.out.ends_with('\n')
    }

    pub(crate) fn finish(self) -> (String, SourceMap) {
        (self.out, self.builder.into_source_map())
    }

    fn map_to(&mut self, offset: usize) {
        let (line, column) = self.index.line_col(self.source, offset);
        self.builder.add_mapping(
            self.line,
            self.column,
            Some(OriginalLocation {
                source: self.source_id,
                line,
                column,
                name: None,
            }),
        );
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
        self.out.push_str(text);
    }
}
