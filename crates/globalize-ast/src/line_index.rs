//! Byte offset to line/column conversion

/// Precomputed line start offsets for one source text.
///
/// Columns are reported in UTF-16 code units, the unit source maps use.
#[derive(Debug, Clone)]
pub struct LineIndex {
    line_starts: Vec<usize>,
}

impl LineIndex {
    pub fn new(source: &str) -> Self {
        let mut line_starts = vec![0];
        for (pos, byte) in source.bytes().enumerate() {
            if byte == b'\n' {
                line_starts.push(pos + 1);
            }
        }
        Self { line_starts }
    }

    /// Zero-based (line, column) of `offset` within `source`.
    pub fn line_col(&self, source: &str, offset: usize) -> (u32, u32) {
        let offset = offset.min(source.len());
        let line = match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(next) => next - 1,
        };
        let start = self.line_starts[line];
        let column = source
            .get(start..offset)
            .map(|prefix| prefix.encode_utf16().count())
            .unwrap_or(0);
        (line as u32, column as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_col() {
        let source = "ab\ncde\n\nf";
        let index = LineIndex::new(source);

        assert_eq!(index.line_col(source, 0), (0, 0));
        assert_eq!(index.line_col(source, 1), (0, 1));
        assert_eq!(index.line_col(source, 3), (1, 0));
        assert_eq!(index.line_col(source, 5), (1, 2));
        assert_eq!(index.line_col(source, 7), (2, 0));
        assert_eq!(index.line_col(source, 8), (3, 0));
    }

    #[test]
    fn test_utf16_columns() {
        // U+1F600 is four UTF-8 bytes but two UTF-16 code units
        let source = "x = '\u{1F600}'; y";
        let index = LineIndex::new(source);
        let y = source.find('y').unwrap();
        assert_eq!(index.line_col(source, y), (0, 10));
    }
}
