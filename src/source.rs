use std::sync::Arc;

/// One source file together with its line-start index, so that byte offsets
/// recorded on syntax nodes can be turned into row/column pairs late, when a
/// diagnostic is rendered.
#[derive(Debug)]
pub struct File {
    name: String,
    contents: String,
    lines: Vec<usize>,
}

impl File {
    pub fn new(name: impl Into<String>, contents: impl Into<String>) -> Self {
        let name = name.into();
        let contents = contents.into();
        let mut lines = vec![0];
        for (idx, ch) in contents.char_indices() {
            if ch == '\n' {
                lines.push(idx + ch.len_utf8());
            }
        }
        Self {
            name,
            contents,
            lines,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn contents(&self) -> &str {
        &self.contents
    }

    pub fn len(&self) -> usize {
        self.contents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contents.is_empty()
    }

    pub fn line_column_at(&self, offset: usize) -> (usize, usize) {
        let offset = offset.min(self.contents.len());
        let line_index = match self.lines.binary_search(&offset) {
            Ok(index) => index,
            Err(index) => index.saturating_sub(1),
        };
        let line_start = self.lines[line_index];
        let column = self.contents[line_start..offset].chars().count() + 1;
        (line_index + 1, column)
    }

    pub fn line(&self, line: usize) -> &str {
        if line == 0 || line > self.lines.len() {
            return "";
        }
        let start = self.lines[line - 1];
        let end = if let Some(next_start) = self.lines.get(line) {
            let mut end = *next_start;
            if end > start && self.contents.as_bytes()[end - 1] == b'\n' {
                end -= 1;
            }
            end
        } else {
            self.contents.len()
        };
        &self.contents[start..end]
    }
}

/// A byte range in a source file. The parser attaches one to every syntax
/// node it produces; the elaborator only threads them through to pre-term
/// metadata and diagnostics.
#[derive(Debug, Clone)]
pub struct Span {
    pub file: Arc<File>,
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(file: Arc<File>, start: usize, end: usize) -> Self {
        Self { file, start, end }
    }

    pub fn eof(file: Arc<File>) -> Self {
        let len = file.len();
        Self::new(file, len.saturating_sub(1), len)
    }

    pub fn line_column(&self) -> (usize, usize) {
        self.file.line_column_at(self.start)
    }

    fn as_str(&self) -> &str {
        self.file
            .contents()
            .get(self.start..self.end)
            .unwrap_or_default()
    }
}

impl PartialEq for Span {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.file, &other.file) && self.start == other.start && self.end == other.end
    }
}

impl Eq for Span {}

impl std::fmt::Display for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (line, column) = self.line_column();
        writeln!(f, "{}:{}:{}\n", self.file.name(), line, column)?;
        let line_text = self.file.line(line);
        writeln!(f, "{}", line_text)?;
        write!(
            f,
            "{}{}",
            " ".repeat(column - 1),
            "^".repeat(std::cmp::max(1, self.as_str().chars().count()))
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_column() {
        let file = File::new("<test>", "ab\ncd\ne");
        assert_eq!(file.line_column_at(0), (1, 1));
        assert_eq!(file.line_column_at(1), (1, 2));
        assert_eq!(file.line_column_at(3), (2, 1));
        assert_eq!(file.line_column_at(6), (3, 1));
        // offsets past the end clamp to the last position
        assert_eq!(file.line_column_at(100), (3, 2));
    }

    #[test]
    fn line_text_excludes_newline() {
        let file = File::new("<test>", "ab\ncd\n");
        assert_eq!(file.line(1), "ab");
        assert_eq!(file.line(2), "cd");
        assert_eq!(file.line(5), "");
    }

    #[test]
    fn render_with_caret() {
        let file = Arc::new(File::new("m.nori", "def x := y\n"));
        let span = Span::new(file, 9, 10);
        let rendered = span.to_string();
        assert!(rendered.starts_with("m.nori:1:10"));
        assert!(rendered.ends_with("         ^"));
    }
}
