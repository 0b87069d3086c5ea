/// Byte range into a manifest source.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Span {
    pub start: u32,
    pub end: u32,
}

impl Span {
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    /// Span for problems that have no useful source location.
    pub fn dummy() -> Self {
        Self { start: 0, end: 0 }
    }

    /// Span covering the single character at a 1-based line/column position,
    /// the way `serde_json` reports parse errors.
    pub fn from_line_col(source: &str, line: usize, column: usize) -> Self {
        let mut offset = 0usize;
        for (idx, text) in source.split_inclusive('\n').enumerate() {
            if idx + 1 == line {
                let col = column.saturating_sub(1).min(text.len());
                offset += col;
                let end = (offset + 1).min(source.len());
                return Self::new(offset as u32, end as u32);
            }
            offset += text.len();
        }
        let end = source.len() as u32;
        Self::new(end, end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_line_col_second_line() {
        let source = "{\n  \"a\": x\n}";
        let span = Span::from_line_col(source, 2, 8);
        assert_eq!(&source[span.start as usize..span.end as usize], "x");
    }

    #[test]
    fn test_from_line_col_past_end() {
        let span = Span::from_line_col("{}", 9, 1);
        assert_eq!(span, Span::new(2, 2));
    }
}
