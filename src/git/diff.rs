/// Display class of a diff line, taken from its first character only
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineType {
    Add,
    Delete,
    Hunk,
    Context,
}

impl LineType {
    pub fn classify(text: &str) -> Self {
        match text.as_bytes().first() {
            Some(b'+') => LineType::Add,
            Some(b'-') => LineType::Delete,
            Some(b'@') => LineType::Hunk,
            _ => LineType::Context,
        }
    }
}

/// One line of patch text as printed by git
#[derive(Debug, Clone, PartialEq)]
pub struct DiffLine {
    pub line_type: LineType,
    pub content: String,
}

impl DiffLine {
    pub fn new(content: String) -> Self {
        DiffLine {
            line_type: LineType::classify(&content),
            content,
        }
    }
}

/// Options that change what a diff fetch returns
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiffOptions {
    pub ignore_whitespace: bool,
}

/// Split raw patch output into lines, expanding tabs to `tab_width` spaces.
/// Empty output yields no lines.
pub fn parse_diff_lines(raw: &str, tab_width: usize) -> Vec<DiffLine> {
    let tab = " ".repeat(tab_width);
    raw.lines()
        .map(|line| DiffLine::new(line.replace('\t', &tab)))
        .collect()
}
