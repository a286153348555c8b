use serde::{Deserialize, Serialize};

/// Boolean style marks a run can carry. A run with every mark off and no link
/// target is plain text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Marks {
    pub bold: bool,
    pub italic: bool,
    pub code: bool,
    pub strikethrough: bool,
    pub underline: bool,
}

impl Marks {
    pub fn is_plain(&self) -> bool {
        *self == Marks::default()
    }
}

/// One styled span of text inside a block.
///
/// Runs are opaque to every algorithm except serialization: the importer
/// builds them from emphasis/link spans, the exporter wraps them back in
/// markdown delimiters, and nothing in between looks inside.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InlineRun {
    pub text: String,
    pub marks: Marks,
    /// Link target when the run sits inside a link span.
    pub href: Option<String>,
}

impl InlineRun {
    pub fn plain(text: &str) -> Self {
        Self {
            text: text.to_string(),
            ..Default::default()
        }
    }

    pub fn styled(text: &str, marks: Marks) -> Self {
        Self {
            text: text.to_string(),
            marks,
            href: None,
        }
    }

    pub fn link(text: &str, href: &str) -> Self {
        Self {
            text: text.to_string(),
            marks: Marks::default(),
            href: Some(href.to_string()),
        }
    }

    pub fn is_plain(&self) -> bool {
        self.marks.is_plain() && self.href.is_none()
    }

    /// Single-run content for plain text; empty content for the empty string.
    pub fn plain_runs(text: &str) -> Vec<InlineRun> {
        if text.is_empty() {
            Vec::new()
        } else {
            vec![InlineRun::plain(text)]
        }
    }
}
