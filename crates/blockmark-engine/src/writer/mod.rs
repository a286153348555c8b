//! Markdown export: serializing the block sequence back to markdown text.
//!
//! Blocks carry no parent links, so list nesting is reconstructed from a
//! stack of open list contexts. Walking the document once, each list block
//! either matches the context on top of the stack (same list type, same
//! indent) or closes every context at its indent or deeper and opens its
//! own. Number blocks draw their label from the counter stored in their
//! context; closing the context discards the counter, which is what makes
//! a numbered run restart at 1 after an interruption at the same indent.
//!
//! Non-list blocks close all open contexts. Quote blocks express their
//! indent as repeated `> ` prefixes; list blocks as two source columns per
//! level. Other blocks start at column zero since markdown has no way to
//! indent them that survives a reparse.
//!
//! Output is canonical: `- ` bullets, `N. ` numbers, fenced code, a blank
//! line between blocks except inside an uninterrupted list run, and a
//! trailing newline. Export of any parse result reproduces its input
//! exactly when the input was itself produced by this writer.

use crate::models::{Block, BlockKind, Document, InlineRun};

/// Serialize a document to canonical markdown text.
pub fn to_markdown(document: &Document) -> String {
    let mut writer = Writer::new();
    for block in document.iter() {
        writer.write_block(block);
    }
    let text = writer.finish();
    tracing::debug!(
        target: "blockmark::export",
        blocks = document.len(),
        bytes = text.len(),
        "exported markdown"
    );
    text
}

impl Document {
    /// Convenience wrapper around [`to_markdown`].
    pub fn to_markdown(&self) -> String {
        to_markdown(self)
    }
}

/// The list type an open context tracks. Bullets and tasks never carry
/// counters but still form distinct runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ListKind {
    Bullet,
    Number,
    Task,
}

impl ListKind {
    fn of(kind: &BlockKind) -> Option<Self> {
        match kind {
            BlockKind::Bullet => Some(ListKind::Bullet),
            BlockKind::Number => Some(ListKind::Number),
            BlockKind::Task { .. } => Some(ListKind::Task),
            _ => None,
        }
    }
}

/// One open list scope during export.
struct ListContext {
    kind: ListKind,
    indent: u8,
    next_number: u64,
}

struct Writer {
    out: String,
    contexts: Vec<ListContext>,
    wrote_any: bool,
    previous_was_list: bool,
}

impl Writer {
    fn new() -> Self {
        Self {
            out: String::new(),
            contexts: Vec::new(),
            wrote_any: false,
            previous_was_list: false,
        }
    }

    fn write_block(&mut self, block: &Block) {
        let is_list = block.kind.is_list();
        // Blank line between blocks, except within a run of list items.
        if self.wrote_any && !(self.previous_was_list && is_list) {
            self.out.push('\n');
        }

        match &block.kind {
            BlockKind::Paragraph => {
                self.contexts.clear();
                self.push_line("", &render_inline(&block.content));
            }
            BlockKind::Heading { level } => {
                self.contexts.clear();
                let text = render_inline(&block.content);
                let hashes = "#".repeat(usize::from(*level));
                if text.is_empty() {
                    self.push_line("", &hashes);
                } else {
                    self.push_line(&format!("{hashes} "), &text);
                }
            }
            BlockKind::Quote => {
                self.contexts.clear();
                let prefix = "> ".repeat(usize::from(block.indent) + 1);
                self.push_line(&prefix, &render_inline(&block.content));
            }
            BlockKind::Code { language } => {
                self.contexts.clear();
                self.write_code(language.as_deref(), &block.text());
            }
            BlockKind::Divider => {
                self.contexts.clear();
                self.push_line("", "---");
            }
            BlockKind::Bullet => {
                self.enter_list(ListKind::Bullet, block.indent);
                self.write_list_line(block, "- ");
            }
            BlockKind::Number => {
                let number = self.enter_list(ListKind::Number, block.indent);
                self.write_list_line(block, &format!("{number}. "));
            }
            BlockKind::Task { checked } => {
                self.enter_list(ListKind::Task, block.indent);
                let marker = if *checked { "- [x] " } else { "- [ ] " };
                self.write_list_line(block, marker);
            }
        }

        self.wrote_any = true;
        self.previous_was_list = is_list;
    }

    /// Close contexts the block does not fit, then ensure one for it.
    /// Returns the number the block should render with (1 for non-numbers).
    fn enter_list(&mut self, kind: ListKind, indent: u8) -> u64 {
        while let Some(top) = self.contexts.last() {
            if top.indent > indent || (top.indent == indent && top.kind != kind) {
                self.contexts.pop();
            } else {
                break;
            }
        }
        let matches = self
            .contexts
            .last()
            .is_some_and(|top| top.kind == kind && top.indent == indent);
        if !matches {
            self.contexts.push(ListContext {
                kind,
                indent,
                next_number: 1,
            });
        }
        // Unwrap-free: a context was pushed just above if none matched.
        let Some(top) = self.contexts.last_mut() else {
            return 1;
        };
        let number = top.next_number;
        if kind == ListKind::Number {
            top.next_number += 1;
        }
        number
    }

    fn write_list_line(&mut self, block: &Block, marker: &str) {
        let columns = "  ".repeat(usize::from(block.indent));
        let prefix = format!("{columns}{marker}");
        self.push_line(&prefix, &render_inline(&block.content));
    }

    fn write_code(&mut self, language: Option<&str>, body: &str) {
        let fence = fence_for(body);
        self.out.push_str(&fence);
        if let Some(lang) = language {
            self.out.push_str(lang);
        }
        self.out.push('\n');
        if !body.is_empty() {
            self.out.push_str(body);
            self.out.push('\n');
        }
        self.out.push_str(&fence);
        self.out.push('\n');
    }

    fn push_line(&mut self, prefix: &str, text: &str) {
        self.out.push_str(prefix);
        self.out.push_str(text);
        self.out.push('\n');
    }

    fn finish(self) -> String {
        self.out
    }
}

/// A fence longer than any backtick run opening a body line, minimum three.
fn fence_for(body: &str) -> String {
    let longest = body
        .lines()
        .map(|line| line.bytes().take_while(|byte| *byte == b'`').count())
        .max()
        .unwrap_or(0);
    "`".repeat(longest.max(2) + 1)
}

/// Serialize styled runs back to inline markdown. Marks wrap from the
/// inside out: code, bold, italic, strikethrough, underline, then link.
fn render_inline(runs: &[InlineRun]) -> String {
    let mut out = String::new();
    for run in runs {
        let mut text = run.text.clone();
        if run.marks.code {
            text = format!("`{text}`");
        }
        if run.marks.bold {
            text = format!("**{text}**");
        }
        if run.marks.italic {
            text = format!("_{text}_");
        }
        if run.marks.strikethrough {
            text = format!("~~{text}~~");
        }
        if run.marks.underline {
            text = format!("<u>{text}</u>");
        }
        if let Some(href) = &run.href {
            text = format!("[{text}]({href})");
        }
        out.push_str(&text);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Marks;
    use rstest::rstest;

    fn doc(blocks: Vec<Block>) -> Document {
        Document::from_blocks(blocks)
    }

    // ============ Block form tests ============

    #[test]
    fn test_export_empty_document() {
        assert_eq!(to_markdown(&Document::new()), "");
    }

    #[test]
    fn test_export_paragraph() {
        let d = doc(vec![Block::paragraph("hello")]);
        assert_eq!(to_markdown(&d), "hello\n");
    }

    #[rstest]
    #[case(1, "# Title\n")]
    #[case(2, "## Title\n")]
    #[case(6, "###### Title\n")]
    fn test_export_heading_levels(#[case] level: u8, #[case] expected: &str) {
        let d = doc(vec![Block::heading(level, "Title")]);
        assert_eq!(to_markdown(&d), expected);
    }

    #[test]
    fn test_export_bullet_indent_two_columns_per_level() {
        let d = doc(vec![
            Block::bullet("a", 0),
            Block::bullet("b", 1),
            Block::bullet("c", 2),
        ]);
        assert_eq!(to_markdown(&d), "- a\n  - b\n    - c\n");
    }

    #[test]
    fn test_export_task_markers() {
        let d = doc(vec![Block::task(false, "open", 0), Block::task(true, "done", 0)]);
        assert_eq!(to_markdown(&d), "- [ ] open\n- [x] done\n");
    }

    #[test]
    fn test_export_quote_depth_as_repeated_prefix() {
        let d = doc(vec![Block::quote("outer", 0), Block::quote("inner", 1)]);
        assert_eq!(to_markdown(&d), "> outer\n\n> > inner\n");
    }

    #[test]
    fn test_export_code_with_language() {
        let d = doc(vec![Block::code(Some("rust"), "fn main() {}")]);
        assert_eq!(to_markdown(&d), "```rust\nfn main() {}\n```\n");
    }

    #[test]
    fn test_export_code_without_language_or_body() {
        let d = doc(vec![Block::code(None, "")]);
        assert_eq!(to_markdown(&d), "```\n```\n");
    }

    #[test]
    fn test_export_code_body_verbatim() {
        let body = "# not a heading\n\n- not a list";
        let d = doc(vec![Block::code(None, body)]);
        assert_eq!(to_markdown(&d), "```\n# not a heading\n\n- not a list\n```\n");
    }

    #[test]
    fn test_export_fence_grows_past_backticks_in_body() {
        let d = doc(vec![Block::code(None, "```\nnested\n```")]);
        assert_eq!(to_markdown(&d), "````\n```\nnested\n```\n````\n");
    }

    #[test]
    fn test_export_divider() {
        let d = doc(vec![Block::divider()]);
        assert_eq!(to_markdown(&d), "---\n");
    }

    // ============ Numbering counter tests ============

    #[test]
    fn test_numbers_count_up_within_a_run() {
        let d = doc(vec![
            Block::number("a", 0),
            Block::number("b", 0),
            Block::number("c", 0),
        ]);
        assert_eq!(to_markdown(&d), "1. a\n2. b\n3. c\n");
    }

    #[test]
    fn test_paragraph_resets_numbering() {
        let d = doc(vec![
            Block::number("one", 0),
            Block::number("two", 0),
            Block::paragraph("break"),
            Block::number("three", 0),
        ]);
        assert_eq!(to_markdown(&d), "1. one\n2. two\n\nbreak\n\n1. three\n");
    }

    #[test]
    fn test_bullet_at_same_indent_resets_numbering() {
        let d = doc(vec![
            Block::number("one", 0),
            Block::bullet("mid", 0),
            Block::number("again", 0),
        ]);
        assert_eq!(to_markdown(&d), "1. one\n- mid\n1. again\n");
    }

    #[test]
    fn test_deeper_interruption_keeps_counter() {
        let d = doc(vec![
            Block::number("first", 0),
            Block::bullet("aside", 1),
            Block::number("second", 0),
        ]);
        assert_eq!(to_markdown(&d), "1. first\n  - aside\n2. second\n");
    }

    #[test]
    fn test_counters_are_independent_per_indent() {
        let d = doc(vec![
            Block::number("a", 0),
            Block::number("a.1", 1),
            Block::number("a.2", 1),
            Block::number("b", 0),
        ]);
        assert_eq!(to_markdown(&d), "1. a\n  1. a.1\n  2. a.2\n2. b\n");
    }

    #[test]
    fn test_task_at_same_indent_resets_numbering() {
        let d = doc(vec![
            Block::number("one", 0),
            Block::task(false, "todo", 0),
            Block::number("restart", 0),
        ]);
        assert_eq!(to_markdown(&d), "1. one\n- [ ] todo\n1. restart\n");
    }

    #[test]
    fn test_outdent_past_open_context_reuses_outer_counter() {
        let d = doc(vec![
            Block::number("a", 0),
            Block::number("deep", 2),
            Block::number("b", 0),
        ]);
        assert_eq!(to_markdown(&d), "1. a\n    1. deep\n2. b\n");
    }

    // ============ Separator tests ============

    #[test]
    fn test_list_run_has_no_blank_lines() {
        let d = doc(vec![
            Block::bullet("a", 0),
            Block::task(true, "b", 0),
            Block::number("c", 0),
        ]);
        assert_eq!(to_markdown(&d), "- a\n- [x] b\n1. c\n");
    }

    #[test]
    fn test_blank_line_between_non_list_blocks() {
        let d = doc(vec![
            Block::heading(1, "Title"),
            Block::paragraph("body"),
            Block::divider(),
        ]);
        assert_eq!(to_markdown(&d), "# Title\n\nbody\n\n---\n");
    }

    #[test]
    fn test_blank_line_between_list_and_paragraph() {
        let d = doc(vec![Block::bullet("item", 0), Block::paragraph("after")]);
        assert_eq!(to_markdown(&d), "- item\n\nafter\n");
    }

    #[test]
    fn test_blank_line_between_adjacent_quotes() {
        // Without the separator the two quotes would merge on reparse.
        let d = doc(vec![Block::quote("a", 0), Block::quote("b", 0)]);
        assert_eq!(to_markdown(&d), "> a\n\n> b\n");
    }

    // ============ Inline rendering tests ============

    #[test]
    fn test_render_marks_wrap_in_fixed_order() {
        let run = InlineRun {
            text: "x".into(),
            marks: Marks {
                bold: true,
                italic: true,
                code: false,
                strikethrough: false,
                underline: false,
            },
            href: None,
        };
        assert_eq!(render_inline(&[run]), "_**x**_");
    }

    #[test]
    fn test_render_code_span_sits_innermost() {
        let run = InlineRun {
            text: "x".into(),
            marks: Marks {
                bold: true,
                code: true,
                ..Marks::default()
            },
            href: None,
        };
        assert_eq!(render_inline(&[run]), "**`x`**");
    }

    #[test]
    fn test_render_link_wraps_outermost() {
        let run = InlineRun {
            text: "docs".into(),
            marks: Marks {
                bold: true,
                ..Marks::default()
            },
            href: Some("https://example.com".into()),
        };
        assert_eq!(render_inline(&[run]), "[**docs**](https://example.com)");
    }

    #[test]
    fn test_render_underline_as_html() {
        let d = doc(vec![Block::with_content(
            BlockKind::Paragraph,
            0,
            vec![
                InlineRun::plain("a "),
                InlineRun::styled(
                    "u",
                    Marks {
                        underline: true,
                        ..Marks::default()
                    },
                ),
            ],
        )]);
        assert_eq!(to_markdown(&d), "a <u>u</u>\n");
    }

    #[test]
    fn test_render_plain_runs_concatenate() {
        let d = doc(vec![Block::with_content(
            BlockKind::Paragraph,
            0,
            vec![InlineRun::plain("a"), InlineRun::plain("b")],
        )]);
        assert_eq!(to_markdown(&d), "ab\n");
    }

    // ============ Mixed document tests ============

    #[test]
    fn test_export_mixed_document() {
        let d = doc(vec![
            Block::heading(1, "Notes"),
            Block::paragraph("intro"),
            Block::bullet("one", 0),
            Block::bullet("nested", 1),
            Block::number("step", 1),
            Block::quote("aside", 0),
            Block::code(Some("sh"), "ls"),
            Block::divider(),
        ]);
        let expected = "# Notes\n\nintro\n\n- one\n  - nested\n  1. step\n\n> aside\n\n```sh\nls\n```\n\n---\n";
        assert_eq!(to_markdown(&d), expected);
    }

    #[test]
    fn test_empty_bullet_still_renders_marker() {
        let d = doc(vec![Block::bullet("", 0)]);
        assert_eq!(to_markdown(&d), "- \n");
    }
}
