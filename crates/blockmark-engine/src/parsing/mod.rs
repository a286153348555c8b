//! Markdown import: flattening a parsed markup tree into the block sequence.
//!
//! pulldown-cmark hands us a pre-order event stream over the nested structure
//! (list > item > paragraph and so on). Flattening rides that order directly:
//! every block is emitted the moment its leading content is complete, so the
//! output sequence always matches source order without buffering subtrees.
//!
//! The only subtlety is *when* a list item's own block is complete. An item's
//! text arrives between `Start(Item)` and either `End(Item)` (tight lists) or
//! `End(Paragraph)` (loose lists), but any nested list, quote, or fence opens
//! before the item closes. The importer therefore tracks open items and
//! flushes the pending item head whenever a nested construct starts, keeping
//! emission pre-order:
//!
//! ```markdown
//! - parent
//!   - child
//! ```
//!
//! 1. `Start(List)`: outer list opens
//! 2. `Start(Item)`: parent item opens (indent recorded here)
//! 3. `Text("parent")`
//! 4. `Start(List)`: parent's head is flushed as a block *now*
//! 5. `Start(Item)` / `Text("child")` / `End(Item)`: child block
//! 6. `End(List)` / `End(Item)` / `End(List)`
//!
//! Import is total: malformed or unsupported constructs degrade to paragraph
//! blocks with their text extracted, never an error.

use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag, TagEnd};

use crate::models::{Block, BlockKind, Document, InlineRun, Marks, MAX_INDENT};


/// Parse markdown text into a flat block document.
///
/// Never fails; unknown constructs degrade to paragraphs with their text kept.
pub fn parse_markdown(text: &str) -> Document {
    let options = Options::ENABLE_TASKLISTS | Options::ENABLE_STRIKETHROUGH;
    let mut importer = Importer::new(text);

    for (event, range) in Parser::new_ext(text, options).into_offset_iter() {
        importer.process_event(event, range.start);
    }

    let document = importer.finish();
    tracing::debug!(
        target: "blockmark::import",
        blocks = document.len(),
        bytes = text.len(),
        "imported markdown"
    );
    document
}

impl Document {
    /// Convenience wrapper around [`parse_markdown`].
    pub fn from_markdown(text: &str) -> Self {
        parse_markdown(text)
    }
}

/// One open list container. Depth of this stack is the tree nesting level.
struct ListScope {
    ordered: bool,
}

/// One open list item. `emitted` flips when the item's head block has been
/// pushed; content arriving afterwards belongs to follow-up blocks.
struct ItemState {
    ordered: bool,
    indent: u8,
    task: Option<bool>,
    emitted: bool,
}

struct CodeCapture {
    language: Option<String>,
    body: String,
}

/// Streaming state for one import call.
struct Importer<'a> {
    source: &'a str,
    blocks: Vec<Block>,
    runs: RunBuilder,
    list_stack: Vec<ListScope>,
    item_stack: Vec<ItemState>,
    quote_depth: usize,
    code: Option<CodeCapture>,
}

impl<'a> Importer<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            blocks: Vec::new(),
            runs: RunBuilder::new(),
            list_stack: Vec::new(),
            item_stack: Vec::new(),
            quote_depth: 0,
            code: None,
        }
    }

    fn process_event(&mut self, event: Event, offset: usize) {
        match event {
            Event::Start(Tag::Paragraph) => {}
            Event::End(TagEnd::Paragraph) => self.end_paragraph(),
            Event::Start(Tag::Heading { .. }) => {
                self.flush_item_head();
            }
            Event::End(TagEnd::Heading(level)) => {
                let content = self.runs.take();
                let indent = self.container_indent();
                self.emit(BlockKind::Heading { level: level as u8 }, indent, content);
            }
            Event::Start(Tag::List(first_number)) => {
                self.flush_item_head();
                self.list_stack.push(ListScope {
                    ordered: first_number.is_some(),
                });
            }
            Event::End(TagEnd::List(_)) => {
                debug_assert!(!self.list_stack.is_empty(), "list end without start");
                self.list_stack.pop();
            }
            Event::Start(Tag::Item) => {
                let ordered = self.list_stack.last().is_some_and(|scope| scope.ordered);
                let indent = self.item_indent(offset);
                self.item_stack.push(ItemState {
                    ordered,
                    indent,
                    task: None,
                    emitted: false,
                });
            }
            Event::TaskListMarker(checked) => {
                if let Some(item) = self.item_stack.last_mut() {
                    item.task = Some(checked);
                }
            }
            Event::End(TagEnd::Item) => {
                let emitted_now = self.flush_item_head();
                if !emitted_now {
                    // Text following nested content inside the same item.
                    let content = self.runs.take();
                    if !content.is_empty() {
                        let indent = self.container_indent();
                        self.emit(BlockKind::Paragraph, indent, content);
                    }
                }
                debug_assert!(!self.item_stack.is_empty(), "item end without start");
                self.item_stack.pop();
            }
            Event::Start(Tag::BlockQuote(_)) => {
                self.flush_item_head();
                self.quote_depth += 1;
            }
            Event::End(TagEnd::BlockQuote(_)) => {
                self.quote_depth = self.quote_depth.saturating_sub(1);
            }
            Event::Start(Tag::CodeBlock(kind)) => {
                self.flush_item_head();
                let language = match kind {
                    CodeBlockKind::Fenced(lang) if !lang.is_empty() => Some(lang.to_string()),
                    _ => None,
                };
                self.code = Some(CodeCapture {
                    language,
                    body: String::new(),
                });
            }
            Event::End(TagEnd::CodeBlock) => {
                if let Some(mut code) = self.code.take() {
                    // The parser's body includes the final newline before the
                    // closing fence; the exporter re-adds it.
                    if code.body.ends_with('\n') {
                        code.body.pop();
                    }
                    let indent = self.container_indent();
                    let content = InlineRun::plain_runs(&code.body);
                    self.emit(BlockKind::Code { language: code.language }, indent, content);
                }
            }
            Event::Rule => {
                self.flush_item_head();
                let indent = self.container_indent();
                self.emit(BlockKind::Divider, indent, Vec::new());
            }
            Event::Start(Tag::HtmlBlock) => {
                self.flush_item_head();
            }
            Event::End(TagEnd::HtmlBlock) => {
                let content = self.runs.take();
                if !content.is_empty() {
                    tracing::warn!(
                        target: "blockmark::import",
                        "html block degraded to paragraph text"
                    );
                    let indent = self.container_indent();
                    self.emit(BlockKind::Paragraph, indent, content);
                }
            }
            Event::Text(text) => {
                if let Some(code) = self.code.as_mut() {
                    code.body.push_str(&text);
                } else {
                    self.runs.push_text(&text);
                }
            }
            Event::Code(text) => self.runs.push_code_span(&text),
            Event::Html(html) => {
                // Raw lines of an HTML block; newlines collapse so the
                // degraded paragraph stays single-line.
                self.runs.push_text(&html.replace('\n', " "));
            }
            Event::InlineHtml(html) => match html.as_ref() {
                "<u>" => self.runs.marks.underline = true,
                "</u>" => self.runs.marks.underline = false,
                other => {
                    tracing::trace!(
                        target: "blockmark::import",
                        html = other,
                        "inline html kept as literal text"
                    );
                    self.runs.push_text(other);
                }
            },
            Event::Start(Tag::Strong) => self.runs.marks.bold = true,
            Event::End(TagEnd::Strong) => self.runs.marks.bold = false,
            Event::Start(Tag::Emphasis) => self.runs.marks.italic = true,
            Event::End(TagEnd::Emphasis) => self.runs.marks.italic = false,
            Event::Start(Tag::Strikethrough) => self.runs.marks.strikethrough = true,
            Event::End(TagEnd::Strikethrough) => self.runs.marks.strikethrough = false,
            Event::Start(Tag::Link { dest_url, .. }) => {
                self.runs.href = Some(dest_url.to_string());
            }
            Event::End(TagEnd::Link) => {
                self.runs.href = None;
            }
            Event::Start(Tag::Image { dest_url, .. }) => {
                // No image block type exists; keep the literal source form so
                // repeated round-trips are stable.
                self.runs.push_text("![");
                self.runs.image_dest.push(dest_url.to_string());
            }
            Event::End(TagEnd::Image) => {
                if let Some(dest) = self.runs.image_dest.pop() {
                    self.runs.push_text(&format!("]({dest})"));
                }
            }
            Event::SoftBreak | Event::HardBreak => self.runs.push_text(" "),
            _ => {}
        }
    }

    /// Emit the innermost item's head block if it is still pending. Returns
    /// whether a head was emitted by this call.
    fn flush_item_head(&mut self) -> bool {
        let (kind, indent) = match self.item_stack.last_mut() {
            Some(item) if !item.emitted => {
                item.emitted = true;
                let kind = match item.task {
                    Some(checked) => BlockKind::Task { checked },
                    None if item.ordered => BlockKind::Number,
                    None => BlockKind::Bullet,
                };
                (kind, item.indent)
            }
            _ => return false,
        };
        let content = self.runs.take();
        self.emit(kind, indent, content);
        true
    }

    fn end_paragraph(&mut self) {
        if self.flush_item_head() {
            return;
        }
        let content = self.runs.take();
        if content.is_empty() {
            return;
        }
        if self.quote_depth > 0 {
            let indent = self.quote_indent();
            self.emit(BlockKind::Quote, indent, content);
        } else {
            let indent = self.container_indent();
            self.emit(BlockKind::Paragraph, indent, content);
        }
    }

    /// Indent for a list item opening at `marker_offset`.
    ///
    /// Tree depth alone flattens "orphan" items whose source indentation has
    /// no parent item (the indent command produces these), so outside quotes
    /// the marker's source column also counts, at two columns per level.
    /// Inside quotes the column is polluted by `> ` prefixes and tree depth
    /// plus quote depth is used alone.
    fn item_indent(&self, marker_offset: usize) -> u8 {
        let tree_depth = self.list_stack.len().saturating_sub(1);
        let depth = if self.quote_depth == 0 {
            tree_depth.max(self.marker_columns(marker_offset) / 2)
        } else {
            tree_depth + self.quote_depth
        };
        depth.min(MAX_INDENT as usize) as u8
    }

    /// Visual column of a marker relative to its line start (tab stop 4).
    fn marker_columns(&self, marker_offset: usize) -> usize {
        let line_start = self.source[..marker_offset]
            .rfind('\n')
            .map(|pos| pos + 1)
            .unwrap_or(0);
        let mut cols = 0;
        for byte in self.source[line_start..marker_offset].bytes() {
            match byte {
                b' ' => cols += 1,
                b'\t' => cols += 4 - (cols % 4),
                _ => return 0,
            }
        }
        cols
    }

    /// Indent for a non-item block at the current container position: one
    /// deeper than the enclosing item, plus one per enclosing quote.
    fn container_indent(&self) -> u8 {
        let base = self
            .item_stack
            .last()
            .map(|item| item.indent as usize + 1)
            .unwrap_or(0);
        (base + self.quote_depth).min(MAX_INDENT as usize) as u8
    }

    /// Indent for a quote block: level of containment minus the quote itself.
    fn quote_indent(&self) -> u8 {
        let base = self
            .item_stack
            .last()
            .map(|item| item.indent as usize + 1)
            .unwrap_or(0);
        (base + self.quote_depth.saturating_sub(1)).min(MAX_INDENT as usize) as u8
    }

    fn emit(&mut self, kind: BlockKind, indent: u8, content: Vec<InlineRun>) {
        self.blocks.push(Block::with_content(kind, indent, content));
    }

    fn finish(mut self) -> Document {
        // The parser closes every tag; this only catches truncated input.
        let content = self.runs.take();
        if !content.is_empty() {
            let indent = self.container_indent();
            self.emit(BlockKind::Paragraph, indent, content);
        }
        Document::from_blocks(self.blocks)
    }
}

/// Accumulates styled runs for the block currently being read. Adjacent text
/// with identical marks merges into one run.
struct RunBuilder {
    runs: Vec<InlineRun>,
    marks: Marks,
    href: Option<String>,
    image_dest: Vec<String>,
}

impl RunBuilder {
    fn new() -> Self {
        Self {
            runs: Vec::new(),
            marks: Marks::default(),
            href: None,
            image_dest: Vec::new(),
        }
    }

    fn push_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if let Some(last) = self.runs.last_mut()
            && last.marks == self.marks
            && last.href == self.href
        {
            last.text.push_str(text);
        } else {
            self.runs.push(InlineRun {
                text: text.to_string(),
                marks: self.marks,
                href: self.href.clone(),
            });
        }
    }

    /// Code spans arrive as one atomic event and become their own run.
    fn push_code_span(&mut self, text: &str) {
        self.runs.push(InlineRun {
            text: text.to_string(),
            marks: Marks {
                code: true,
                ..self.marks
            },
            href: self.href.clone(),
        });
    }

    /// Take the accumulated runs, trimming boundary whitespace from the first
    /// and last run and dropping runs left empty by the trim.
    fn take(&mut self) -> Vec<InlineRun> {
        let mut runs = std::mem::take(&mut self.runs);
        if let Some(first) = runs.first_mut() {
            first.text = first.text.trim_start().to_string();
        }
        if let Some(last) = runs.last_mut() {
            last.text = last.text.trim_end().to_string();
        }
        runs.retain(|run| !run.text.is_empty());
        runs
    }
}
