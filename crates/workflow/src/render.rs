//! Markdown to styled terminal text.
//!
//! Summaries come back from the service as markdown. This walks the
//! pulldown-cmark event stream once and writes plain lines with `console`
//! styling: bold headings, bullet and numbered lists, dimmed indented code
//! blocks, `│ ` prefixed quotes and pipe tables with padded columns.

use console::{Alignment as Pad, measure_text_width, pad_str, style};
use pulldown_cmark::{Event, Options, Parser, Tag, TagEnd};

const CODE_INDENT: &str = "    ";
const QUOTE_PREFIX: &str = "│ ";
const RULE: &str = "────────────────────────";

/// Render `text` for a terminal. Styling is dropped automatically when the
/// output is not a tty.
pub(crate) fn render_markdown(text: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);

    let mut writer = TermWriter::default();
    for event in Parser::new_ext(text, options) {
        writer.event(event);
    }
    writer.finish()
}

#[derive(Default)]
struct Inline {
    strong: bool,
    emphasis: bool,
    strike: bool,
    heading: Option<u8>,
    link: bool,
}

#[derive(Default)]
struct Table {
    rows: Vec<Vec<String>>,
    header_rows: usize,
    cell: Option<String>,
}

#[derive(Default)]
struct TermWriter {
    out: String,
    at_line_start: bool,
    quote_depth: usize,
    lists: Vec<Option<u64>>,
    in_code_block: bool,
    inline: Inline,
    table: Option<Table>,
}

impl TermWriter {
    fn event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(tag) => self.end(tag),
            Event::Text(text) => {
                if self.in_code_block {
                    self.code_text(&text);
                } else {
                    let styled = self.styled(&text);
                    self.emit(&styled);
                }
            }
            Event::Code(code) => {
                let styled = style(code.as_ref()).cyan().to_string();
                self.emit(&styled);
            }
            Event::SoftBreak => self.emit(" "),
            Event::HardBreak => self.newline(),
            Event::Rule => {
                self.blank_line();
                let rule = style(RULE).dim().to_string();
                self.emit(&rule);
                self.blank_line();
            }
            Event::TaskListMarker(done) => self.emit(if done { "[x] " } else { "[ ] " }),
            _ => {}
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Paragraph => {}
            Tag::Heading { level, .. } => {
                self.blank_line();
                self.inline.heading = Some(level as u8);
            }
            Tag::BlockQuote { .. } => {
                self.blank_line();
                self.quote_depth += 1;
            }
            Tag::CodeBlock(_) => {
                self.blank_line();
                self.in_code_block = true;
            }
            Tag::List(start) => {
                if self.lists.is_empty() {
                    self.blank_line();
                } else {
                    self.line_break();
                }
                self.lists.push(start);
            }
            Tag::Item => {
                self.line_break();
                let depth = self.lists.len().saturating_sub(1);
                let marker = match self.lists.last_mut() {
                    Some(Some(n)) => {
                        let marker = format!("{n}. ");
                        *n += 1;
                        marker
                    }
                    _ => "• ".to_string(),
                };
                self.emit(&format!("{}{marker}", "  ".repeat(depth)));
            }
            Tag::Table(_) => {
                self.blank_line();
                self.table = Some(Table::default());
            }
            Tag::TableHead | Tag::TableRow => {
                if let Some(table) = self.table.as_mut() {
                    table.rows.push(Vec::new());
                }
            }
            Tag::TableCell => {
                if let Some(table) = self.table.as_mut() {
                    table.cell = Some(String::new());
                }
            }
            Tag::Emphasis => self.inline.emphasis = true,
            Tag::Strong => self.inline.strong = true,
            Tag::Strikethrough => self.inline.strike = true,
            Tag::Link { .. } => self.inline.link = true,
            _ => {}
        }
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph => {
                if self.lists.is_empty() {
                    self.blank_line();
                } else {
                    self.line_break();
                }
            }
            TagEnd::Heading { .. } => {
                self.inline.heading = None;
                self.blank_line();
            }
            TagEnd::BlockQuote { .. } => {
                self.quote_depth = self.quote_depth.saturating_sub(1);
                self.blank_line();
            }
            TagEnd::CodeBlock => {
                self.in_code_block = false;
                self.blank_line();
            }
            TagEnd::List { .. } => {
                self.lists.pop();
                if self.lists.is_empty() {
                    self.blank_line();
                }
            }
            TagEnd::Item => self.line_break(),
            TagEnd::TableHead => {
                if let Some(table) = self.table.as_mut() {
                    table.header_rows = table.rows.len();
                }
            }
            TagEnd::TableCell => {
                if let Some(table) = self.table.as_mut() {
                    let cell = table.cell.take().unwrap_or_default();
                    if let Some(row) = table.rows.last_mut() {
                        row.push(cell.trim().to_string());
                    }
                }
            }
            TagEnd::Table => {
                if let Some(table) = self.table.take() {
                    self.write_table(&table);
                }
                self.blank_line();
            }
            TagEnd::Emphasis => self.inline.emphasis = false,
            TagEnd::Strong => self.inline.strong = false,
            TagEnd::Strikethrough => self.inline.strike = false,
            TagEnd::Link => self.inline.link = false,
            _ => {}
        }
    }

    fn styled(&self, text: &str) -> String {
        let mut styled = style(text);
        if self.inline.heading.is_some() || self.inline.strong {
            styled = styled.bold();
        }
        if self.inline.heading == Some(1) || self.inline.link {
            styled = styled.underlined();
        }
        if self.inline.emphasis {
            styled = styled.italic();
        }
        if self.inline.strike {
            styled = styled.strikethrough();
        }
        styled.to_string()
    }

    fn code_text(&mut self, text: &str) {
        for line in text.lines() {
            let styled = style(line).dim().to_string();
            self.emit(CODE_INDENT);
            self.emit(&styled);
            self.newline();
        }
    }

    fn write_table(&mut self, table: &Table) {
        let columns = table.rows.iter().map(Vec::len).max().unwrap_or(0);
        let mut widths = vec![0; columns];
        for row in &table.rows {
            for (i, cell) in row.iter().enumerate() {
                widths[i] = widths[i].max(measure_text_width(cell));
            }
        }

        for (r, row) in table.rows.iter().enumerate() {
            let mut line = String::from("|");
            for (i, width) in widths.iter().enumerate() {
                let cell = row.get(i).map_or("", String::as_str);
                let padded = pad_str(cell, *width, Pad::Left, None);
                if r < table.header_rows {
                    line.push_str(&format!(" {} |", style(padded).bold()));
                } else {
                    line.push_str(&format!(" {padded} |"));
                }
            }
            self.emit(&line);
            self.newline();

            if r + 1 == table.header_rows {
                let mut sep = String::from("|");
                for width in &widths {
                    sep.push_str(&format!("{}|", "-".repeat(width + 2)));
                }
                self.emit(&sep);
                self.newline();
            }
        }
    }

    fn emit(&mut self, text: &str) {
        if let Some(cell) = self.table.as_mut().and_then(|t| t.cell.as_mut()) {
            cell.push_str(text);
            return;
        }
        if text.is_empty() {
            return;
        }
        if self.at_line_start || self.out.is_empty() {
            for _ in 0..self.quote_depth {
                self.out.push_str(QUOTE_PREFIX);
            }
            self.at_line_start = false;
        }
        self.out.push_str(text);
    }

    fn newline(&mut self) {
        self.out.push('\n');
        self.at_line_start = true;
    }

    /// End the current line unless already at the start of one.
    fn line_break(&mut self) {
        if !self.out.is_empty() && !self.at_line_start {
            self.newline();
        }
    }

    /// Leave exactly one empty line between blocks.
    fn blank_line(&mut self) {
        if self.out.is_empty() {
            return;
        }
        self.line_break();
        if !self.out.ends_with("\n\n") {
            self.newline();
        }
    }

    fn finish(self) -> String {
        self.out.trim_end().to_string()
    }
}
