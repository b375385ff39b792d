//! Markdown to styled terminal lines for bot replies.
//!
//! Uses pulldown-cmark for parsing. [`render_markdown`] returns an error when
//! the event stream cannot be turned into visible lines, so callers can fall
//! back to showing the raw text. HTML is kept as literal text and link
//! destinations are printed after the link text.

use pulldown_cmark::{Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    Plain,
    Heading,
    Emphasis,
    Strong,
    Strikethrough,
    Link,
    Quote,
    CodeInline,
    CodeBlock,
    ListMarker,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyledSpan {
    pub text: String,
    pub style: Style,
}

impl StyledSpan {
    pub fn new(text: impl Into<String>, style: Style) -> Self {
        Self {
            text: text.into(),
            style,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyledLine {
    pub spans: Vec<StyledSpan>,
}

impl StyledLine {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    /// Text of the line without styling.
    pub fn plain_text(&self) -> String {
        self.spans.iter().map(|span| span.text.as_str()).collect()
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MarkdownError {
    #[error("closing tag without an opening tag")]
    Unbalanced,

    #[error("markdown produced no visible content")]
    NoContent,
}

/// Parses `text` as Markdown and lays it out as styled lines.
pub fn render_markdown(text: &str) -> Result<Vec<StyledLine>, MarkdownError> {
    let options = Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TASKLISTS;
    let mut renderer = MarkdownRenderer::new();

    for event in Parser::new_ext(text, options) {
        renderer.process_event(event)?;
    }

    renderer.finish()
}

#[derive(Debug)]
struct MarkdownRenderer {
    lines: Vec<StyledLine>,
    current_spans: Vec<StyledSpan>,
    style_stack: Vec<Style>,
    /// `None` for bullet lists, `Some(next number)` for ordered ones.
    list_stack: Vec<Option<u64>>,
    /// Destinations of the links currently open.
    link_stack: Vec<String>,
    in_code_block: bool,
}

impl MarkdownRenderer {
    fn new() -> Self {
        Self {
            lines: Vec::new(),
            current_spans: Vec::new(),
            style_stack: vec![Style::Plain],
            list_stack: Vec::new(),
            link_stack: Vec::new(),
            in_code_block: false,
        }
    }

    fn current_style(&self) -> Style {
        self.style_stack.last().copied().unwrap_or(Style::Plain)
    }

    fn push_style(&mut self, style: Style) {
        self.style_stack.push(style);
    }

    fn pop_style(&mut self) -> Result<(), MarkdownError> {
        if self.style_stack.len() <= 1 {
            return Err(MarkdownError::Unbalanced);
        }
        self.style_stack.pop();
        Ok(())
    }

    fn process_event(&mut self, event: Event<'_>) -> Result<(), MarkdownError> {
        match event {
            Event::Start(tag) => self.start_tag(tag),
            Event::End(tag) => self.end_tag(tag)?,
            Event::Text(text) => self.add_text(&text),
            Event::Code(code) => self
                .current_spans
                .push(StyledSpan::new(code.to_string(), Style::CodeInline)),
            Event::SoftBreak => {
                let style = self.current_style();
                self.current_spans.push(StyledSpan::new(" ", style));
            }
            Event::HardBreak => self.flush_line(),
            Event::TaskListMarker(checked) => {
                let marker = if checked { "[x] " } else { "[ ] " };
                self.current_spans
                    .push(StyledSpan::new(marker, Style::ListMarker));
            }
            Event::Rule => {
                self.flush_line();
                self.lines.push(StyledLine {
                    spans: vec![StyledSpan::new("─".repeat(24), Style::Plain)],
                });
            }
            // Raw HTML is shown as literal text, never interpreted.
            Event::Html(html) => {
                self.flush_line();
                for line in html.trim_end_matches('\n').split('\n') {
                    self.lines.push(StyledLine {
                        spans: vec![StyledSpan::new(line, Style::Plain)],
                    });
                }
            }
            Event::InlineHtml(html) => self
                .current_spans
                .push(StyledSpan::new(html.to_string(), Style::Plain)),
            _ => {}
        }
        Ok(())
    }

    fn start_tag(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Heading { level, .. } => {
                self.flush_line();
                let marker = match level {
                    HeadingLevel::H1 => "# ",
                    HeadingLevel::H2 => "## ",
                    _ => "### ",
                };
                self.current_spans
                    .push(StyledSpan::new(marker, Style::Heading));
                self.push_style(Style::Heading);
            }
            Tag::CodeBlock(_) => {
                self.flush_line();
                self.in_code_block = true;
                self.push_style(Style::CodeBlock);
            }
            Tag::List(start) => {
                self.flush_line();
                self.list_stack.push(start);
            }
            Tag::Item => {
                self.flush_line();
                let depth = self.list_stack.len().saturating_sub(1);
                let marker = match self.list_stack.last_mut() {
                    Some(Some(number)) => {
                        let marker = format!("{}. ", number);
                        *number += 1;
                        marker
                    }
                    _ => "• ".to_string(),
                };
                self.current_spans.push(StyledSpan::new(
                    format!("{}{}", "  ".repeat(depth), marker),
                    Style::ListMarker,
                ));
            }
            Tag::BlockQuote(_) => {
                self.flush_line();
                self.push_style(Style::Quote);
            }
            Tag::Emphasis => self.push_style(Style::Emphasis),
            Tag::Strong => self.push_style(Style::Strong),
            Tag::Strikethrough => self.push_style(Style::Strikethrough),
            Tag::Link { dest_url, .. } => {
                self.link_stack.push(dest_url.to_string());
                self.push_style(Style::Link);
            }
            _ => {}
        }
    }

    fn end_tag(&mut self, tag: TagEnd) -> Result<(), MarkdownError> {
        match tag {
            TagEnd::Paragraph => {
                self.flush_line();
                if self.list_stack.is_empty() {
                    self.lines.push(StyledLine::empty());
                }
            }
            TagEnd::Heading(_) => {
                self.flush_line();
                self.pop_style()?;
                self.lines.push(StyledLine::empty());
            }
            TagEnd::CodeBlock => {
                self.in_code_block = false;
                self.pop_style()?;
                self.lines.push(StyledLine::empty());
            }
            TagEnd::List(_) => {
                self.flush_line();
                self.list_stack.pop();
                if self.list_stack.is_empty() {
                    self.lines.push(StyledLine::empty());
                }
            }
            TagEnd::Item => self.flush_line(),
            TagEnd::BlockQuote(_) => {
                self.flush_line();
                self.pop_style()?;
            }
            TagEnd::Link => {
                self.pop_style()?;
                let url = self.link_stack.pop().ok_or(MarkdownError::Unbalanced)?;
                // Autolinks already show their destination.
                let shown = self.current_spans.last().is_some_and(|span| span.text == url);
                if !url.is_empty() && !shown {
                    self.current_spans
                        .push(StyledSpan::new(format!(" ({})", url), Style::Plain));
                }
            }
            TagEnd::Emphasis | TagEnd::Strong | TagEnd::Strikethrough => {
                self.pop_style()?;
            }
            _ => {}
        }
        Ok(())
    }

    fn add_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }

        if self.in_code_block {
            // Code keeps its own line structure.
            for line in text.trim_end_matches('\n').split('\n') {
                self.lines.push(StyledLine {
                    spans: vec![
                        StyledSpan::new("    ", Style::Plain),
                        StyledSpan::new(line, Style::CodeBlock),
                    ],
                });
            }
            return;
        }

        let style = self.current_style();
        self.current_spans.push(StyledSpan::new(text, style));
    }

    fn flush_line(&mut self) {
        if self.current_spans.is_empty() {
            return;
        }
        let spans = std::mem::take(&mut self.current_spans);
        self.lines.push(StyledLine { spans });
    }

    fn finish(mut self) -> Result<Vec<StyledLine>, MarkdownError> {
        self.flush_line();

        while self.lines.last().is_some_and(StyledLine::is_empty) {
            self.lines.pop();
        }

        if self.lines.is_empty() {
            return Err(MarkdownError::NoContent);
        }

        Ok(self.lines)
    }
}
