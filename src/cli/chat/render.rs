use std::borrow::Cow;
use std::io::{self, Write};

use crossterm::queue;
use crossterm::style::{Attribute, Color, Print, ResetColor, SetAttribute, SetForegroundColor};
use tracing::debug;

use super::conversation_state::Conversation;
use super::markdown::{render_markdown, Style, StyledLine};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Speaker {
    User,
    Bot,
}

impl Speaker {
    pub fn label(self) -> &'static str {
        match self {
            Speaker::User => "You",
            Speaker::Bot => "Bot",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BubbleBody {
    /// Text shown exactly as received.
    Plain(String),
    /// Formatted Markdown.
    Rich(Vec<StyledLine>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bubble {
    pub speaker: Speaker,
    pub body: BubbleBody,
}

/// Projects a conversation onto the bubbles of the chat thread.
///
/// `rich` says whether the output can show formatting at all. Bot replies
/// whose Markdown cannot be laid out fall back to their raw text.
pub fn render_conversation(conversation: &Conversation, rich: bool) -> Vec<Bubble> {
    let mut bubbles = Vec::new();

    for turn in conversation.turns() {
        if let Some(user) = turn.user_text() {
            bubbles.push(Bubble {
                speaker: Speaker::User,
                body: BubbleBody::Plain(user.to_string()),
            });
        }
        if let Some(bot) = turn.bot_text() {
            bubbles.push(Bubble {
                speaker: Speaker::Bot,
                body: bot_body(bot, rich),
            });
        }
    }

    bubbles
}

fn bot_body(text: &str, rich: bool) -> BubbleBody {
    if !rich {
        return BubbleBody::Plain(text.to_string());
    }

    match render_markdown(text) {
        Ok(lines) => BubbleBody::Rich(lines),
        Err(e) => {
            debug!("Showing bot reply as plain text: {}", e);
            BubbleBody::Plain(text.to_string())
        }
    }
}

/// Writes bubbles to a terminal. Colors are only emitted when `color` is set.
pub fn paint_bubbles<W: Write>(out: &mut W, bubbles: &[Bubble], color: bool) -> io::Result<()> {
    for bubble in bubbles {
        paint_label(out, bubble.speaker, color)?;

        match &bubble.body {
            BubbleBody::Plain(text) => {
                for line in text.split('\n') {
                    queue!(out, Print("  │ "), Print(escape_control(line)), Print("\n"))?;
                }
            }
            BubbleBody::Rich(lines) => {
                for line in lines {
                    queue!(out, Print("  │ "))?;
                    for span in &line.spans {
                        paint_span(out, &span.text, span.style, color)?;
                    }
                    queue!(out, Print("\n"))?;
                }
            }
        }
        queue!(out, Print("\n"))?;
    }

    out.flush()
}

fn paint_label<W: Write>(out: &mut W, speaker: Speaker, color: bool) -> io::Result<()> {
    if !color {
        return queue!(out, Print(speaker.label()), Print("\n"));
    }

    let fg = match speaker {
        Speaker::User => Color::Cyan,
        Speaker::Bot => Color::Green,
    };
    queue!(
        out,
        SetForegroundColor(fg),
        SetAttribute(Attribute::Bold),
        Print(speaker.label()),
        SetAttribute(Attribute::Reset),
        ResetColor,
        Print("\n")
    )
}

fn paint_span<W: Write>(out: &mut W, text: &str, style: Style, color: bool) -> io::Result<()> {
    let text = escape_control(text);
    if !color || style == Style::Plain {
        return queue!(out, Print(text));
    }

    let (fg, attribute) = match style {
        Style::Heading => (Some(Color::Magenta), Some(Attribute::Bold)),
        Style::Strong => (None, Some(Attribute::Bold)),
        Style::Emphasis => (None, Some(Attribute::Italic)),
        Style::Strikethrough => (None, Some(Attribute::CrossedOut)),
        Style::Link => (Some(Color::Blue), Some(Attribute::Underlined)),
        Style::Quote => (Some(Color::DarkGrey), Some(Attribute::Italic)),
        Style::CodeInline | Style::CodeBlock => (Some(Color::Yellow), None),
        Style::ListMarker => (Some(Color::DarkCyan), None),
        Style::Plain => (None, None),
    };

    if let Some(fg) = fg {
        queue!(out, SetForegroundColor(fg))?;
    }
    if let Some(attribute) = attribute {
        queue!(out, SetAttribute(attribute))?;
    }
    queue!(out, Print(text), SetAttribute(Attribute::Reset), ResetColor)
}

/// Makes text safe to print: control characters other than tab and newline are shown escaped.
pub fn escape_control(text: &str) -> Cow<'_, str> {
    if !text.chars().any(|c| c.is_control() && c != '\t' && c != '\n') {
        return Cow::Borrowed(text);
    }

    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if c.is_control() && c != '\t' && c != '\n' {
            escaped.extend(c.escape_default());
        } else {
            escaped.push(c);
        }
    }
    Cow::Owned(escaped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::chat::conversation_state::Turn;

    fn conversation(turns: Vec<Turn>) -> Conversation {
        Conversation::from(turns)
    }

    #[test]
    fn one_bubble_per_present_half() {
        let bubbles = render_conversation(&conversation(vec![Turn::new("hi", "hello!")]), true);

        assert_eq!(bubbles.len(), 2);
        assert_eq!(bubbles[0].speaker, Speaker::User);
        assert_eq!(bubbles[0].body, BubbleBody::Plain("hi".to_string()));
        assert_eq!(bubbles[1].speaker, Speaker::Bot);
        match &bubbles[1].body {
            BubbleBody::Rich(lines) => assert_eq!(lines[0].plain_text(), "hello!"),
            other => panic!("expected rich body, got {:?}", other),
        }
    }

    #[test]
    fn empty_or_missing_user_half_has_no_bubble() {
        let turns = vec![
            Turn {
                user: Some(String::new()),
                bot: Some("welcome".to_string()),
            },
            Turn {
                user: None,
                bot: Some("second".to_string()),
            },
        ];
        let bubbles = render_conversation(&conversation(turns), true);

        assert_eq!(bubbles.len(), 2);
        assert!(bubbles.iter().all(|b| b.speaker == Speaker::Bot));
    }

    #[test]
    fn rendering_is_idempotent() {
        let conversation = conversation(vec![
            Turn::new("first", "**bold** answer"),
            Turn::new("second", "- a\n- b"),
        ]);

        assert_eq!(
            render_conversation(&conversation, true),
            render_conversation(&conversation, true)
        );
    }

    #[test]
    fn user_text_is_never_formatted() {
        let bubbles = render_conversation(&conversation(vec![Turn::new("**not bold**", "")]), true);

        assert_eq!(bubbles.len(), 1);
        assert_eq!(bubbles[0].body, BubbleBody::Plain("**not bold**".to_string()));
    }

    #[test]
    fn unrenderable_markdown_falls_back_to_raw_text() {
        let raw = "[paper]: https://example.org";
        let bubbles = render_conversation(&conversation(vec![Turn::new("q", raw)]), true);

        assert_eq!(bubbles[1].body, BubbleBody::Plain(raw.to_string()));
    }

    #[test]
    fn html_in_a_reply_is_painted() {
        let reply = "Results:\n\n<table><tr><td>42%</td></tr></table>";
        let bubbles = render_conversation(&conversation(vec![Turn::new("q", reply)]), true);
        let mut out = Vec::new();

        paint_bubbles(&mut out, &bubbles, false).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("  │ Results:\n"));
        assert!(text.contains("  │ <table><tr><td>42%</td></tr></table>\n"));
    }

    #[test]
    fn plain_mode_skips_markdown() {
        let bubbles = render_conversation(&conversation(vec![Turn::new("q", "# Title")]), false);

        assert_eq!(bubbles[1].body, BubbleBody::Plain("# Title".to_string()));
    }

    #[test]
    fn paints_labels_and_text_without_color() {
        let bubbles = render_conversation(&conversation(vec![Turn::new("hi", "hello!")]), true);
        let mut out = Vec::new();

        paint_bubbles(&mut out, &bubbles, false).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, "You\n  │ hi\n\nBot\n  │ hello!\n\n");
    }

    #[test]
    fn escapes_terminal_control_sequences() {
        assert_eq!(escape_control("plain\ttext"), "plain\ttext");
        assert_eq!(escape_control("two\nlines"), "two\nlines");
        assert_eq!(escape_control("\u{1b}[2Jgone"), "\\u{1b}[2Jgone");
    }
}
