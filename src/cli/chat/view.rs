use std::env;
use std::fmt;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use color_print::cformat;
use crossterm::cursor::MoveTo;
use crossterm::queue;
use crossterm::terminal::{Clear, ClearType};
use crossterm::tty::IsTty;

use super::render::{escape_control, paint_bubbles, Bubble};

/// Contents of the status line shown above the thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    Uploading,
    Uploaded,
    Failed(String),
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Uploading => write!(f, "Uploading..."),
            Status::Uploaded => write!(f, "Upload successful!"),
            Status::Failed(message) => write!(f, "Error: {}", message),
        }
    }
}

/// A message that interrupts the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Alert {
    MissingFile,
    UnreadableFile { path: PathBuf, reason: String },
    ServiceError(String),
}

impl fmt::Display for Alert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Alert::MissingFile => write!(f, "Select a PDF first!"),
            Alert::UnreadableFile { path, reason } => {
                write!(f, "Cannot read {}: {}", path.display(), reason)
            }
            Alert::ServiceError(message) => write!(f, "Error: {}", message),
        }
    }
}

/// The presentation surface the chat handlers drive.
///
/// Mirrors the four bindings of the chat page: a file picker, a status line,
/// a message input and the thread container.
pub trait ChatView {
    fn selected_file(&self) -> Option<PathBuf>;

    fn message_input(&self) -> String;

    fn clear_message_input(&mut self);

    fn set_status(&mut self, status: Status) -> io::Result<()>;

    fn alert(&mut self, alert: Alert) -> io::Result<()>;

    /// Replaces the thread with `bubbles`, leaving the newest one in view.
    fn show_chat(&mut self, bubbles: &[Bubble]) -> io::Result<()>;

    /// Whether bot replies may be shown as formatted Markdown.
    fn supports_rich_text(&self) -> bool {
        true
    }
}

/// Options describing what the attached terminal can do.
#[derive(Debug, Clone, Copy)]
pub struct TerminalCapabilities {
    /// Colors and Markdown formatting.
    pub rich: bool,
    /// Clearing the screen before drawing the thread.
    pub redraw: bool,
}

impl TerminalCapabilities {
    /// Inspects stdout. `NO_COLOR` and `plain` turn formatting off.
    pub fn detect(plain: bool) -> Self {
        let tty = io::stdout().is_tty();
        let no_color = env::var_os("NO_COLOR").is_some_and(|value| !value.is_empty());

        Self {
            rich: tty && !plain && !no_color,
            redraw: tty,
        }
    }

    pub fn plain() -> Self {
        Self {
            rich: false,
            redraw: false,
        }
    }
}

pub struct TerminalView {
    output: Box<dyn Write>,
    capabilities: TerminalCapabilities,
    selected_file: Option<PathBuf>,
    message: String,
    status: Option<Status>,
}

impl TerminalView {
    pub fn new(output: Box<dyn Write>, capabilities: TerminalCapabilities) -> Self {
        Self {
            output,
            capabilities,
            selected_file: None,
            message: String::new(),
            status: None,
        }
    }

    /// Picks the file the next upload sends. The selection is kept until replaced.
    pub fn select_file(&mut self, path: &str) {
        self.selected_file = Some(sanitize_path(path));
    }

    pub fn status(&self) -> Option<&Status> {
        self.status.as_ref()
    }

    pub fn set_message_input(&mut self, message: &str) {
        self.message = message.to_string();
    }

    pub fn output(&mut self) -> &mut dyn Write {
        &mut self.output
    }

    fn write_status_line(&mut self) -> io::Result<()> {
        let Some(status) = &self.status else {
            return Ok(());
        };

        let line = escape_control(&status.to_string()).into_owned();
        if !self.capabilities.rich {
            return writeln!(self.output, "{}", line);
        }

        let line = match status {
            Status::Failed(_) => cformat!("<red>{}</>", line),
            Status::Uploaded => cformat!("<green>{}</>", line),
            Status::Uploading => cformat!("<dim>{}</>", line),
        };
        writeln!(self.output, "{}", line)
    }
}

impl ChatView for TerminalView {
    fn selected_file(&self) -> Option<PathBuf> {
        self.selected_file.clone()
    }

    fn message_input(&self) -> String {
        self.message.clone()
    }

    fn clear_message_input(&mut self) {
        self.message.clear();
    }

    fn set_status(&mut self, status: Status) -> io::Result<()> {
        self.status = Some(status);
        self.write_status_line()?;
        self.output.flush()
    }

    fn alert(&mut self, alert: Alert) -> io::Result<()> {
        let text = escape_control(&alert.to_string()).into_owned();
        if self.capabilities.rich {
            writeln!(self.output, "{}", cformat!("<bold,yellow>! {}</>", text))?;
        } else {
            writeln!(self.output, "! {}", text)?;
        }
        self.output.flush()
    }

    fn show_chat(&mut self, bubbles: &[Bubble]) -> io::Result<()> {
        if self.capabilities.redraw {
            queue!(self.output, Clear(ClearType::All), MoveTo(0, 0))?;
            self.write_status_line()?;
            writeln!(self.output)?;
        } else {
            writeln!(self.output, "{}", "─".repeat(24))?;
        }

        paint_bubbles(&mut self.output, bubbles, self.capabilities.rich)
    }

    fn supports_rich_text(&self) -> bool {
        self.capabilities.rich
    }
}

/// Expands a leading `~` and resolves relative paths against the working directory.
pub fn sanitize_path(path: &str) -> PathBuf {
    let path = path.trim();

    if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    } else if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }

    let path_buf = Path::new(path);
    if path_buf.is_relative() {
        if let Ok(current_dir) = env::current_dir() {
            return current_dir.join(path_buf);
        }
    }

    path_buf.to_path_buf()
}
