pub mod conversation_state;
pub mod handlers;
pub mod markdown;
pub mod prompt;
pub mod render;
pub mod view;

use std::io::Write;
use std::process::ExitCode;

use conversation_state::ChatSession;
use eyre::Result;
use prompt::generate_prompt;
use rustyline::error::ReadlineError;
use tracing::{debug, info};
use view::{Alert, ChatView, Status, TerminalCapabilities, TerminalView};

use crate::rag_client::RagClient;

const WELCOME_TEXT: &str = "
Hi, I answer questions about research papers.

Upload a PDF, then ask away.

/upload <path>   Upload a paper and start a new session
/help            Show the help dialogue
/quit            Quit the application
";

const HELP_TEXT: &str = "
Paper Chat CLI

/upload [path]   Upload a paper (reuses the last selected file without a path)
/clear           Clear the conversation history
/health          Check whether the service is up
/help            Show this help dialogue
/quit            Quit the application

Anything else is sent as a question about the uploaded paper.
Start a line with // to send a question that begins with /.
";

pub struct ChatContext {
    view: TerminalView,
    session: ChatSession,
    client: RagClient,
    file: Option<String>,
    input: Option<String>,
}

impl ChatContext {
    pub fn new(
        output: Box<dyn Write>,
        capabilities: TerminalCapabilities,
        client: RagClient,
        file: Option<String>,
        input: Option<String>,
    ) -> Self {
        Self {
            view: TerminalView::new(output, capabilities),
            session: ChatSession::new(),
            client,
            file,
            input,
        }
    }

    pub async fn run(&mut self) -> Result<ExitCode> {
        if self.file.is_some() || self.input.is_some() {
            let exit_code = if self.run_once().await? {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            };
            return Ok(exit_code);
        }

        self.print_welcome()?;
        self.run_interactive().await?;

        Ok(ExitCode::SUCCESS)
    }

    /// Asks the service for its health and reports it.
    pub async fn health(&mut self) -> Result<ExitCode> {
        if self.print_health().await? {
            Ok(ExitCode::SUCCESS)
        } else {
            Ok(ExitCode::FAILURE)
        }
    }

    fn print_welcome(&mut self) -> Result<()> {
        writeln!(self.view.output(), "{}", WELCOME_TEXT)?;
        writeln!(self.view.output(), "Service: {}\n", self.client.base_url())?;
        Ok(())
    }

    /// Uploads `--file` and asks `--input`. Returns whether every step succeeded.
    async fn run_once(&mut self) -> Result<bool> {
        if let Some(path) = self.file.take() {
            self.view.select_file(&path);
            handlers::submit_document(&mut self.session, &self.client, &mut self.view).await?;
            if self.view.status() != Some(&Status::Uploaded) {
                return Ok(false);
            }
        }

        if let Some(input) = self.input.take() {
            self.view.set_message_input(&input);
            handlers::send_message(&mut self.session, &self.client, &mut self.view).await?;
            if !self.view.message_input().trim().is_empty() {
                return Ok(false);
            }
        }

        Ok(true)
    }

    async fn run_interactive(&mut self) -> Result<()> {
        let mut rl = prompt::rl()?;

        loop {
            let prompt_text = generate_prompt(self.session.session_id());
            // A message the service rejected stays in the input, escaped again if needed.
            let mut pending = self.view.message_input();
            if pending.starts_with('/') {
                pending.insert(0, '/');
            }
            let readline = if pending.is_empty() {
                rl.readline(&prompt_text)
            } else {
                rl.readline_with_initial(&prompt_text, (pending.as_str(), ""))
            };

            match readline {
                Ok(line) => {
                    if line.trim().is_empty() {
                        self.view.clear_message_input();
                        continue;
                    }

                    rl.add_history_entry(line.as_str());

                    if line.trim() == "/quit" {
                        break;
                    }

                    if let Err(e) = self.handle_input(&line).await {
                        writeln!(self.view.output(), "Error: {}", e)?;
                    }
                }
                Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
                Err(e) => {
                    writeln!(self.view.output(), "Error: {}", e)?;
                    break;
                }
            }
        }

        prompt::save_history(&mut rl);
        info!("Leaving chat");
        Ok(())
    }

    async fn handle_input(&mut self, input: &str) -> Result<()> {
        let trimmed = input.trim();
        if !trimmed.starts_with('/') || trimmed.starts_with("//") {
            let message = match trimmed.strip_prefix("//") {
                Some(rest) => format!("/{}", rest),
                None => input.to_string(),
            };
            self.view.set_message_input(&message);
            handlers::send_message(&mut self.session, &self.client, &mut self.view).await?;
            return Ok(());
        }

        self.view.clear_message_input();

        let (command, argument) = match trimmed.split_once(char::is_whitespace) {
            Some((command, argument)) => (command, Some(argument.trim())),
            None => (trimmed, None),
        };
        debug!("Running command {} {:?}", command, argument);

        match command {
            "/help" => {
                writeln!(self.view.output(), "{}", HELP_TEXT)?;
            }
            "/upload" => {
                if let Some(path) = argument.filter(|path| !path.is_empty()) {
                    self.view.select_file(path);
                }
                handlers::submit_document(&mut self.session, &self.client, &mut self.view).await?;
            }
            "/clear" => {
                handlers::clear_conversation(&mut self.session, &self.client, &mut self.view)
                    .await?;
            }
            "/health" => {
                self.print_health().await?;
            }
            _ => {
                writeln!(
                    self.view.output(),
                    "Unknown command {}. Type /help for the list of commands, or start the line with // to ask it.",
                    command
                )?;
            }
        }

        Ok(())
    }

    /// Returns whether the service answered.
    async fn print_health(&mut self) -> Result<bool> {
        match self.client.health().await {
            Ok(report) => {
                writeln!(
                    self.view.output(),
                    "Service {} (backend: {})",
                    report.status,
                    report.gradio_client.as_deref().unwrap_or("unknown")
                )?;
                if let Some(message) = report.message {
                    writeln!(self.view.output(), "{}", message)?;
                }
                Ok(true)
            }
            Err(e) => {
                self.view.alert(Alert::ServiceError(e.user_message()))?;
                Ok(false)
            }
        }
    }
}
