#![allow(dead_code)]

use std::collections::VecDeque;
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;

use async_trait::async_trait;
use paper_chat::cli::chat::conversation_state::{Conversation, Turn};
use paper_chat::cli::chat::render::{Bubble, BubbleBody, Speaker};
use paper_chat::cli::chat::view::{Alert, ChatView, Status};
use paper_chat::error::ServiceError;
use paper_chat::rag_client::{Document, SessionService, UploadReply};

/// A call the handlers made against the service.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Upload { file_name: String },
    Ask { message: String, history: Conversation },
    Clear,
}

/// Service double answering from queued replies.
#[derive(Default)]
pub struct MockService {
    calls: Mutex<Vec<Call>>,
    uploads: Mutex<VecDeque<Result<UploadReply, ServiceError>>>,
    asks: Mutex<VecDeque<Result<Conversation, ServiceError>>>,
    clears: Mutex<VecDeque<Result<(), ServiceError>>>,
}

impl MockService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_upload(self, reply: Result<UploadReply, ServiceError>) -> Self {
        self.uploads.lock().unwrap().push_back(reply);
        self
    }

    pub fn on_ask(self, reply: Result<Conversation, ServiceError>) -> Self {
        self.asks.lock().unwrap().push_back(reply);
        self
    }

    pub fn on_clear(self, reply: Result<(), ServiceError>) -> Self {
        self.clears.lock().unwrap().push_back(reply);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl SessionService for MockService {
    async fn upload(&self, document: Document) -> Result<UploadReply, ServiceError> {
        self.calls.lock().unwrap().push(Call::Upload {
            file_name: document.file_name,
        });
        self.uploads
            .lock()
            .unwrap()
            .pop_front()
            .expect("unexpected upload")
    }

    async fn ask(
        &self,
        message: &str,
        history: &Conversation,
    ) -> Result<Conversation, ServiceError> {
        self.calls.lock().unwrap().push(Call::Ask {
            message: message.to_string(),
            history: history.clone(),
        });
        self.asks.lock().unwrap().pop_front().expect("unexpected ask")
    }

    async fn clear(&self) -> Result<(), ServiceError> {
        self.calls.lock().unwrap().push(Call::Clear);
        self.clears.lock().unwrap().pop_front().expect("unexpected clear")
    }
}

/// View double recording everything the handlers show.
#[derive(Default)]
pub struct RecordingView {
    pub selected_file: Option<PathBuf>,
    pub message: String,
    pub statuses: Vec<Status>,
    pub alerts: Vec<Alert>,
    pub renders: Vec<Vec<Bubble>>,
}

impl RecordingView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_render(&self) -> &[Bubble] {
        self.renders.last().map(Vec::as_slice).unwrap_or(&[])
    }
}

impl ChatView for RecordingView {
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
        self.statuses.push(status);
        Ok(())
    }

    fn alert(&mut self, alert: Alert) -> io::Result<()> {
        self.alerts.push(alert);
        Ok(())
    }

    fn show_chat(&mut self, bubbles: &[Bubble]) -> io::Result<()> {
        self.renders.push(bubbles.to_vec());
        Ok(())
    }
}

pub fn conversation(turns: &[(&str, &str)]) -> Conversation {
    Conversation::from(
        turns
            .iter()
            .map(|(user, bot)| Turn::new(*user, *bot))
            .collect::<Vec<_>>(),
    )
}

/// Plain text of a bubble, whether it was formatted or not.
pub fn bubble_text(bubble: &Bubble) -> String {
    match &bubble.body {
        BubbleBody::Plain(text) => text.clone(),
        BubbleBody::Rich(lines) => lines
            .iter()
            .map(|line| line.plain_text())
            .collect::<Vec<_>>()
            .join("\n"),
    }
}

pub fn speakers(bubbles: &[Bubble]) -> Vec<Speaker> {
    bubbles.iter().map(|bubble| bubble.speaker).collect()
}
