//! The user actions of the chat page.
//!
//! Each handler performs at most one round trip to the service and only
//! touches the [`ChatSession`] after that round trip has settled.

use std::io;

use tracing::{debug, info, warn};

use super::conversation_state::ChatSession;
use super::render::render_conversation;
use super::view::{Alert, ChatView, Status};
use crate::rag_client::{Document, SessionService};

/// Uploads the file selected in the view and starts a new session from the reply.
pub async fn submit_document<S, V>(
    session: &mut ChatSession,
    service: &S,
    view: &mut V,
) -> io::Result<()>
where
    S: SessionService + ?Sized,
    V: ChatView + ?Sized,
{
    let Some(path) = view.selected_file() else {
        return view.alert(Alert::MissingFile);
    };

    let document = match Document::read(&path).await {
        Ok(document) => document,
        Err(e) => {
            warn!("Failed to read {}: {}", path.display(), e);
            return view.alert(Alert::UnreadableFile {
                path,
                reason: e.to_string(),
            });
        }
    };

    view.set_status(Status::Uploading)?;

    match service.upload(document).await {
        Ok(reply) => {
            info!("Upload accepted, session {:?}", reply.session_id);
            session.start_session(reply.session_id, reply.chat_history);
            view.set_status(Status::Uploaded)?;
            render(session, view)
        }
        Err(e) => view.set_status(Status::Failed(e.user_message())),
    }
}

/// Asks the service about the current message input.
pub async fn send_message<S, V>(
    session: &mut ChatSession,
    service: &S,
    view: &mut V,
) -> io::Result<()>
where
    S: SessionService + ?Sized,
    V: ChatView + ?Sized,
{
    let message = view.message_input();
    if message.trim().is_empty() {
        return Ok(());
    }

    match service.ask(&message, session.conversation()).await {
        Ok(history) => {
            debug!("Service returned {} turns", history.len());
            session.replace_conversation(history);
            render(session, view)?;
            view.clear_message_input();
            Ok(())
        }
        Err(e) => view.alert(Alert::ServiceError(e.user_message())),
    }
}

/// Asks the service to forget the thread. Failures are not reported to the user.
pub async fn clear_conversation<S, V>(
    session: &mut ChatSession,
    service: &S,
    view: &mut V,
) -> io::Result<()>
where
    S: SessionService + ?Sized,
    V: ChatView + ?Sized,
{
    match service.clear().await {
        Ok(()) => {
            session.clear();
            render(session, view)
        }
        Err(e) => {
            warn!("Clearing the conversation failed: {}", e);
            Ok(())
        }
    }
}

/// Draws the current conversation into the view.
pub fn render<V>(session: &ChatSession, view: &mut V) -> io::Result<()>
where
    V: ChatView + ?Sized,
{
    let bubbles = render_conversation(session.conversation(), view.supports_rich_text());
    view.show_chat(&bubbles)
}
