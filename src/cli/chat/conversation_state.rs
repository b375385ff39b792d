use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// One exchange of the thread. Either half may be missing.
///
/// On the wire a turn is a two element array, `["question", "answer"]`, whose
/// items may be `null`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Turn {
    pub user: Option<String>,
    pub bot: Option<String>,
}

impl Turn {
    pub fn new(user: impl Into<String>, bot: impl Into<String>) -> Self {
        Self {
            user: Some(user.into()),
            bot: Some(bot.into()),
        }
    }

    /// User text, if present and non-empty.
    pub fn user_text(&self) -> Option<&str> {
        self.user.as_deref().filter(|text| !text.is_empty())
    }

    /// Bot text, if present and non-empty.
    pub fn bot_text(&self) -> Option<&str> {
        self.bot.as_deref().filter(|text| !text.is_empty())
    }
}

impl Serialize for Turn {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        (&self.user, &self.bot).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Turn {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let (user, bot) = <(Option<String>, Option<String>)>::deserialize(deserializer)?;
        Ok(Self { user, bot })
    }
}

/// Chronological list of turns, exactly as last returned by the service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Conversation(Vec<Turn>);

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn turns(&self) -> &[Turn] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<Turn>> for Conversation {
    fn from(turns: Vec<Turn>) -> Self {
        Self(turns)
    }
}

/// View-model of the chat page.
///
/// Holds the only two pieces of client state. It is written only after a
/// request settles, and only with values the service returned (or cleared).
#[derive(Debug, Default)]
pub struct ChatSession {
    session_id: Option<String>,
    conversation: Conversation,
}

impl ChatSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    /// Adopts the result of a successful upload. A missing history means an empty thread.
    pub fn start_session(&mut self, session_id: Option<String>, history: Option<Conversation>) {
        self.session_id = session_id;
        self.conversation = history.unwrap_or_default();
    }

    pub fn replace_conversation(&mut self, conversation: Conversation) {
        self.conversation = conversation;
    }

    pub fn clear(&mut self) {
        self.conversation = Conversation::new();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn turn_uses_pair_encoding() {
        let conversation = Conversation::from(vec![Turn::new("hi", "hello!")]);
        assert_eq!(
            serde_json::to_value(&conversation).unwrap(),
            json!([["hi", "hello!"]])
        );
    }

    #[test]
    fn null_and_empty_halves_survive_a_round_trip() {
        let raw = json!([[null, "welcome"], ["", "answer"]]);
        let conversation: Conversation = serde_json::from_value(raw.clone()).unwrap();

        assert_eq!(conversation.turns()[0].user, None);
        assert_eq!(conversation.turns()[1].user.as_deref(), Some(""));
        assert_eq!(conversation.turns()[1].user_text(), None);
        assert_eq!(serde_json::to_value(&conversation).unwrap(), raw);
    }

    #[test]
    fn rejects_turns_that_are_not_pairs() {
        assert!(serde_json::from_value::<Conversation>(json!([["only one"]])).is_err());
    }

    #[test]
    fn upload_without_history_starts_empty() {
        let mut session = ChatSession::new();
        session.replace_conversation(Conversation::from(vec![Turn::new("a", "b")]));

        session.start_session(Some("s1".to_string()), None);

        assert_eq!(session.session_id(), Some("s1"));
        assert!(session.conversation().is_empty());
    }

    #[test]
    fn clear_keeps_session_id() {
        let mut session = ChatSession::new();
        session.start_session(
            Some("s1".to_string()),
            Some(Conversation::from(vec![Turn::new("a", "b")])),
        );

        session.clear();

        assert_eq!(session.session_id(), Some("s1"));
        assert!(session.conversation().is_empty());
    }
}
