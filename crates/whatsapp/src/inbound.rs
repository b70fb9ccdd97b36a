use serde::Deserialize;

/// The slice of the Cloud API webhook envelope this bot cares about:
/// `entry[].changes[].value.messages[].text.body` plus the sender. Status
/// callbacks, media messages, and anything else decode to "no message".
#[derive(Debug, Default, Deserialize)]
pub struct WebhookEnvelope {
    #[serde(default)]
    entry: Vec<Entry>,
}

#[derive(Debug, Default, Deserialize)]
struct Entry {
    #[serde(default)]
    changes: Vec<Change>,
}

#[derive(Debug, Default, Deserialize)]
struct Change {
    #[serde(default)]
    value: ChangeValue,
}

#[derive(Debug, Default, Deserialize)]
struct ChangeValue {
    #[serde(default)]
    messages: Vec<Message>,
}

#[derive(Debug, Default, Deserialize)]
struct Message {
    #[serde(default)]
    from: Option<String>,
    #[serde(default)]
    text: Option<TextBody>,
}

#[derive(Debug, Default, Deserialize)]
struct TextBody {
    #[serde(default)]
    body: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InboundMessage {
    pub sender: String,
    pub text: String,
}

impl WebhookEnvelope {
    /// The first decodable text message, trimmed. Empty text counts as no
    /// message; the dispatcher never sees blank input.
    pub fn first_text_message(&self) -> Option<InboundMessage> {
        self.entry
            .iter()
            .flat_map(|entry| &entry.changes)
            .flat_map(|change| &change.value.messages)
            .find_map(|message| {
                let sender = message.from.as_deref()?.trim();
                let text = message.text.as_ref()?.body.as_deref()?.trim();
                if sender.is_empty() || text.is_empty() {
                    return None;
                }
                Some(InboundMessage { sender: sender.to_owned(), text: text.to_owned() })
            })
    }
}
