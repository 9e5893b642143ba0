use serde::{Deserialize, Serialize};

/// Message exchanged with the host document, in either direction.
///
/// Inbound and outbound updates have the same shape on the wire:
/// `{"type":"update","text":"..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum HostMessage {
    Update { text: String },
}

impl HostMessage {
    pub fn update(text: impl Into<String>) -> Self {
        HostMessage::Update { text: text.into() }
    }

    pub fn text(&self) -> &str {
        match self {
            HostMessage::Update { text } => text,
        }
    }
}
