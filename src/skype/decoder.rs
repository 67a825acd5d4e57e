use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::domain::{
    chat_update::{
        null_as_default, ChatAction, ChatActionType, ChatUpdate, ChatUpdateCommand, ChatUpdateData,
        PayloadShape,
    },
    identifiers::SuffixRule,
};

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("malformed chat update envelope: {0}")]
    MalformedEnvelope(#[source] serde_json::Error),
    #[error("malformed {element} in chat update action: {source}")]
    MalformedActionPayload {
        element: String,
        #[source]
        source: serde_json::Error,
    },
}

impl DecodeError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::MalformedEnvelope(_) => "CHAT_UPDATE_MALFORMED_ENVELOPE",
            Self::MalformedActionPayload { .. } => "CHAT_UPDATE_MALFORMED_ACTION_PAYLOAD",
        }
    }
}

/// Envelope as it arrives on the wire, either `{"id","cmd","data"}` or the
/// positional `[id, cmd, data]` form.
#[derive(Debug, Deserialize)]
struct WireEnvelope {
    #[serde(default, deserialize_with = "null_as_default")]
    id: String,
    cmd: ChatUpdateCommand,
    #[serde(default)]
    data: Option<Vec<Value>>,
}

#[derive(Debug, Clone, Default)]
pub struct ChatUpdateDecoder {
    rule: SuffixRule,
}

impl ChatUpdateDecoder {
    pub fn new(rule: SuffixRule) -> Self {
        Self { rule }
    }

    /// Decodes one wire message and normalizes every identifier in it.
    ///
    /// Short action arrays and action types without a payload shape produce
    /// an event with no action rather than an error.
    pub fn decode(&self, raw: &[u8]) -> Result<ChatUpdate, DecodeError> {
        let envelope: WireEnvelope =
            serde_json::from_slice(raw).map_err(DecodeError::MalformedEnvelope)?;

        let mut data = match envelope.data {
            Some(elements) => decode_data(&elements)?,
            None => ChatUpdateData::default(),
        };
        data.normalize_ids(&self.rule);

        Ok(ChatUpdate {
            chat_id: self.rule.normalize(&envelope.id),
            command: envelope.cmd,
            data,
        })
    }
}

fn decode_data(elements: &[Value]) -> Result<ChatUpdateData, DecodeError> {
    let [action_type, sender_id, payload, ..] = elements else {
        return Ok(ChatUpdateData::default());
    };

    let action_type = ChatActionType::deserialize(action_type)
        .map_err(|source| malformed("action type", source))?;
    let sender_id =
        String::deserialize(sender_id).map_err(|source| malformed("sender id", source))?;

    let action = match action_type.payload_shape() {
        Some(shape) => Some(decode_payload(shape, payload).map_err(|source| {
            malformed(format!("`{}` payload", action_type.as_wire()), source)
        })?),
        None => {
            tracing::debug!(
                action_type = action_type.as_wire(),
                "chat update action type has no payload shape; leaving action empty"
            );
            None
        }
    };

    Ok(ChatUpdateData {
        action_type: Some(action_type),
        sender_id,
        action,
    })
}

/// A `null` payload decodes to the zero value of its shape.
fn decode_payload(shape: PayloadShape, payload: &Value) -> Result<ChatAction, serde_json::Error> {
    let action = match shape {
        PayloadShape::NameChange => ChatAction::NameChange(null_as_default(payload)?),
        PayloadShape::AddTopic => ChatAction::AddTopic(null_as_default(payload)?),
        PayloadShape::RemoveTopic => ChatAction::RemoveTopic(null_as_default(payload)?),
        PayloadShape::Restrict => ChatAction::Restrict(null_as_default(payload)?),
        PayloadShape::Announce => ChatAction::Announce(null_as_default(payload)?),
        PayloadShape::PermissionChange => ChatAction::PermissionChange(null_as_default(payload)?),
        PayloadShape::MemberAction => ChatAction::MemberAction(null_as_default(payload)?),
        PayloadShape::Create => ChatAction::Create(null_as_default(payload)?),
    };

    Ok(action)
}

fn malformed(element: impl Into<String>, source: serde_json::Error) -> DecodeError {
    DecodeError::MalformedActionPayload {
        element: element.into(),
        source,
    }
}
