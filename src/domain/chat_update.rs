//! Typed model of a chat-update event after decoding and normalization.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::domain::identifiers::SuffixRule;

/// One decoded chat-update event.
///
/// Built fresh for each inbound wire message and treated as read-only once
/// handed to dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatUpdate {
    pub chat_id: String,
    pub command: ChatUpdateCommand,
    pub data: ChatUpdateData,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatUpdateCommand {
    Action,
    Other(String),
}

impl ChatUpdateCommand {
    pub fn from_wire(token: &str) -> Self {
        match token {
            "action" => Self::Action,
            other => Self::Other(other.to_owned()),
        }
    }

    pub fn as_wire(&self) -> &str {
        match self {
            Self::Action => "action",
            Self::Other(token) => token,
        }
    }
}

impl Serialize for ChatUpdateCommand {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_wire())
    }
}

impl<'de> Deserialize<'de> for ChatUpdateCommand {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let token = String::deserialize(deserializer)?;
        Ok(Self::from_wire(&token))
    }
}

/// Action part of a chat update.
///
/// `action_type` is `None` when the wire payload was too short to carry an
/// action. `action` is `None` for short payloads and for action types that
/// have no decodable payload shape.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ChatUpdateData {
    pub action_type: Option<ChatActionType>,
    pub sender_id: String,
    pub action: Option<ChatAction>,
}

impl ChatUpdateData {
    pub(crate) fn normalize_ids(&mut self, rule: &SuffixRule) {
        rule.normalize_in_place(&mut self.sender_id);
        if let Some(action) = self.action.as_mut() {
            action.normalize_ids(rule);
        }
    }
}

/// Discriminator token found at position 0 of the action array.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ChatActionType {
    NameChange,
    AddTopic,
    RemoveTopic,
    Restrict,
    Announce,
    Promote,
    Demote,
    Remove,
    Add,
    Introduce,
    Create,
    Thread,
    TopicUpdate,
    PictureUpdate,
    MemberAdd,
    MemberDelete,
    Unrecognized(String),
}

impl ChatActionType {
    pub fn from_wire(token: &str) -> Self {
        match token {
            "subject" => Self::NameChange,
            "desc_add" => Self::AddTopic,
            "desc_remove" => Self::RemoveTopic,
            "restrict" => Self::Restrict,
            "announce" => Self::Announce,
            "promote" => Self::Promote,
            "demote" => Self::Demote,
            "remove" => Self::Remove,
            "add" => Self::Add,
            "introduce" => Self::Introduce,
            "create" => Self::Create,
            "Thread" => Self::Thread,
            "ThreadActivity/TopicUpdate" => Self::TopicUpdate,
            "ThreadActivity/PictureUpdate" => Self::PictureUpdate,
            "ThreadActivity/AddMember" => Self::MemberAdd,
            "ThreadActivity/DeleteMember" => Self::MemberDelete,
            other => Self::Unrecognized(other.to_owned()),
        }
    }

    pub fn as_wire(&self) -> &str {
        match self {
            Self::NameChange => "subject",
            Self::AddTopic => "desc_add",
            Self::RemoveTopic => "desc_remove",
            Self::Restrict => "restrict",
            Self::Announce => "announce",
            Self::Promote => "promote",
            Self::Demote => "demote",
            Self::Remove => "remove",
            Self::Add => "add",
            Self::Introduce => "introduce",
            Self::Create => "create",
            Self::Thread => "Thread",
            Self::TopicUpdate => "ThreadActivity/TopicUpdate",
            Self::PictureUpdate => "ThreadActivity/PictureUpdate",
            Self::MemberAdd => "ThreadActivity/AddMember",
            Self::MemberDelete => "ThreadActivity/DeleteMember",
            Self::Unrecognized(token) => token,
        }
    }

    /// Payload shape carried at position 2 for this action type.
    ///
    /// Returns `None` for types whose payload is not decoded; those events are
    /// still delivered, just without an action.
    pub fn payload_shape(&self) -> Option<PayloadShape> {
        let shape = match self {
            Self::NameChange => PayloadShape::NameChange,
            Self::AddTopic => PayloadShape::AddTopic,
            Self::RemoveTopic => PayloadShape::RemoveTopic,
            Self::Restrict => PayloadShape::Restrict,
            Self::Announce => PayloadShape::Announce,
            Self::Promote | Self::Demote => PayloadShape::PermissionChange,
            Self::Add | Self::Remove => PayloadShape::MemberAction,
            Self::Create => PayloadShape::Create,
            Self::Introduce
            | Self::Thread
            | Self::TopicUpdate
            | Self::PictureUpdate
            | Self::MemberAdd
            | Self::MemberDelete
            | Self::Unrecognized(_) => return None,
        };

        Some(shape)
    }
}

impl Serialize for ChatActionType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_wire())
    }
}

impl<'de> Deserialize<'de> for ChatActionType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let token = String::deserialize(deserializer)?;
        Ok(Self::from_wire(&token))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadShape {
    NameChange,
    AddTopic,
    RemoveTopic,
    Restrict,
    Announce,
    PermissionChange,
    MemberAction,
    Create,
}

/// Decoded action payload. Exactly one variant is populated per event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "payload", rename_all = "snake_case")]
pub enum ChatAction {
    NameChange(NameChange),
    AddTopic(AddTopic),
    RemoveTopic(RemoveTopic),
    Restrict(bool),
    Announce(bool),
    PermissionChange(MemberList),
    MemberAction(MemberList),
    Create(Create),
}

impl ChatAction {
    fn normalize_ids(&mut self, rule: &SuffixRule) {
        match self {
            Self::NameChange(change) => rule.normalize_in_place(&mut change.set_by),
            Self::PermissionChange(members) | Self::MemberAction(members) => {
                rule.normalize_all(&mut members.member_ids)
            }
            Self::Create(create) => {
                rule.normalize_in_place(&mut create.set_by);
                rule.normalize_all(&mut create.admin_ids);
                rule.normalize_all(&mut create.super_admin_ids);
                rule.normalize_all(&mut create.regular_member_ids);
            }
            Self::AddTopic(_) | Self::RemoveTopic(_) | Self::Restrict(_) | Self::Announce(_) => {}
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NameChange {
    #[serde(rename(deserialize = "subject"))]
    pub name: String,
    #[serde(rename(deserialize = "s_t"))]
    pub set_at: i64,
    #[serde(rename(deserialize = "s_o"))]
    pub set_by: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AddTopic {
    #[serde(rename(deserialize = "desc"))]
    pub topic: String,
    #[serde(rename(deserialize = "descId"))]
    pub topic_id: String,
    #[serde(rename(deserialize = "descTime"))]
    pub set_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoveTopic {
    #[serde(rename(deserialize = "descId"))]
    pub topic_id: String,
}

/// Participant list shared by promote/demote and add/remove actions.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MemberList {
    #[serde(
        rename(deserialize = "participants"),
        deserialize_with = "null_as_default"
    )]
    pub member_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Create {
    #[serde(rename(deserialize = "creation"))]
    pub creation_time: i64,
    #[serde(rename(deserialize = "subject"))]
    pub name: String,
    #[serde(rename(deserialize = "s_t"))]
    pub set_at: i64,
    #[serde(rename(deserialize = "s_o"))]
    pub set_by: String,
    #[serde(rename(deserialize = "admins"), deserialize_with = "null_as_default")]
    pub admin_ids: Vec<String>,
    #[serde(
        rename(deserialize = "superadmins"),
        deserialize_with = "null_as_default"
    )]
    pub super_admin_ids: Vec<String>,
    #[serde(rename(deserialize = "regulars"), deserialize_with = "null_as_default")]
    pub regular_member_ids: Vec<String>,
}

// The server sends `null` for empty participant lists.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
