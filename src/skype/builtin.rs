//! Handlers wired in by the CLI.

use std::io::{self, Write};

use chrono::DateTime;

use crate::{
    domain::chat_update::{ChatAction, ChatUpdate},
    skype::{
        decoder::DecodeError,
        handler::{ChatUpdateHandler, Handler},
    },
};

pub const PRINT_HANDLER: &str = "print";
pub const LOG_HANDLER: &str = "log";

const PRINT_HANDLER_WRITE_FAILED: &str = "CHAT_UPDATE_PRINT_WRITE_FAILED";

/// Writes each update to stdout as one JSON line.
#[derive(Debug, Default)]
pub struct PrintHandler;

impl Handler for PrintHandler {
    fn name(&self) -> &str {
        PRINT_HANDLER
    }

    fn as_chat_update_handler(&self) -> Option<&dyn ChatUpdateHandler> {
        Some(self)
    }
}

impl ChatUpdateHandler for PrintHandler {
    fn handle_chat_update(&self, update: &ChatUpdate) {
        if let Err(error) = write_json_line(&mut io::stdout().lock(), update) {
            tracing::warn!(
                code = PRINT_HANDLER_WRITE_FAILED,
                error = %error,
                "failed to print chat update"
            );
        }
    }
}

pub fn write_json_line<W: Write>(out: &mut W, update: &ChatUpdate) -> io::Result<()> {
    serde_json::to_writer(&mut *out, update)?;
    out.write_all(b"\n")
}

/// Emits a one-line tracing summary of each update.
#[derive(Debug, Default)]
pub struct LogHandler;

impl Handler for LogHandler {
    fn name(&self) -> &str {
        LOG_HANDLER
    }

    fn as_chat_update_handler(&self) -> Option<&dyn ChatUpdateHandler> {
        Some(self)
    }

    fn handle_decode_error(&self, error: &DecodeError) {
        tracing::debug!(kind = error.code(), "log handler saw a dropped chat update");
    }
}

impl ChatUpdateHandler for LogHandler {
    fn handle_chat_update(&self, update: &ChatUpdate) {
        tracing::info!(
            chat_id = %update.chat_id,
            sender_id = %update.data.sender_id,
            action_type = update.data.action_type.as_ref().map(|t| t.as_wire()),
            "{}",
            summarize(update)
        );
    }
}

pub fn summarize(update: &ChatUpdate) -> String {
    let Some(action) = &update.data.action else {
        return "chat update without action".to_owned();
    };

    match action {
        ChatAction::NameChange(change) => format!(
            "renamed to {:?} by {} at {}",
            change.name,
            change.set_by,
            format_epoch(change.set_at)
        ),
        ChatAction::AddTopic(topic) => format!(
            "topic {} set to {:?} at {}",
            topic.topic_id,
            topic.topic,
            format_epoch(topic.set_at)
        ),
        ChatAction::RemoveTopic(topic) => format!("topic {} removed", topic.topic_id),
        ChatAction::Restrict(enabled) => format!("restrict set to {enabled}"),
        ChatAction::Announce(enabled) => format!("announce set to {enabled}"),
        ChatAction::PermissionChange(members) => format!(
            "permissions changed for {}",
            members.member_ids.join(", ")
        ),
        ChatAction::MemberAction(members) => {
            format!("membership changed for {}", members.member_ids.join(", "))
        }
        ChatAction::Create(create) => format!(
            "created {:?} at {} with {} admins, {} super admins, {} members",
            create.name,
            format_epoch(create.creation_time),
            create.admin_ids.len(),
            create.super_admin_ids.len(),
            create.regular_member_ids.len()
        ),
    }
}

fn format_epoch(seconds: i64) -> String {
    DateTime::from_timestamp(seconds, 0)
        .map(|at| at.to_rfc3339())
        .unwrap_or_else(|| seconds.to_string())
}
