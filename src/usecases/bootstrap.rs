use std::{path::Path, sync::Arc};

use tokio::runtime::Handle;

use crate::{
    infra::{self, error::AppError},
    skype::{
        builtin::{LogHandler, PrintHandler},
        connection::{named_sync_policy, ChatUpdateConnection},
        decoder::ChatUpdateDecoder,
        dispatcher::ChatUpdateDispatcher,
    },
    usecases::context::AppContext,
};

pub fn bootstrap(config_path: Option<&Path>) -> Result<AppContext, AppError> {
    let context = build_context(config_path)?;
    infra::logging::init(&context.config.logging)?;

    Ok(context)
}

fn build_context(config_path: Option<&Path>) -> Result<AppContext, AppError> {
    let config = infra::config::load(config_path)?;

    Ok(AppContext::new(config))
}

pub fn compose_decoder(context: &AppContext) -> ChatUpdateDecoder {
    ChatUpdateDecoder::new(context.config.identifiers.suffix_rule())
}

/// Builds a connection with the built-in handlers registered in a fixed
/// order: `print` first, then `log`.
pub fn compose_connection(context: &AppContext, runtime: Handle) -> ChatUpdateConnection {
    let mut connection = ChatUpdateConnection::new(
        compose_decoder(context),
        ChatUpdateDispatcher::new(runtime),
        named_sync_policy(context.config.dispatch.synchronous_handlers.iter().cloned()),
    );
    connection.add_handler(Arc::new(PrintHandler));
    connection.add_handler(Arc::new(LogHandler));

    connection
}
