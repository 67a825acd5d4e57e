use std::{io, time::Duration};

use anyhow::Result;
use tokio::runtime::Builder;

use crate::{
    cli::{Cli, Command},
    domain, infra,
    infra::error::AppError,
    skype,
    usecases::{self, bootstrap, decode_stream::decode_stream, process_stream},
};

pub fn run(cli: Cli) -> Result<()> {
    let context = bootstrap::bootstrap(cli.config.as_deref())?;

    tracing::debug!(
        domain = domain::module_name(),
        skype = skype::module_name(),
        usecases = usecases::module_name(),
        infra = infra::module_name(),
        "module boundaries loaded"
    );

    match cli.command_or_default() {
        Command::Dispatch { input } => {
            let runtime = Builder::new_multi_thread()
                .thread_name("chat-update-dispatch")
                .build()
                .map_err(AppError::Runtime)?;
            let connection = bootstrap::compose_connection(&context, runtime.handle().clone());

            let reader = process_stream::open_input(input.as_deref())?;
            let summary = process_stream::process_stream(reader, &connection)?;

            runtime.shutdown_timeout(Duration::from_millis(
                context.config.dispatch.shutdown_grace_ms,
            ));
            eprintln!(
                "Dispatched {} chat updates ({} failed to decode, {} handler panics).",
                summary.processed,
                summary.failed,
                connection.handler_panics()
            );
        }
        Command::Decode { input } => {
            let decoder = bootstrap::compose_decoder(&context);
            let reader = process_stream::open_input(input.as_deref())?;
            let summary = decode_stream(reader, &decoder, &mut io::stdout().lock())?;

            tracing::info!(
                decoded = summary.processed,
                failed = summary.failed,
                "decode finished"
            );
        }
    }

    Ok(())
}
