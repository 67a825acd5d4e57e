//! Feeds newline-delimited wire messages through a connection.

use std::{
    fs::File,
    io::{self, BufRead, BufReader},
    path::Path,
};

use anyhow::{Context, Result};

use crate::{infra::error::AppError, skype::connection::ChatUpdateConnection};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamSummary {
    pub processed: usize,
    pub failed: usize,
}

/// Opens `path`, or stdin when no path is given.
pub fn open_input(path: Option<&Path>) -> Result<Box<dyn BufRead>, AppError> {
    match path {
        Some(path) => {
            let file = File::open(path).map_err(|source| AppError::InputOpen {
                path: path.to_path_buf(),
                source,
            })?;
            Ok(Box::new(BufReader::new(file)))
        }
        None => Ok(Box::new(BufReader::new(io::stdin()))),
    }
}

/// Calls `on_message` with the 1-based line number and raw bytes of every
/// non-blank line. Lines are not required to be UTF-8; only I/O errors stop
/// the stream.
pub(crate) fn for_each_message<R, F>(reader: R, mut on_message: F) -> Result<()>
where
    R: BufRead,
    F: FnMut(usize, &[u8]) -> Result<()>,
{
    for (index, line) in reader.split(b'\n').enumerate() {
        let line = line.with_context(|| format!("failed to read input line {}", index + 1))?;
        let message = line.trim_ascii();
        if message.is_empty() {
            continue;
        }

        on_message(index + 1, message)?;
    }

    Ok(())
}

/// Hands every non-blank line to `connection`. Lines that fail to decode are
/// counted and skipped.
pub fn process_stream<R: BufRead>(
    reader: R,
    connection: &ChatUpdateConnection,
) -> Result<StreamSummary> {
    let mut summary = StreamSummary::default();

    for_each_message(reader, |_, message| {
        match connection.handle_message(message) {
            Ok(()) => summary.processed += 1,
            Err(_) => summary.failed += 1,
        }
        Ok(())
    })?;

    tracing::info!(
        processed = summary.processed,
        failed = summary.failed,
        "chat update stream finished"
    );
    Ok(summary)
}
