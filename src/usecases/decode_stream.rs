//! Decode-only mode: prints each normalized event as one JSON line.

use std::io::{BufRead, Write};

use anyhow::{Context, Result};

use crate::{
    skype::{builtin::write_json_line, decoder::ChatUpdateDecoder},
    usecases::process_stream::{for_each_message, StreamSummary},
};

const DECODE_STREAM_LINE_SKIPPED: &str = "DECODE_STREAM_LINE_SKIPPED";

pub fn decode_stream<R: BufRead, W: Write>(
    reader: R,
    decoder: &ChatUpdateDecoder,
    out: &mut W,
) -> Result<StreamSummary> {
    let mut summary = StreamSummary::default();

    for_each_message(reader, |line, message| {
        match decoder.decode(message) {
            Ok(update) => {
                write_json_line(&mut *out, &update).context("failed to write decoded event")?;
                summary.processed += 1;
            }
            Err(error) => {
                tracing::warn!(
                    code = DECODE_STREAM_LINE_SKIPPED,
                    line,
                    kind = error.code(),
                    error = %error,
                    "skipping chat update that failed to decode"
                );
                summary.failed += 1;
            }
        }
        Ok(())
    })?;

    out.flush().context("failed to flush decoded events")?;
    Ok(summary)
}
