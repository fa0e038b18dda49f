//! JSON rendering of annotation results on stdout.

use std::io::{self, Write};

use annota_client::{AnnotationResult, ChunkOutcome};
use anyhow::Context;
use serde::Serialize;

/// One line of `--settled` output.
#[derive(Debug, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
enum ChunkReport<'a> {
    Completed(&'a AnnotationResult),
    Failed {
        chunk_index: usize,
        kind: &'static str,
        message: String,
    },
}

impl<'a> ChunkReport<'a> {
    fn new(chunk_index: usize, outcome: &'a ChunkOutcome) -> Self {
        match outcome {
            Ok(result) => Self::Completed(result),
            Err(error) => Self::Failed {
                chunk_index,
                kind: error.kind().into(),
                message: error.to_string(),
            },
        }
    }
}

/// Writes the ordered results of a successful run.
pub fn write_results(results: &[AnnotationResult], pretty: bool) -> anyhow::Result<()> {
    write_json(&results, pretty)
}

/// Writes one report per chunk, failures included.
pub fn write_outcomes(outcomes: &[ChunkOutcome], pretty: bool) -> anyhow::Result<()> {
    let reports: Vec<_> = outcomes
        .iter()
        .enumerate()
        .map(|(index, outcome)| ChunkReport::new(index, outcome))
        .collect();

    write_json(&reports, pretty)
}

fn write_json<T: Serialize + ?Sized>(value: &T, pretty: bool) -> anyhow::Result<()> {
    let mut stdout = io::stdout().lock();
    render(&mut stdout, value, pretty)?;
    stdout.flush().context("failed to flush stdout")
}

fn render<W: Write, T: Serialize + ?Sized>(
    writer: &mut W,
    value: &T,
    pretty: bool,
) -> anyhow::Result<()> {
    if pretty {
        serde_json::to_writer_pretty(&mut *writer, value)
    } else {
        serde_json::to_writer(&mut *writer, value)
    }
    .context("failed to serialize output")?;

    writeln!(writer).context("failed to write output")
}
