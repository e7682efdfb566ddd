//! Command line front end for the `s7commp` decoder.
//!
//! Reads `CONNECTION SEGMENT HEX` lines, feeds them through one
//! [`AnalysisSession`] and prints each delivered telegram as a JSON line.

mod cli;

use std::{
    fs::File,
    io::{self, BufRead, BufReader, Write},
};

use clap::Parser;
use s7commp::{
    AnalysisSession,
    ConnectionId,
    DecoderConfig,
    ReassemblyConfig,
    SegmentId,
    hooks::{LabelRecorder, NoopObserver},
};
use serde_json::json;
use thiserror::Error;

use crate::cli::{Cli, Command, DecodeArgs};

/// Problems with one input line.
#[derive(Debug, Error)]
enum LineError {
    #[error("line {line}: expected `CONNECTION SEGMENT HEX`")]
    MissingField { line: usize },
    #[error("line {line}: `{text}` is not a number")]
    BadNumber { line: usize, text: String },
    #[error("line {line}: payload is not an even run of hex digits")]
    BadHex { line: usize },
}

struct InputSegment {
    connection: ConnectionId,
    segment: SegmentId,
    bytes: Vec<u8>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Applications embedding the library should install their own subscriber.
    tracing_subscriber::fmt().with_writer(io::stderr).init();

    let cli = Cli::parse();
    match cli.command {
        Command::Decode(args) => decode(&args),
    }
}

fn decode(args: &DecodeArgs) -> Result<(), Box<dyn std::error::Error>> {
    let reader: Box<dyn BufRead> = match &args.input {
        Some(path) => Box::new(BufReader::new(File::open(path)?)),
        None => Box::new(BufReader::new(io::stdin())),
    };
    let decoder = DecoderConfig::new(args.max_depth);
    let mut session = AnalysisSession::with_config(
        ReassemblyConfig::new(args.max_telegram_size)
            .with_max_retained_telegrams(args.max_retained_telegrams),
    );
    let mut out = io::stdout().lock();

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let Some(input) = parse_line(index + 1, &line)? else {
            continue;
        };
        let classification = match session.classify_and_maybe_buffer(
            &input.bytes,
            input.connection,
            input.segment,
        ) {
            Ok(classification) => classification,
            Err(err) => {
                tracing::warn!(segment = %input.segment, "{err}");
                continue;
            }
        };
        let class = classification.class;
        let Some(telegram) = classification.into_telegram() else {
            continue;
        };

        let mut recorder = LabelRecorder::new();
        let decoded = if args.labels {
            telegram.decode_with(&decoder, &mut recorder)
        } else {
            telegram.decode_with(&decoder, &mut NoopObserver)
        };
        let decoded = match decoded {
            Ok(decoded) => decoded,
            Err(err) => {
                tracing::warn!(segment = %input.segment, "{err}");
                continue;
            }
        };
        let mut record = json!({
            "connection": input.connection,
            "segment": input.segment,
            "class": class,
            "segments": telegram.segments(),
            "telegram": decoded,
        });
        if args.labels {
            record["labels"] = json!(recorder.labels());
        }
        serde_json::to_writer(&mut out, &record)?;
        writeln!(out)?;
    }
    Ok(())
}

fn parse_line(line: usize, text: &str) -> Result<Option<InputSegment>, LineError> {
    let text = text.trim();
    if text.is_empty() || text.starts_with('#') {
        return Ok(None);
    }
    let mut fields = text.split_whitespace();
    let mut number = || {
        let field = fields.next().ok_or(LineError::MissingField { line })?;
        field.parse::<u64>().map_err(|_| LineError::BadNumber {
            line,
            text: field.to_owned(),
        })
    };
    let connection = ConnectionId::new(number()?);
    let segment = SegmentId::new(number()?);
    let hex: String = fields.collect();
    if hex.is_empty() {
        return Err(LineError::MissingField { line });
    }
    let bytes = parse_hex(&hex).ok_or(LineError::BadHex { line })?;
    Ok(Some(InputSegment {
        connection,
        segment,
        bytes,
    }))
}

fn parse_hex(hex: &str) -> Option<Vec<u8>> {
    if hex.len() % 2 != 0 {
        return None;
    }
    hex.as_bytes()
        .chunks_exact(2)
        .map(|pair| {
            let pair = std::str::from_utf8(pair).ok()?;
            u8::from_str_radix(pair, 16).ok()
        })
        .collect()
}
