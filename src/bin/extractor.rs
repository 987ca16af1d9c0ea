use std::io::{self, BufRead, Write};

use anyhow::Context;
use clap::Parser;
use log::info;
use telemetry_extractor::args::ProgramArgs;
use telemetry_extractor::host::Dispatcher;
use telemetry_extractor::payload::PayloadDocument;

fn main() -> anyhow::Result<()> {
    let args = ProgramArgs::parse();
    let level = match args.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    simple_logger::SimpleLogger::new()
        .with_level(level)
        .init()
        .unwrap();

    let mut dispatcher = Dispatcher::new();
    if let Some(path) = &args.payload {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading payload document {}", path.display()))?;
        let value: serde_json::Value = serde_json::from_str(&text)
            .with_context(|| format!("parsing payload document {}", path.display()))?;
        let doc = PayloadDocument::from_value(&value)
            .map_err(|_| anyhow::anyhow!("malformed payload document {}", path.display()))?;
        dispatcher.preload_payload(doc);
    }

    info!("extractor ready");

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    for line in stdin.lock().lines() {
        let line = line.context("reading command line from stdin")?;
        if line.is_empty() {
            continue;
        }
        for event in dispatcher.handle_line(&line) {
            writeln!(stdout, "{}", event.to_value())?;
        }
        stdout.flush()?;
    }

    Ok(())
}
