// SPDX-License-Identifier: MIT OR Apache-2.0
//! Storyboard timeline - headless session replay
//!
//! Replays a recorded editing session against the timeline core and prints
//! the resulting timeline snapshot as JSON:
//!
//! ```text
//! storyboard_timeline <session.ron> [--settings <settings.ron>] [--output <snapshot.json>]
//! ```
//!
//! Logs go to stderr; `RUST_LOG` adjusts the filter.

mod replay;

use replay::{ReplayError, Session};
use std::path::{Path, PathBuf};
use storyboard_timeline::EditorSettings;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const USAGE: &str = "usage: storyboard_timeline <session.ron> \
    [--settings <settings.ron>] [--output <snapshot.json>]";

/// Parsed command line
#[derive(Debug, Clone, PartialEq)]
struct Args {
    session: PathBuf,
    settings: Option<PathBuf>,
    output: Option<PathBuf>,
}

impl Args {
    fn parse(mut args: impl Iterator<Item = String>) -> Result<Self, ReplayError> {
        let mut session = None;
        let mut settings = None;
        let mut output = None;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--settings" => settings = Some(Self::value(&mut args, "--settings")?),
                "--output" => output = Some(Self::value(&mut args, "--output")?),
                "-h" | "--help" => return Err(ReplayError::Usage(USAGE.to_string())),
                flag if flag.starts_with('-') => {
                    return Err(ReplayError::Usage(format!("unknown option {flag}\n{USAGE}")));
                }
                _ if session.is_none() => session = Some(PathBuf::from(&arg)),
                _ => return Err(ReplayError::Usage(format!("unexpected argument {arg}\n{USAGE}"))),
            }
        }

        Ok(Self {
            session: session.ok_or_else(|| ReplayError::Usage(USAGE.to_string()))?,
            settings,
            output,
        })
    }

    fn value(args: &mut impl Iterator<Item = String>, flag: &str) -> Result<PathBuf, ReplayError> {
        args.next()
            .map(PathBuf::from)
            .ok_or_else(|| ReplayError::Usage(format!("{flag} needs a path\n{USAGE}")))
    }
}

fn load_settings(path: Option<&Path>) -> EditorSettings {
    let Some(path) = path else {
        tracing::info!("No settings file given, using defaults");
        return EditorSettings::default();
    };
    match EditorSettings::load(path) {
        Ok(settings) => {
            tracing::info!("Loaded settings from {:?}", path);
            settings
        }
        Err(e) => {
            tracing::warn!("Falling back to default settings: {e}");
            EditorSettings::default()
        }
    }
}

fn run(args: &Args) -> Result<(), ReplayError> {
    let settings = load_settings(args.settings.as_deref());
    let session = Session::load(&args.session)?;
    let replay = replay::run(session, settings)?;
    tracing::info!(
        "Playhead at {}s showing {:?} after {} frame changes; {} edits refused",
        replay.render.time,
        replay.render.frame,
        replay.render.frame_changes,
        replay.rejected
    );

    let json = replay.editor.timeline().snapshot().to_json()?;
    match &args.output {
        Some(path) => {
            std::fs::write(path, json)?;
            tracing::info!("Wrote snapshot to {:?}", path);
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn main() {
    let mut env_filter = tracing_subscriber::EnvFilter::from_default_env();
    for directive in ["storyboard_timeline=debug", "storyboard_timeline_app=debug"] {
        match directive.parse::<Directive>() {
            Ok(directive) => env_filter = env_filter.add_directive(directive),
            Err(e) => eprintln!("Ignoring log directive {directive}: {e}"),
        }
    }

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::info!("Starting storyboard timeline v{}", env!("CARGO_PKG_VERSION"));

    let args = match Args::parse(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(2);
        }
    };

    if let Err(e) = run(&args) {
        tracing::error!("Replay failed: {e}");
        std::process::exit(1);
    }
}
