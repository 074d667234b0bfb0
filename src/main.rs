use anyhow::{bail, Context, Result};
use maths_notes::recognition::{HttpRecognitionClient, RecognitionWorker};
use maths_notes::settings::SketchSettings;
use maths_notes::sketch::replay::StrokeScript;
use maths_notes::sketch::{export, ApplyOutcome, SketchSession};
use maths_notes::{logging, settings_store};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

struct Args {
    script: PathBuf,
    export_dir: Option<PathBuf>,
}

fn parse_args() -> Result<Args> {
    let mut script = None;
    let mut export_dir = None;
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--export" => {
                let dir = args.next().map(PathBuf::from);
                export_dir = Some(match dir {
                    Some(dir) => dir,
                    None => export::default_output_folder()?,
                });
            }
            other if other.starts_with("--") => bail!("unknown option {other}"),
            other => script = Some(PathBuf::from(other)),
        }
    }
    let Some(script) = script else {
        bail!("usage: maths_notes <strokes.json> [--export [DIR]]");
    };
    Ok(Args { script, export_dir })
}

/// Writes the effective settings on first run so there is a file to edit.
fn write_settings_template(settings: &SketchSettings) {
    match settings_store::resolve_settings_path() {
        Ok(path) if path.exists() => {}
        Ok(_) => match settings_store::save(settings) {
            Ok(path) => tracing::info!("wrote default settings to {}", path.display()),
            Err(err) => tracing::warn!("could not write default settings: {err:#}"),
        },
        Err(err) => tracing::warn!("could not resolve settings path: {err:#}"),
    }
}

fn main() -> Result<()> {
    let args = parse_args()?;
    let settings = match settings_store::load() {
        Ok(settings) => settings,
        Err(err) => {
            eprintln!("failed to load settings, using defaults: {err:#}");
            SketchSettings::default()
        }
    };
    logging::init(settings.debug_logging, settings.log_file.clone());
    write_settings_template(&settings);

    let script = StrokeScript::load(&args.script)?;
    let mut session = SketchSession::new(script.width, script.height, &settings);
    script.replay(&mut session);
    tracing::info!(
        strokes = script.strokes.len(),
        width = script.width,
        height = script.height,
        "replayed stroke script"
    );

    if let Some(dir) = &args.export_dir {
        let payload = session
            .snapshot_encoder()
            .capture(session.surface())
            .context("capture snapshot for export")?;
        let path = export::write_snapshot(&payload, dir, chrono::Local::now())?;
        println!("snapshot written to {}", path.display());
    }

    // Drawing stays usable without a credential; only recognition is skipped.
    let client = match HttpRecognitionClient::from_settings(&settings.recognition) {
        Ok(client) => client,
        Err(err) => {
            tracing::error!("recognition unavailable: {err}");
            eprintln!("recognition unavailable: {err}");
            return Ok(());
        }
    };

    let worker = RecognitionWorker::spawn(Arc::new(client))?;
    let request = session.begin_recognition()?;
    worker.submit(request)?;

    let wait = Duration::from_secs(settings.recognition.timeout_seconds + 5);
    let Some(reply) = worker.recv_timeout(wait) else {
        bail!("no recognition reply within {}s", wait.as_secs());
    };

    match session.complete_recognition(reply.ticket, reply.result) {
        ApplyOutcome::Applied { added } => {
            for annotation in &added {
                let position = annotation.position();
                println!(
                    "{} @ ({:.0}, {:.0})",
                    annotation.label(),
                    position.x,
                    position.y
                );
            }
            println!("bindings {}", session.bindings().to_json());
        }
        ApplyOutcome::Failed(err) => {
            eprintln!("recognition failed ({}): {err}", err.kind());
            if let Some(raw) = err.raw_payload() {
                eprintln!("raw payload: {raw}");
            }
        }
        ApplyOutcome::Discarded => {}
    }
    Ok(())
}
