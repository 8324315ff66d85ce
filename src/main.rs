use std::sync::Arc;

use anyhow::Context;
use tokio::io::AsyncReadExt;

use contact_enrich::config::{EnrichConfig, GateMode};
use contact_enrich::contacts::parse;
use contact_enrich::gate::{CliGate, DisambiguationGate, OperatorDesk};
use contact_enrich::lookup::create_lookup;
use contact_enrich::orchestrator::{Orchestrator, Phase, ProgressWatch, RunOutcome};
use contact_enrich::report;
use contact_enrich::server::operator_routes;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let config = EnrichConfig::from_env().context("Invalid configuration")?;

    // Contacts come from the file named on the command line, or stdin.
    let input_path = std::env::args().nth(1);
    let raw = match &input_path {
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read contacts from {path}"))?,
        None => {
            let mut raw = String::new();
            tokio::io::stdin()
                .read_to_string(&mut raw)
                .await
                .context("Failed to read contacts from stdin")?;
            raw
        }
    };

    if input_path.is_none() && config.gate == GateMode::Cli {
        tracing::warn!("Contacts were read from stdin; CLI selections will be abandoned");
    }

    eprintln!("📇 Contact Enrich v{}", env!("CARGO_PKG_VERSION"));

    enrich(config, &raw).await?;
    Ok(())
}

async fn enrich(config: EnrichConfig, raw: &str) -> contact_enrich::error::Result<()> {
    let parsed = parse(raw);
    for error in &parsed.errors {
        eprintln!("{error}");
    }
    eprintln!("{} valid contacts found", parsed.seeds.len());
    tracing::info!(
        lines = parsed.lines_examined(),
        valid = parsed.seeds.len(),
        rejected = parsed.errors.len(),
        "Parsed contacts"
    );

    let lookup = create_lookup(&config.lookup)?;

    let (gate, desk): (Arc<dyn DisambiguationGate>, Option<Arc<OperatorDesk>>) = match config.gate
    {
        GateMode::Cli => (Arc::new(CliGate::stdin()), None),
        GateMode::Http => {
            let desk = OperatorDesk::new();
            (desk.clone(), Some(desk))
        }
    };

    let mut orchestrator = Orchestrator::new(parsed.seeds, Arc::clone(&lookup), gate);

    // ── Operator server ──────────────────────────────────────────────────
    if let Some(desk) = desk {
        let app = operator_routes(desk, orchestrator.watch(), Arc::clone(&lookup));
        let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.http_port))
            .await
            .map_err(contact_enrich::error::GateError::from)?;
        eprintln!("   Operator API: http://0.0.0.0:{}/api/selection", config.http_port);
        tracing::info!(port = config.http_port, "Operator server started");
        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!(error = %e, "Operator server stopped");
            }
        });
    }

    let printer = tokio::spawn(print_progress(orchestrator.watch()));

    let outcome = orchestrator.run().await?;
    printer.abort();

    let state = orchestrator.state();
    match outcome {
        RunOutcome::Suspended => eprintln!(
            "Run suspended: selection abandoned at contact {} of {}",
            state.cursor() + 1,
            state.contacts().len()
        ),
        RunOutcome::Completed => {
            if let (Some(started), Some(completed)) = (state.started_at(), state.completed_at()) {
                let elapsed = (completed - started).num_milliseconds() as f64 / 1000.0;
                eprintln!("Finished in {elapsed:.1}s");
            }
        }
    }

    let contacts = orchestrator.into_state().into_contacts();
    println!("{}", report::render_text(&contacts));

    if let Some(path) = &config.output_path {
        report::write_json(path, &contacts)?;
        eprintln!("Results written to {}", path.display());
    }

    Ok(())
}

/// Print "Processing <key>... <pct>%" whenever the run moves to a new contact.
async fn print_progress(mut watch: ProgressWatch) {
    let mut last: Option<(String, u8)> = None;
    while let Some(snapshot) = watch.changed().await {
        if snapshot.phase == Phase::Completed {
            break;
        }
        let Some(key) = snapshot.current_organization_key.clone() else {
            continue;
        };
        let line = (key, snapshot.percent());
        if last.as_ref() != Some(&line) {
            eprintln!("Processing {}... {}%", line.0, line.1);
            last = Some(line);
        }
    }
}
