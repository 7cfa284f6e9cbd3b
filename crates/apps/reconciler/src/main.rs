use app_state::load_settings_from_path;
use clap::Parser;
use color_eyre::Result;
use reconciler::harness::Harness;
use reconciler::script::SessionScript;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Replays a session script against in-memory collaborators and logs the resulting state.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// JSON session script to replay.
    #[clap(long, short)]
    script: PathBuf,

    /// Settings file, defaults to `config/settings.yaml`.
    #[clap(long)]
    settings: Option<PathBuf>,

    /// Overrides `entitlement.api_key`.
    #[clap(long)]
    api_key: Option<String>,

    /// How long to let background listeners settle after each step.
    #[clap(long, default_value_t = 50)]
    settle_ms: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let mut settings = match &args.settings {
        Some(path) => load_settings_from_path(path, true)?,
        None => app_state::settings().clone(),
    };
    if let Some(api_key) = args.api_key {
        settings.entitlement.api_key = Some(api_key);
    }

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| settings.logging.level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
    color_eyre::install()?;

    let script = SessionScript::from_path(&args.script)?;
    info!(
        "Replaying {} steps from {}",
        script.steps.len(),
        args.script.display()
    );

    let mut harness = Harness::new(settings, Duration::from_millis(args.settle_ms));
    let reports = harness.replay(&script).await?;
    println!("{}", serde_json::to_string_pretty(&reports)?);

    Ok(())
}
