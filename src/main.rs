mod interactions;

use clap::{Parser, Subcommand};
use interactions::Interactions;
use murmur_core::{
    config::{self, install_bundled_templates, shellexpand, Config, Templates},
    memory::agent_id,
    traits::{Generator, InteractionStore, PlatformClient},
};
use murmur_memory::{AuditLogger, Store};
use murmur_platform::XClient;
use murmur_providers::OpenAiGenerator;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(
    name = "murmur",
    version,
    about = "murmur — watches mentions and priority authors, decides, replies"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to config file.
    #[arg(short, long, default_value = "config.toml", env = "MURMUR_CONFIG")]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the interaction loop until Ctrl-C.
    Start,
    /// Run a single interaction cycle and print its summary.
    Once,
    /// Show configuration, provider availability, and stored state.
    Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = config::load(&cli.config)?;
    let _log_guard = init_logging(&cfg)?;

    match cli.command {
        Commands::Start => {
            if !cfg.interactions.enabled {
                anyhow::bail!("interactions are disabled in {}", cli.config);
            }
            let pipeline = build_pipeline(&cfg).await?;
            let pipeline = Arc::new(pipeline);

            println!("murmur — starting interaction loop...");
            let cancel = CancellationToken::new();
            let handle = tokio::spawn(pipeline.run_loop(cancel.clone()));

            tokio::signal::ctrl_c().await?;
            info!("Received shutdown signal");
            cancel.cancel();
            handle.await?;
        }
        Commands::Once => {
            let pipeline = build_pipeline(&cfg).await?;
            let state = pipeline.load_state().await?;
            let (_, result) = pipeline
                .run_cycle(state, chrono::Utc::now().timestamp())
                .await;
            let report = result?;

            println!("murmur — cycle summary\n");
            println!("  discovered:        {}", report.discovered);
            println!("  candidates:        {}", report.candidates);
            println!("  processed:         {}", report.processed);
            println!("  responded:         {}", report.responded);
            println!("  ignored:           {}", report.ignored);
            println!("  stopped:           {}", report.stopped);
            println!("  empty replies:     {}", report.empty);
            println!("  posts sent:        {}", report.sent_posts);
            println!("  skipped (seen):    {}", report.skipped_watermark);
            println!("  skipped (memory):  {}", report.skipped_memory);
            println!("  generation errors: {}", report.generation_failures);
            println!("  dispatch errors:   {}", report.dispatch_failures);
            println!("  memory errors:     {}", report.memory_write_failures);
            println!(
                "  watermark:         {}",
                report
                    .watermark
                    .map(|w| w.to_string())
                    .unwrap_or_else(|| "none".into())
            );
        }
        Commands::Status => status(&cli.config, &cfg).await?,
    }

    Ok(())
}

/// Stderr plus `{data_dir}/logs/murmur.log`. `RUST_LOG` wins over `log_level`.
fn init_logging(cfg: &Config) -> anyhow::Result<WorkerGuard> {
    let log_dir = std::path::PathBuf::from(shellexpand(&cfg.murmur.data_dir)).join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let file = tracing_appender::rolling::never(&log_dir, "murmur.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&cfg.murmur.log_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(file_writer),
        )
        .init();

    Ok(guard)
}

/// Wire the platform client, generator, and store into a pipeline.
async fn build_pipeline(cfg: &Config) -> anyhow::Result<Interactions> {
    if cfg.platform.bearer_token.is_empty() {
        anyhow::bail!(
            "platform.bearer_token is empty. \
             Set it in config.toml or the {} env var.",
            config::ENV_PLATFORM_TOKEN
        );
    }

    let generator = OpenAiGenerator::from_config(&cfg.provider, cfg.persona.system.clone());
    if !generator.is_available().await {
        anyhow::bail!(
            "provider '{}' is not available. Check provider.base_url and the {} env var.",
            generator.name(),
            config::ENV_PROVIDER_API_KEY
        );
    }

    let platform = XClient::new(&cfg.platform);
    let store = Store::new(&cfg.memory).await?;

    install_bundled_templates(&cfg.murmur.data_dir);
    let templates = Templates::load(&cfg.murmur.data_dir);

    Ok(Interactions::new(
        Arc::new(platform),
        Arc::new(generator),
        Arc::new(store),
        cfg.interactions.clone(),
        cfg.persona.clone(),
        templates,
        cfg.memory.recent_interactions,
        cfg.platform.dry_run,
    ))
}

async fn status(config_path: &str, cfg: &Config) -> anyhow::Result<()> {
    println!("murmur — status check\n");
    println!("Config: {config_path}");
    println!("Persona: {}", cfg.persona.name);
    println!(
        "Interactions: {} | every {}s | priority: {}",
        if cfg.interactions.enabled {
            "enabled"
        } else {
            "disabled"
        },
        cfg.interactions.poll_interval_secs,
        {
            let handles = cfg.interactions.priority_handles();
            if handles.is_empty() {
                "none".to_string()
            } else {
                handles.join(", ")
            }
        }
    );
    println!("Dry run: {}", cfg.platform.dry_run);
    println!();

    let generator = OpenAiGenerator::from_config(&cfg.provider, cfg.persona.system.clone());
    println!(
        "  provider ({}, {} / {}): {}",
        generator.name(),
        cfg.provider.model,
        cfg.provider.model_large,
        if generator.is_available().await {
            "available"
        } else {
            "unavailable"
        }
    );

    if cfg.platform.bearer_token.is_empty() {
        println!("  platform: missing bearer_token");
        return Ok(());
    }
    let platform = XClient::new(&cfg.platform);
    let profile = match platform.profile().await {
        Ok(p) => {
            println!("  platform ({}): @{}", platform.name(), p.handle);
            p
        }
        Err(e) => {
            println!("  platform ({}): unreachable ({e})", platform.name());
            return Ok(());
        }
    };

    let store = Store::new(&cfg.memory).await?;
    let agent = agent_id(&profile.id);
    let watermark = store.get_watermark(&agent).await?;
    println!(
        "  watermark: {}",
        watermark
            .map(|w| w.to_string())
            .unwrap_or_else(|| "none".into())
    );
    println!("  memories: {}", store.memory_count(&agent).await?);

    let counts = AuditLogger::new(store.pool().clone())
        .outcome_counts("-1 day")
        .await?;
    if counts.is_empty() {
        println!("  dispatches (24h): none");
    } else {
        let summary: Vec<String> = counts.iter().map(|(o, n)| format!("{o}={n}")).collect();
        println!("  dispatches (24h): {}", summary.join(", "));
    }
    Ok(())
}
