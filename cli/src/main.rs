//! CLI entrypoint for dual-relay
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result, bail};
use clap::Parser;
use relay_application::{
    ChannelOrchestrator, HistoryFilter, NotificationBus, ProcessorRegistry, RequestRegistry,
    ResultHistory, StreamTransport, TurnResults,
};
use relay_domain::{ConversationContext, FileAttachment, ResultStatus, Turn};
use relay_infrastructure::{
    AddressRecognitionProcessor, ConfigLoader, DifyTransport, FileConfig, JsonlConversationLogger,
};
use relay_presentation::{Cli, ConsoleFormatter, ConsoleSubscriber, OutputFormat, follow};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity level
    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"), // -vvv or more
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if cli.show_config {
        ConfigLoader::print_config_sources();
        return Ok(());
    }

    let config = load_config(&cli)?;
    info!("Starting dual-relay against {}", config.primary.api_base);

    // === Dependency Injection ===
    let mut orchestrator_config = config.to_orchestrator_config();
    if let Some(secs) = cli.timeout {
        if secs == 0 {
            bail!("--timeout must be greater than 0");
        }
        orchestrator_config = orchestrator_config.with_idle_timeout(Duration::from_secs(secs));
    }

    let registry = RequestRegistry::new(orchestrator_config.idle_timeout);
    let bus = Arc::new(NotificationBus::new());

    let history = Arc::new(ResultHistory::new(orchestrator_config.history_limit));
    bus.subscribe(history.clone());

    let processors = Arc::new(ProcessorRegistry::new());
    processors.register(Arc::new(
        AddressRecognitionProcessor::new().context("Failed to compile address patterns")?,
    ));
    bus.subscribe(processors.clone());

    if !cli.quiet {
        bus.subscribe(Arc::new(ConsoleSubscriber));
    }

    let primary: Arc<dyn StreamTransport> = Arc::new(
        DifyTransport::from_target(&config.primary_target())
            .context("Failed to create primary transport")?,
    );
    let mut orchestrator = ChannelOrchestrator::new(primary, registry, bus)
        .with_config(orchestrator_config);

    if !cli.no_auxiliary
        && let Some(target) = config.auxiliary_target()
    {
        let auxiliary = DifyTransport::from_target(&target)
            .context("Failed to create auxiliary transport")?;
        orchestrator = orchestrator.with_auxiliary(Arc::new(auxiliary));
    }

    if let Some(path) = &config.logging.conversation_log {
        match JsonlConversationLogger::new(path) {
            Some(logger) => orchestrator = orchestrator.with_logger(Arc::new(logger)),
            None => warn!("Conversation log {} could not be opened", path.display()),
        }
    }

    let context = build_context(&cli);

    if !cli.batch.is_empty() {
        let results = orchestrator
            .submit_auxiliary_batch(cli.batch.iter().map(String::as_str), &context)
            .await?;
        let output = match cli.output {
            OutputFormat::Json => {
                serde_json::to_string_pretty(&results).unwrap_or_else(|_| "[]".to_string())
            }
            OutputFormat::Text | OutputFormat::Full => ConsoleFormatter::format_batch(&results),
        };
        println!("{}", output);
        print_history(&cli, &history);
        return Ok(());
    }

    let query = match cli.query.clone() {
        Some(q) => q,
        None => bail!("A query is required. Use --batch for auxiliary-only queries."),
    };

    let mut turn = Turn::new(query).with_context(context);
    if let Some(aux) = &cli.aux_query {
        turn = turn.with_auxiliary(aux.clone());
    }

    let handles = orchestrator.submit(&turn).await?;

    let streaming = !cli.quiet && cli.output == OutputFormat::Text;
    let live = streaming.then(|| tokio::spawn(follow(handles.primary.watch_text(), std::io::stdout())));

    let wait = handles.wait_all();
    tokio::pin!(wait);
    let results = tokio::select! {
        results = &mut wait => results,
        _ = tokio::signal::ctrl_c() => {
            let cancelled = orchestrator.teardown();
            info!("Interrupted, cancelled {} channel(s)", cancelled);
            wait.await
        }
    };

    if let Some(live) = live {
        match live.await {
            Ok(Err(e)) => warn!("Live output failed: {}", e),
            Err(e) => warn!("Live output task failed: {}", e),
            Ok(Ok(_)) => {}
        }
    }

    print_results(&cli, streaming, &results, &processors);
    print_history(&cli, &history);
    orchestrator.teardown();

    if results.primary.status == ResultStatus::Error {
        bail!(
            "Primary channel failed: {}",
            results.primary.error.as_deref().unwrap_or("unknown")
        );
    }
    Ok(())
}

fn load_config(cli: &Cli) -> Result<FileConfig> {
    let config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_ref()).context("Failed to load configuration")?
    };
    config.validate()?;
    Ok(config)
}

fn build_context(cli: &Cli) -> ConversationContext {
    let mut context = ConversationContext::new();
    if let Some(id) = &cli.conversation_id {
        context = context.with_conversation_id(id.clone());
    }
    for (key, value) in &cli.input {
        context = context.with_input(key.clone(), value.clone());
    }
    for url in &cli.image_url {
        context = context.with_file(FileAttachment::remote("image", url.clone()));
    }
    context
}

fn print_history(cli: &Cli, history: &ResultHistory) {
    if cli.history {
        let entries = history.entries(&HistoryFilter::new());
        println!("{}", ConsoleFormatter::format_history(&entries));
    }
}

fn print_results(
    cli: &Cli,
    streamed: bool,
    results: &TurnResults,
    processors: &ProcessorRegistry,
) {
    let outcomes = processors.last_outcomes();
    match cli.output {
        OutputFormat::Full => println!("{}", ConsoleFormatter::format(results, &outcomes)),
        OutputFormat::Json => println!("{}", ConsoleFormatter::format_json(results, &outcomes)),
        // The live printer already showed a successful answer.
        OutputFormat::Text if streamed && results.primary.is_success() => {}
        OutputFormat::Text => print!("{}", ConsoleFormatter::format_answer_only(results)),
    }
}
