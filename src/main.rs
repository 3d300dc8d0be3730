use clap::Parser;
use tasman_fare_watch::utils::logger;
use tasman_fare_watch::{
    AmadeusClient, BrevoNotifier, CliConfig, LocalStorage, LogFormat, RunOutcome, WatchConfig,
    WatchEngine, WatchError,
};

fn exit_with(e: &WatchError) -> ! {
    tracing::error!(
        "❌ Run failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());
    std::process::exit(e.exit_code());
}

async fn run(config: &WatchConfig) -> tasman_fare_watch::Result<RunOutcome> {
    let today = chrono::Local::now().date_naive();
    let settings = config.run_settings(today)?;
    let provider = AmadeusClient::new(config.fares.clone())?;
    let notifier = BrevoNotifier::new(config.email.clone())?;

    let engine = WatchEngine::new(provider, notifier, settings).with_today(today);
    match &config.report_dir {
        Some(dir) => {
            engine
                .with_report(LocalStorage::new(dir.clone()))
                .run()
                .await
        }
        None => engine.run().await,
    }
}

#[tokio::main]
async fn main() {
    let cli = CliConfig::parse();

    match cli.log_format {
        LogFormat::Compact => logger::init_cli_logger(cli.verbose),
        LogFormat::Json => logger::init_json_logger(cli.verbose),
    }

    tracing::info!("🚀 Starting tasman-fare-watch");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    let config = match cli.load() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("❌ Configuration validation failed: {}", e);
            exit_with(&e);
        }
    };

    match run(&config).await {
        Ok(RunOutcome::NoMatches { fetched }) => {
            println!("No qualifying fares among {} offers; no email sent.", fetched);
        }
        Ok(RunOutcome::DryRun { matched, subject }) => {
            println!("DRY RUN: {} deal(s) found, email not sent.", matched);
            println!("Subject: {}", subject);
        }
        Ok(RunOutcome::Notified { matched }) => {
            println!(
                "✅ Sent {} deal(s) to {}",
                matched, config.email.recipient_email
            );
        }
        Err(e) => exit_with(&e),
    }

    if let Some(dir) = &config.report_dir {
        tracing::info!("📁 Reports directory: {}", dir);
    }
}
