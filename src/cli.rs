//! CLI definition and dispatch.

use chrono::Utc;
use clap::{Parser, Subcommand};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::adapters::csv_adapter::{CsvTickerAdapter, DEFAULT_TICKER_COLUMN};
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::json_checkpoint_adapter::JsonCheckpointAdapter;
use crate::adapters::openai_adapter::{self, OpenAiAdapter};
use crate::adapters::polygon_adapter::{self, PolygonAdapter};
use crate::adapters::sqlite_adapter::{DEFAULT_NEWS_PATH, DEFAULT_SCORES_PATH, SqliteAdapter};
use crate::adapters::text_report_adapter::{DEFAULT_REPORT_PATH, TextReportAdapter};
use crate::adapters::vader_adapter::VaderAdapter;
use crate::domain::config_validation::{
    api_key, build_pipeline_settings, validate_config, validate_credentials,
};
use crate::domain::error::TickerScoreError;
use crate::domain::pipeline::Pipeline;
use crate::domain::report::rank;
use crate::domain::retry::ThreadSleeper;
use crate::domain::sentiment::SentimentLabel;
use crate::ports::checkpoint_port::CheckpointPort;
use crate::ports::config_port::ConfigPort;
use crate::ports::polarity_port::PolarityPort;
use crate::ports::report_port::ReportPort;
use crate::ports::store_port::ScoreStorePort;
use crate::ports::ticker_port::TickerPort;

pub const DEFAULT_TICKERS_PATH: &str = "Tickers.csv";
pub const DEFAULT_STATE_PATH: &str = "state.json";

#[derive(Parser, Debug)]
#[command(
    name = "tickerscore",
    about = "Rank stock tickers by news sentiment and technical indicators"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Fetch, classify and score every pending ticker, then write the report
    Run {
        #[arg(short, long)]
        config: PathBuf,
        /// Ticker CSV, overriding [paths] tickers
        #[arg(long)]
        tickers: Option<PathBuf>,
        /// Report file, overriding [paths] report
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Validate inputs and list pending tickers without any network calls
        #[arg(long)]
        dry_run: bool,
    },
    /// Write the report from the current checkpoint without fetching
    Report {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Show stored score records for one ticker
    History {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        ticker: String,
    },
    /// Print the lexicon polarity and label of a text
    Classify {
        #[arg(long)]
        text: String,
    },
    /// Remove the checkpoint so the next run starts over
    Reset {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Run {
            config,
            tickers,
            output,
            dry_run,
        } => run_pipeline(&config, tickers.as_deref(), output.as_deref(), dry_run),
        Command::Report { config, output } => run_report(&config, output.as_deref()),
        Command::History { config, ticker } => run_history(&config, &ticker),
        Command::Classify { text } => run_classify(&text),
        Command::Reset { config } => run_reset(&config),
        Command::Validate { config } => run_validate(&config),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

/// Load the config file and install the log subscriber it describes.
pub fn load_config(path: &Path) -> Result<FileConfigAdapter, TickerScoreError> {
    let config = FileConfigAdapter::from_file(path)?;
    init_logging(&config)?;
    info!("Loaded config from {}", path.display());
    Ok(config)
}

/// `RUST_LOG` overrides `[logging] level`. Output goes to `[logging] file`
/// (truncated) when set, stderr otherwise.
pub fn init_logging(config: &dyn ConfigPort) -> Result<(), TickerScoreError> {
    let level = config
        .get_string("logging", "level")
        .unwrap_or_else(|| "info".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&level));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let installed = match config.get_string("logging", "file").filter(|f| !f.trim().is_empty()) {
        Some(file) => {
            let file = File::create(file.trim())?;
            builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
        }
        None => builder.with_writer(std::io::stderr).try_init(),
    };
    // Tests and repeated calls reuse the first subscriber.
    if let Err(e) = installed {
        debug!("Keeping existing log subscriber: {}", e);
    }
    Ok(())
}

fn path_setting(config: &dyn ConfigPort, section: &str, key: &str, default: &str) -> PathBuf {
    config
        .get_string(section, key)
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(default))
}

fn checkpoint_store(config: &dyn ConfigPort) -> JsonCheckpointAdapter {
    JsonCheckpointAdapter::new(path_setting(config, "paths", "state", DEFAULT_STATE_PATH))
}

fn report_writer(config: &dyn ConfigPort, output: Option<&Path>) -> TextReportAdapter {
    let path = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| path_setting(config, "paths", "report", DEFAULT_REPORT_PATH));
    let writer = TextReportAdapter::new(path);
    if config.get_bool("report", "echo_stdout", true) {
        writer
    } else {
        writer.quiet()
    }
}

fn open_store(
    config: &dyn ConfigPort,
    key: &str,
    default_path: &str,
) -> Result<SqliteAdapter, TickerScoreError> {
    let store = SqliteAdapter::from_config(config, key, default_path)?;
    store.initialize_schema()?;
    Ok(store)
}

fn timeout(config: &dyn ConfigPort, section: &str, default_secs: u64) -> Duration {
    Duration::from_secs(config.get_int(section, "timeout_secs", default_secs as i64).max(1) as u64)
}

/// Tickers from `tickers_override`, or from `[paths] tickers` and `ticker_column`.
pub fn load_tickers(
    config: &dyn ConfigPort,
    tickers_override: Option<&Path>,
) -> Result<Vec<String>, TickerScoreError> {
    let tickers_path = tickers_override
        .map(Path::to_path_buf)
        .unwrap_or_else(|| path_setting(config, "paths", "tickers", DEFAULT_TICKERS_PATH));
    let column = config.get_int("paths", "ticker_column", DEFAULT_TICKER_COLUMN as i64) as usize;
    let tickers = CsvTickerAdapter::new(tickers_path.clone(), column).load_tickers()?;
    info!("Loaded {} tickers from {}", tickers.len(), tickers_path.display());
    Ok(tickers)
}

fn run_pipeline(
    config_path: &Path,
    tickers_override: Option<&Path>,
    output: Option<&Path>,
    dry_run: bool,
) -> Result<(), TickerScoreError> {
    let config = load_config(config_path)?;
    validate_config(&config)?;
    let settings = build_pipeline_settings(&config)?;

    let tickers = load_tickers(&config, tickers_override)?;
    let checkpoints = checkpoint_store(&config);

    if dry_run {
        let checkpoint = checkpoints.load();
        let pending = checkpoint.pending(&tickers);
        eprintln!(
            "Dry run: {} tickers, {} already processed, {} pending",
            tickers.len(),
            tickers.len() - pending.len(),
            pending.len()
        );
        for ticker in pending {
            println!("{ticker}");
        }
        return Ok(());
    }

    validate_credentials(&config)?;
    let polygon = PolygonAdapter::new(
        &config
            .get_string("polygon", "base_url")
            .unwrap_or_else(|| polygon_adapter::DEFAULT_BASE_URL.to_string()),
        &api_key(&config, "polygon", "POLYGON_API_KEY")?,
        timeout(&config, "polygon", polygon_adapter::DEFAULT_TIMEOUT_SECS),
    )?;
    let model = OpenAiAdapter::new(
        &config
            .get_string("openai", "base_url")
            .unwrap_or_else(|| openai_adapter::DEFAULT_BASE_URL.to_string()),
        &api_key(&config, "openai", "OPENAI_API_KEY")?,
        &config
            .get_string("openai", "model")
            .unwrap_or_else(|| openai_adapter::DEFAULT_MODEL.to_string()),
        config.get_int("openai", "max_tokens", openai_adapter::DEFAULT_MAX_TOKENS as i64) as u32,
        timeout(&config, "openai", openai_adapter::DEFAULT_TIMEOUT_SECS),
    )?;

    let news_store = open_store(&config, "news_path", DEFAULT_NEWS_PATH)?;
    let score_store = open_store(&config, "scores_path", DEFAULT_SCORES_PATH)?;
    let polarity = VaderAdapter::new();
    let reporter = report_writer(&config, output);

    let pipeline = Pipeline {
        news: &polygon,
        indicators: &polygon,
        polarity: &polarity,
        model: &model,
        news_store: &news_store,
        score_store: &score_store,
        checkpoints: &checkpoints,
        reporter: &reporter,
        sleeper: &ThreadSleeper,
        settings,
        run_date: Utc::now().date_naive(),
    };

    let summary = pipeline.run(&tickers)?;
    info!(
        "Run complete: {} scored this run, {} tickers in report",
        summary.scored_count(),
        summary.report.len()
    );
    Ok(())
}

fn run_report(config_path: &Path, output: Option<&Path>) -> Result<(), TickerScoreError> {
    let config = load_config(config_path)?;
    let checkpoint = checkpoint_store(&config).load();
    let rows = rank(&checkpoint.report_rows);

    report_writer(&config, output).write(&rows)?;

    let score_store = open_store(&config, "scores_path", DEFAULT_SCORES_PATH)?;
    let count = score_store.count_records()?;
    match score_store.latest_date()? {
        Some(date) => eprintln!("{count} score records stored, latest from {date}"),
        None => eprintln!("No score records stored"),
    }
    Ok(())
}

fn run_history(config_path: &Path, ticker: &str) -> Result<(), TickerScoreError> {
    let config = load_config(config_path)?;
    let score_store = open_store(&config, "scores_path", DEFAULT_SCORES_PATH)?;
    let ticker = ticker.trim().to_uppercase();

    let records = score_store.records_for(&ticker)?;
    if records.is_empty() {
        eprintln!("No score records for {ticker}");
        return Ok(());
    }

    println!("date        score     vader   gpt     price     high      low       rsi     macd");
    for r in &records {
        println!(
            "{}  {:>8.4}  {:>6.2}  {:>6.2}  {:>8.2}  {:>8.2}  {:>8.2}  {:>6.2}  {:>7.3}",
            r.date,
            r.aggregated_score,
            r.vader_sentiment_sum,
            r.gpt_sentiment_sum,
            r.recent_price,
            r.historical_high,
            r.historical_low,
            r.rsi,
            r.macd
        );
    }
    eprintln!("{} records for {}", records.len(), ticker);
    Ok(())
}

fn run_classify(text: &str) -> Result<(), TickerScoreError> {
    let compound = VaderAdapter::new().compound(text);
    println!("compound: {compound}");
    println!("label:    {}", SentimentLabel::from_compound(compound));
    Ok(())
}

fn run_reset(config_path: &Path) -> Result<(), TickerScoreError> {
    let config = load_config(config_path)?;
    let checkpoints = checkpoint_store(&config);
    checkpoints.clear()?;
    eprintln!("Removed checkpoint {}", checkpoints.path().display());
    Ok(())
}

fn run_validate(config_path: &Path) -> Result<(), TickerScoreError> {
    let config = load_config(config_path)?;
    validate_config(&config)?;
    let settings = build_pipeline_settings(&config)?;

    eprintln!("Config validated successfully");
    eprintln!(
        "  fetch retry:     {} attempts, {:?}",
        settings.fetch_retry.max_attempts, settings.fetch_retry.backoff
    );
    eprintln!(
        "  sentiment retry: {} attempts, {:?}",
        settings.sentiment_retry.max_attempts, settings.sentiment_retry.backoff
    );
    eprintln!("  on_no_articles:   {:?}", settings.on_no_articles);
    eprintln!("  on_fetch_failure: {:?}", settings.on_fetch_failure);

    if let Err(e) = validate_credentials(&config) {
        eprintln!("warning: {e} (required for run)");
    }
    Ok(())
}
