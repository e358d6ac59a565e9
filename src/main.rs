// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result, anyhow};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, info, warn};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use zhlesson::app_config::{self, Config, TranslationProvider};
use zhlesson::database::{DatabaseConnection, LessonStore, Repository};
use zhlesson::dictionary::{CedictOptions, cedict};
use zhlesson::ingest::{Ingestor, SrtIngestRequest, TextIngestRequest};
use zhlesson::lesson::IngestOutcome;

/// CLI Wrapper for TranslationProvider to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliTranslationProvider {
    Ollama,
    Anthropic,
}

impl From<CliTranslationProvider> for TranslationProvider {
    fn from(cli_provider: CliTranslationProvider) -> Self {
        match cli_provider {
            CliTranslationProvider::Ollama => TranslationProvider::Ollama,
            CliTranslationProvider::Anthropic => TranslationProvider::Anthropic,
        }
    }
}

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

/// Options shared by both ingest commands
#[derive(Parser, Debug)]
struct IngestArgs {
    /// Source unit name (defaults to the file name)
    #[arg(short, long)]
    name: Option<String>,

    /// Source language code (must be Chinese, e.g. 'zh', 'zh-TW')
    #[arg(short, long)]
    source_language: Option<String>,

    /// Target language code for translations (e.g. 'en', 'fr')
    #[arg(short, long)]
    target_language: Option<String>,

    /// Skip machine translation
    #[arg(long)]
    no_translate: bool,

    /// Translation provider to use
    #[arg(short, long, value_enum)]
    provider: Option<CliTranslationProvider>,

    /// Model name to use for translation
    #[arg(short, long)]
    model: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Ingest a plain text file as one lesson
    IngestText {
        /// Text file to ingest
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Lesson title (defaults to the file stem)
        #[arg(long)]
        title: Option<String>,

        #[command(flatten)]
        args: IngestArgs,
    },

    /// Ingest an SRT subtitle file as one lesson
    IngestSrt {
        /// SRT file to ingest
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Lesson title (defaults to the file stem)
        #[arg(long)]
        title: Option<String>,

        /// Audio URL stored with the lesson
        #[arg(long)]
        audio_url: Option<String>,

        #[command(flatten)]
        args: IngestArgs,
    },

    /// Import a CC-CEDICT file into the dictionary
    ImportCedict {
        /// CEDICT file (defaults to dictionary.cedict_path from the config)
        #[arg(value_name = "FILE")]
        input: Option<PathBuf>,

        /// Keep CL: classifier glosses
        #[arg(long)]
        keep_classifiers: bool,

        /// Stop after this many entry lines
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Print a stored lesson as JSON
    Show {
        id: Uuid,
    },

    /// List stored lessons
    List,

    /// Delete a stored lesson
    Delete {
        id: Uuid,
    },

    /// Generate shell completions for zhlesson
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// zhlesson - Chinese lessons from text and subtitles
///
/// Segments Chinese text into sentences, matches words against CC-CEDICT and
/// stores the result, with optional machine translations, as a lesson.
#[derive(Parser, Debug)]
#[command(name = "zhlesson")]
#[command(version)]
#[command(about = "Build Chinese reading lessons from text and SRT files")]
#[command(long_about = "zhlesson turns Chinese text and subtitle files into lessons.

EXAMPLES:
    zhlesson import-cedict cedict_ts.u8            # Load the dictionary
    zhlesson ingest-text story.txt --title Story   # Ingest a text file
    zhlesson ingest-srt ep01.srt -t fr             # Ingest subtitles, translate to French
    zhlesson ingest-srt ep01.srt --no-translate    # Ingest without translations
    zhlesson list                                  # List lessons
    zhlesson show <ID>                             # Print a lesson as JSON
    zhlesson completions bash > zhlesson.bash      # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config. If the config file doesn't exist, a default one
    will be created automatically.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json", global = true)]
    config_path: String,

    /// Database file (overrides the config)
    #[arg(long, global = true)]
    database: Option<PathBuf>,

    /// Set logging level
    #[arg(short, long, value_enum, global = true)]
    log_level: Option<CliLogLevel>,
}

struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    fn color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "1;31",
            Level::Warn => "1;33",
            Level::Info => "1;32",
            Level::Debug => "1;36",
            Level::Trace => "1;35",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let mut stderr = std::io::stderr();
            let _ = writeln!(
                stderr,
                "\x1B[{}m{} {:<5} {}\x1B[0m",
                Self::color_for_level(record.level()),
                now,
                record.level(),
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Trace here so the runtime level can go up later; set_max_level filters
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();

    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = CommandLineOptions::command();
        generate(*shell, &mut cmd, "zhlesson", &mut std::io::stdout());
        return Ok(());
    }

    let mut config = Config::load_or_create(&cli.config_path)?;
    if let Some(log_level) = &cli.log_level {
        config.log_level = log_level.clone().into();
    }
    if let Some(database) = &cli.database {
        config.database_path = Some(database.clone());
    }
    log::set_max_level((&config.log_level).into());

    match cli.command {
        Commands::IngestText { input, title, args } => {
            apply_ingest_overrides(&mut config, &args);
            config.validate().context("Configuration validation failed")?;
            let text = std::fs::read_to_string(&input)
                .with_context(|| format!("Failed to read text file: {:?}", input))?;

            let mut request = TextIngestRequest::new(title.unwrap_or_else(|| file_stem(&input)), text);
            request.name = args.name.or_else(|| file_name(&input));
            request.source_language = config.source_language.clone();
            request.target_language = config.target_language.clone();
            request.translate = !args.no_translate;

            let (ingestor, cancel) = build_ingestor(&config).await?;
            let outcome = ingestor.ingest_text(request, &cancel).await?;
            print_outcome(&outcome)
        }
        Commands::IngestSrt { input, title, audio_url, args } => {
            apply_ingest_overrides(&mut config, &args);
            config.validate().context("Configuration validation failed")?;
            let bytes = std::fs::read(&input).with_context(|| format!("Failed to read SRT file: {:?}", input))?;

            let mut request = SrtIngestRequest::from_bytes(title.unwrap_or_else(|| file_stem(&input)), &bytes);
            request.file_name = file_name(&input);
            request.name = args.name;
            request.source_language = config.source_language.clone();
            request.target_language = config.target_language.clone();
            request.translate = !args.no_translate;
            request.audio_url = audio_url;

            let (ingestor, cancel) = build_ingestor(&config).await?;
            let outcome = ingestor.ingest_srt(request, &cancel).await?;
            print_outcome(&outcome)
        }
        Commands::ImportCedict { input, keep_classifiers, limit } => {
            let path = input
                .or_else(|| config.dictionary.cedict_path.clone())
                .ok_or_else(|| anyhow!("No CEDICT file given and dictionary.cedict_path is not set"))?;
            let file = std::fs::File::open(&path).with_context(|| format!("Failed to open CEDICT file: {:?}", path))?;
            let entries = cedict::parse_reader(std::io::BufReader::new(file), &CedictOptions { keep_classifiers, limit })?;

            let repository = open_repository(&config)?;
            let summary = repository.import_lemmas(entries).await?;
            println!(
                "{} lemmas added, {} updated, {} senses",
                summary.inserted, summary.updated, summary.senses
            );
            Ok(())
        }
        Commands::Show { id } => {
            let repository = open_repository(&config)?;
            let lesson = repository
                .get_lesson(id)
                .await?
                .ok_or_else(|| anyhow!("Lesson not found: {}", id))?;
            println!("{}", serde_json::to_string_pretty(&lesson)?);
            Ok(())
        }
        Commands::List => {
            let repository = open_repository(&config)?;
            for lesson in repository.list_lessons().await? {
                println!(
                    "{}  {}  {} sentences  {} -> {}  {}",
                    lesson.id,
                    lesson.created_at.format("%Y-%m-%d %H:%M"),
                    lesson.sentence_count,
                    lesson.source_language,
                    lesson.target_language,
                    lesson.title
                );
            }
            info!("{}", repository.connection().stats()?);
            Ok(())
        }
        Commands::Delete { id } => {
            let repository = open_repository(&config)?;
            if !repository.delete_lesson(id).await? {
                return Err(anyhow!("Lesson not found: {}", id));
            }
            println!("Deleted {}", id);
            Ok(())
        }
        Commands::Completions { .. } => Ok(()),
    }
}

fn apply_ingest_overrides(config: &mut Config, args: &IngestArgs) {
    if let Some(provider) = &args.provider {
        config.translation.provider = provider.clone().into();
    }

    if let Some(model) = &args.model {
        let provider_str = config.translation.provider.to_lowercase_string();
        if let Some(provider_config) = config
            .translation
            .available_providers
            .iter_mut()
            .find(|p| p.provider_type == provider_str)
        {
            provider_config.model = model.clone();
        }
    }

    if let Some(source_lang) = &args.source_language {
        config.source_language = source_lang.clone();
    }

    if let Some(target_lang) = &args.target_language {
        config.target_language = target_lang.clone();
    }

    if args.no_translate {
        config.translation.enabled = false;
    }
}

fn open_repository(config: &Config) -> Result<Repository> {
    let db = DatabaseConnection::new(config.database_path()?)?;
    Ok(Repository::new(db))
}

/// Ingestor over the stored dictionary, plus a token cancelled by Ctrl-C
async fn build_ingestor(config: &Config) -> Result<(Ingestor, CancellationToken)> {
    let repository = open_repository(config)?;
    let dictionary = repository.load_dictionary().await?;
    if dictionary.is_empty() {
        warn!("Dictionary is empty, every character will be unknown. Run import-cedict first.");
    }

    let mut ingestor = Ingestor::new(Arc::new(dictionary), Arc::new(repository)).with_options(config.ingest_options());
    if let Some(translator) = config.build_translator() {
        info!(
            "Translating with {} ({})",
            config.translation.provider.display_name(),
            config.translation.get_model()
        );
        ingestor = ingestor.with_translator(translator);
    }

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling ingestion");
            on_signal.cancel();
        }
    });

    Ok((ingestor, cancel))
}

fn print_outcome(outcome: &IngestOutcome) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(outcome)?);
    Ok(())
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "Untitled".to_string())
}

fn file_name(path: &Path) -> Option<String> {
    path.file_name().map(|s| s.to_string_lossy().into_owned())
}
