use std::fs::{self, File};
use std::io::{self, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use log::LevelFilter;
use pepscrape::cache::CACHE_FILE_NAME;
use pepscrape::docs::{DOWNLOADS_DIR, DocsScraper};
use pepscrape::pep::{Execution, PepScraper};
use pepscrape::{CachedFetcher, HttpFetcher, PageFetcher, Report, ScraperError};

#[derive(Parser)]
#[command(name = "pepscrape")]
#[command(about = "A docs.python.org and PEP index scraper", long_about = None)]
struct Cli {
    #[arg(
        short = 'l',
        long = "log-level",
        value_enum,
        default_value = "info",
        global = true,
        help = "Set the logging level"
    )]
    log_level: LogLevel,

    #[arg(
        long = "log-file",
        global = true,
        help = "Also append logs to this file"
    )]
    log_file: Option<PathBuf>,

    #[arg(
        short = 'c',
        long = "clear-cache",
        global = true,
        help = "Clear the page cache before running"
    )]
    clear_cache: bool,

    #[arg(long = "no-cache", global = true, help = "Bypass the page cache entirely")]
    no_cache: bool,

    #[arg(
        short = 'o',
        long = "output",
        value_enum,
        global = true,
        help = "Output format (rows printed space-separated when omitted)"
    )]
    output: Option<OutputFormat>,

    #[arg(
        long = "base-dir",
        default_value = ".",
        global = true,
        help = "Directory for results, downloads and the page cache"
    )]
    base_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::Off,
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Box-drawn table on stdout
    Pretty,
    /// CSV file under <base-dir>/results
    File,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Count PEPs per status, verifying each against its own page
    Pep {
        #[arg(long, help = "Fetch PEP pages one at a time instead of all at once")]
        sequential: bool,
    },
    /// List the "What's New" articles with their editors
    WhatsNew,
    /// List documentation versions and their support status
    LatestVersions,
    /// Download the A4 PDF documentation archive
    Download,
}

/// Writes every byte to both sinks.
struct Tee<A, B>(A, B);

impl<A: Write, B: Write> Write for Tee<A, B> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.write_all(buf)?;
        self.1.write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.0.flush()?;
        self.1.flush()
    }
}

fn init_logging(level: LevelFilter, log_file: Option<&Path>) -> Result<(), std::io::Error> {
    let mut builder = env_logger::Builder::new();
    builder.filter_level(level);
    if let Some(path) = log_file {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        let file = File::options().create(true).append(true).open(path)?;
        builder.target(env_logger::Target::Pipe(Box::new(Tee(io::stderr(), file))));
    }
    builder.init();
    Ok(())
}

fn emit(report: &Report, output: Option<OutputFormat>, base_dir: &Path) -> Result<(), ScraperError> {
    match output {
        None => print!("{}", report.plain()),
        Some(OutputFormat::Pretty) => print!("{}", report),
        Some(OutputFormat::Json) => println!("{}", report.to_json()?),
        Some(OutputFormat::File) => {
            report.write_csv(base_dir)?;
        }
    }
    Ok(())
}

async fn run<F: PageFetcher + Sync>(
    cli: &Cli,
    fetcher: &F,
    show_progress: bool,
) -> Result<Option<Report>, ScraperError> {
    match cli.command {
        Commands::Pep { sequential } => {
            let execution = if sequential {
                Execution::Sequential
            } else {
                Execution::Concurrent
            };
            let tally = PepScraper::new(fetcher)
                .with_progress(show_progress)
                .run(execution).await?;
            Ok(Some(Report::from_tally(&tally)))
        }
        Commands::WhatsNew => {
            let articles = DocsScraper::new(fetcher)
                .with_progress(show_progress)
                .fetch_whats_new().await?;
            Ok(Some(Report::from_whats_new(&articles)))
        }
        Commands::LatestVersions => {
            let versions = DocsScraper::new(fetcher).fetch_latest_versions().await?;
            Ok(Some(Report::from_versions(&versions)))
        }
        Commands::Download => {
            DocsScraper::new(fetcher)
                .download_pdf_a4(&cli.base_dir.join(DOWNLOADS_DIR))
                .await?;
            Ok(None)
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let level: LevelFilter = cli.log_level.clone().into();
    let show_progress = level != LevelFilter::Off && io::stdout().is_terminal();
    if let Err(e) = init_logging(level, cli.log_file.as_deref()) {
        eprintln!("Error setting up logging: {}", e);
        process::exit(1);
    }
    log::info!("Scraper started");

    let http = HttpFetcher::new().unwrap_or_else(|e| {
        log::error!("Error creating HTTP client: {}", e);
        process::exit(1);
    });
    let result = if cli.no_cache {
        run(&cli, &http, show_progress).await
    } else {
        let fetcher = CachedFetcher::open(http, cli.base_dir.join(CACHE_FILE_NAME));
        if cli.clear_cache
            && let Err(e) = fetcher.clear()
        {
            log::warn!("Could not clear page cache: {}", e);
        }
        let result = run(&cli, &fetcher, show_progress).await;
        if let Err(e) = fetcher.persist() {
            log::warn!("Could not save page cache: {}", e);
        }
        result
    };

    let result = result.and_then(|report| match report {
        Some(report) => emit(&report, cli.output, &cli.base_dir),
        None => Ok(()),
    });

    match result {
        Ok(()) => log::info!("Scraper finished"),
        Err(e) => {
            log::error!("{}", e);
            process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tee_writes_to_both_sinks() {
        let mut tee = Tee(Vec::new(), Vec::new());
        writeln!(tee, "[INFO] Scraper started").unwrap();
        tee.flush().unwrap();

        assert_eq!(tee.0, b"[INFO] Scraper started\n");
        assert_eq!(tee.0, tee.1);
    }

    #[test]
    fn test_log_file_receives_records() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("logs").join("pepscrape.log");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        let file = File::options().create(true).append(true).open(&path).unwrap();

        let mut tee = Tee(io::sink(), file);
        tee.write_all(b"first\n").unwrap();
        tee.write_all(b"second\n").unwrap();
        tee.flush().unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "first\nsecond\n");
    }
}
