//! `imgprobe` command line entry point

use clap::Parser;
use imgprobe::config::Config;
use imgprobe::environment::DOCUMENT_ROOT_ENV;
use imgprobe::error::Result;
use imgprobe::pipeline::Pipeline;
use imgprobe::report::reporter_for;
use std::path::PathBuf;
use std::process;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Default log filter when neither `RUST_LOG` nor `--log-level` is given
const DEFAULT_LOG_LEVEL: &str = "warn";

/// Download images, check they are images, save them and report every step
#[derive(Debug, Parser)]
#[command(name = "imgprobe", version, about)]
struct Cli {
    /// URLs to probe (replaces the configured list)
    #[arg(value_name = "URLS")]
    urls: Vec<String>,

    /// JSON configuration file
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Report format: text, html or json
    #[arg(short = 'f', long = "format", value_name = "FORMAT")]
    format: Option<String>,

    /// Directory the images are written to
    #[arg(short = 'o', long = "output-dir", value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Per-request timeout in seconds
    #[arg(long = "timeout", value_name = "SECS")]
    timeout: Option<u64>,

    /// Web document root used to derive public paths for saved files
    #[arg(long = "document-root", env = DOCUMENT_ROOT_ENV, value_name = "DIR")]
    document_root: Option<PathBuf>,

    /// Log filter used when RUST_LOG is not set
    #[arg(long = "log-level", default_value = DEFAULT_LOG_LEVEL, value_name = "LEVEL")]
    log_level: String,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    let exit_code = match run(cli).await {
        Ok(code) => code,
        Err(err) => {
            tracing::error!(code = err.error_code(), error = %err, "run aborted");
            eprintln!("error: {err}");
            err.exit_code()
        }
    };

    if exit_code != 0 {
        process::exit(exit_code);
    }
}

async fn run(cli: Cli) -> Result<i32> {
    let config = load_config(cli)?;

    let mut reporter = reporter_for(&config.report, std::io::stdout());
    let pipeline = Pipeline::new(config)?;
    let report = pipeline.run(reporter.as_mut()).await?;

    Ok(report.summary.exit_code())
}

/// Read the configuration file (if any) and apply command line overrides
fn load_config(cli: Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::from_json_file(path)?,
        None => Config::default(),
    };

    if !cli.urls.is_empty() {
        config.urls = cli.urls;
    }
    if let Some(format) = cli.format {
        config.report.format = format.parse()?;
    }
    if let Some(dir) = cli.output_dir {
        config.output_dir = dir;
    }
    if let Some(secs) = cli.timeout {
        config.fetch.timeout = Duration::from_secs(secs);
    }
    if let Some(root) = cli.document_root.filter(|r| !r.as_os_str().is_empty()) {
        config.document_root = Some(root);
    }

    config.validate()?;
    Ok(config)
}

/// Install the stderr subscriber; `RUST_LOG` wins over `--log-level`
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL));

    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();

    if let Err(e) = installed {
        eprintln!("warning: could not install log subscriber: {e}");
    }
}
