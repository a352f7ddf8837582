#![warn(missing_docs)]
//! Cadence CLI Library
//!
//! Command-line harness for benchmark binaries. Call [`run`] (re-exported as
//! `cadence::run`) from `main` with the function that registers your cases.
//!
//! # Example
//!
//! ```ignore
//! fn main() {
//!     if let Err(e) = cadence_cli::run(|api| {
//!         api.bench("sum", || {
//!             let _ = (0..100u64).sum::<u64>();
//!         });
//!     }) {
//!         eprintln!("Error: {}", e);
//!         std::process::exit(1);
//!     }
//! }
//! ```

mod config;
mod profile;

pub use config::{CONFIG_FILE, CadenceConfig, ConfigError, OutputConfig, ProfileConfig};
pub use profile::{ProfileRecord, ProfileWriter, sanitize_file_name};

use anyhow::Context;
use cadence_core::{
    BenchmarkOptions, NamePattern, Options, ProfileMiddleware, RunSummary, Suite, benchmark,
    parse_duration,
};
use cadence_report::{DEFAULT_REPORTER, REPORTERS, ReporterFactory, find_reporter};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Cadence CLI arguments
#[derive(Parser, Debug)]
#[command(name = "cadence")]
#[command(author, version, about = "Cadence - benchmark suites for Rust")]
pub struct Cli {
    /// Run only cases whose name matches this pattern (same as --grep)
    pub filter: Option<String>,

    /// Run a subset of benchmarks (case-insensitive regex)
    #[arg(short, long)]
    pub grep: Option<String>,

    /// Reporter to use
    #[arg(short = 'R', long)]
    pub reporter: Option<String>,

    /// Display available reporters
    #[arg(long)]
    pub reporters: bool,

    /// Profile cases, optionally only those matching a pattern
    #[arg(long)]
    pub profile: Option<Option<String>>,

    /// Directory for profile output
    #[arg(long)]
    pub profile_dir: Option<PathBuf>,

    /// Upper bound on measuring time per case (e.g. "500ms", "2s")
    #[arg(long, value_parser = parse_duration)]
    pub max_time: Option<Duration>,

    /// Minimum number of samples per case
    #[arg(long)]
    pub min_samples: Option<u64>,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Internal: Absorb cargo bench's --bench flag
    #[arg(long, hide = true)]
    pub bench: bool,
}

impl Cli {
    /// The registration filter, `--grep` taking precedence over the positional filter
    pub fn pattern(&self) -> Option<&str> {
        self.grep.as_deref().or(self.filter.as_deref())
    }
}

/// Run the Cadence CLI with the given registration function.
/// This is the main entry point for benchmark binaries.
///
/// Exits the process with status 1 when any case reported a measurement
/// error. An aborted run is returned as an error.
pub fn run<F>(prepare: F) -> anyhow::Result<()>
where
    F: FnOnce(&Suite) + Send + 'static,
{
    let cli = Cli::parse();
    if let Some(summary) = run_with_cli(cli, prepare)? {
        if !summary.is_success() {
            std::process::exit(1);
        }
    }
    Ok(())
}

/// Run with pre-parsed arguments.
///
/// Returns `None` when nothing was benchmarked (`--reporters`).
pub fn run_with_cli<F>(cli: Cli, prepare: F) -> anyhow::Result<Option<RunSummary>>
where
    F: FnOnce(&Suite) + Send + 'static,
{
    init_logging(cli.verbose);

    if cli.reporters {
        print!("{}", list_reporters());
        return Ok(None);
    }

    // Discover cadence.toml configuration (CLI flags override)
    let config = CadenceConfig::discover()?.unwrap_or_default();
    let options = benchmark_options(&cli, &config, prepare)?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start the async runtime")?;
    let summary = runtime.block_on(benchmark(options))?;

    Ok(Some(summary))
}

fn init_logging(verbose: bool) {
    let default = if verbose { "cadence=debug" } else { "cadence=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    // A subscriber may already be installed by the host program.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// One line per reporter: right-aligned name and description
pub fn list_reporters() -> String {
    REPORTERS
        .iter()
        .map(|factory| format!("{:>15} - {}\n", factory.name, factory.description))
        .collect()
}

/// Reporter named on the command line, else in the config file, else the default
pub fn select_reporter(
    cli: &Cli,
    config: &CadenceConfig,
) -> anyhow::Result<&'static ReporterFactory> {
    let name = cli
        .reporter
        .as_deref()
        .or(config.output.reporter.as_deref())
        .unwrap_or(DEFAULT_REPORTER);
    find_reporter(name).with_context(|| {
        let known: Vec<_> = REPORTERS.iter().map(|f| f.name).collect();
        format!("unknown reporter `{name}` (available: {})", known.join(", "))
    })
}

/// Root options: the config file's `[options]` table with CLI overrides applied
pub fn root_options(cli: &Cli, config: &CadenceConfig) -> anyhow::Result<Options> {
    let mut overrides = Options::new();
    if let Some(max_time) = cli.max_time {
        overrides = overrides.with_max_time(max_time);
    }
    if let Some(min_samples) = cli.min_samples {
        overrides = overrides.with_min_samples(min_samples);
    }
    Ok(config.root_options()?.assign(&overrides))
}

/// Profiling middleware, when `--profile` was given
pub fn profile_middleware(
    cli: &Cli,
    config: &CadenceConfig,
) -> anyhow::Result<Option<ProfileMiddleware>> {
    let Some(include) = &cli.profile else {
        return Ok(None);
    };

    let directory = cli
        .profile_dir
        .clone()
        .unwrap_or_else(|| config.profile.directory.clone());
    let mut middleware = ProfileMiddleware::wall_clock(Arc::new(ProfileWriter::new(&directory)));

    if let Some(pattern) = include.as_deref().or(config.profile.include.as_deref()) {
        middleware = middleware.include(NamePattern::regex(pattern)?);
    }
    tracing::debug!(directory = %directory.display(), "Profiling enabled");
    Ok(Some(middleware))
}

fn benchmark_options<F>(
    cli: &Cli,
    config: &CadenceConfig,
    prepare: F,
) -> anyhow::Result<BenchmarkOptions>
where
    F: FnOnce(&Suite) + Send + 'static,
{
    let reporter = (select_reporter(cli, config)?.start)();
    let mut options = BenchmarkOptions::new(reporter, prepare).defaults(root_options(cli, config)?);

    if let Some(pattern) = cli.pattern() {
        options = options.grep(NamePattern::regex(pattern)?);
    }
    if let Some(profiler) = profile_middleware(cli, config)? {
        options = options.middleware(profiler);
    }
    Ok(options)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("bench").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_parse_flags() {
        let cli = parse(&["-g", "sort", "-R", "json", "--max-time", "250ms", "--bench"]);
        assert_eq!(cli.pattern(), Some("sort"));
        assert_eq!(cli.reporter.as_deref(), Some("json"));
        assert_eq!(cli.max_time, Some(Duration::from_millis(250)));
        assert!(cli.bench);
        assert!(cli.profile.is_none());
    }

    #[test]
    fn test_positional_filter() {
        assert_eq!(parse(&["vec"]).pattern(), Some("vec"));
        assert_eq!(parse(&["vec", "--grep", "map"]).pattern(), Some("map"));
    }

    #[test]
    fn test_profile_flag_pattern_is_optional() {
        assert_eq!(parse(&["--profile"]).profile, Some(None));
        assert_eq!(
            parse(&["--profile", "parse"]).profile,
            Some(Some("parse".to_string()))
        );
    }

    #[test]
    fn test_bad_duration_is_rejected() {
        assert!(Cli::try_parse_from(["bench", "--max-time", "soon"]).is_err());
    }

    #[test]
    fn test_reporter_precedence() {
        let mut config = CadenceConfig::default();
        assert_eq!(select_reporter(&parse(&[]), &config).unwrap().name, "pretty");

        config.output.reporter = Some("csv".to_string());
        assert_eq!(select_reporter(&parse(&[]), &config).unwrap().name, "csv");
        assert_eq!(
            select_reporter(&parse(&["-R", "json-summary"]), &config).unwrap().name,
            "json-summary"
        );

        let err = select_reporter(&parse(&["-R", "html"]), &config).unwrap_err();
        assert!(err.to_string().contains("unknown reporter `html`"));
    }

    #[test]
    fn test_cli_overrides_config_options() {
        let config: CadenceConfig =
            toml::from_str("[options]\nmax_time = 3\nmin_samples = 8\n").unwrap();
        let options = root_options(&parse(&["--max-time", "1s"]), &config).unwrap();

        assert_eq!(options.max_time(), Some(Duration::from_secs(1)));
        assert_eq!(options.min_samples(), Some(8));
    }

    #[test]
    fn test_profile_middleware_only_when_requested() {
        let config = CadenceConfig::default();
        assert!(profile_middleware(&parse(&[]), &config).unwrap().is_none());
        assert!(profile_middleware(&parse(&["--profile"]), &config).unwrap().is_some());
        assert!(profile_middleware(&parse(&["--profile", "("]), &config).is_err());
    }

    #[test]
    fn test_list_reporters() {
        let listing = list_reporters();
        assert_eq!(listing.lines().count(), REPORTERS.len());
        assert!(listing.contains("         pretty - Pretty prints results to the console"));
    }

    #[test]
    fn test_reporters_flag_runs_nothing() {
        let summary = run_with_cli(parse(&["--reporters"]), |_| {
            panic!("registration must not run");
        })
        .unwrap();
        assert!(summary.is_none());
    }
}
