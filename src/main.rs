use anyhow::Context;
use clap::error::ErrorKind;
use clap::Parser;
use ks_rulecheck::batch::BatchValidator;
use ks_rulecheck::config::{OutputFormat, Settings};
use ks_rulecheck::input::{load_rules, LineFilter, RuleSource};
use ks_rulecheck::report::{ReportWriter, ValidationStats};
use ks_rulecheck::RuleCheckError;
use std::io::{self, BufWriter};
use std::path::PathBuf;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "ks-rulecheck")]
#[command(author = "KS-Sniff Contributors")]
#[command(version)]
#[command(about = "A simple dumbpig-like snort/suricata rules checker", long_about = None)]
struct Cli {
    /// Rules file name, use dash (-) for stdin
    #[arg(short, long, value_name = "FILE", required_unless_present = "generate_config")]
    filename: Option<String>,

    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum)]
    format: Option<FormatArg>,

    /// Number of worker threads (0 = auto)
    #[arg(short, long)]
    jobs: Option<usize>,

    /// Do not print rules without findings
    #[arg(long)]
    quiet_ok: bool,

    /// Print a summary to stderr when done
    #[arg(long)]
    stats: bool,

    /// Skip comment and blank lines instead of reporting them
    #[arg(long)]
    skip_comments: bool,

    /// Generate default configuration file
    #[arg(long)]
    generate_config: bool,

    /// Verbose logging (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode (errors only)
    #[arg(short, long)]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum FormatArg {
    Text,
    Json,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Text => OutputFormat::Text,
            FormatArg::Json => OutputFormat::Json,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => e.exit(),
        Err(e) => {
            eprintln!("{}", e);
            eprintln!("Use '-h' option for help");
            std::process::exit(1);
        }
    };

    if cli.generate_config {
        generate_default_config()?;
        return Ok(());
    }

    let mut settings = match load_config(&cli) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("{:#}", e);
            std::process::exit(1);
        }
    };

    init_logging(&cli, &settings);

    info!("Starting ks-rulecheck v{}", env!("CARGO_PKG_VERSION"));

    // CLI arguments override the config file
    if let Some(format) = cli.format {
        settings.output.format = format.into();
    }
    if let Some(jobs) = cli.jobs {
        settings.validation.worker_threads = jobs;
    }
    settings.output.quiet_ok |= cli.quiet_ok;
    settings.output.stats |= cli.stats;
    if cli.skip_comments {
        settings.validation.skip_comments = true;
        settings.validation.skip_blank = true;
    }

    settings.validate().context("Invalid configuration")?;

    let filename = cli
        .filename
        .as_deref()
        .context("No rules file given, use -f <FILE> or -f - for stdin")?;
    let source = RuleSource::from_arg(filename);

    if let Err(e) = run(&settings, &source) {
        if let Some(RuleCheckError::InputError(msg)) = e.downcast_ref::<RuleCheckError>() {
            eprintln!("{}", msg);
            std::process::exit(2);
        }
        error!("Rule check failed: {:#}", e);
        return Err(e);
    }

    Ok(())
}

fn run(settings: &Settings, source: &RuleSource) -> anyhow::Result<()> {
    let filter = LineFilter {
        skip_comments: settings.validation.skip_comments,
        skip_blank: settings.validation.skip_blank,
    };
    let lines = load_rules(source, filter)?;

    let validator = BatchValidator::new(
        settings.validation.worker_threads,
        settings.validation.queue_size,
    );
    let results = validator.validate(lines).context("Failed to check rules")?;

    let stdout = io::stdout();
    let mut writer = ReportWriter::new(
        BufWriter::new(stdout.lock()),
        settings.output.format,
        settings.output.quiet_ok,
    );
    writer
        .write_all(&results)
        .context("Failed to write results")?;

    let stats = ValidationStats::from_results(&results);
    info!(
        worst = %stats.worst(),
        "Checked {} rules: ok={}, warnings={}, errors={}",
        stats.total, stats.ok, stats.warnings, stats.errors
    );

    if settings.output.stats {
        eprint!("{}", stats);
    }

    Ok(())
}

fn init_logging(cli: &Cli, settings: &Settings) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;
    use tracing_subscriber::{fmt, EnvFilter};

    let log_level = if cli.quiet {
        "error".to_string()
    } else {
        match cli.verbose {
            0 => settings.logging.level.to_ascii_lowercase(),
            1 => "debug".to_string(),
            _ => "trace".to_string(),
        }
    };

    let filter_string = format!("ks_rulecheck={}", log_level);

    // RUST_LOG, when set, wins over flags and settings
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&filter_string))
    } else {
        EnvFilter::new(&filter_string)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(io::stderr).with_target(true))
        .init();
}

fn load_config(cli: &Cli) -> anyhow::Result<Settings> {
    if let Some(config_path) = &cli.config {
        return Settings::from_file(config_path).context("Failed to load configuration file");
    }

    let default_paths = [
        PathBuf::from("ks-rulecheck.yaml"),
        PathBuf::from("config/ks-rulecheck.yaml"),
        PathBuf::from("/etc/ks-rulecheck/ks-rulecheck.yaml"),
    ];

    for path in default_paths {
        if path.exists() {
            return Settings::from_file(&path)
                .with_context(|| format!("Failed to load configuration from {:?}", path));
        }
    }

    Ok(Settings::default_config())
}

fn generate_default_config() -> anyhow::Result<()> {
    let config = Settings::default_config();
    let yaml = serde_yaml::to_string(&config).context("Failed to serialize config")?;

    let output_path = PathBuf::from("ks-rulecheck.yaml");
    std::fs::write(&output_path, yaml).context("Failed to write config file")?;

    println!("Generated default configuration at: {:?}", output_path);
    Ok(())
}
