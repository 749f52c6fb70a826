//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use leadpages_core::{GenerateConfig, GenerationReport, ProgressReporter};
use leadpages_render::{TemplateRegistry, slugify};
use leadpages_shared::{
    AppConfig, CONFIG_FILE_NAME, TemplateTag, init_config, load_config, load_config_from,
    user_config_path,
};
use tracing::info;
use url::Url;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// leadpages — landing pages from lead lists.
#[derive(Parser)]
#[command(
    name = "leadpages",
    version,
    about = "Generate per-company landing pages from CSV/TSV lead lists.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Config file (defaults to <root>/leadpages.toml, then ~/.leadpages/leadpages.toml).
    #[arg(long, env = "LEADPAGES_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Project root that relative paths in the config resolve against.
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, PartialEq, Eq, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Generate pages for one lead list, or for every configured list.
    Generate {
        /// Lead list to process, relative to the data directory.
        input: Option<PathBuf>,

        /// Base URL for the landing_page_url column.
        #[arg(env = "LEADPAGES_BASE_URL")]
        base_url: Option<String>,

        /// Leave input files untouched (archive copies are still written).
        #[arg(long)]
        no_annotate: bool,
    },

    /// Show directories, templates, and inputs the pipeline would use.
    Status,

    /// Print the slug for a company name.
    Slug {
        /// Company name or explicit slug.
        name: String,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Write a config file with defaults.
    Init {
        /// Write the user-wide file instead of the project file.
        #[arg(long)]
        user: bool,
    },
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "leadpages=info",
        1 => "leadpages=debug",
        _ => "leadpages=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let root = match &cli.root {
        Some(root) => root.clone(),
        None => std::env::current_dir()
            .map_err(|e| eyre!("cannot determine working directory: {e}"))?,
    };

    match cli.command {
        Command::Generate {
            ref input,
            ref base_url,
            no_annotate,
        } => {
            let config = resolve_config(cli.config.as_deref(), &root)?;
            cmd_generate(
                &config,
                &root,
                input.clone(),
                base_url.as_deref(),
                no_annotate,
                &cli.log_format,
            )
            .await
        }
        Command::Status => {
            let config = resolve_config(cli.config.as_deref(), &root)?;
            cmd_status(&config, &root).await
        }
        Command::Slug { ref name } => {
            println!("{}", slugify(name));
            Ok(())
        }
        Command::Config { ref action } => match action {
            ConfigAction::Init { user } => cmd_config_init(cli.config.as_deref(), &root, *user),
            ConfigAction::Show => {
                let config = resolve_config(cli.config.as_deref(), &root)?;
                println!("{}", toml::to_string_pretty(&config)?);
                Ok(())
            }
        },
    }
}

fn resolve_config(explicit: Option<&Path>, root: &Path) -> Result<AppConfig> {
    let config = match explicit {
        Some(path) => load_config_from(path)?,
        None => load_config(root)?,
    };
    config.validate()?;
    Ok(config)
}

// ---------------------------------------------------------------------------
// generate
// ---------------------------------------------------------------------------

async fn cmd_generate(
    config: &AppConfig,
    root: &Path,
    input: Option<PathBuf>,
    base_url: Option<&str>,
    no_annotate: bool,
    log_format: &LogFormat,
) -> Result<()> {
    let mut generate_config = GenerateConfig::from_app(config, root);
    generate_config.input = input;
    if let Some(base_url) = base_url {
        generate_config.base_url = base_url.to_string();
    }
    if no_annotate {
        generate_config.annotate_source = false;
    }

    let parsed = Url::parse(&generate_config.base_url)
        .map_err(|e| eyre!("invalid base URL '{}': {e}", generate_config.base_url))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(eyre!(
            "base URL '{}' must use http or https",
            generate_config.base_url
        ));
    }

    info!(
        root = %root.display(),
        base_url = %generate_config.base_url,
        input = ?generate_config.input,
        "starting landing page generation"
    );

    let reporter = CliProgress::new();
    let report = leadpages_core::generate(&generate_config, &reporter).await?;

    if *log_format == LogFormat::Json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_summary(&report);
    }

    Ok(())
}

fn print_summary(report: &GenerationReport) {
    println!();
    println!("  Landing page generation complete!");
    for file in &report.files {
        println!(
            "  {:<24} {} generated, {} failed",
            file.file, file.generated, file.failed
        );
        match (&file.archive, &file.archive_error) {
            (Some(archived), _) => println!("    archived: {}", archived.archive_path.display()),
            (None, Some(err)) => println!("    archive failed: {err}"),
            (None, None) => {}
        }
    }
    let usage: Vec<String> = report
        .template_usage
        .iter()
        .map(|(tag, count)| format!("{tag}: {count}"))
        .collect();
    println!(
        "  Templates: {}",
        if usage.is_empty() {
            "none".to_string()
        } else {
            usage.join(", ")
        }
    );
    println!("  Assets:    {} file(s)", report.assets_copied);
    println!("  Output:    {}", report.output_dir.display());
    println!(
        "  Time:      {:.1}s",
        report.elapsed_ms as f64 / 1000.0
    );
    println!();
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn file_started(&self, file: &str, rows: usize) {
        self.spinner
            .set_message(format!("Processing {rows} row(s) from {file}"));
    }

    fn row_generated(&self, slug: &str, tag: &TemplateTag, current: usize, total: usize) {
        self.spinner
            .set_message(format!("[{current}/{total}] /{slug}/ ({tag})"));
    }

    fn row_failed(&self, identifier: &str, current: usize, total: usize) {
        self.spinner
            .set_message(format!("[{current}/{total}] failed: {identifier}"));
    }

    fn done(&self, _report: &GenerationReport) {
        self.spinner.finish_and_clear();
    }
}

// ---------------------------------------------------------------------------
// status
// ---------------------------------------------------------------------------

async fn cmd_status(config: &AppConfig, root: &Path) -> Result<()> {
    let paths = config.resolve_paths(root);
    let registry = TemplateRegistry::new(&paths.templates_dir, config.template_table());

    println!();
    println!("  Pipeline: lead lists -> templates -> pages -> annotated lists -> archive");
    println!();
    println!("  Data:      {}", marked(&paths.data_dir).await);
    println!("  Templates: {}", marked(registry.dir()).await);
    println!("  Assets:    {}", marked(&paths.assets_dir).await);
    println!("  Output:    {}", paths.output_dir.display());
    println!("  Archive:   {}", paths.archive_dir.display());
    println!("  Base URL:  {}", config.site.base_url);
    println!(
        "  Annotate:  {}",
        if config.site.annotate_source { "yes" } else { "no" }
    );

    println!();
    println!("  Templates (default: {}):", config.templates.default);
    for (tag, path) in registry.entries() {
        println!("    {:<16} {}", tag.as_str(), marked(&path).await);
    }

    println!();
    println!("  Inputs:");
    for input in &config.inputs {
        let path = paths.data_dir.join(&input.file);
        println!(
            "    {:<24} -> {:<16} {}",
            input.file,
            input.template,
            marked(&path).await
        );
    }
    println!();

    Ok(())
}

async fn marked(path: &Path) -> String {
    let state = if tokio::fs::try_exists(path).await.unwrap_or(false) {
        "ok"
    } else {
        "missing"
    };
    format!("{} [{state}]", path.display())
}

// ---------------------------------------------------------------------------
// config
// ---------------------------------------------------------------------------

fn cmd_config_init(explicit: Option<&Path>, root: &Path, user: bool) -> Result<()> {
    let path = match (explicit, user) {
        (Some(path), _) => path.to_path_buf(),
        (None, true) => user_config_path()?,
        (None, false) => root.join(CONFIG_FILE_NAME),
    };
    init_config(&path)?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}
