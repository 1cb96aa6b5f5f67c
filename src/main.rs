//! Sumi-Mirror main entry point
//!
//! This is the command-line interface for the Sumi-Mirror website importer.

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use sumi_mirror::config::{load_config_with_hash, Config};
use sumi_mirror::crawler::{detect_internal_pages, Coordinator};
use sumi_mirror::output::{DirectoryOutput, JsonOutput, OutputHandler, Report};
use sumi_mirror::Importer;
use tracing_subscriber::EnvFilter;
use url::Url;

/// Sumi-Mirror: a website mirroring and import tool
///
/// Sumi-Mirror fetches a page and its stylesheets, inlines what it can,
/// strips trackers, and repairs the markup into a self-contained document.
/// It can also analyze a page's design or mirror a whole site.
#[derive(Parser, Debug)]
#[command(name = "sumi-mirror")]
#[command(version)]
#[command(about = "Mirror and analyze websites", long_about = None)]
struct Cli {
    /// URL to import, or an HTML file with --html
    #[arg(value_name = "TARGET")]
    target: String,

    /// Treat TARGET as a local HTML file
    #[arg(long)]
    html: bool,

    /// Source URL of a local HTML file, used to resolve relative references
    #[arg(long, value_name = "URL", requires = "html")]
    source_url: Option<String>,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Print a design analysis instead of the import result
    #[arg(long, conflicts_with_all = ["crawl", "pages"])]
    analyze: bool,

    /// Import the page and the internal pages it links to
    #[arg(long, conflicts_with_all = ["analyze", "pages", "html"])]
    crawl: bool,

    /// Only list the internal pages linked from TARGET
    #[arg(long, conflicts_with_all = ["analyze", "crawl"])]
    pages: bool,

    /// Write mirrored pages and result.json into this directory
    #[arg(short, long, value_name = "DIR")]
    out: Option<PathBuf>,

    /// Show the resolved configuration and exit
    #[arg(long)]
    dry_run: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => Config::default(),
    };

    if cli.dry_run {
        handle_dry_run(&cli, &config)?;
        return Ok(ExitCode::SUCCESS);
    }

    let report = run(&cli, &config).await?;

    let mut output: Box<dyn OutputHandler> = match &cli.out {
        Some(dir) => Box::new(DirectoryOutput::new(dir)),
        None => Box::new(JsonOutput::new(std::io::stdout().lock(), true)),
    };
    output.emit(&report).context("Failed to write output")?;

    let errors = report.error_count();
    if errors > 0 {
        tracing::warn!("Finished with {} errors", errors);
        return Ok(ExitCode::from(2));
    }
    Ok(ExitCode::SUCCESS)
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// Logs go to stderr so JSON on stdout stays parseable.
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sumi_mirror=info,warn"),
            1 => EnvFilter::new("sumi_mirror=debug,info"),
            2 => EnvFilter::new("sumi_mirror=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Runs the selected mode and returns its report
async fn run(cli: &Cli, config: &Config) -> anyhow::Result<Report> {
    let importer = Importer::new(config).context("Failed to set up the importer")?;

    if cli.html {
        let html = std::fs::read_to_string(&cli.target)
            .with_context(|| format!("Failed to read {}", cli.target))?;
        let options = match &cli.source_url {
            Some(url) => importer.options().with_source_url(url),
            None => importer.options().clone(),
        };

        return Ok(if cli.analyze {
            Report::Analysis(Box::new(importer.analyze_html(&html, &options).await?))
        } else if cli.pages {
            let source = options
                .source_url
                .as_deref()
                .context("--pages with --html needs --source-url")?;
            let source = Url::parse(source).context("Invalid --source-url")?;
            Report::Pages(detect_internal_pages(&html, &source))
        } else {
            Report::Import(importer.import_html(&html, &options).await?)
        });
    }

    let target = Url::parse(&cli.target).with_context(|| format!("Invalid URL: {}", cli.target))?;

    if cli.analyze {
        Ok(Report::Analysis(Box::new(importer.analyze_url(target.as_str()).await?)))
    } else if cli.crawl {
        let coordinator = Coordinator::new(&importer, config.crawl.clone());
        Ok(Report::Site(coordinator.crawl_site(target.as_str()).await?))
    } else if cli.pages {
        let page = importer
            .fetch_page(target.as_str())
            .await
            .with_context(|| format!("Failed to fetch {}", target))?;
        let source = Url::parse(&page.final_url)?;
        Ok(Report::Pages(detect_internal_pages(&page.text(), &source)))
    } else {
        Ok(Report::Import(importer.import_url(target.as_str()).await?))
    }
}

/// Handles the --dry-run mode: shows the resolved configuration
fn handle_dry_run(cli: &Cli, config: &Config) -> anyhow::Result<()> {
    println!("=== Sumi-Mirror Dry Run ===\n");

    let mode = if cli.analyze {
        "analyze"
    } else if cli.crawl {
        "crawl"
    } else if cli.pages {
        "pages"
    } else {
        "import"
    };
    println!("Target: {} ({})", cli.target, if cli.html { "file" } else { "url" });
    println!("Mode: {}", mode);
    match &config.fetch.proxy_url {
        Some(proxy) => println!("Fetching through proxy: {}", proxy),
        None => println!("Fetching directly"),
    }
    if let Some(dir) = &cli.out {
        println!("Output directory: {}", dir.display());
    }

    println!("\nResolved configuration:\n");
    println!("{}", toml::to_string_pretty(config).context("Failed to render configuration")?);

    println!("✓ Configuration is valid");
    Ok(())
}
