use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{CommandFactory, Parser};
use clap_complete::Shell;
use owo_colors::OwoColorize;
use threadwatch_core::fetch::DEFAULT_PROBE_PAGE;
use threadwatch_core::notify::ntfy::DEFAULT_NTFY_SERVER;
use threadwatch_core::{
    Document, FetchConfig, HttpPageSource, LogNotifier, MAX_STORED_MESSAGES, Monitor, MonitorConfig, NotifierSet,
    NtfyNotifier, OutboxNotifier, SiteLayout, ThreadListParser, ThreadStyle, ThreadTarget, extract_messages,
};
use tracing_subscriber::EnvFilter;

mod echo;

use echo::{format_size, print_banner, print_info, print_step, print_success, print_summary, print_warning};

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Poll forum threads and deliver the messages posted since the last run
#[derive(Parser, Debug)]
#[command(name = "threadwatch")]
#[command(author = "threadwatch contributors")]
#[command(version)]
#[command(about = "Poll forum threads and deliver newly posted messages", long_about = None)]
struct Args {
    /// Thread list, one `title|url|message bg|reply bg|spoiler bg` per line
    #[arg(long, default_value = "threads.txt", value_name = "FILE")]
    threads: PathBuf,

    /// Seen-message store
    #[arg(long, default_value = "last.txt", value_name = "FILE")]
    store: PathBuf,

    /// Number of most recent pages scanned per thread
    #[arg(long, default_value = "3", value_name = "NUM")]
    pages: u32,

    /// Maximum number of message ids kept in the store
    #[arg(long, default_value_t = MAX_STORED_MESSAGES, value_name = "NUM")]
    max_stored: usize,

    /// HTTP timeout in seconds
    #[arg(long, default_value = "30", value_name = "SECS")]
    timeout: u64,

    /// Custom User-Agent for HTTP requests
    #[arg(long, value_name = "UA")]
    user_agent: Option<String>,

    /// ntfy topic for push notifications
    #[arg(long, env = "NTFY_TOPIC", value_name = "TOPIC")]
    ntfy_topic: Option<String>,

    /// ntfy server
    #[arg(long, env = "NTFY_SERVER", default_value = DEFAULT_NTFY_SERVER, value_name = "URL")]
    ntfy_server: String,

    /// Write HTML digests into this directory
    #[arg(long, value_name = "DIR")]
    outbox: Option<PathBuf>,

    /// Report new messages without updating the store
    #[arg(long)]
    dry_run: bool,

    /// Render the messages of a saved thread page and exit
    #[arg(long, value_name = "FILE", conflicts_with = "completions")]
    inspect: Option<PathBuf>,

    /// Print shell completions and exit
    #[arg(long, value_name = "SHELL")]
    completions: Option<Shell>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::stderr).with_target(false).init();
}

/// Prints the canonical messages of one saved page.
fn inspect(path: &Path, verbose: bool) -> anyhow::Result<()> {
    let html = fs::read_to_string(path).with_context(|| format!("Failed to read file: {}", path.display()))?;

    if verbose {
        print_step(1, 2, &format!("Reading {}", path.display().bright_white()));
        eprintln!("  {} {}", "Size:".dimmed(), format_size(html.len()).bright_white());
        if let Some(title) = Document::parse(&html).ok().and_then(|doc| doc.title()) {
            eprintln!("  {} {}", "Title:".dimmed(), title.bright_white());
        }
        eprintln!();
        print_step(2, 2, "Extracting messages");
    }

    let layout = SiteLayout::default().compile().context("Invalid site layout")?;
    let messages = extract_messages(&html, &layout, &ThreadStyle::default()).context("Failed to extract messages")?;

    for message in &messages {
        println!("{message}\n");
    }

    if verbose {
        print_success(&format!("{} message(s)", messages.len()));
    }
    Ok(())
}

fn load_targets(path: &Path) -> Vec<ThreadTarget> {
    match ThreadListParser::parse_file(path) {
        Ok(targets) => targets,
        Err(e) => {
            tracing::warn!(error = %e, "cannot load thread list");
            Vec::new()
        }
    }
}

fn notifiers(args: &Args) -> anyhow::Result<NotifierSet> {
    let mut set = NotifierSet::new().with(LogNotifier);

    if let Some(topic) = &args.ntfy_topic {
        let ntfy = NtfyNotifier::new(&args.ntfy_server, topic, args.timeout).context("Failed to build ntfy client")?;
        set = set.with(ntfy);
    }

    if let Some(dir) = &args.outbox {
        set = set.with(OutboxNotifier::new(dir));
    }

    Ok(set)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if let Some(shell) = args.completions {
        clap_complete::generate(shell, &mut Args::command(), "threadwatch", &mut io::stdout());
        return Ok(());
    }

    init_logging(args.verbose);

    if args.verbose {
        print_banner();
        print_info("Debug logging enabled");
        eprintln!();
    }

    if let Some(path) = &args.inspect {
        return inspect(path, args.verbose);
    }

    if args.verbose {
        print_step(1, 3, &format!("Loading threads from {}", args.threads.display().bright_white()));
    }

    let targets = load_targets(&args.threads);
    if targets.is_empty() && args.verbose {
        print_warning("No threads to monitor");
    }

    let fetch_config = FetchConfig {
        timeout: args.timeout,
        user_agent: args.user_agent.clone().unwrap_or_else(|| FetchConfig::default().user_agent),
    };
    let source = HttpPageSource::new(&fetch_config).context("Failed to build HTTP client")?;
    let notifier = notifiers(&args)?;

    let config = MonitorConfig::builder()
        .pages_to_scan(args.pages)
        .max_stored_messages(args.max_stored)
        .probe_page(DEFAULT_PROBE_PAGE)
        .dry_run(args.dry_run)
        .build();

    if args.verbose {
        print_step(2, 3, &format!("Checking {} thread(s) over {} channel(s)", targets.len(), notifier.len()));
    }

    let monitor = Monitor::new(&source, &notifier, &args.store, config).context("Failed to set up monitor")?;
    let summary = monitor.run(&targets).await;

    if args.verbose {
        print_step(3, 3, "Done");
        print_summary(&summary);
    }

    Ok(())
}
