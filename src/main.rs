//! CLI entry point for `mailgunner`.

use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand};

use mailgunner::compose::headers::{BATCH_MESSAGE_HEADER, BCC_HEADER, CC_HEADER};
use mailgunner::compose::SendRequest;
use mailgunner::config::{self, Config};
use mailgunner::mailer::Mailer;
use mailgunner::model::address::AddressList;
use mailgunner::model::attachment::RawAttachment;
use mailgunner::transport::dry_run::DryRunAdapter;

#[derive(Parser)]
#[command(
    name = "mailgunner",
    version,
    about = "Compose transactional email for batch-capable provider APIs"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose logging (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse an address list and print its entries
    Parse {
        /// e.g. "Joe <joe@example.com>; jane@example.com"
        addresses: String,
        #[arg(long)]
        json: bool,
    },
    /// Compose a message and print the provider payloads (nothing is sent)
    Compose {
        #[arg(long)]
        from: String,
        #[arg(long)]
        to: String,
        #[arg(short, long, default_value = "")]
        subject: String,
        /// HTML body
        #[arg(long, default_value = "")]
        html: String,
        /// Plain-text body
        #[arg(long, default_value = "")]
        text: String,
        #[arg(long)]
        cc: Option<String>,
        #[arg(long)]
        bcc: Option<String>,
        /// Attach a file (repeatable)
        #[arg(short, long = "attach", value_name = "PATH")]
        attachments: Vec<PathBuf>,
        /// Custom header as "Name: value" (repeatable)
        #[arg(short = 'H', long = "header", value_name = "HEADER")]
        headers: Vec<String>,
        /// Submit in batch mode
        #[arg(long)]
        batch: bool,
        /// Sending domain (defaults to provider.api_domain)
        #[arg(long, env = "MAILGUNNER_DOMAIN")]
        domain: Option<String>,
    },
    /// Print the effective configuration
    Config {
        /// Write the default configuration to the config file
        #[arg(long)]
        init: bool,
    },
    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
    /// Generate a man page
    Manpage,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = config::load_config();

    // Configure logging: stderr + optional log file
    let log_level = match cli.verbose {
        0 => config.general.log_level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    setup_logging(log_level, &config);

    match cli.command {
        Commands::Parse { addresses, json } => cmd_parse(&addresses, json),
        Commands::Compose {
            from,
            to,
            subject,
            html,
            text,
            cc,
            bcc,
            attachments,
            headers,
            batch,
            domain,
        } => {
            let mut request = SendRequest::new(to, from, subject).html(html).plain(text);
            for path in &attachments {
                request = request.attachment(RawAttachment::from_path(path)?);
            }
            for raw in &headers {
                let (name, value) = parse_header_arg(raw)?;
                request = request.header(name, value);
            }
            if let Some(cc) = cc {
                request = request.header(CC_HEADER, cc);
            }
            if let Some(bcc) = bcc {
                request = request.header(BCC_HEADER, bcc);
            }
            if batch {
                request = request.header(BATCH_MESSAGE_HEADER, "true");
            }
            cmd_compose(&request, domain, &config)
        }
        Commands::Config { init } => cmd_config(init, &config),
        Commands::Completions { shell } => cmd_completions(shell),
        Commands::Manpage => cmd_manpage(),
    }
}

/// Set up tracing with stderr output and optional file logging.
fn setup_logging(level: &str, config: &Config) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    // Try to set up file logging
    let log_dir = config::log_dir(config);
    if std::fs::create_dir_all(&log_dir).is_ok() {
        let file_appender = tracing_appender::rolling::never(&log_dir, "mailgunner.log");
        let file_layer = tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_writer(file_appender);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .with(file_layer)
            .init();
    } else {
        // Fall back to stderr only
        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .init();
    }
}

/// Split a `Name: value` header argument.
fn parse_header_arg(raw: &str) -> anyhow::Result<(String, String)> {
    let Some((name, value)) = raw.split_once(':') else {
        anyhow::bail!("Header '{}' is not in \"Name: value\" form", raw);
    };
    Ok((name.trim().to_string(), value.trim().to_string()))
}

/// Print parsed addresses as a table or JSON.
fn cmd_parse(raw: &str, json: bool) -> anyhow::Result<()> {
    let entries = AddressList::parse(raw).into_entries();

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    println!();
    println!("  {} address(es)", entries.len());
    if !entries.is_empty() {
        println!();
        println!("  {:<4} {:<40} {}", "#", "Email", "Name");
        println!("  {}", "-".repeat(70));
        for (i, entry) in entries.iter().enumerate() {
            println!("  {:<4} {:<40} {}", i + 1, entry.email, entry.display_name);
        }
    }
    println!();
    Ok(())
}

/// Run a full send attempt against the dry-run adapter.
fn cmd_compose(
    request: &SendRequest,
    domain: Option<String>,
    config: &Config,
) -> anyhow::Result<()> {
    let domain = domain.unwrap_or_else(|| config.provider.api_domain.clone());
    if domain.is_empty() {
        anyhow::bail!("No sending domain: pass --domain or set provider.api_domain");
    }

    let adapter = DryRunAdapter::new(std::io::stdout().lock(), config.provider.batch_threshold);
    let mut mailer = Mailer::from_config(adapter, config).with_domain(domain);

    let receipt = mailer.send(request)?;

    use humansize::{format_size, BINARY};
    eprintln!();
    eprintln!("  {:<20} {}", "Domain", mailer.domain());
    eprintln!("  {:<20} {}", "Mode", receipt.mode);
    eprintln!("  {:<20} {}", "Recipients", receipt.recipients);
    eprintln!(
        "  {:<20} {} ({})",
        "Attachments",
        receipt.attachments,
        format_size(receipt.staged_bytes, BINARY)
    );
    eprintln!("  {:<20} {}", "Provider calls", receipt.chunks);
    eprintln!("  {:<20} {}", "Composed at", receipt.sent_at.to_rfc3339());
    eprintln!();

    Ok(())
}

/// Print the effective configuration, or write the defaults.
fn cmd_config(init: bool, config: &Config) -> anyhow::Result<()> {
    if init {
        let path = config::save_config(&Config::default())?;
        println!("  Wrote default config to {}", path.display());
        return Ok(());
    }

    if let Some(path) = config::config_file_path() {
        println!("# {}", path.display());
    }
    print!("{}", config::render_config(config)?);
    Ok(())
}

/// Generate shell completions and print to stdout.
fn cmd_completions(shell: clap_complete::Shell) -> anyhow::Result<()> {
    let mut cmd = Cli::command();
    clap_complete::generate(shell, &mut cmd, "mailgunner", &mut std::io::stdout());
    Ok(())
}

/// Generate a man page and print to stdout.
fn cmd_manpage() -> anyhow::Result<()> {
    let cmd = Cli::command();
    let man = clap_mangen::Man::new(cmd);
    let mut buf = Vec::new();
    man.render(&mut buf)?;
    std::io::Write::write_all(&mut std::io::stdout(), &buf)?;
    Ok(())
}
