use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use harvest_cli::OutputFormat;
use harvest_cli::commands::{self, BrowserArgs, emails::EmailsOptions};
use std::net::IpAddr;

#[derive(Parser)]
#[command(name = "harvest")]
#[command(author, version)]
#[command(
    about = "Scrape contact emails and business listings with headless Chrome",
    long_about = "Harvest loads pages in a throw-away headless Chrome, collects every email \
                  address in the rendered document and its mailto links, and can search a map \
                  service for business listings. Run it once from the command line or serve \
                  both scrapers over HTTP."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value_t = OutputFormat::Pretty)]
    format: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP scrape server
    Serve {
        /// Address to bind
        #[arg(long, env = "HARVEST_HOST", default_value = "127.0.0.1")]
        host: IpAddr,

        /// Port to listen on
        #[arg(short, long, env = "HARVEST_PORT", default_value_t = 3000)]
        port: u16,

        /// Browser sessions allowed to run at once
        #[arg(long, env = "HARVEST_MAX_SESSIONS", default_value_t = 4)]
        max_sessions: usize,

        #[command(flatten)]
        browser: BrowserArgs,
    },

    /// Collect email addresses from one or more pages
    Emails {
        /// Pages to scrape (https:// is assumed when no scheme is given)
        #[arg(value_name = "URL", required = true)]
        urls: Vec<String>,

        /// Pages scraped at once
        #[arg(short, long, default_value_t = 1)]
        jobs: usize,

        /// Print every address as one comma-separated line
        #[arg(long)]
        copy_all: bool,

        /// Print a bulk-mail mailto: link with this subject
        #[arg(long)]
        subject: Option<String>,

        /// Body for the bulk-mail link
        #[arg(long, default_value = "", requires = "subject")]
        body: String,

        #[command(flatten)]
        browser: BrowserArgs,
    },

    /// Search for business listings
    Listings {
        /// What to search for, e.g. "coffee shop"
        #[arg(short, long)]
        query: String,

        /// Where to search, e.g. "Austin TX"
        #[arg(short, long, default_value = "")]
        location: String,

        #[command(flatten)]
        browser: BrowserArgs,
    },

    /// Generate shell completion scripts
    #[command(long_about = "Generate shell completion scripts for harvest.

SUPPORTED SHELLS:
  bash, zsh, fish, powershell, elvish

INSTALLATION:
  bash:  harvest completion --shell bash >> ~/.bashrc
  zsh:   harvest completion --shell zsh > ~/.zfunc/_harvest
  fish:  harvest completion --shell fish > ~/.config/fish/completions/harvest.fish")]
    Completion {
        /// Shell to generate completions for
        #[arg(short, long, value_enum)]
        shell: Shell,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    match cli.command {
        Commands::Serve {
            host,
            port,
            max_sessions,
            browser,
        } => commands::serve::execute(host, port, max_sessions, &browser),
        Commands::Emails {
            urls,
            jobs,
            copy_all,
            subject,
            body,
            browser,
        } => commands::emails::execute(
            EmailsOptions {
                urls,
                jobs,
                copy_all,
                subject,
                body,
            },
            &browser,
            cli.format,
        ),
        Commands::Listings {
            query,
            location,
            browser,
        } => commands::listings::execute(&query, &location, &browser, cli.format),
        Commands::Completion { shell } => commands::completion::execute(shell, &mut Cli::command()),
    }
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new(
            "harvest=debug,harvest_cli=debug,harvest_core=debug,harvest_browser=debug,harvest_server=debug",
        )
    } else {
        EnvFilter::new("harvest=info,harvest_cli=info,harvest_browser=info,harvest_server=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}
