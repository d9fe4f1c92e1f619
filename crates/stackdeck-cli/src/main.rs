mod commands;

use clap::{Args, Parser, Subcommand};
use commands::wizard::WizardParams;
use stackdeck_core::config::{self, FeedSource};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "stackdeck",
    version,
    about = "Operations dashboard: container status and stack composition wizard"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Where container status comes from.
#[derive(Args)]
struct FeedArgs {
    /// Serve fixed demo data instead of querying hosts
    #[arg(long, env = "DEMO_MODE", default_value = "true")]
    demo_mode: String,

    /// Ansible inventory host to run `docker-compose ps` on
    #[arg(long, env = "ANSIBLE_HOST", default_value = config::DEFAULT_ANSIBLE_HOST)]
    ansible_host: String,

    /// Shell command replacing the ansible invocation
    #[arg(long, env = "ANSIBLE_CMD")]
    ansible_cmd: Option<String>,

    /// Query this host over SSH instead of through ansible
    #[arg(long, env = "STATUS_SSH_HOST")]
    ssh_host: Option<String>,

    /// Private key for the SSH host
    #[arg(long, env = "STATUS_SSH_KEY")]
    ssh_key: Option<PathBuf>,

    /// SSH user
    #[arg(long, env = "STATUS_SSH_USER", default_value = config::DEFAULT_SSH_USER)]
    ssh_user: String,
}

impl FeedArgs {
    fn source(self) -> anyhow::Result<FeedSource> {
        Ok(FeedSource::resolve(
            config::parse_flag(&self.demo_mode),
            &self.ansible_host,
            self.ansible_cmd.as_deref(),
            self.ssh_host.as_deref(),
            &self.ssh_user,
            self.ssh_key,
        )?)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Show the container status table
    Status {
        #[command(flatten)]
        feed: FeedArgs,

        /// Keep polling and redraw the table
        #[arg(long, default_value = "false")]
        watch: bool,

        /// Seconds between polls in watch mode
        #[arg(long, default_value_t = config::STATUS_POLL_INTERVAL.as_secs())]
        interval: u64,
    },

    /// Compose a stack interactively: community → platforms → types → applications
    Wizard {
        /// JSON catalog replacing the built-in one
        #[arg(long, env = "STACKDECK_CATALOG")]
        catalog: Option<PathBuf>,

        /// Allow only one platform and one application type
        #[arg(long, default_value = "false")]
        single: bool,

        /// Start from the stored stack instead of an empty selection
        #[arg(long, default_value = "false")]
        edit: bool,

        /// POST the selection to this URL instead of storing it locally
        #[arg(long, env = "STACKDECK_SUBMIT_URL")]
        submit_url: Option<String>,
    },

    /// Prompt for Git and Harbor credentials and save them
    Configure,

    /// Print the stored stack
    Show,

    /// Run the web dashboard and JSON API
    #[cfg(feature = "web-ui")]
    Serve {
        #[command(flatten)]
        feed: FeedArgs,

        /// Port to listen on
        #[arg(long, env = "PORT", default_value_t = config::DEFAULT_PORT)]
        port: u16,

        /// Directory of static files served as fallback
        #[arg(long)]
        static_dir: Option<PathBuf>,

        /// JSON catalog replacing the built-in one
        #[arg(long, env = "STACKDECK_CATALOG")]
        catalog: Option<PathBuf>,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .try_init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Status {
            feed,
            watch,
            interval,
        } => {
            let feed = stackdeck_remote::from_source(feed.source()?);
            commands::status::run(feed, watch, Duration::from_secs(interval.max(1))).await?;
        }
        Commands::Wizard {
            catalog,
            single,
            edit,
            submit_url,
        } => {
            let params = WizardParams {
                catalog,
                single,
                edit,
                submit_url,
            };
            commands::wizard::run(params).await?;
        }
        Commands::Configure => {
            commands::configure::run()?;
        }
        Commands::Show => {
            commands::show::run()?;
        }
        #[cfg(feature = "web-ui")]
        Commands::Serve {
            feed,
            port,
            static_dir,
            catalog,
        } => {
            let feed = stackdeck_remote::from_source(feed.source()?);
            let catalog = commands::load_catalog(catalog.as_deref())?;
            commands::serve::run(port, feed, catalog, static_dir).await?;
        }
    }

    Ok(())
}
