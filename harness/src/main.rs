use std::path::{Path, PathBuf};

use clap::Parser;
use statbench::config::{self, HarnessConfig, Role};
use statbench::supervisor::{self, ServerOutcome, SupervisorError};
use statbench::{catalog, driver};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Exit code for hard configuration errors (bad flags, missing server
/// executable, co-located client and server)
const EXIT_CONFIG_ERROR: i32 = 2;

/// Benchmark a sysstatd server across a fixed catalog of load tests.
///
/// Run without a URL on one machine to start and verify the server.
/// Then run on a second machine with the URL the first run printed.
#[derive(Debug, Parser)]
#[command(name = "statbench", version)]
struct Cli {
    /// Path to the server executable
    #[arg(short = 's', long = "server", default_value = config::DEFAULT_SERVER_EXE)]
    server_exe: PathBuf,

    /// Path to the server root directory for fixture files
    #[arg(short = 'R', long = "root", default_value = config::DEFAULT_SERVER_ROOT)]
    server_root: PathBuf,

    /// Run just the named tests, in this order
    #[arg(short = 't', long = "tests", value_delimiter = ',', value_name = "TEST,...")]
    tests: Option<Vec<String>>,

    /// List available tests with their descriptions and exit
    #[arg(short = 'l', long = "list")]
    list: bool,

    /// Echo subprocess command lines before running them
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,

    /// URL where the running server can be reached, e.g.
    /// http://node1.cluster:22306/ (omit to run the server role)
    url: Option<String>,
}

impl Cli {
    fn into_config(self) -> (HarnessConfig, Option<String>) {
        let mut config = HarnessConfig {
            server_exe: self.server_exe,
            server_root: self.server_root,
            verbose: self.verbose,
            ..HarnessConfig::default()
        };
        if let Some(tests) = self.tests {
            config.run_selection = tests;
        }
        (config, self.url)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "statbench=debug"
    } else {
        "statbench=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if cli.list {
        catalog::print_listing();
        return Ok(());
    }

    let (config, url) = cli.into_config();

    // Same-host and malformed-URL problems are hard preconditions:
    // report and exit before any fixture or network work happens.
    let role = match config::dispatch(url.as_deref(), &config::local_hostname()) {
        Ok(role) => role,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(EXIT_CONFIG_ERROR);
        }
    };

    match role {
        Role::Server => match supervisor::run_server(&config).await {
            // The server never coming up is the student's bug to fix,
            // not a harness crash: informational exit 0.
            Ok(ServerOutcome::NeverHealthy) => Ok(()),
            Ok(ServerOutcome::Exited(code)) => {
                info!("server role finished (server exit code {code:?})");
                Ok(())
            }
            Ok(ServerOutcome::Interrupted) => Ok(()),
            Err(
                e @ (SupervisorError::ExecutableNotFound(_) | SupervisorError::NotExecutable(_)),
            ) => {
                eprintln!("{e}");
                std::process::exit(EXIT_CONFIG_ERROR);
            }
            Err(e) => Err(e.into()),
        },
        Role::Client { url } => {
            let report = match driver::run_client(&config, &url).await {
                Ok(report) => report,
                // A missing JSON helper would fail every scenario
                // identically: a configuration error, like a missing
                // server executable on the other role.
                Err(e @ driver::DriverError::MissingHelper(_)) => {
                    eprintln!("{e}");
                    std::process::exit(EXIT_CONFIG_ERROR);
                }
                Err(e) => return Err(e.into()),
            };
            let path = report.persist(Path::new("."))?;
            println!("Writing results to {}", path.display());
            println!(
                "\nSubmit your results to the scoreboard with postresults {}\n",
                path.display()
            );
            Ok(())
        }
    }
}
