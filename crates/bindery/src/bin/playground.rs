//! Bindery playground - entry point.
//!
//! Serves the sample application from [`bindery::playground`].

use std::path::PathBuf;

use anyhow::Context;
use bindery::config::ConfigLoader;
use bindery::host::{Application, Server};
use bindery::playground;

const ENV_PREFIX: &str = "BINDERY";

/// Command-line arguments.
struct Args {
    /// Path to a configuration file.
    config: Option<PathBuf>,
}

impl Args {
    fn parse() -> anyhow::Result<Self> {
        let mut args = std::env::args().skip(1);
        let mut config = None;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--config" | "-c" => {
                    config = Some(args.next().map(PathBuf::from).context("--config needs a path")?);
                }
                "--help" | "-h" => {
                    print_help();
                    std::process::exit(0);
                }
                "--version" | "-v" => {
                    println!("bindery-playground {}", env!("CARGO_PKG_VERSION"));
                    std::process::exit(0);
                }
                other => anyhow::bail!("unknown argument: {other} (use --help for usage)"),
            }
        }

        Ok(Self { config })
    }
}

fn print_help() {
    println!(
        r"Bindery playground - sample parameter binding service

USAGE:
    bindery-playground [OPTIONS]

OPTIONS:
    -c, --config <PATH>    Configuration file (TOML or JSON)
    -h, --help             Print help information
    -v, --version          Print version information

ENVIRONMENT VARIABLES:
    BINDERY__SERVER__HTTP_ADDR          Bind address (default: 0.0.0.0:8080)
    BINDERY__HOST__ENVIRONMENT          development, staging or production
    BINDERY__HOST__TRUST_REQUEST_ID     Reuse incoming x-request-id headers
    BINDERY__LOGGING__LEVEL             Log filter (RUST_LOG takes precedence)
    BINDERY__LOGGING__FORMAT            json or pretty

EXAMPLES:
    BINDERY__HOST__ENVIRONMENT=development bindery-playground
    curl -H 'accept: application/json' 'http://localhost:8080/items?id=abc'
"
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse()?;

    let mut loader = ConfigLoader::new().with_dotenv()?;
    if let Some(path) = &args.config {
        loader = loader.with_file(path)?;
    }
    let config = loader.with_env_prefix(ENV_PREFIX).load()?;

    bindery::telemetry::init_logging(&config.log_config())?;

    let environment = config.environment()?;
    let mut builder = Application::builder();
    builder
        .environment(environment)
        .trust_request_id_header(config.host.trust_request_id);
    if config.host.problem_details {
        builder.add_problem_details_exception_filter();
    }
    playground::configure(&mut builder);
    let app = builder.build()?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        %environment,
        addr = %config.server.http_addr,
        "starting bindery playground"
    );

    Server::new(app, config.server_config())
        .run()
        .await
        .context("server failed")
}
