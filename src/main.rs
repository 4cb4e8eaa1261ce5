mod cli;
mod commands;
mod output;

use crate::cli::Cli;
use clap::Parser;
use tome_config::Config;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// Turns a library error into a terminal report. The top-level message is
/// what gets shown; the full error tree is logged at debug level.
pub(crate) trait IntoReport<T> {
    fn into_report(self) -> miette::Result<T>;
}
impl<T, E> IntoReport<T> for Result<T, exn::Exn<E>>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn into_report(self) -> miette::Result<T> {
        self.map_err(|err| {
            tracing::debug!("{err:?}");
            let kind: &E = &err;
            miette::miette!("{kind}")
        })
    }
}

fn init_tracing(default_level: &str) {
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();
}

#[tokio::main]
async fn main() -> miette::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_level());
    let config = Config::load(cli.config.as_deref()).into_report()?;
    commands::run(cli.command, &config).await
}
