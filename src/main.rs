mod error;
mod run;

use crate::error::ErrorKind;
use exn::ResultExt;
use shelf_config::Config;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();

    let result = match Config::load().or_raise(|| ErrorKind::Config) {
        Ok(config) => run::run(&config).await,
        Err(e) => Err(e),
    };
    match result {
        Ok(path) => {
            tracing::info!(output = %path.display(), "Conversion complete");
            ExitCode::SUCCESS
        },
        Err(e) => {
            eprintln!("{e:?}");
            ExitCode::FAILURE
        },
    }
}
