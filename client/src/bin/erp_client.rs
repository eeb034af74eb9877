//! `erp-client`: call the School ERP API from a terminal.
//!
//! Settings come from `ERP_*` environment variables; the session lives in the
//! file named by `ERP_STORAGE_PATH`. Results are printed to stdout as JSON,
//! logs go to stderr.
#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]

use std::io;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use color_eyre::eyre::{Context, Result};
use erp_client::config::ClientSettings;
use erp_client::domain::ApiClient;
use erp_client::inbound::cli::{self, Cli, TerminalSessionExpiredHandler};
use erp_client::outbound::http::ReqwestTransport;
use erp_client::outbound::storage::FileTokenStore;
use tokio::runtime::Builder;
use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt};

fn main() -> Result<ExitCode> {
    color_eyre::install()?;
    if let Err(error) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .json()
        .try_init()
    {
        warn!(error = %error, "tracing init failed");
    }

    let args = Cli::parse();
    let settings = ClientSettings::from_environment()?;

    let transport = ReqwestTransport::new(settings.api_base_url()?, settings.timeout()?)
        .wrap_err("failed to build HTTP client")?;
    let store = FileTokenStore::open(&settings.storage_path())
        .wrap_err("failed to open session storage")?;
    let handler = Arc::new(TerminalSessionExpiredHandler::default());
    let client = ApiClient::new(Arc::new(transport), Arc::new(store))
        .with_session_handler(handler.clone())
        .with_sign_in_route(settings.sign_in_route());

    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .wrap_err("failed to create Tokio runtime")?;
    let outcome = runtime.block_on(cli::run(&client, args.command));

    match outcome {
        Ok(output) => {
            println!("{}", serde_json::to_string_pretty(&output)?);
            Ok(ExitCode::SUCCESS)
        }
        Err(error) => {
            println!("{}", serde_json::to_string_pretty(&error.to_json())?);
            if handler.session_expired() {
                eprintln!("session expired; sign in and run `erp-client session set --token <token>`");
            }
            Ok(ExitCode::FAILURE)
        }
    }
}
