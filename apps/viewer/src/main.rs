use std::sync::Arc;

use anyhow::{bail, Result};
use clap::Parser;
use github_client::GithubClient;
use query_core::{QueryClient, QueryController, QueryPhase};
use tracing::debug;

mod config;
mod profile;

#[derive(Parser, Debug)]
struct Args {
    /// GitHub login to look up.
    #[arg(long)]
    login: String,
    /// GraphQL endpoint override (defaults to the public GitHub API).
    #[arg(long)]
    endpoint: Option<String>,
    /// Access token override (defaults to GITHUB_TOKEN).
    #[arg(long)]
    token: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().init();
    let args = Args::parse();

    let mut settings = config::load_settings();
    if let Some(endpoint) = args.endpoint {
        settings.endpoint = endpoint;
    }
    if let Some(token) = args.token {
        settings.token = token;
    }

    let client: Arc<dyn QueryClient> =
        Arc::new(GithubClient::new(&settings.endpoint, settings.token)?);

    let mut controller = QueryController::new(profile::ProfileNormalize);
    let mut updates = controller.subscribe();

    let initial = updates.borrow().clone();
    println!("{}", profile::render(&initial));

    debug!(login = %args.login, "evaluating profile query");
    controller
        .evaluate(profile::descriptor(&args.login), &client)
        .await;

    let outcome = loop {
        updates.changed().await?;
        let state = updates.borrow_and_update().clone();
        println!("{}", profile::render(&state));
        match state.phase() {
            QueryPhase::Loaded | QueryPhase::Errored => break state,
            QueryPhase::Idle | QueryPhase::Fetching => {}
        }
    };

    controller.teardown().await;

    if let Some(error) = outcome.error {
        bail!("profile lookup failed: {error}");
    }
    Ok(())
}
