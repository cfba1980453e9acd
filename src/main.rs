//! Tiki Product Reviewer - product insights from real customer reviews
//!
//! A command-line client for the Tiki review chatbot backend. Answers are
//! fetched through a caching, de-duplicating dispatcher and cleaned before
//! they are printed. Ctrl-C cancels the request in flight.

use std::process::ExitCode;

use clap::Parser;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use tiki_reviewer::api::ReviewApi;
use tiki_reviewer::cli::{Cli, Command, Settings};
use tiki_reviewer::client::{ApiError, Dispatcher};
use tiki_reviewer::config::ApiConfig;
use tiki_reviewer::models::Model;

/// Logs go to stderr so answers on stdout stay clean
fn setup_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Cancels `token` when the user presses Ctrl-C
fn cancel_on_ctrl_c(token: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            token.cancel();
        }
    });
}

fn print_json(value: &Value) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_models(selected: Model) {
    for model in Model::all() {
        let marker = if *model == selected { "*" } else { " " };
        println!(
            "{} {:<18} {:<18} {}",
            marker,
            model.id(),
            model.label(),
            model.provider()
        );
    }
}

async fn run(settings: Settings, api: &ReviewApi) -> Result<(), Box<dyn std::error::Error>> {
    let signal = CancellationToken::new();
    cancel_on_ctrl_c(signal.clone());

    let response = match &settings.command {
        Command::Ask { product, raw: false } => {
            let reply = api
                .ask_product(product, settings.model, Some(signal))
                .await?;
            println!("[{}]\n", reply.model.label());
            println!("{}", reply.text);
            if let Some(product) = &reply.product {
                println!();
                print_json(product)?;
            }
            return Ok(());
        }
        Command::Ask { product, raw: true } => {
            let prompt = tiki_reviewer::models::analysis_prompt(product, settings.model);
            api.ask_chatbot(&prompt, settings.model, Some(signal), None)
                .await?
        }
        Command::Query { query } => api.query_backend(query).await?,
        Command::Text2sql { query } => api.query_with_nl_to_sql(query).await?,
        Command::Reviews { .. } => api.get_product_reviews(&settings.review_params).await?,
        Command::Scrape { product_name } => {
            api.scrape_tiki_product(&serde_json::json!({ "product_name": product_name }))
                .await?
        }
        Command::Categories => api.get_electronics_categories().await?,
        Command::DbStructure => api.get_db_structure().await?,
        Command::HealthData { user_id } => api.get_health_data(user_id).await?,
        Command::Health => api.check_health().await?,
        Command::Models => {
            print_models(settings.model);
            return Ok(());
        }
    };

    print_json(&response)
}

#[tokio::main]
async fn main() -> ExitCode {
    setup_logging();

    let cli = Cli::parse();
    let settings = match Settings::from_cli(&cli) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::from(2);
        }
    };

    let mut config = match ApiConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::from(2);
        }
    };
    if let Some(timeout) = settings.timeout {
        config = config.timeout(timeout);
    }

    let base_url = config.base_url.clone();
    let api = ReviewApi::new(Dispatcher::new(config)).chat_cache(settings.use_cache);

    match run(settings, &api).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            match e.downcast_ref::<ApiError>() {
                Some(err) if err.is_abort() => {
                    eprintln!("Request cancelled or timed out. You can try again or switch to a different model.");
                }
                Some(_) => {
                    eprintln!(
                        "Sorry, I encountered an error: {}. Please make sure the backend is running at {}",
                        e, base_url
                    );
                }
                None => eprintln!("error: {}", e),
            }
            ExitCode::FAILURE
        }
    }
}
