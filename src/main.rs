use anyhow::{Context, Result};
use clap::Parser;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use price_whisperer::{
    constants, web_server, ApiKey, Category, GeminiClient, GeminiConfig, Locale,
    PredictionSession, PredictionView, ProductAttributes, ServerConfig, SessionStore,
};

// Define the command-line interface structure using clap
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Start the web UI.
    Serve {
        #[arg(long, default_value_t = constants::DEFAULT_PORT, help = "Port for the web server.")]
        port: u16,
        #[arg(long, default_value = "127.0.0.1", help = "Address to bind the web server to.")]
        bind: IpAddr,
        #[arg(long, help = "Directory holding the HTML templates.")]
        templates_dir: Option<String>,
        #[arg(long, help = "Directory holding static assets.")]
        static_dir: Option<String>,
        #[command(flatten)]
        api: ApiArgs,
    },
    /// Predict the price of a single product and print the result.
    Predict {
        #[arg(long, help = "Product name.")]
        name: String,
        #[arg(long, value_enum, help = "Product category.")]
        category: Category,
        #[arg(long, help = "Product brand.")]
        brand: String,
        #[arg(long, help = "Features or specifications.")]
        features: String,
        #[arg(long, help = "Optional historical price data, e.g. \"$2,500 (Jan), $2,400 (Feb)\".")]
        historical_prices: Option<String>,
        #[arg(long, help = "Print the outcome as JSON.")]
        json: bool,
        #[command(flatten)]
        api: ApiArgs,
    },
}

/// Connection settings for the prediction API.
#[derive(clap::Args, Debug)]
struct ApiArgs {
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true, help = "Gemini API key.")]
    api_key: String,
    #[arg(long, env = "GEMINI_API_URL", help = "Base URL of the Gemini API.")]
    api_url: Option<String>,
    #[arg(long, env = "GEMINI_MODEL", help = "Model used for predictions.")]
    model: Option<String>,
    #[arg(long, env = "PRICE_WHISPERER_LOCALE", default_value_t = Locale::EnUs, help = "Market locale: en-US or id-ID.")]
    locale: Locale,
    #[arg(long, help = "Abort a prediction request after this many seconds.")]
    request_timeout_secs: Option<u64>,
}

impl ApiArgs {
    fn client(&self) -> Result<GeminiClient> {
        let mut config = GeminiConfig::new(ApiKey::new(self.api_key.clone()))
            .with_request_timeout(self.request_timeout_secs.map(Duration::from_secs));
        if let Some(url) = &self.api_url {
            config = config.with_api_url(url.clone());
        }
        if let Some(model) = &self.model {
            config = config.with_model(model.clone());
        }
        GeminiClient::new(&config).context("Failed to create prediction client")
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (for environment variables like API keys)
    dotenvy::dotenv().ok();

    // Reads log level from RUST_LOG environment variable (e.g., RUST_LOG=info,price_whisperer=debug)
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            port,
            bind,
            templates_dir,
            static_dir,
            api,
        } => {
            let sessions = Arc::new(SessionStore::new(api.client()?, api.locale));
            let mut server_config = ServerConfig::default();
            if let Some(dir) = templates_dir {
                server_config.templates_dir = dir;
            }
            if let Some(dir) = static_dir {
                server_config.static_dir = dir;
            }

            info!(locale = %api.locale, "Starting Price Whisperer on port {}...", port);
            web_server::start_web_server(SocketAddr::new(bind, port), sessions, &server_config)
                .await
                .context("Web server failed")?;
        }
        Commands::Predict {
            name,
            category,
            brand,
            features,
            historical_prices,
            json,
            api,
        } => {
            let session = PredictionSession::new(api.client()?, api.locale);
            let attributes = ProductAttributes {
                name,
                category,
                brand,
                features,
                historical_prices,
            };
            let submission = session
                .submit(attributes)
                .await
                .context("Prediction request did not complete")?;

            if let Some(notice) = submission.outcome.notice() {
                eprintln!("Error: {}", notice);
            }
            if let Some(message) = submission.outcome.message() {
                info!("{}", message);
            }
            if json {
                let output = serde_json::to_string_pretty(&submission.outcome)
                    .context("Failed to serialize prediction")?;
                println!("{}", output);
            } else {
                let view = PredictionView::new(
                    submission.outcome.prediction(),
                    &submission.attributes.name,
                    session.locale(),
                );
                print!("{}", view.to_text());
            }
        }
    }

    Ok(())
}
