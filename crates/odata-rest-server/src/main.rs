//! CLI for `odata-rest-server`.
//!
//! ```text
//! # Serve synthesized routes and documents
//! odata-rest-server serve --config gateway.yaml
//!
//! # Print the routes that would be registered
//! odata-rest-server routes --config gateway.yaml
//!
//! # Write the OpenAPI document (optionally for one service)
//! odata-rest-server openapi --config gateway.yaml --service ZSALES_SRV --format yaml
//! ```

#![forbid(unsafe_code)]

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use odata_rest::UpstreamConfig;
use odata_rest_openapi::{to_json, to_yaml, ApiCatalog};
use odata_rest_server::{
    backfill_metadata, load_records, upstream_client, Gateway, GatewayConfig, SqliteServiceStore,
};
use tracing_subscriber::EnvFilter;

/// REST and OpenAPI gateway for OData services stored in SQLite.
#[derive(Parser)]
#[command(name = "odata-rest-server", version, about)]
enum Cli {
    /// Synthesize routes and serve them with `/openapi.json` and `/tools/{service}`.
    Serve(CommonArgs),

    /// Print the synthesized routes, one per line.
    Routes(CommonArgs),

    /// Print the OpenAPI document.
    Openapi(OpenapiArgs),
}

#[derive(Parser)]
struct CommonArgs {
    /// Path to a gateway config YAML file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// SQLite path or URL of the service store. Overrides `database` in the config.
    #[arg(long, env = "DB_PATH")]
    database: Option<String>,
}

#[derive(Parser)]
struct OpenapiArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// Restrict the document to one service.
    #[arg(short, long)]
    service: Option<String>,

    /// Output format.
    #[arg(short, long, value_enum, default_value_t = Format::Json)]
    format: Format,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Json,
    Yaml,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    match cli {
        Cli::Serve(args) => {
            let config = load_config(&args)?;
            init_tracing(&config.log_filter);
            let bind = config.bind;
            let gateway = bootstrap(&config).await?;
            gateway.serve(bind).await
        }
        Cli::Routes(args) => {
            let config = load_config(&args)?;
            init_tracing("warn");
            let gateway = bootstrap(&config).await?;
            print_routes(gateway.catalog());
            Ok(())
        }
        Cli::Openapi(args) => {
            let config = load_config(&args.common)?;
            init_tracing("warn");
            let gateway = bootstrap(&config).await?;
            let doc = match &args.service {
                Some(service) => gateway.catalog().require_service_document(service)?,
                None => gateway.catalog().document(),
            };
            let rendered = match args.format {
                Format::Json => to_json(&doc)?,
                Format::Yaml => to_yaml(&doc)?,
            };
            println!("{rendered}");
            Ok(())
        }
    }
}

fn load_config(args: &CommonArgs) -> anyhow::Result<GatewayConfig> {
    let mut config = match &args.config {
        Some(path) => GatewayConfig::load(path)?,
        None => GatewayConfig::default(),
    };
    if let Some(database) = &args.database {
        config.database.clone_from(database);
    }
    Ok(config)
}

/// `RUST_LOG` wins over the configured filter.
fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt().with_env_filter(filter).try_init().ok();
}

/// Store → records → (metadata backfill) → synthesized gateway.
async fn bootstrap(config: &GatewayConfig) -> anyhow::Result<Gateway> {
    let store = SqliteServiceStore::connect(&config.database, &config.table)
        .await
        .with_context(|| format!("failed to open service store {}", config.database))?;
    let mut records = load_records(&store)
        .await
        .with_context(|| format!("failed to read services from table {}", config.table))?;

    let upstream = upstream_client(config, &records, UpstreamConfig::from_env)?;

    if config.upstream.fetch_missing_metadata {
        if let Some(client) = &upstream {
            let filled = backfill_metadata(client, &mut records).await;
            tracing::info!(filled, "fetched missing metadata");
        }
    }

    Ok(Gateway::build(config, &records, upstream))
}

fn print_routes(catalog: &ApiCatalog) {
    for route in catalog.routes() {
        println!(
            "{:<6} {:<48} {:<7} {}",
            route.method.to_string(),
            route.path,
            route.mode.as_str(),
            route.operation_id,
        );
    }
}
