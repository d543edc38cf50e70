//! # Math Server Example
//!
//! Runs one JSON-RPC request body through a pipeline with a `math` namespace
//! and prints the response headers and body.
//!
//! ## Usage
//! ```bash
//! echo '{"jsonrpc":"2.0","method":"subtract","params":[42,23],"id":1}' \
//!   | cargo run --example math-server -- --path /math/
//!
//! echo '{"jsonrpc":"2.0","method":"getConfiguration","id":1}' \
//!   | cargo run --example math-server
//!
//! # Serve a schema document instead of a call
//! cargo run --example math-server -- --schema /math/sum/input-schema.json
//! ```

use std::io::Read;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use nsrpc_server::prelude::*;
use serde_json::json;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Request path carrying the namespace, e.g. /math/
    #[arg(short, long)]
    path: Option<String>,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the schema served at this path and exit
    #[arg(long)]
    schema: Option<String>,
}

struct MathHandler {
    context: HandlerContext,
}

impl MathHandler {
    fn subtract(&mut self, args: Args) -> MethodFuture<'_> {
        Box::pin(async move {
            let (minuend, subtrahend): (i64, i64) = args.into_tuple()?;
            Ok(json!(minuend - subtrahend))
        })
    }

    fn sum(&mut self, args: Args) -> MethodFuture<'_> {
        Box::pin(async move {
            let (number_a, number_b): (i64, i64) = args.into_tuple()?;
            self.context.enable_default_cache();
            Ok(json!({"sum": number_a + number_b, "message": "Here you are!"}))
        })
    }

    fn divide(&mut self, args: Args) -> MethodFuture<'_> {
        Box::pin(async move {
            let (dividend, divisor): (f64, f64) = args.into_tuple()?;
            if divisor == 0.0 {
                return Err(HandlerError::server(-32010, "Division by zero"));
            }
            Ok(json!(dividend / divisor))
        })
    }
}

impl HandlerType for MathHandler {
    fn create(context: HandlerContext) -> Self {
        Self { context }
    }

    fn context(&self) -> &HandlerContext {
        &self.context
    }

    fn methods() -> Vec<Method<Self>> {
        vec![
            Method::new("subtract", Self::subtract)
                .param("minuend", ParamType::Integer)
                .param("subtrahend", ParamType::Integer),
            Method::new("sum", Self::sum)
                .param("numberA", ParamType::Integer)
                .param("numberB", ParamType::Integer),
            Method::new("divide", Self::divide)
                .param("dividend", ParamType::Number)
                .param("divisor", ParamType::Number),
        ]
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => ServerConfig::from_file(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => ServerConfig::default(),
    };

    let pipeline = ServerBuilder::from_config(config)
        .handler_type::<MathHandler>("MathHandler")
        .namespace("math", "MathHandler")
        .build()
        .context("building server pipeline")?;

    if let Some(path) = &cli.schema {
        let schema = pipeline.schema_provider().resolve_path(path);
        println!("{}", serde_json::to_string_pretty(&schema)?);
        return Ok(());
    }

    let mut body = Vec::new();
    std::io::stdin()
        .read_to_end(&mut body)
        .context("reading request body from stdin")?;

    let namespace = pipeline.resolve_namespace(cli.path.as_deref());
    info!(namespace = %namespace, bytes = body.len(), "Handling request");

    let output = pipeline.handle(cli.path.as_deref(), &body).await;

    for (name, value) in output.headers(chrono::Utc::now()).iter() {
        println!("{}: {}", name, value);
    }
    println!();
    println!("{}", output.body_str());

    Ok(())
}
