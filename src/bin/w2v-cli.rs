//! w2v-similar CLI Client
//!
//! Sends a payload of queries to a running server and prints the neighbors.

use anyhow::{bail, Context};
use clap::Parser;
use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;
use std::path::PathBuf;
use w2v_similar::protocol::{CSV_CONTENT_TYPE, CUSTOM_ATTRIBUTES_HEADER};
use w2v_similar::server::{INVOCATIONS_PATH, PING_PATH};
use w2v_similar::PredictionResponse;

/// w2v-similar CLI - Invocation Client
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Server base URL
    #[arg(short, long, default_value = "http://127.0.0.1:8080")]
    url: String,

    /// Payload file, one query per line
    #[arg(default_value = "./local_test/payload.csv")]
    payload: PathBuf,

    /// Number of neighbors per query
    #[arg(short = 'n', long, default_value_t = 10)]
    topn: usize,

    /// Only run the health check
    #[arg(long, default_value_t = false)]
    ping: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let base = args.url.trim_end_matches('/');
    let client = reqwest::Client::new();

    if args.ping {
        let status = client
            .get(format!("{}{}", base, PING_PATH))
            .send()
            .await
            .with_context(|| format!("Failed to reach {}", base))?
            .status();
        if status == StatusCode::OK {
            println!("ready");
            return Ok(());
        }
        bail!("Model not ready (status {})", status);
    }

    let payload = std::fs::read_to_string(&args.payload)
        .with_context(|| format!("Failed to read {}", args.payload.display()))?;
    let payload = payload.trim().to_string();
    println!("payload {}", payload);

    let attributes = serde_json::json!({ "topn": args.topn }).to_string();
    let response = client
        .post(format!("{}{}", base, INVOCATIONS_PATH))
        .header(CONTENT_TYPE, CSV_CONTENT_TYPE)
        .header(CUSTOM_ATTRIBUTES_HEADER, attributes)
        .body(payload)
        .send()
        .await
        .with_context(|| format!("Failed to reach {}", base))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        bail!("Invocation failed with status {}: {}", status, body.trim());
    }

    let reply: PredictionResponse = response
        .json()
        .await
        .context("Server returned an unexpected reply")?;

    for (i, rows) in reply.results.iter().enumerate() {
        println!("{}", i + 1);
        for row in rows {
            println!("word: {}", row.word);
            println!("similarity: {}", row.similarity);
        }
    }

    Ok(())
}
