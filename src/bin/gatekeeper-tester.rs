//! Gatekeeper Tester CLI Tool
//!
//! Command-line tool that posts simulated Studio events to a running gatekeeper
//! and prints the TwiML it answers with.
//!
//! Usage:
//!   cargo run --bin gatekeeper-tester -- --help
//!   cargo run --bin gatekeeper-tester direct-line --queue-time 10
//!   cargo run --bin gatekeeper-tester routed --queue "Sales" --ewt-enabled --present-callback
//!   cargo run --bin gatekeeper-tester health

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use gatekeeper::service::WEBHOOK_PATH;

#[derive(Parser)]
#[command(name = "gatekeeper-tester")]
#[command(about = "Send simulated inbound call events to a running gatekeeper")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Base URL of the gatekeeper service
    #[arg(long, default_value = "http://localhost:8080")]
    url: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Simulate a direct-line call
    DirectLine {
        /// Seconds the caller has been queued
        #[arg(short, long, default_value = "10")]
        queue_time: String,
        /// Caller number
        #[arg(short, long, default_value = "+15550100")]
        caller: String,
    },
    /// Simulate a queue-routed call
    Routed {
        /// Task queue friendly name
        #[arg(short, long)]
        queue: String,
        /// Announce the estimated wait time
        #[arg(long)]
        ewt_enabled: bool,
        /// Within operating hours, callback may be offered
        #[arg(long)]
        present_callback: bool,
        /// Queue SID passed through to the callback redirect
        #[arg(long, default_value = "QU00000000000000000000000000000000")]
        queue_sid: String,
        /// Call SID passed through to the callback redirect
        #[arg(long, default_value = "CA00000000000000000000000000000000")]
        call_sid: String,
    },
    /// Show service health and statistics
    Health,
}

struct GatekeeperTester {
    client: reqwest::Client,
    base_url: String,
}

impl GatekeeperTester {
    fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn post_event(&self, params: &[(&str, String)]) -> Result<String> {
        let response = self
            .client
            .post(format!("{}{}", self.base_url, WEBHOOK_PATH))
            .form(params)
            .send()
            .await
            .context("Failed to reach gatekeeper")?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            anyhow::bail!("Gatekeeper answered {}: {}", status, body);
        }
        Ok(body)
    }

    async fn direct_line(&self, queue_time: &str, caller: &str) -> Result<String> {
        self.post_event(&[
            ("directLine", "true".to_string()),
            ("QueueTime", queue_time.to_string()),
            ("Caller", caller.to_string()),
        ])
        .await
    }

    async fn routed(
        &self,
        queue: &str,
        ewt_enabled: bool,
        present_callback: bool,
        queue_sid: &str,
        call_sid: &str,
    ) -> Result<String> {
        self.post_event(&[
            ("directLine", "false".to_string()),
            ("taskQueueName", queue.to_string()),
            ("ewtEnabled", ewt_enabled.to_string()),
            ("presentCallback", present_callback.to_string()),
            ("QueueSid", queue_sid.to_string()),
            ("CallSid", call_sid.to_string()),
        ])
        .await
    }

    async fn stats(&self) -> Result<serde_json::Value> {
        let response = self
            .client
            .get(format!("{}/stats", self.base_url))
            .send()
            .await
            .context("Failed to reach gatekeeper")?;
        Ok(response.json().await?)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let tester = GatekeeperTester::new(&cli.url);

    println!("🔌 Gatekeeper at: {}", cli.url);

    let result = match cli.command {
        Commands::DirectLine { queue_time, caller } => {
            println!("📞 Direct line call from {} queued {}s", caller, queue_time);
            tester.direct_line(&queue_time, &caller).await
        }
        Commands::Routed {
            queue,
            ewt_enabled,
            present_callback,
            queue_sid,
            call_sid,
        } => {
            println!(
                "📞 Routed call to '{}' (ewt: {}, callback: {})",
                queue, ewt_enabled, present_callback
            );
            tester
                .routed(&queue, ewt_enabled, present_callback, &queue_sid, &call_sid)
                .await
        }
        Commands::Health => match tester.stats().await {
            Ok(stats) => serde_json::to_string_pretty(&stats).map_err(Into::into),
            Err(e) => Err(e),
        },
    };

    match result {
        Ok(body) => {
            println!("✅ Response:");
            println!("{}", body);
            Ok(())
        }
        Err(e) => {
            eprintln!("❌ Request failed: {:#}", e);
            eprintln!("💡 Make sure the gatekeeper is running: cargo run --bin gatekeeper");
            std::process::exit(1);
        }
    }
}
