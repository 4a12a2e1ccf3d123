//! Search command

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Args;

use crate::output::{print_json, OutputFormat};
use crate::{AppContext, Cli};
use circuity_core::limits::parse_label;
use circuity_core::{
    CancelToken, CircuitEngine, CircuitRequest, SearchConfig, SearchResult, SelectionPolicy,
};

#[derive(Args)]
pub struct SearchArgs {
    /// Single-character label
    #[arg(short, long, required_unless_present = "request")]
    pub label: Option<String>,

    /// Origin node address (can be used multiple times)
    #[arg(short, long = "origin", required_unless_present = "request")]
    pub origins: Vec<String>,

    /// Read the request from a JSON file instead
    #[arg(long, conflicts_with_all = ["label", "origins"])]
    pub request: Option<PathBuf>,

    /// Retry budget per label node
    #[arg(short, long)]
    pub tries: Option<usize>,

    /// Selection policy: weighted-random, max-weight
    #[arg(long)]
    pub policy: Option<SelectionPolicy>,

    /// RNG seed for a reproducible search
    #[arg(long)]
    pub seed: Option<u64>,

    /// Step budget per try
    #[arg(long)]
    pub step_limit: Option<usize>,

    /// Verification step ceiling per try
    #[arg(long)]
    pub verify_ceiling: Option<usize>,

    /// Give up after this many milliseconds
    #[arg(long)]
    pub timeout_ms: Option<u64>,
}

impl SearchArgs {
    fn request(&self) -> anyhow::Result<CircuitRequest> {
        if let Some(path) = &self.request {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read request {}", path.display()))?;
            return serde_json::from_str(&content)
                .with_context(|| format!("Invalid request {}", path.display()));
        }

        let label = parse_label(self.label.as_deref().unwrap_or_default())?;
        Ok(CircuitRequest::new(label, self.origins.clone()))
    }

    /// Command-line flags override the config file
    fn search_config(&self, base: &SearchConfig) -> SearchConfig {
        let mut config = base.clone();
        if let Some(tries) = self.tries {
            config = config.with_tries(tries);
        }
        if let Some(policy) = self.policy {
            config = config.with_policy(policy);
        }
        if let Some(seed) = self.seed {
            config = config.with_seed(seed);
        }
        if let Some(step_limit) = self.step_limit {
            config = config.with_step_limit(step_limit);
        }
        if let Some(verify_ceiling) = self.verify_ceiling {
            config = config.with_verify_ceiling(verify_ceiling);
        }
        if let Some(timeout_ms) = self.timeout_ms {
            config = config.with_timeout(Duration::from_millis(timeout_ms));
        }
        config
    }
}

pub async fn run(args: &SearchArgs, cli: &Cli, ctx: &AppContext) -> anyhow::Result<()> {
    let request = args.request()?;
    let config = args.search_config(&ctx.config.search);
    tracing::debug!("Search config: {:?}", config);

    let engine = CircuitEngine::new(ctx.store.clone(), config);
    let cancel = CancelToken::new();

    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, cancelling search");
            interrupt.cancel();
        }
    });

    let result = engine.run(&request, &cancel).await?;

    match cli.format {
        OutputFormat::Json => print_json(&result)?,
        OutputFormat::Table => print_summary(&result),
    }

    result.into_result()?;
    Ok(())
}

fn print_summary(result: &SearchResult) {
    println!("Status: {:?}", result.status);
    println!("  Origin: {}", result.origin);
    if let Some(label_node) = &result.label_node {
        println!("  Label node: {}", label_node);
    }
    if let Some(big_node) = &result.big_node {
        println!("  Big node: {}", big_node);
    }
    println!(
        "  Steps: {} (verify {}, total {})",
        result.steps_taken, result.verify_steps, result.total_steps
    );
    println!("  Tries: {}", result.tries_used);
    if let Some(reason) = &result.failure_reason {
        println!("  Reason: {:?}", reason);
    }
    println!("  Path:");
    for address in &result.path {
        println!("    {}", address);
    }
}
