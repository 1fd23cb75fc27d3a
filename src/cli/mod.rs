//! CLI argument parsing and command dispatch

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use crowdtest_core::{
    sink_fn, BatchOutcome, OrchestratorBuilder, PanelConfig, ResolvedTask, TaskResolver, TaskResult,
    DEFAULT_CONCURRENCY, DEFAULT_MAX_AGENTS, DEFAULT_MAX_TOKENS, DEFAULT_PROCESSED_DIR,
};
use crowdtest_report::{segment_summaries, BatchReport, JsonExporter, SentimentBreakdown};
use crowdtest_vendors::{create_client, Vendor, VendorConfig, DEFAULT_MODEL};
use indicatif::{ProgressBar, ProgressStyle};

/// crowdtest - run a product idea past a panel of customer personas
#[derive(Parser, Debug)]
#[command(name = "crowdtest")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a panel against a product description
    Run(RunArgs),
    /// Load and resolve the manifest without calling the service
    Validate(ValidateArgs),
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Product description every persona evaluates
    #[arg(short, long)]
    pub product: String,

    /// Directory holding manifest.json and the persona files
    #[arg(long, env = "PROCESSED_DIR", default_value = DEFAULT_PROCESSED_DIR)]
    pub processed_dir: PathBuf,

    /// Number of manifest entries to run
    #[arg(long, env = "MAX_AGENTS", default_value_t = DEFAULT_MAX_AGENTS)]
    pub max_agents: usize,

    /// Maximum concurrent calls to the response service
    #[arg(short, long, env = "MAX_CONCURRENT_AGENTS", default_value_t = DEFAULT_CONCURRENCY)]
    pub concurrency: usize,

    /// Response-size ceiling per call
    #[arg(long, default_value_t = DEFAULT_MAX_TOKENS)]
    pub max_tokens: u32,

    /// Per-call timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Directory with agent_persona.txt / agent_evaluation.txt overrides
    #[arg(long)]
    pub template_dir: Option<PathBuf>,

    /// Write the JSON report to this file
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Response service (anthropic, openai)
    #[arg(long, default_value = "anthropic")]
    pub vendor: Vendor,

    /// Model name
    #[arg(short, long, env = "AGENT_MODEL", default_value = DEFAULT_MODEL)]
    pub model: String,

    /// Base URL overriding the vendor default
    #[arg(long)]
    pub endpoint: Option<String>,

    /// API key; defaults to ANTHROPIC_API_KEY or OPENAI_API_KEY to match --vendor
    #[arg(long)]
    pub api_key: Option<String>,
}

#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Directory holding manifest.json and the persona files
    #[arg(long, env = "PROCESSED_DIR", default_value = DEFAULT_PROCESSED_DIR)]
    pub processed_dir: PathBuf,

    /// Number of manifest entries to check
    #[arg(long, env = "MAX_AGENTS", default_value_t = DEFAULT_MAX_AGENTS)]
    pub max_agents: usize,
}

impl Cli {
    /// Dispatch the selected command
    pub async fn run(self) -> Result<()> {
        match self.command {
            Commands::Run(args) => args.run().await,
            Commands::Validate(args) => args.run(),
        }
    }
}

impl RunArgs {
    fn panel_config(&self) -> Result<PanelConfig> {
        let mut config = PanelConfig::new(self.concurrency)
            .with_max_agents(self.max_agents)
            .with_max_tokens(self.max_tokens)
            .with_processed_dir(&self.processed_dir);
        if let Some(secs) = self.timeout {
            config = config.with_call_timeout(Duration::from_secs(secs));
        }
        if let Some(dir) = &self.template_dir {
            config = config.with_template_dir(dir);
        }
        config.validate().context("Invalid panel configuration")?;
        Ok(config)
    }

    fn vendor_config(&self) -> VendorConfig {
        self.vendor_config_from(|name| std::env::var(name).ok())
    }

    /// Only the selected vendor's own variable is consulted, so one
    /// service's key is never sent to another
    fn vendor_config_from(&self, env: impl Fn(&str) -> Option<String>) -> VendorConfig {
        let mut config = VendorConfig::new(self.vendor, &self.model);
        if let Some(endpoint) = &self.endpoint {
            config = config.with_endpoint(endpoint);
        }
        let key = self
            .api_key
            .clone()
            .or_else(|| env(self.vendor.api_key_env()));
        if let Some(key) = key {
            config = config.with_api_key(key);
        }
        config
    }

    async fn run(self) -> Result<()> {
        let config = self.panel_config()?;
        let client = create_client(&self.vendor_config()).context("Failed to create client")?;

        tracing::info!(
            vendor = %self.vendor,
            model = %self.model,
            concurrency = config.concurrency,
            max_agents = config.max_agents,
            "Starting crowdtest"
        );

        let tasks = TaskResolver::new(&config.processed_dir)
            .with_ceiling(config.max_agents)
            .resolve()
            .with_context(|| {
                format!("Failed to load manifest from: {}", config.processed_dir.display())
            })?;

        let orchestrator = OrchestratorBuilder::new()
            .config(config.clone())
            .client(client)
            .build()
            .context("Failed to build orchestrator")?;

        print_banner(&self, tasks.len());

        let pb = ProgressBar::new(tasks.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}",
                )?
                .progress_chars("#>-"),
        );

        let failures = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let sink = {
            let pb = pb.clone();
            let failures = Arc::clone(&failures);
            sink_fn(move |result: &TaskResult| {
                if result.is_error() {
                    let n = failures.fetch_add(1, std::sync::atomic::Ordering::Relaxed) + 1;
                    pb.set_message(format!("{n} failed"));
                }
                pb.inc(1);
            })
        };

        let outcome = orchestrator
            .run_with_signal_handling(&self.product, tasks, Some(config.max_agents), Some(sink))
            .await;
        pb.finish_and_clear();

        print_results(&outcome);

        if let Some(path) = &self.output {
            let report = BatchReport::new(&self.product, &outcome);
            JsonExporter::export(&report, path)
                .with_context(|| format!("Failed to export JSON to: {}", path.display()))?;
            println!("✓ JSON report exported to: {}", path.display());
        }

        Ok(())
    }
}

impl ValidateArgs {
    fn run(self) -> Result<()> {
        let tasks = TaskResolver::new(&self.processed_dir)
            .with_ceiling(self.max_agents)
            .resolve()
            .with_context(|| {
                format!("Failed to load manifest from: {}", self.processed_dir.display())
            })?;

        let ready = tasks.iter().filter(|t| t.is_ready()).count();
        println!("Manifest:  {}", self.processed_dir.join(crowdtest_core::MANIFEST_FILE).display());
        println!("Tasks:     {}", tasks.len());
        println!("Ready:     {ready}");
        println!("Missing:   {}", tasks.len() - ready);

        for task in &tasks {
            if let ResolvedTask::Missing { task_id, reason, .. } = task {
                println!("  ✗ {task_id}: {reason}");
            }
        }

        Ok(())
    }
}

fn print_banner(args: &RunArgs, tasks: usize) {
    println!("\n{}", "=".repeat(70));
    println!("   crowdtest - Persona Panel");
    println!("{}", "=".repeat(70));
    println!();
    println!("Configuration:");
    println!("  Vendor:       {}", args.vendor);
    println!("  Model:        {}", args.model);
    println!("  Personas:     {tasks}");
    println!("  Concurrency:  {}", args.concurrency);
    println!("  Product:      {}", args.product);
    println!("{}", "=".repeat(70));
    println!();
}

fn print_results(outcome: &BatchOutcome) {
    let summary = &outcome.summary;
    let breakdown = SentimentBreakdown::from_results(&outcome.results);

    println!("{}", "=".repeat(70));
    println!("   Results");
    println!("{}", "=".repeat(70));
    println!(
        "Completed {} agents in {:.1}s (avg {:.0}ms/agent, {} failures)",
        summary.total,
        summary.duration.as_secs_f64(),
        summary.wall_ms_per_task(),
        summary.failures
    );
    println!("Mean response time: {:.0}ms", summary.mean_response_ms);
    println!();
    println!("Sentiment:");
    println!("  Positive:  {:>4}  ({:.1}%)", breakdown.positive, breakdown.positive_pct);
    println!("  Neutral:   {:>4}  ({:.1}%)", breakdown.neutral, breakdown.neutral_pct);
    println!("  Negative:  {:>4}  ({:.1}%)", breakdown.negative, breakdown.negative_pct);

    let segments = segment_summaries(&outcome.results);
    if !segments.is_empty() {
        println!();
        println!("Segments:");
        for segment in &segments {
            println!(
                "  {:<24} {:>4}  {:?}",
                segment.segment_name, segment.count, segment.sentiment
            );
        }
    }

    let failed: Vec<_> = outcome.failed().collect();
    if !failed.is_empty() {
        println!();
        println!("Failures:");
        for result in failed {
            println!("  {} ({}): {}", result.task_id, result.display_name, result.response_text);
        }
    }
    println!();
}
