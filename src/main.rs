//! Breeder - Promptbreeder 风格的提示词进化
//!
//! 入口：初始化日志、加载配置与样本池、建初始种群、跑 n 代进化并打印结果。

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

use breeder::config::{load_config, AppConfig};
use breeder::dataset::read_jsonl;
use breeder::evolution::{
    create_population, sample_prompts, EvolutionConfig, EvolutionEngine, CATALOG_STREAM,
    MUTATION_PROMPTS, THINKING_STYLES,
};
use breeder::llm::create_client_from_config;
use breeder::observability::{self, TracingReporter};

/// Run the Prompt Breeder algorithm.
#[derive(Parser, Debug)]
#[command(name = "breeder")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Number of thinking styles to use
    #[arg(short = 't', long)]
    num_thinking_styles: Option<usize>,

    /// Number of mutation prompts to use
    #[arg(short = 'm', long)]
    num_mutation_prompts: Option<usize>,

    /// Problem description the task prompts are evolved for
    #[arg(short = 'p', long)]
    problem_statement: Option<String>,

    /// Number of evaluation examples per unit and pass
    #[arg(short = 'e', long)]
    num_evals: Option<usize>,

    /// Number of generations to run
    #[arg(short = 'n', long)]
    generations: Option<usize>,

    /// JSONL example pool (one {"question","answer"} object per line)
    #[arg(short = 'd', long)]
    dataset: Option<PathBuf>,

    /// Extra TOML config file, layered over config/default.toml
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Seed for reproducible sampling
    #[arg(long)]
    seed: Option<u64>,

    /// Print the final population as JSON on stdout
    #[arg(long)]
    json: bool,
}

impl Cli {
    /// 命令行覆盖配置文件
    fn apply(&self, cfg: &mut AppConfig) {
        if let Some(n) = self.num_thinking_styles {
            cfg.run.num_thinking_styles = n;
        }
        if let Some(n) = self.num_mutation_prompts {
            cfg.run.num_mutation_prompts = n;
        }
        if let Some(p) = &self.problem_statement {
            cfg.run.problem_description = p.clone();
        }
        if let Some(n) = self.num_evals {
            cfg.run.num_evals = n;
        }
        if let Some(n) = self.generations {
            cfg.run.generations = n;
        }
        if let Some(d) = &self.dataset {
            cfg.run.dataset_path = d.clone();
        }
        if self.seed.is_some() {
            cfg.run.seed = self.seed;
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    observability::init();
    let cli = Cli::parse();

    let mut cfg = load_config(cli.config.clone()).unwrap_or_else(|e| {
        tracing::warn!("Config load failed ({}), using defaults", e);
        AppConfig::default()
    });
    cli.apply(&mut cfg);
    let run = cfg.run.clone();

    let client = create_client_from_config(&cfg).context("Failed to create LLM client")?;
    let examples = read_jsonl(&run.dataset_path).context("Failed to load example pool")?;
    tracing::info!(
        "Loaded {} examples from {}",
        examples.len(),
        run.dataset_path.display()
    );

    let engine = EvolutionEngine::new(
        client.clone(),
        EvolutionConfig::from(&cfg),
        Arc::new(TracingReporter),
    );

    let mut rng = engine.config().rng(CATALOG_STREAM);
    let thinking_styles = sample_prompts(
        "thinking styles",
        THINKING_STYLES,
        run.num_thinking_styles,
        &mut rng,
    )?;
    let mutation_prompts = sample_prompts(
        "mutation prompts",
        MUTATION_PROMPTS,
        run.num_mutation_prompts,
        &mut rng,
    )?;

    let mut population =
        create_population(&thinking_styles, &mutation_prompts, &run.problem_description);

    let mut evolution = engine.evolution_loop();
    engine
        .initializer()
        .init_run(
            &mut population,
            evolution.evaluator_mut(),
            &examples,
            run.num_evals,
        )
        .await
        .context("Initialization failed")?;

    let summaries = evolution
        .run(run.generations, &mut population, &examples, run.num_evals)
        .await
        .context("Evolution run failed")?;

    println!("\nGeneration summary:");
    for s in &summaries {
        println!(
            "  Generation {}: max fitness {:.2} ({} units)",
            s.generation, s.max_fitness, s.units
        );
    }
    if let Some(elite) = population.latest_elite() {
        println!(
            "\nBest task prompt (fitness {:.2}):\n{}",
            elite.fitness, elite.task_prompt
        );
    }
    let (prompt_tokens, completion_tokens, total_tokens) = client.token_usage();
    tracing::info!(
        prompt_tokens,
        completion_tokens,
        total_tokens,
        "Token usage"
    );

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&population)?);
    }

    Ok(())
}
