use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::config::AppConfig;
use crate::evolution::fitness::FitnessEvaluator;
use crate::evolution::initializer::PopulationInitializer;
use crate::evolution::loop_::EvolutionLoop;
use crate::evolution::mutation::LlmMutator;
use crate::llm::{effective_model, CompletionClient, CompletionRequest};
use crate::observability::Reporter;

/// 各组件共享的补全与随机数设置
#[derive(Debug, Clone)]
pub struct EvolutionConfig {
    pub model: String,
    pub max_tokens: u32,
    /// 单元内样本评估的并发上限；1 为严格串行
    pub max_concurrency: usize,
    /// 固定种子时各组件使用互不相同但可复现的随机流
    pub seed: Option<u64>,
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            max_tokens: 1000,
            max_concurrency: 1,
            seed: None,
        }
    }
}

impl From<&AppConfig> for EvolutionConfig {
    fn from(cfg: &AppConfig) -> Self {
        Self {
            model: effective_model(cfg),
            max_tokens: cfg.llm.max_tokens,
            max_concurrency: cfg.llm.max_concurrent_requests.max(1),
            seed: cfg.run.seed,
        }
    }
}

impl EvolutionConfig {
    pub fn request(&self, prompt: impl Into<String>) -> CompletionRequest {
        CompletionRequest::new(self.model.clone(), prompt, self.max_tokens)
    }

    /// 第 `stream` 条随机流
    pub fn rng(&self, stream: u64) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(stream)),
            None => StdRng::from_entropy(),
        }
    }
}

const EVALUATOR_STREAM: u64 = 0;
const MUTATOR_STREAM: u64 = 1;
/// 供调用方抽样思维风格/变异提示词
pub const CATALOG_STREAM: u64 = 2;

/// 组装初始化器、评估器、变异器与代际循环，共享同一个客户端与 Reporter
pub struct EvolutionEngine {
    client: Arc<dyn CompletionClient>,
    config: EvolutionConfig,
    reporter: Arc<dyn Reporter>,
}

impl EvolutionEngine {
    pub fn new(
        client: Arc<dyn CompletionClient>,
        config: EvolutionConfig,
        reporter: Arc<dyn Reporter>,
    ) -> Self {
        Self {
            client,
            config,
            reporter,
        }
    }

    pub fn config(&self) -> &EvolutionConfig {
        &self.config
    }

    pub fn initializer(&self) -> PopulationInitializer {
        PopulationInitializer::new(
            self.client.clone(),
            self.config.clone(),
            self.reporter.clone(),
        )
    }

    pub fn evaluator(&self) -> FitnessEvaluator {
        FitnessEvaluator::new(
            self.client.clone(),
            self.config.clone(),
            self.reporter.clone(),
            self.config.rng(EVALUATOR_STREAM),
        )
    }

    pub fn mutator(&self) -> LlmMutator {
        LlmMutator::new(
            self.client.clone(),
            self.config.clone(),
            self.reporter.clone(),
            self.config.rng(MUTATOR_STREAM),
        )
    }

    /// 默认组合：LLM 变异器 + 新的评估器
    pub fn evolution_loop(&self) -> EvolutionLoop {
        EvolutionLoop::new(
            Box::new(self.mutator()),
            self.evaluator(),
            self.reporter.clone(),
        )
    }
}
