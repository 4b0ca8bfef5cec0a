//! 进化核心的错误类型
//!
//! 致命错误都带上单元下标；由 EvolutionLoop 补上代数，便于定位在哪一代、哪个单元中止。

use thiserror::Error;

use crate::llm::LlmError;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvolutionError {
    #[error("Completion service failed at {} unit {unit}: {source}", stage(.generation))]
    Service {
        /// None 表示初始化阶段
        generation: Option<usize>,
        unit: usize,
        #[source]
        source: LlmError,
    },

    #[error("Mutation '{operator}' failed at {} unit {unit}: {source}", stage(.generation))]
    Mutation {
        generation: Option<usize>,
        unit: usize,
        operator: String,
        #[source]
        source: LlmError,
    },

    /// 请求的评估样本数超过样本池大小（在任何服务调用之前报告）
    #[error("Cannot sample {requested} examples from a pool of {available}")]
    Sampling { requested: usize, available: usize },

    #[error("Population has no units")]
    EmptyPopulation,

    /// 目录里的提示词不够抽样
    #[error("Cannot sample {requested} {catalog} from a catalog of {available}")]
    Catalog {
        catalog: &'static str,
        requested: usize,
        available: usize,
    },
}

fn stage(generation: &Option<usize>) -> String {
    match generation {
        Some(g) => format!("generation {}", g),
        None => "initialization".to_string(),
    }
}

impl EvolutionError {
    /// 标记发生在第几代
    pub fn with_generation(self, g: usize) -> Self {
        match self {
            EvolutionError::Service { unit, source, .. } => EvolutionError::Service {
                generation: Some(g),
                unit,
                source,
            },
            EvolutionError::Mutation {
                unit,
                operator,
                source,
                ..
            } => EvolutionError::Mutation {
                generation: Some(g),
                unit,
                operator,
                source,
            },
            other => other,
        }
    }
}
