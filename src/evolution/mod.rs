//! 进化核心：数据模型、种群初始化、适应度评估、变异、代际循环

pub mod engine;
pub mod error;
pub mod fitness;
pub mod initializer;
pub mod loop_;
pub mod mutation;
pub mod prompts;
pub mod types;

pub use engine::{EvolutionConfig, EvolutionEngine, CATALOG_STREAM};
pub use error::EvolutionError;
pub use fitness::{check_evaluation_inputs, select_elite, FitnessEvaluator};
pub use initializer::{create_population, seed_prompt, PopulationInitializer};
pub use loop_::EvolutionLoop;
pub use mutation::{LlmMutator, MutationOperator, Mutator};
pub use prompts::{sample_prompts, MUTATION_PROMPTS, THINKING_STYLES};
pub use types::{EvolutionUnit, GenerationSummary, Population};
