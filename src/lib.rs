//! Breeder - Promptbreeder 风格的自指进化搜索
//!
//! 模块划分：
//! - **config**: 应用配置加载（TOML + 环境变量）
//! - **dataset**: 评估样本池读取、答案抽取与比对
//! - **evolution**: 种群、初始化、适应度评估、变异、代际循环
//! - **llm**: 补全客户端抽象与实现（OpenAI 兼容 / DeepSeek / Mock）+ 重试
//! - **observability**: 进化事件、Reporter、tracing 初始化

pub mod config;
pub mod dataset;
pub mod evolution;
pub mod llm;
pub mod observability;

pub use evolution::{EvolutionEngine, EvolutionLoop, Population};
