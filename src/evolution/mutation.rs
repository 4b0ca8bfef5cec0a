//! 变异：代际循环只依赖 [`Mutator`]；LlmMutator 在一个封闭的算子集合上统一分派
//!
//! 每个单元每代随机选一个算子。任务提示词的每次改变都经过 `set_task_prompt`，旧值进入 history；
//! 变异提示词本身也可被改写（HyperMutation）。

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::evolution::{EvolutionConfig, EvolutionError, Population};
use crate::llm::{CompletionClient, LlmError};
use crate::observability::{EvolutionEvent, Reporter};

/// LineageBasedMutation 最多引用的精英数
const LINEAGE_WINDOW: usize = 5;

/// 原地修改 `population.units` 的变异策略
#[async_trait]
pub trait Mutator: Send {
    async fn mutate(&mut self, population: &mut Population) -> Result<(), EvolutionError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MutationOperator {
    /// 只看问题描述，重新生成任务提示词
    ZeroOrderPromptGeneration,
    /// 用变异提示词改写当前任务提示词
    FirstOrderPromptGeneration,
    /// 参考历代精英的任务提示词生成新提示词
    LineageBasedMutation,
    /// 先用思维风格改写变异提示词，再用新变异提示词做一阶改写
    HyperMutation,
}

impl MutationOperator {
    pub const ALL: [MutationOperator; 4] = [
        MutationOperator::ZeroOrderPromptGeneration,
        MutationOperator::FirstOrderPromptGeneration,
        MutationOperator::LineageBasedMutation,
        MutationOperator::HyperMutation,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            MutationOperator::ZeroOrderPromptGeneration => "zero_order_prompt_generation",
            MutationOperator::FirstOrderPromptGeneration => "first_order_prompt_generation",
            MutationOperator::LineageBasedMutation => "lineage_based_mutation",
            MutationOperator::HyperMutation => "hyper_mutation",
        }
    }
}

impl fmt::Display for MutationOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 首个非空行，去掉常见的列表前缀（"1." / "-"）
fn first_line(text: &str) -> &str {
    text.lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .map(|l| {
            l.trim_start_matches(|c: char| c.is_ascii_digit())
                .trim_start_matches(&['.', ')', '-'][..])
                .trim()
        })
        .unwrap_or("")
}

pub struct LlmMutator {
    client: Arc<dyn CompletionClient>,
    config: EvolutionConfig,
    reporter: Arc<dyn Reporter>,
    rng: StdRng,
    operators: Vec<MutationOperator>,
}

impl LlmMutator {
    pub fn new(
        client: Arc<dyn CompletionClient>,
        config: EvolutionConfig,
        reporter: Arc<dyn Reporter>,
        rng: StdRng,
    ) -> Self {
        Self {
            client,
            config,
            reporter,
            rng,
            operators: MutationOperator::ALL.to_vec(),
        }
    }

    /// 限定可选算子；空列表时退回全部算子
    pub fn with_operators(mut self, operators: Vec<MutationOperator>) -> Self {
        self.operators = if operators.is_empty() {
            MutationOperator::ALL.to_vec()
        } else {
            operators
        };
        self
    }

    async fn ask(&self, prompt: String) -> Result<String, LlmError> {
        let completion = self.client.complete(&self.config.request(prompt)).await?;
        Ok(completion.text.trim().to_string())
    }

    /// 唯一分派点：对第 `idx` 个单元应用算子；空改写保持单元不变
    pub async fn apply(
        &self,
        operator: MutationOperator,
        population: &mut Population,
        idx: usize,
    ) -> Result<(), LlmError> {
        let problem = population.problem_description.clone();
        let lineage: Vec<String> = population
            .elites
            .iter()
            .rev()
            .take(LINEAGE_WINDOW)
            .rev()
            .map(|e| e.task_prompt.clone())
            .collect();
        let Some(unit) = population.units.get_mut(idx) else {
            return Ok(());
        };

        let new_prompt = match operator {
            MutationOperator::ZeroOrderPromptGeneration => {
                let text = self
                    .ask(format!("{} An ordered list of 100 hints: ", problem))
                    .await?;
                first_line(&text).to_string()
            }
            MutationOperator::FirstOrderPromptGeneration => {
                self.ask(format!(
                    "{} INSTRUCTION: {} INSTRUCTION MUTANT = ",
                    unit.mutation_prompt, unit.task_prompt
                ))
                .await?
            }
            MutationOperator::LineageBasedMutation if !lineage.is_empty() => {
                let listed = lineage
                    .iter()
                    .enumerate()
                    .map(|(i, p)| format!("{}. {}", i + 1, p))
                    .collect::<Vec<_>>()
                    .join("\n");
                let text = self
                    .ask(format!(
                        "GENOTYPES FOUND IN ASCENDING ORDER OF QUALITY\n{}\nINSTRUCTION: {}\nNEW GENOTYPE = ",
                        listed, problem
                    ))
                    .await?;
                first_line(&text).to_string()
            }
            // 还没有精英时退化为一阶改写
            MutationOperator::LineageBasedMutation => {
                self.ask(format!(
                    "{} INSTRUCTION: {} INSTRUCTION MUTANT = ",
                    unit.mutation_prompt, unit.task_prompt
                ))
                .await?
            }
            MutationOperator::HyperMutation => {
                let new_mutation = self
                    .ask(format!(
                        "{} Please summarize and improve the following instruction: {}",
                        unit.thinking_style, unit.mutation_prompt
                    ))
                    .await?;
                if !new_mutation.is_empty() {
                    unit.mutation_prompt = new_mutation;
                }
                self.ask(format!(
                    "{} INSTRUCTION: {} INSTRUCTION MUTANT = ",
                    unit.mutation_prompt, unit.task_prompt
                ))
                .await?
            }
        };

        if !new_prompt.is_empty() {
            unit.set_task_prompt(new_prompt);
        }
        Ok(())
    }
}

#[async_trait]
impl Mutator for LlmMutator {
    async fn mutate(&mut self, population: &mut Population) -> Result<(), EvolutionError> {
        for idx in 0..population.units.len() {
            let operator = self
                .operators
                .choose(&mut self.rng)
                .copied()
                .unwrap_or(MutationOperator::FirstOrderPromptGeneration);

            self.apply(operator, population, idx)
                .await
                .map_err(|source| EvolutionError::Mutation {
                    generation: None,
                    unit: idx,
                    operator: operator.to_string(),
                    source,
                })?;

            self.reporter.report(&EvolutionEvent::UnitMutated {
                unit: idx,
                operator: operator.to_string(),
            });
        }
        Ok(())
    }
}
