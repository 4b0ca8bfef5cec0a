//! 种群初始化：思维风格 × 变异提示词的交叉积，种子阶段为每个单元生成初始任务提示词

use std::sync::Arc;

use futures_util::{stream, StreamExt, TryStreamExt};

use crate::dataset::Example;
use crate::evolution::fitness::{check_evaluation_inputs, FitnessEvaluator};
use crate::evolution::{EvolutionConfig, EvolutionError, EvolutionUnit, Population};
use crate::llm::{CompletionClient, LlmError};
use crate::observability::{EvolutionEvent, Reporter};

/// 交叉积建种群：每个单元的任务提示词为空、适应度为 0、history 为空
pub fn create_population(
    thinking_styles: &[String],
    mutation_prompts: &[String],
    problem_description: &str,
) -> Population {
    let units = thinking_styles
        .iter()
        .flat_map(|t| {
            mutation_prompts
                .iter()
                .map(move |m| EvolutionUnit::new(t.clone(), m.clone()))
        })
        .collect();
    Population::new(problem_description, units)
}

/// 种子阶段的 prompt
pub fn seed_prompt(unit: &EvolutionUnit, problem_description: &str) -> String {
    format!(
        "{} {} INSTRUCTION: {} INSTRUCTION MUTANT = ",
        unit.thinking_style, unit.mutation_prompt, problem_description
    )
}

pub struct PopulationInitializer {
    client: Arc<dyn CompletionClient>,
    config: EvolutionConfig,
    reporter: Arc<dyn Reporter>,
}

impl PopulationInitializer {
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

    /// 每个单元一次服务调用，trim 后写入 task_prompt；空回复视为服务错误
    pub async fn seed(&self, population: &mut Population) -> Result<(), EvolutionError> {
        let requests: Vec<_> = population
            .units
            .iter()
            .map(|unit| {
                self.config
                    .request(seed_prompt(unit, &population.problem_description))
            })
            .collect();

        let prompts: Vec<String> = stream::iter(requests.into_iter().enumerate())
            .map(|(idx, request)| {
                let client = self.client.clone();
                async move {
                    let text = client
                        .complete(&request)
                        .await
                        .map(|c| c.text.trim().to_string())
                        .and_then(|text| {
                            if text.is_empty() {
                                Err(LlmError::EmptyResponse)
                            } else {
                                Ok(text)
                            }
                        });
                    text.map_err(|source| EvolutionError::Service {
                        generation: None,
                        unit: idx,
                        source,
                    })
                }
            })
            .buffered(self.config.max_concurrency.max(1))
            .try_collect()
            .await?;

        for (idx, (unit, prompt)) in population.units.iter_mut().zip(prompts).enumerate() {
            unit.set_task_prompt(prompt);
            self.reporter.report(&EvolutionEvent::UnitSeeded {
                unit: idx,
                task_prompt: unit.task_prompt.clone(),
            });
        }
        Ok(())
    }

    /// 种子阶段 + 一轮适应度评估。输入检查先于任何服务调用。
    pub async fn init_run<'p>(
        &self,
        population: &'p mut Population,
        evaluator: &mut FitnessEvaluator,
        pool: &[Example],
        num_evals: usize,
    ) -> Result<&'p mut Population, EvolutionError> {
        check_evaluation_inputs(population, pool, num_evals)?;
        self.reporter.report(&EvolutionEvent::PopulationCreated {
            units: population.units.len(),
        });

        self.seed(population).await?;
        evaluator.evaluate(population, pool, num_evals).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MockLlmClient;
    use crate::observability::NoopReporter;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn pool() -> Vec<Example> {
        vec![
            Example::new("Q1", "#### 5"),
            Example::new("Q2", "#### 6"),
            Example::new("Q3", "#### 7"),
        ]
    }

    fn initializer(client: Arc<MockLlmClient>) -> PopulationInitializer {
        PopulationInitializer::new(client, EvolutionConfig::default(), Arc::new(NoopReporter))
    }

    fn evaluator(client: Arc<MockLlmClient>) -> FitnessEvaluator {
        FitnessEvaluator::new(
            client,
            EvolutionConfig::default(),
            Arc::new(NoopReporter),
            StdRng::seed_from_u64(0),
        )
    }

    #[test]
    fn test_cross_product() {
        let population = create_population(
            &strings(&["t1", "t2", "t3"]),
            &strings(&["m1", "m2"]),
            "problem",
        );
        assert_eq!(population.units.len(), 6);
        assert_eq!(population.size, 6);
        assert_eq!(population.age, 0);
        assert!(population.elites.is_empty());
        assert_eq!(population.units[0].thinking_style, "t1");
        assert_eq!(population.units[1].mutation_prompt, "m2");
        assert_eq!(population.units[5].thinking_style, "t3");
        for unit in &population.units {
            assert_eq!(unit.fitness, 0.0);
            assert!(unit.task_prompt.is_empty());
            assert!(unit.history.is_empty());
        }
    }

    #[test]
    fn test_seed_prompt_layout() {
        let unit = EvolutionUnit::new("Think.", "Mutate.");
        assert_eq!(
            seed_prompt(&unit, "Solve it."),
            "Think. Mutate. INSTRUCTION: Solve it. INSTRUCTION MUTANT = "
        );
    }

    #[tokio::test]
    async fn test_seed_trims_and_keeps_history_empty() {
        let client = Arc::new(MockLlmClient::constant("  Let's solve step by step.\n"));
        let mut population = create_population(&strings(&["t"]), &strings(&["m1", "m2"]), "p");

        initializer(client.clone()).seed(&mut population).await.unwrap();

        assert_eq!(client.calls(), 2);
        for unit in &population.units {
            assert_eq!(unit.task_prompt, "Let's solve step by step.");
            assert!(unit.history.is_empty());
        }
    }

    #[tokio::test]
    async fn test_empty_seed_response_is_an_error() {
        let client = Arc::new(MockLlmClient::constant("   "));
        let mut population = create_population(&strings(&["t"]), &strings(&["m"]), "p");

        let err = initializer(client).seed(&mut population).await.unwrap_err();
        assert_eq!(
            err,
            EvolutionError::Service {
                generation: None,
                unit: 0,
                source: LlmError::EmptyResponse
            }
        );
    }

    #[tokio::test]
    async fn test_init_run_seeds_then_evaluates() {
        let client = Arc::new(MockLlmClient::new(|prompt| {
            if prompt.contains("INSTRUCTION MUTANT") {
                Ok("Answer:".to_string())
            } else {
                Ok("5 6 7".to_string())
            }
        }));
        let mut population = create_population(&strings(&["t1", "t2"]), &strings(&["m"]), "p");
        let mut eval = evaluator(client.clone());

        initializer(client.clone())
            .init_run(&mut population, &mut eval, &pool(), 3)
            .await
            .unwrap();

        // 2 次种子 + 2 单元 × 3 题
        assert_eq!(client.calls(), 8);
        assert_eq!(population.elites.len(), 1);
        for unit in &population.units {
            assert!((unit.fitness - 1.0).abs() < 1e-9);
        }
    }

    #[tokio::test]
    async fn test_init_run_fails_fast_on_oversized_sample() {
        let client = Arc::new(MockLlmClient::echo());
        let mut population = create_population(&strings(&["t"]), &strings(&["m"]), "p");
        let mut eval = evaluator(client.clone());

        let err = initializer(client.clone())
            .init_run(&mut population, &mut eval, &pool(), 10)
            .await
            .unwrap_err();

        assert!(matches!(err, EvolutionError::Sampling { .. }));
        assert_eq!(client.calls(), 0);
    }
}
