//! 适应度评估：每轮抽一组样本，所有单元在同一组样本上打分，随后选出本轮精英
//!
//! - 同一轮内样本共享，保证单元间可比；每次调用重新抽样，跨代分数不在同一组题上
//! - 单元之间串行；单元内的样本请求可按 `max_concurrency` 并发，结果按样本顺序计分
//! - 精英选择在所有单元打分完毕后进行，只有这一处写 `population.elites`

use std::sync::Arc;

use futures_util::{stream, StreamExt, TryStreamExt};
use rand::rngs::StdRng;

use crate::dataset::{check_answer_in_response, extract_expected_answer, Example};
use crate::evolution::{EvolutionConfig, EvolutionError, EvolutionUnit, Population};
use crate::llm::{CompletionClient, LlmError};
use crate::observability::{EvolutionEvent, Reporter};

/// 精英选择：适应度严格最高者，并列取最早出现的；空种群报错
///
/// 初始哨兵为 -1，任何合法适应度都会超过它；返回 None 只在没有单元可比较时出现（如 NaN）。
pub fn select_elite(units: &[EvolutionUnit]) -> Result<Option<usize>, EvolutionError> {
    if units.is_empty() {
        return Err(EvolutionError::EmptyPopulation);
    }

    let mut elite_fitness = -1.0;
    let mut current_elite = None;
    for (idx, unit) in units.iter().enumerate() {
        if unit.fitness > elite_fitness {
            elite_fitness = unit.fitness;
            current_elite = Some(idx);
        }
    }
    Ok(current_elite)
}

/// 评估入口的前置检查，在任何服务调用之前完成
pub fn check_evaluation_inputs(
    population: &Population,
    pool: &[Example],
    num_evals: usize,
) -> Result<(), EvolutionError> {
    if population.units.is_empty() {
        return Err(EvolutionError::EmptyPopulation);
    }
    if num_evals > pool.len() {
        return Err(EvolutionError::Sampling {
            requested: num_evals,
            available: pool.len(),
        });
    }
    Ok(())
}

pub struct FitnessEvaluator {
    client: Arc<dyn CompletionClient>,
    config: EvolutionConfig,
    reporter: Arc<dyn Reporter>,
    rng: StdRng,
}

impl FitnessEvaluator {
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
        }
    }

    /// 原地更新每个单元的 fitness，并追加本轮精英；返回同一个种群便于链式调用
    pub async fn evaluate<'p>(
        &mut self,
        population: &'p mut Population,
        pool: &[Example],
        num_evals: usize,
    ) -> Result<&'p mut Population, EvolutionError> {
        self.evaluate_pass(population, pool, num_evals, None).await?;
        Ok(population)
    }

    /// `generation` 只用于事件与错误定位
    pub(crate) async fn evaluate_pass(
        &mut self,
        population: &mut Population,
        pool: &[Example],
        num_evals: usize,
        generation: Option<usize>,
    ) -> Result<(), EvolutionError> {
        check_evaluation_inputs(population, pool, num_evals)?;

        let sample: Vec<&Example> = rand::seq::index::sample(&mut self.rng, pool.len(), num_evals)
            .into_iter()
            .map(|i| &pool[i])
            .collect();

        self.reporter.report(&EvolutionEvent::EvaluationStarted {
            generation,
            units: population.units.len(),
            sample_size: sample.len(),
        });

        let step = 1.0 / num_evals as f64;
        for (unit_idx, unit) in population.units.iter_mut().enumerate() {
            unit.fitness = 0.0;

            let answers = self
                .answer_all(&unit.task_prompt, &sample)
                .await
                .map_err(|source| EvolutionError::Service {
                    generation,
                    unit: unit_idx,
                    source,
                })?;

            for (example_idx, (example, answer)) in sample.iter().zip(&answers).enumerate() {
                let expected = match extract_expected_answer(&example.answer) {
                    Ok(expected) => expected,
                    Err(_) => {
                        self.reporter.report(&EvolutionEvent::ExampleSkipped {
                            unit: unit_idx,
                            example: example_idx,
                        });
                        continue;
                    }
                };

                let correct = check_answer_in_response(answer, expected);
                if correct {
                    unit.fitness += step;
                }
                self.reporter.report(&EvolutionEvent::ExampleScored {
                    unit: unit_idx,
                    example: example_idx,
                    expected: expected.to_string(),
                    answer: answer.clone(),
                    correct,
                });
            }
        }

        if let Some(idx) = select_elite(&population.units)? {
            let elite = population.units[idx].clone();
            self.reporter.report(&EvolutionEvent::EliteRecorded {
                unit: idx,
                fitness: elite.fitness,
            });
            population.elites.push(elite);
        }

        Ok(())
    }

    /// 用同一个任务提示词回答整组样本，结果与样本顺序一致
    async fn answer_all(
        &self,
        task_prompt: &str,
        sample: &[&Example],
    ) -> Result<Vec<String>, LlmError> {
        let requests: Vec<_> = sample
            .iter()
            .map(|example| {
                self.config
                    .request(format!("{} {}", task_prompt, example.question))
            })
            .collect();

        stream::iter(requests)
            .map(|request| {
                let client = self.client.clone();
                async move {
                    client
                        .complete(&request)
                        .await
                        .map(|c| c.text.trim().to_string())
                }
            })
            .buffered(self.config.max_concurrency.max(1))
            .try_collect()
            .await
    }
}
