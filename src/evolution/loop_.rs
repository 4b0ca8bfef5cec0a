use std::sync::Arc;

use crate::dataset::Example;
use crate::evolution::fitness::{check_evaluation_inputs, FitnessEvaluator};
use crate::evolution::mutation::Mutator;
use crate::evolution::{EvolutionError, GenerationSummary, Population};
use crate::observability::{EvolutionEvent, Reporter};

/// 代际循环：每代严格按 变异 -> 评估 -> 汇总 顺序执行，跑满 n 代后停止
pub struct EvolutionLoop {
    mutator: Box<dyn Mutator>,
    evaluator: FitnessEvaluator,
    reporter: Arc<dyn Reporter>,
}

impl EvolutionLoop {
    pub fn new(
        mutator: Box<dyn Mutator>,
        evaluator: FitnessEvaluator,
        reporter: Arc<dyn Reporter>,
    ) -> Self {
        Self {
            mutator,
            evaluator,
            reporter,
        }
    }

    pub fn evaluator_mut(&mut self) -> &mut FitnessEvaluator {
        &mut self.evaluator
    }

    /// 没有按适应度提前停止，也不增删单元（那是变异器的事）。
    /// 任一致命错误立即中止，错误中带上代数与单元下标。
    pub async fn run(
        &mut self,
        n: usize,
        population: &mut Population,
        pool: &[Example],
        num_evals: usize,
    ) -> Result<Vec<GenerationSummary>, EvolutionError> {
        if n > 0 {
            check_evaluation_inputs(population, pool, num_evals)?;
        }
        let mut summaries = Vec::with_capacity(n);

        for generation in 0..n {
            self.reporter
                .report(&EvolutionEvent::GenerationStarted { generation });

            self.mutator
                .mutate(population)
                .await
                .map_err(|e| e.with_generation(generation))?;

            self.evaluator
                .evaluate_pass(population, pool, num_evals, Some(generation))
                .await
                .map_err(|e| e.with_generation(generation))?;

            let max_fitness = population
                .max_fitness()
                .ok_or(EvolutionError::EmptyPopulation)?;
            population.age += 1;

            self.reporter.report(&EvolutionEvent::GenerationCompleted {
                generation,
                max_fitness,
            });
            summaries.push(GenerationSummary {
                generation,
                max_fitness,
                units: population.units.len(),
            });
        }

        Ok(summaries)
    }
}
