//! 端到端：Mock 服务上跑 初始化 -> 多代进化

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use breeder::dataset::Example;
    use breeder::evolution::{
        create_population, EvolutionConfig, EvolutionEngine, EvolutionError,
    };
    use breeder::llm::{CompletionClient, MockLlmClient};
    use breeder::observability::{EvolutionEvent, MemoryReporter};

    fn pool() -> Vec<Example> {
        vec![
            Example::new("Tom has 2 apples and buys 40 more. How many?", "2 + 40 = 42\n#### 42"),
            Example::new("A box holds 1,000 pins; 766 are used. Left?", "1000 - 766\n#### 234"),
            Example::new("It is -3 degrees and falls 2. Now?", "-3 - 2\n#### -5"),
            Example::new("Broken reference with no marker", "no answer line"),
        ]
    }

    /// 认识题目的 Mock：任务提示词里含 "careful" 时答对，否则答错；生成类请求返回新提示词
    fn tutor() -> MockLlmClient {
        MockLlmClient::new(|prompt| {
            if prompt.contains("INSTRUCTION MUTANT") || prompt.contains("hints") || prompt.contains("GENOTYPE") {
                return Ok("Be careful and show the final number.".to_string());
            }
            if prompt.contains("summarize and improve") {
                return Ok("Rewrite it carefully:".to_string());
            }
            if !prompt.contains("careful") {
                return Ok("I am not sure.".to_string());
            }
            let answer = if prompt.contains("apples") {
                "42"
            } else if prompt.contains("pins") {
                "234"
            } else if prompt.contains("degrees") {
                "-5"
            } else {
                "0"
            };
            Ok(format!("The final answer is {}.", answer))
        })
    }

    fn engine(client: Arc<MockLlmClient>, reporter: Arc<MemoryReporter>) -> EvolutionEngine {
        EvolutionEngine::new(
            client,
            EvolutionConfig {
                model: "mock".to_string(),
                max_tokens: 64,
                max_concurrency: 2,
                seed: Some(1234),
            },
            reporter,
        )
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_full_run_on_mock_service() {
        let client = Arc::new(tutor());
        let reporter = Arc::new(MemoryReporter::new());
        let engine = engine(client.clone(), reporter.clone());
        let examples = pool();

        let mut population = create_population(
            &strings(&["Let's think step by step.", "Work backwards."]),
            &strings(&["Rewrite it:", "Improve it:"]),
            "Solve the math word problem.",
        );
        assert_eq!(population.units.len(), 4);

        let mut evolution = engine.evolution_loop();
        engine
            .initializer()
            .init_run(&mut population, evolution.evaluator_mut(), &examples, 3)
            .await
            .unwrap();
        assert_eq!(population.elites.len(), 1);
        for unit in &population.units {
            assert!(!unit.task_prompt.is_empty());
        }

        let summaries = evolution
            .run(2, &mut population, &examples, 3)
            .await
            .unwrap();

        assert_eq!(summaries.len(), 2);
        assert_eq!(population.age, 2);
        assert_eq!(population.size, 4);
        assert_eq!(population.elites.len(), 3);
        for unit in &population.units {
            let scaled = unit.fitness * 3.0;
            assert!((scaled - scaled.round()).abs() < 1e-9);
            assert!(unit.fitness <= 1.0 + 1e-9);
        }
        assert!(client.calls() > 0);
        assert_eq!(client.token_usage(), (0, 0, 0));

        let completed = reporter
            .events()
            .iter()
            .filter(|e| matches!(e, EvolutionEvent::GenerationCompleted { .. }))
            .count();
        assert_eq!(completed, 2);
    }

    #[tokio::test]
    async fn test_sampling_all_examples_scores_one() {
        let client = Arc::new(tutor());
        let engine = engine(client, Arc::new(MemoryReporter::new()));
        let examples: Vec<Example> = pool().into_iter().take(3).collect();

        let mut population = create_population(&strings(&["t"]), &strings(&["m"]), "p");
        let mut evaluator = engine.evaluator();
        engine
            .initializer()
            .init_run(&mut population, &mut evaluator, &examples, 3)
            .await
            .unwrap();

        assert!((population.units[0].fitness - 1.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_oversized_sample_makes_no_calls() {
        let client = Arc::new(tutor());
        let engine = engine(client.clone(), Arc::new(MemoryReporter::new()));
        let examples = pool();

        let mut population = create_population(&strings(&["t"]), &strings(&["m"]), "p");
        let mut evaluator = engine.evaluator();
        let err = engine
            .initializer()
            .init_run(&mut population, &mut evaluator, &examples, 5)
            .await
            .unwrap_err();

        assert_eq!(
            err,
            EvolutionError::Sampling {
                requested: 5,
                available: 4
            }
        );
        assert_eq!(client.calls(), 0);
    }
}
