//! Reporter：核心向外报告事件的唯一通道

use std::sync::Mutex;

use crate::observability::EvolutionEvent;

/// 回答预览长度（字符数，取末尾）
const ANSWER_PREVIEW_CHARS: usize = 500;

pub trait Reporter: Send + Sync {
    fn report(&self, event: &EvolutionEvent);
}

/// 转发到 tracing：每代汇总与精英用 info，逐题判分用 debug
#[derive(Debug, Default)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn report(&self, event: &EvolutionEvent) {
        match event {
            EvolutionEvent::PopulationCreated { units } => {
                tracing::info!("Created initial population with {} units", units)
            }
            EvolutionEvent::UnitSeeded { unit, task_prompt } => {
                tracing::debug!("Unit {} seeded: {}", unit, task_prompt)
            }
            EvolutionEvent::EvaluationStarted {
                generation,
                units,
                sample_size,
            } => match generation {
                Some(g) => tracing::info!(
                    "Generation {}: evaluating {} units on {} examples",
                    g,
                    units,
                    sample_size
                ),
                None => tracing::info!(
                    "Initial evaluation of {} units on {} examples",
                    units,
                    sample_size
                ),
            },
            EvolutionEvent::ExampleScored {
                unit,
                example,
                expected,
                answer,
                correct,
            } => tracing::debug!(
                unit,
                example,
                expected = %expected,
                correct,
                "LLM's answer: {}",
                tail(answer, ANSWER_PREVIEW_CHARS)
            ),
            EvolutionEvent::ExampleSkipped { unit, example } => tracing::warn!(
                "Unit {}: example {} has no answer marker, skipped",
                unit,
                example
            ),
            EvolutionEvent::EliteRecorded { unit, fitness } => {
                tracing::info!("Elite: unit {} (fitness {:.2})", unit, fitness)
            }
            EvolutionEvent::GenerationStarted { generation } => {
                tracing::info!("Running generation {}", generation)
            }
            EvolutionEvent::UnitMutated { unit, operator } => {
                tracing::debug!("Unit {} mutated by {}", unit, operator)
            }
            EvolutionEvent::GenerationCompleted {
                generation,
                max_fitness,
            } => tracing::info!(
                "Generation {} summary: max fitness {:.2}",
                generation,
                max_fitness
            ),
        }
    }
}

/// 丢弃所有事件
#[derive(Debug, Default)]
pub struct NoopReporter;

impl Reporter for NoopReporter {
    fn report(&self, _event: &EvolutionEvent) {}
}

/// 收集事件到内存（测试用）
#[derive(Debug, Default)]
pub struct MemoryReporter {
    events: Mutex<Vec<EvolutionEvent>>,
}

impl MemoryReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<EvolutionEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

impl Reporter for MemoryReporter {
    fn report(&self, event: &EvolutionEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}

/// 取字符串末尾至多 n 个字符
fn tail(s: &str, n: usize) -> &str {
    let count = s.chars().count();
    if count <= n {
        return s;
    }
    match s.char_indices().nth(count - n) {
        Some((idx, _)) => &s[idx..],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tail_respects_char_boundaries() {
        assert_eq!(tail("hello", 10), "hello");
        assert_eq!(tail("hello", 3), "llo");
        assert_eq!(tail("答案是四十二", 2), "十二");
    }

    #[test]
    fn test_memory_reporter_keeps_order() {
        let reporter = MemoryReporter::new();
        reporter.report(&EvolutionEvent::GenerationStarted { generation: 0 });
        reporter.report(&EvolutionEvent::GenerationCompleted {
            generation: 0,
            max_fitness: 0.5,
        });
        let events = reporter.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0], EvolutionEvent::GenerationStarted { generation: 0 });
    }

    #[test]
    fn test_event_serializes_with_type_tag() {
        let json = serde_json::to_value(EvolutionEvent::EliteRecorded {
            unit: 3,
            fitness: 1.0,
        })
        .unwrap();
        assert_eq!(json["type"], "elite_recorded");
        assert_eq!(json["unit"], 3);
    }
}
