//! 进化过程事件：初始化、评估、精英记录、每代汇总

use serde::Serialize;

/// 单个过程事件（可序列化为 JSON）
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EvolutionEvent {
    /// 交叉积建好种群
    PopulationCreated { units: usize },
    /// 种子阶段为某单元生成了初始任务提示词
    UnitSeeded { unit: usize, task_prompt: String },
    /// 一轮适应度评估开始（generation 为 None 表示初始化阶段的评估）
    EvaluationStarted {
        generation: Option<usize>,
        units: usize,
        sample_size: usize,
    },
    /// 单题判分结果（answer 为模型完整回答，TracingReporter 输出时只取末尾）
    ExampleScored {
        unit: usize,
        example: usize,
        expected: String,
        answer: String,
        correct: bool,
    },
    /// 参考答案缺少标记，跳过该题
    ExampleSkipped { unit: usize, example: usize },
    /// 本轮精英
    EliteRecorded { unit: usize, fitness: f64 },
    GenerationStarted { generation: usize },
    /// 变异算子作用于某单元
    UnitMutated { unit: usize, operator: String },
    /// 一代结束（max_fitness 仅供观察）
    GenerationCompleted { generation: usize, max_fitness: f64 },
}
