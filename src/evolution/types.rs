use serde::{Deserialize, Serialize};

/// 种群中的一个候选：思维风格 + 变异提示词 -> 任务提示词
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvolutionUnit {
    pub thinking_style: String,
    pub mutation_prompt: String,
    pub task_prompt: String,
    /// 最近一次评估中答对的比例，[0, 1]；每轮评估开始时清零
    pub fitness: f64,
    /// 曾经用过的任务提示词（只追加）
    pub history: Vec<String>,
}

impl EvolutionUnit {
    pub fn new(thinking_style: impl Into<String>, mutation_prompt: impl Into<String>) -> Self {
        Self {
            thinking_style: thinking_style.into(),
            mutation_prompt: mutation_prompt.into(),
            task_prompt: String::new(),
            fitness: 0.0,
            history: Vec::new(),
        }
    }

    /// 替换任务提示词，旧值（非空时）进入 history
    pub fn set_task_prompt(&mut self, prompt: impl Into<String>) {
        let previous = std::mem::replace(&mut self.task_prompt, prompt.into());
        if !previous.is_empty() {
            self.history.push(previous);
        }
    }
}

/// 种群：单元集合 + 代数、问题描述、历代精英
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Population {
    /// 创建时的单元数；变异可能增删单元，之后不保证等于 units.len()
    pub size: usize,
    /// 已完成的代数
    pub age: usize,
    pub problem_description: String,
    pub units: Vec<EvolutionUnit>,
    /// 每轮评估的最佳单元快照，只追加、不去重
    pub elites: Vec<EvolutionUnit>,
}

impl Population {
    pub fn new(problem_description: impl Into<String>, units: Vec<EvolutionUnit>) -> Self {
        Self {
            size: units.len(),
            age: 0,
            problem_description: problem_description.into(),
            units,
            elites: Vec::new(),
        }
    }

    /// 当前单元的最高适应度；空种群返回 None
    pub fn max_fitness(&self) -> Option<f64> {
        self.units.iter().map(|u| u.fitness).reduce(f64::max)
    }

    /// 最近一次记录的精英
    pub fn latest_elite(&self) -> Option<&EvolutionUnit> {
        self.elites.last()
    }
}

/// 一代结束时的汇总（仅供观察，不影响算法）
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationSummary {
    pub generation: usize,
    pub max_fitness: f64,
    pub units: usize,
}
