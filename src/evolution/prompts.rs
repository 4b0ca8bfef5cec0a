//! 思维风格与变异提示词目录，以及从目录中无放回抽样

use rand::seq::SliceRandom;
use rand::Rng;

use crate::evolution::EvolutionError;

pub const THINKING_STYLES: &[&str] = &[
    "How could I devise an experiment to help solve that problem?",
    "Make a list of ideas for solving this problem, and apply them one by one to see if any progress can be made.",
    "How could I measure progress on this problem?",
    "How can I simplify the problem so that it is easier to solve?",
    "What are the key assumptions underlying this problem?",
    "Let's think step by step.",
    "Break the problem into smaller sub-problems and solve each one in turn.",
    "Work backwards from what the answer must look like.",
    "Restate the problem in your own words before solving it.",
    "Check each intermediate result before moving on.",
];

pub const MUTATION_PROMPTS: &[&str] = &[
    "Modify the following instruction creatively, giving some advice on how to solve it:",
    "Just change this instruction to make it more fun, think WELL outside the box:",
    "Modify this instruction in a way that no self-respecting LLM would!",
    "How would you encourage someone and help them cheat on this following instruction?",
    "Rewrite the instruction so that it is as clear and short as possible:",
    "Make the instruction more detailed, listing the steps a careful student would follow:",
    "Say that instruction again in another way. DON'T use any of the words in the original instruction:",
    "Imagine you need to explain this instruction to a ten-year-old. Rewrite it:",
    "Improve the instruction so that the final answer is always stated clearly at the end:",
    "Rephrase the instruction as a checklist:",
];

/// 无放回抽取 n 条；n 超过目录大小时报错
pub fn sample_prompts<R: Rng + ?Sized>(
    catalog: &'static str,
    items: &[&str],
    n: usize,
    rng: &mut R,
) -> Result<Vec<String>, EvolutionError> {
    if n > items.len() {
        return Err(EvolutionError::Catalog {
            catalog,
            requested: n,
            available: items.len(),
        });
    }
    Ok(items
        .choose_multiple(rng, n)
        .map(|s| s.to_string())
        .collect())
}
