//! 评估样本池：GSM8K 风格 JSONL 读取与答案抽取/比对
//!
//! 每行一个 `{"question": ..., "answer": ...}`；参考解答最后一行形如 `#### 1,234`。

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 一道评估题
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Example {
    pub question: String,
    pub answer: String,
}

impl Example {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
        }
    }
}

#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed example at line {line}: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// 参考解答里没有 `#### <number>` 标记；评估时跳过该题，不致命
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Answer marker not found in reference solution")]
pub struct ExtractionError;

static ANSWER_RE: OnceLock<Regex> = OnceLock::new();

fn answer_re() -> &'static Regex {
    ANSWER_RE.get_or_init(|| Regex::new(r"#### (\-?[0-9\.\,]+)").unwrap())
}

/// 读取 JSONL 样本池，空行忽略
pub fn read_jsonl(path: impl AsRef<Path>) -> Result<Vec<Example>, DatasetError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| DatasetError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(idx, line)| {
            serde_json::from_str(line).map_err(|source| DatasetError::Parse {
                line: idx + 1,
                source,
            })
        })
        .collect()
}

/// 从参考解答中取出标准答案字面量（保留逗号、小数点与负号）
pub fn gsm_extract_answer(solution: &str) -> Option<&str> {
    answer_re()
        .captures(solution)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim())
}

pub fn extract_expected_answer(solution: &str) -> Result<&str, ExtractionError> {
    gsm_extract_answer(solution).ok_or(ExtractionError)
}

/// 字面子串匹配：不做数值等价判断，"42" 也会命中 "420"
pub fn check_answer_in_response(model_answer: &str, expected_answer: &str) -> bool {
    model_answer.contains(expected_answer)
}
