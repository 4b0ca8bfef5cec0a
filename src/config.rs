//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先读 TOML 文件，再用环境变量 `BREEDER__*` 覆盖（双下划线表示嵌套，如 `BREEDER__LLM__PROVIDER=mock`）。

use std::path::PathBuf;

use serde::Deserialize;

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    #[serde(default)]
    pub llm: LlmSection,
    #[serde(default)]
    pub run: RunSection,
}

/// [llm] 段：后端选择、凭证、单次请求限制
#[derive(Debug, Clone, Deserialize)]
pub struct LlmSection {
    /// 后端：openai / deepseek / mock
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_model")]
    pub model: String,
    pub base_url: Option<String>,
    /// 显式凭证；未设置时由 [`AppConfig::api_key`] 回退到环境变量
    pub api_key: Option<String>,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// 单次请求超时（秒）
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// 同一单元内并发评估的样本数；1 表示严格串行
    #[serde(default = "default_max_concurrent_requests")]
    pub max_concurrent_requests: usize,
    #[serde(default)]
    pub retry: RetrySection,
}

fn default_provider() -> String {
    "openai".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_max_tokens() -> u32 {
    1000
}

fn default_request_timeout_secs() -> u64 {
    60
}

fn default_max_concurrent_requests() -> usize {
    1
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            base_url: None,
            api_key: None,
            max_tokens: default_max_tokens(),
            request_timeout_secs: default_request_timeout_secs(),
            max_concurrent_requests: default_max_concurrent_requests(),
            retry: RetrySection::default(),
        }
    }
}

/// [llm.retry] 段：指数退避重试
#[derive(Debug, Clone, Deserialize)]
pub struct RetrySection {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

fn default_max_retries() -> u32 {
    3
}

fn default_initial_backoff_ms() -> u64 {
    500
}

fn default_max_backoff_ms() -> u64 {
    8000
}

impl Default for RetrySection {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
        }
    }
}

/// [run] 段：一次进化运行的全部参数（命令行可覆盖）
#[derive(Debug, Clone, Deserialize)]
pub struct RunSection {
    #[serde(default = "default_num_thinking_styles")]
    pub num_thinking_styles: usize,
    #[serde(default = "default_num_mutation_prompts")]
    pub num_mutation_prompts: usize,
    #[serde(default = "default_problem_description")]
    pub problem_description: String,
    /// 每轮评估抽取的样本数
    #[serde(default = "default_num_evals")]
    pub num_evals: usize,
    #[serde(default = "default_generations")]
    pub generations: usize,
    #[serde(default = "default_dataset_path")]
    pub dataset_path: PathBuf,
    /// 固定随机种子，便于复现抽样
    pub seed: Option<u64>,
}

fn default_num_thinking_styles() -> usize {
    2
}

fn default_num_mutation_prompts() -> usize {
    2
}

fn default_problem_description() -> String {
    "Solve the math word problem, giving your answer as an arabic numeral.".to_string()
}

fn default_num_evals() -> usize {
    10
}

fn default_generations() -> usize {
    5
}

fn default_dataset_path() -> PathBuf {
    PathBuf::from("./gsm8k_sampled.jsonl")
}

impl Default for RunSection {
    fn default() -> Self {
        Self {
            num_thinking_styles: default_num_thinking_styles(),
            num_mutation_prompts: default_num_mutation_prompts(),
            problem_description: default_problem_description(),
            num_evals: default_num_evals(),
            generations: default_generations(),
            dataset_path: default_dataset_path(),
            seed: None,
        }
    }
}

impl AppConfig {
    /// 解析服务凭证：配置优先，其次按 provider 读环境变量。
    ///
    /// 进程内唯一读取凭证环境变量的位置；结果显式传给客户端构造函数。
    pub fn api_key(&self) -> Option<String> {
        if let Some(key) = self.llm.api_key.as_ref().filter(|k| !k.is_empty()) {
            return Some(key.clone());
        }
        match self.llm.provider.to_lowercase().as_str() {
            "deepseek" => std::env::var("DEEPSEEK_API_KEY")
                .ok()
                .or_else(|| std::env::var("OPENAI_API_KEY").ok()),
            _ => std::env::var("OPENAI_API_KEY").ok(),
        }
    }
}

/// 从 config 目录加载配置，环境变量 BREEDER__* 可覆盖
///
/// 1. 按顺序查找 config/default.toml、../config/default.toml、default.toml，找到则作为第一源
/// 2. 若传入 config_path 且文件存在，则追加该文件（可覆盖前面的键）
/// 3. 最后叠加环境变量 BREEDER__*（双下划线表示嵌套键）
pub fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig, config::ConfigError> {
    let mut builder = config::Config::builder();

    let default_names = ["config/default", "../config/default", "default"];
    for name in default_names {
        let path = format!("{}.toml", name);
        if std::path::Path::new(&path).exists() {
            builder = builder.add_source(config::File::with_name(name).required(false));
            break;
        }
    }

    if let Some(ref path) = config_path {
        if path.exists() {
            builder = builder.add_source(config::File::from(path.clone()).required(false));
        }
    }

    builder = builder.add_source(
        config::Environment::with_prefix("BREEDER")
            .separator("__")
            .try_parsing(true),
    );

    let c = builder.build()?;
    c.try_deserialize()
}
