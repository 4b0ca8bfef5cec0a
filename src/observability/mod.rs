//! 可观测性：进化事件、Reporter 注入点、tracing 初始化
//!
//! 核心只依赖 [`Reporter`]；全局 tracing subscriber 只由二进制入口安装。

pub mod events;
pub mod reporter;

pub use events::EvolutionEvent;
pub use reporter::{MemoryReporter, NoopReporter, Reporter, TracingReporter};

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// 日志：默认 info，可通过 RUST_LOG 覆盖
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .init();
}
