//! 命令模块
//!
//! 命令行各子命令的实现，按功能分组：
//! - analyze: 评论区氛围、图片有害性、模因提取以及完整流水线
//! - inspect: 只读取数据表并统计每个视频的评论与图片数量

pub mod analyze;
pub mod inspect;

pub use analyze::*;
pub use inspect::*;

use crate::llm::LLMManager;
use crate::settings::AnalyzerConfig;
use crate::storage::ImageStore;
use std::fmt;

/// 执行分析命令所需的共享状态
pub struct CommandContext {
    pub config: AnalyzerConfig,
    pub llm: LLMManager,
    pub images: ImageStore,
    /// 忽略已有结果，重新调用模型
    pub force: bool,
}

impl CommandContext {
    pub fn new(config: AnalyzerConfig, llm: LLMManager, force: bool) -> Self {
        let images = ImageStore::new(config.images.clone());
        Self {
            config,
            llm,
            images,
            force,
        }
    }
}

/// 单个步骤的批处理结果
#[derive(Debug, Default)]
pub struct BatchReport {
    pub step: String,
    pub total_candidates: usize,
    pub processed: usize,
    pub failed: usize,
    pub messages: Vec<String>,
}

impl BatchReport {
    pub fn new(step: impl Into<String>, total_candidates: usize) -> Self {
        Self {
            step: step.into(),
            total_candidates,
            ..Default::default()
        }
    }

    fn record_failure(&mut self, video_id: &str, err: &anyhow::Error) {
        self.failed += 1;
        self.messages.push(format!("{}: {:#}", video_id, err));
    }
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] 共 {} 个视频, 成功 {}, 失败 {}",
            self.step, self.total_candidates, self.processed, self.failed
        )
    }
}

/// 一次命令的所有步骤结果
#[derive(Debug, Default)]
pub struct RunSummary {
    pub steps: Vec<BatchReport>,
}

impl RunSummary {
    pub fn failed(&self) -> usize {
        self.steps.iter().map(|step| step.failed).sum()
    }

    pub fn has_failures(&self) -> bool {
        self.failed() > 0
    }
}

impl From<BatchReport> for RunSummary {
    fn from(report: BatchReport) -> Self {
        Self {
            steps: vec![report],
        }
    }
}
