use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::info;

use crate::analysis::SelectionConfig;
use crate::llm::LLMConfig;
use crate::storage::{ImageStoreConfig, TableSchema};

/// 持久化的应用配置
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    pub llm: LLMConfig,
    pub selection: SelectionConfig,
    pub schema: TableSchema,
    pub images: ImageStoreConfig,
    /// 日志目录，为空时使用系统默认位置
    pub log_dir: Option<PathBuf>,
}

pub struct SettingsManager {
    path: PathBuf,
    data: RwLock<AnalyzerConfig>,
}

impl SettingsManager {
    /// 读取配置文件，不存在或为空时写出默认配置
    pub async fn new(path: PathBuf) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let initial = match tokio::fs::read(&path).await {
            Ok(bytes) if !bytes.is_empty() => serde_json::from_slice::<AnalyzerConfig>(&bytes)
                .with_context(|| format!("配置文件格式错误: {:?}", path))?,
            _ => {
                let default = AnalyzerConfig::default();
                let json = serde_json::to_string_pretty(&default)?;
                tokio::fs::write(&path, json).await?;
                info!("已写出默认配置: {:?}", path);
                default
            }
        };

        Ok(Self {
            path,
            data: RwLock::new(initial),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 用命令行参数覆盖配置（不写回文件）
    pub async fn apply_overrides(&self, seed: Option<u64>) -> AnalyzerConfig {
        let mut config = self.data.write().await;
        if let Some(seed) = seed {
            config.selection.seed = seed;
        }
        config.clone()
    }
}
