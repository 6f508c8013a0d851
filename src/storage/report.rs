// 模因分析报告 - 以 JSON 形式保存每个视频的模因列表

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::info;

/// 模因分析报告
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemeReport {
    pub generated_at: Option<DateTime<Local>>,
    /// 视频 ID -> 模因描述列表
    pub videos: BTreeMap<String, Vec<String>>,
}

impl MemeReport {
    pub fn new() -> Self {
        Self {
            generated_at: Some(Local::now()),
            videos: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, video_id: impl Into<String>, memes: Vec<String>) {
        self.videos.insert(video_id.into(), memes);
    }

    pub fn total_memes(&self) -> usize {
        self.videos.values().map(Vec::len).sum()
    }

    pub async fn save(&self, path: &Path) -> Result<()> {
        crate::utils::ensure_parent_dir(path)
            .with_context(|| format!("无法创建报告目录: {:?}", path))?;
        let json = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, json)
            .await
            .with_context(|| format!("写入模因报告失败: {:?}", path))?;
        info!(
            "模因报告已保存到 {:?}（{} 个视频, {} 条模因）",
            path,
            self.videos.len(),
            self.total_memes()
        );
        Ok(())
    }

    #[cfg(test)]
    pub(crate) async fn load(path: &Path) -> Result<Self> {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("读取模因报告失败: {:?}", path))?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_report_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("reports/memes.json");

        let mut report = MemeReport::new();
        report.insert("100", vec!["反语".to_string(), "刻板印象".to_string()]);
        report.insert("200", Vec::new());
        report.save(&path).await.unwrap();

        let loaded = MemeReport::load(&path).await.unwrap();
        assert_eq!(loaded.videos, report.videos);
        assert_eq!(loaded.total_memes(), 2);
    }

    #[tokio::test]
    async fn test_report_json_layout() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("memes.json");

        let mut report = MemeReport::new();
        report.insert("100", vec!["反语".to_string()]);
        report.save(&path).await.unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        let keys: Vec<&str> = value
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        assert_eq!(keys, vec!["generated_at", "videos"]);
        assert!(value["generated_at"].is_string());
        assert_eq!(value["videos"]["100"], serde_json::json!(["反语"]));
    }
}
