// 数据表检查 - 只读取，不调用模型

use crate::storage::{self, TableSchema};
use anyhow::{Context, Result};
use serde::Serialize;
use std::fmt;
use std::path::Path;
use tracing::info;

/// 单个视频的统计信息
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VideoStats {
    pub video_id: String,
    pub title: String,
    pub comments: usize,
    pub images: usize,
    pub labeled_images: usize,
    pub harmful_images: usize,
    pub pn_sentiment: Option<String>,
}

impl fmt::Display for VideoStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\t{}\t评论 {}\t图片 {} (已判定 {}, 有害 {})\t氛围 {}",
            self.video_id,
            self.title,
            self.comments,
            self.images,
            self.labeled_images,
            self.harmful_images,
            self.pn_sentiment.as_deref().unwrap_or("-")
        )
    }
}

pub fn inspect(input: &Path, schema: &TableSchema) -> Result<Vec<VideoStats>> {
    let (table, videos) = storage::load_videos(input, schema)
        .with_context(|| format!("读取数据表失败: {:?}", input))?;
    info!("{:?}: {} 行, {} 个视频", input, table.row_count(), videos.len());

    Ok(videos
        .into_values()
        .map(|video| VideoStats {
            comments: video.comments.len(),
            images: video.images.len(),
            labeled_images: video.images.iter().filter(|i| i.sentiment.is_some()).count(),
            harmful_images: video.harmful_count(),
            pn_sentiment: video.pn_sentiment.map(|s| s.to_string()),
            video_id: video.id,
            title: video.title,
        })
        .collect())
}
