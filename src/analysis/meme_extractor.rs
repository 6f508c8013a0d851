//! 高赞有害图片模因提取

use super::selection::{select_images, ImageSlice, SelectionConfig};
use super::sentiment_context;
use crate::llm::{LLMProvider, MemeRequest};
use crate::models::{ImageSentiment, VideoRecord};
use crate::storage::ImageStore;
use anyhow::{Context, Result};
use tracing::info;

pub struct MemeExtractor<'a> {
    provider: &'a dyn LLMProvider,
    store: &'a ImageStore,
    selection: &'a SelectionConfig,
}

impl<'a> MemeExtractor<'a> {
    pub fn new(
        provider: &'a dyn LLMProvider,
        store: &'a ImageStore,
        selection: &'a SelectionConfig,
    ) -> Self {
        Self {
            provider,
            store,
            selection,
        }
    }

    /// 对高赞切片中已判定为 harmful 的图片逐张提取模因，结果按图片顺序展平
    pub async fn extract(&self, video: &VideoRecord) -> Result<Vec<String>> {
        let harmful: Vec<_> = select_images(&video.images, ImageSlice::Top, self.selection)
            .into_iter()
            .filter(|image| image.sentiment == Some(ImageSentiment::Harmful))
            .collect();

        if harmful.is_empty() {
            info!("视频 {} 没有 harmful 的高赞图片可以分析", video.id);
            return Ok(Vec::new());
        }

        let context = sentiment_context(video);
        let mut memes = Vec::new();

        for image in harmful {
            let request = MemeRequest {
                video_title: video.title.clone(),
                video_comment_sentiment: context.clone(),
                image: self.store.locate(&image.id),
            };

            let found = self
                .provider
                .extract_memes(&request)
                .await
                .with_context(|| format!("视频 {} 图片 {} 模因提取失败", video.id, image.id))?;

            info!("图片 {} 提取到 {} 条模因", image.id, found.len());
            memes.extend(found);
        }

        Ok(memes)
    }
}
