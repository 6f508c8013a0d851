//! 图片有害性判定
//!
//! 高赞图片、其余图片与全部图片三种分析路径共用同一个组件，
//! 由切片（`ImageSlice`）和是否附带判定原则决定行为。

use super::selection::{select_images, ImageSlice, SelectionConfig};
use super::sentiment_context;
use crate::llm::{ImageJudgmentRequest, LLMProvider, HARM_PRINCIPLES};
use crate::models::{ImageId, ImageSentiment, VideoRecord};
use crate::storage::ImageStore;
use anyhow::{anyhow, Context, Result};
use tracing::{debug, info, warn};

pub struct ImageClassifier<'a> {
    provider: &'a dyn LLMProvider,
    store: &'a ImageStore,
    selection: &'a SelectionConfig,
    slice: ImageSlice,
    use_rubric: bool,
    force: bool,
}

impl<'a> ImageClassifier<'a> {
    /// 按切片的默认方式创建：高赞图片不附带判定原则，其余路径附带
    pub fn new(
        provider: &'a dyn LLMProvider,
        store: &'a ImageStore,
        selection: &'a SelectionConfig,
        slice: ImageSlice,
    ) -> Self {
        Self {
            provider,
            store,
            selection,
            slice,
            use_rubric: !matches!(slice, ImageSlice::Top),
            force: false,
        }
    }

    pub fn with_rubric(mut self, use_rubric: bool) -> Self {
        self.use_rubric = use_rubric;
        self
    }

    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    /// 判定切片内的图片，返回每张图片的分类（包括沿用的已有结果）
    ///
    /// 每张图片的结果在调用返回后立即写回视频；中途失败时，
    /// 之前已写入的结果保留，错误向上返回。
    pub async fn classify(&self, video: &mut VideoRecord) -> Result<Vec<(ImageId, ImageSentiment)>> {
        if video.images.is_empty() {
            info!("视频 {} 无图片可分析", video.id);
            return Ok(Vec::new());
        }

        let selected: Vec<(ImageId, Option<String>)> =
            select_images(&video.images, self.slice, self.selection)
                .into_iter()
                .map(|image| (image.id.clone(), image.text.clone()))
                .collect();

        info!(
            "视频 {} 图片分析 ({}): 共 {} 张，选取 {} 张",
            video.id,
            self.slice.as_str(),
            video.images.len(),
            selected.len()
        );

        let context = sentiment_context(video);
        if context.is_empty() {
            warn!("视频 {} 尚无评论区氛围分析，图片判定将缺少语境", video.id);
        }

        let principles = self.use_rubric.then(|| HARM_PRINCIPLES.to_string());
        let mut results = Vec::with_capacity(selected.len());

        for (id, text) in selected {
            let cached = video
                .images
                .iter()
                .find(|image| image.id == id)
                .and_then(|image| image.sentiment);

            if let (false, Some(sentiment)) = (self.force, cached) {
                info!("图片 {} 已有情感分析结果，跳过", id);
                results.push((id, sentiment));
                continue;
            }

            let request = ImageJudgmentRequest {
                video_title: video.title.clone(),
                video_comment_sentiment: context.clone(),
                image: self.store.locate(&id),
                comments: text,
                principles: principles.clone(),
            };

            let verdict = self
                .provider
                .classify_image(&request)
                .await
                .with_context(|| format!("视频 {} 图片 {} 判定失败", video.id, id))?;

            match video.image_mut(&id) {
                Some(image) => image.sentiment = Some(verdict.sentiment),
                None => return Err(anyhow!("视频 {} 中找不到图片 {}", video.id, id)),
            }

            info!("图片 {} 判定为 {}", id, verdict.sentiment);
            if let Some(analysis) = &verdict.analysis {
                debug!("图片 {} 判定依据: {}", id, analysis);
            }
            results.push((id, verdict.sentiment));
        }

        Ok(results)
    }
}
