//! 评论区整体氛围分析
//!
//! 每个视频一次模型调用：标题、封面与选出的评论 → 氛围描述 + positive/negative

use super::selection::{merge_comments, select_comments, SelectionConfig};
use crate::llm::{CommentSentimentRequest, LLMProvider};
use crate::models::{CommentSentiment, VideoRecord};
use anyhow::{Context, Result};
use tracing::info;

/// 单个视频的分析结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentSentimentOutcome {
    pub sentiment: CommentSentiment,
    pub analysis: String,
    /// 结果来自已有数据，未调用模型
    pub cached: bool,
}

pub struct CommentSentimentAnalyzer<'a> {
    provider: &'a dyn LLMProvider,
    selection: &'a SelectionConfig,
    force: bool,
}

impl<'a> CommentSentimentAnalyzer<'a> {
    pub fn new(provider: &'a dyn LLMProvider, selection: &'a SelectionConfig, force: bool) -> Self {
        Self {
            provider,
            selection,
            force,
        }
    }

    /// 分析视频评论区整体氛围，成功后写回视频的两个情感字段
    ///
    /// 两个字段都已有值且未强制重算时直接返回已有结果
    pub async fn analyze(&self, video: &mut VideoRecord) -> Result<CommentSentimentOutcome> {
        if !self.force {
            if let (Some(analysis), Some(sentiment)) = (&video.overall_sentiment, video.pn_sentiment)
            {
                info!("视频 {} 已有分析结果，跳过分析", video.id);
                return Ok(CommentSentimentOutcome {
                    sentiment,
                    analysis: analysis.clone(),
                    cached: true,
                });
            }
        }

        let selected = select_comments(&video.comments, self.selection);
        info!(
            "分析视频 {} 评论区: 共 {} 条评论，选取 {} 条",
            video.id,
            video.comments.len(),
            selected.len()
        );

        let request = CommentSentimentRequest {
            video_title: video.title.clone(),
            video_cover: video.cover.clone(),
            comments: merge_comments(&selected),
        };

        let verdict = self
            .provider
            .summarize_comments(&request)
            .await
            .with_context(|| format!("视频 {} 评论区氛围分析失败", video.id))?;

        video.overall_sentiment = Some(verdict.analysis.clone());
        video.pn_sentiment = Some(verdict.sentiment);

        info!("视频 {} 评论区情感: {}", video.id, verdict.sentiment);
        Ok(CommentSentimentOutcome {
            sentiment: verdict.sentiment,
            analysis: verdict.analysis,
            cached: false,
        })
    }
}
