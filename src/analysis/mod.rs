//! 评论区分析模块
//!
//! 负责核心的分析业务逻辑，包括：
//! - 选取代表性评论与图片（selection）
//! - 评论区整体氛围分析（comment_sentiment）
//! - 图片有害性判定（image_classifier）
//! - 高赞有害图片模因提取（meme_extractor）
//!
//! 所有模型调用按顺序逐条执行，结果直接写回借用的 `VideoRecord`。

pub mod comment_sentiment;
pub mod image_classifier;
pub mod meme_extractor;
pub mod selection;

// 重新导出常用结构体和函数
pub use comment_sentiment::{CommentSentimentAnalyzer, CommentSentimentOutcome};
pub use image_classifier::ImageClassifier;
pub use meme_extractor::MemeExtractor;
pub use selection::{ImageSlice, SelectionConfig};

/// 评论区氛围为空时传给模型的文本
pub(crate) fn sentiment_context(video: &crate::models::VideoRecord) -> String {
    video.overall_sentiment.clone().unwrap_or_default()
}
