// 存储模块 - 评论数据表、图片文件与分析报告

// 子模块
pub mod dataset;
pub mod images;
pub mod report;

// 重新导出主要类型
pub use dataset::{
    ensure_not_input, load_videos, save_all_sentiment, save_comments_sentiment,
    save_images_sentiment, CommentTable, TableSchema,
};
pub use images::{ImageStore, ImageStoreConfig};
pub use report::MemeReport;
