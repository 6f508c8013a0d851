// 数据表读写错误

use thiserror::Error;

/// 加载或保存评论数据表时可能出现的错误
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("缺少必要列: {0}")]
    MissingColumn(String),

    #[error("第 {row} 行点赞数无效: {value:?}")]
    InvalidLikeCount { row: usize, value: String },

    #[error("第 {row} 行 {column} 列标签无效: {value:?}")]
    InvalidLabel {
        row: usize,
        column: String,
        value: String,
    },

    #[error("视频 {video_id} 中存在重复的图片标识: {image_id}")]
    DuplicateImage { video_id: String, image_id: String },

    #[error("第 {row} 行为图片评论，但缺少图片标识")]
    MissingImageId { row: usize },

    #[error("输出路径与输入路径相同，拒绝覆盖原始数据: {0}")]
    OutputIsInput(String),

    #[error("CSV 解析错误: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO 错误: {0}")]
    Io(#[from] std::io::Error),
}

pub type DatasetResult<T> = std::result::Result<T, DatasetError>;
