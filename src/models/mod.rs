// 数据模型模块 - 定义视频、评论与情感标签

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// 评论区整体情感分类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommentSentiment {
    Positive,
    Negative,
}

impl CommentSentiment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Positive => "positive",
            Self::Negative => "negative",
        }
    }
}

impl FromStr for CommentSentiment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_label(s).as_str() {
            "positive" | "积极" | "正面" => Ok(Self::Positive),
            "negative" | "消极" | "负面" => Ok(Self::Negative),
            _ => Err(format!("无效的评论区情感标签: {}", s)),
        }
    }
}

impl fmt::Display for CommentSentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 图片评论的有害性分类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageSentiment {
    Harmful,
    NonHarmful,
}

impl ImageSentiment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Harmful => "harmful",
            Self::NonHarmful => "non_harmful",
        }
    }
}

impl FromStr for ImageSentiment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_label(s).as_str() {
            "harmful" | "有害" => Ok(Self::Harmful),
            "non_harmful" | "nonharmful" | "not_harmful" | "无害" => Ok(Self::NonHarmful),
            _ => Err(format!("无效的图片情感标签: {}", s)),
        }
    }
}

impl fmt::Display for ImageSentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 统一标签写法：去掉引号和空白，小写，`-` 与空格视作 `_`
fn normalize_label(raw: &str) -> String {
    raw.trim()
        .trim_matches(|c| c == '"' || c == '\'')
        .trim()
        .to_lowercase()
        .replace(['-', ' '], "_")
}

/// 图片评论标识（数据表中的 cid 列），始终按字符串比较
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageId(String);

impl ImageId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 提交给 LLM 的图片来源
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageSource {
    /// 本地文件，发送前转为 base64
    Path(PathBuf),
    /// 远程地址，原样传给模型
    Url(String),
}

impl ImageSource {
    /// 根据单元格内容判断是 URL 还是本地路径
    pub fn parse(raw: &str) -> Option<Self> {
        let value = raw.trim();
        if value.is_empty() {
            return None;
        }
        if value.starts_with("http://")
            || value.starts_with("https://")
            || value.starts_with("data:")
        {
            Some(Self::Url(value.to_string()))
        } else {
            Some(Self::Path(PathBuf::from(value)))
        }
    }
}

/// 普通文字评论
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlainComment {
    /// 评论内容
    pub content: String,
    /// 点赞数
    pub likes: u64,
}

/// 图片评论
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageComment {
    /// 图片标识，用于定位图片文件
    pub id: ImageId,
    /// 点赞数
    pub likes: u64,
    /// 与图片一同发布的文字
    pub text: Option<String>,
    /// 有害性分类，未分析时为空
    pub sentiment: Option<ImageSentiment>,
}

/// 单个视频及其评论区
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoRecord {
    pub id: String,
    pub title: String,
    /// 视频封面（可选）
    pub cover: Option<ImageSource>,
    pub comments: Vec<PlainComment>,
    pub images: Vec<ImageComment>,
    /// 评论区整体氛围分析
    pub overall_sentiment: Option<String>,
    /// 评论区整体情感分类
    pub pn_sentiment: Option<CommentSentiment>,
}

impl VideoRecord {
    pub fn new(id: impl Into<String>, title: Option<String>) -> Self {
        let id = id.into();
        let title = title
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| default_title(&id));
        Self {
            id,
            title,
            cover: None,
            comments: Vec::new(),
            images: Vec::new(),
            overall_sentiment: None,
            pn_sentiment: None,
        }
    }

    /// 两个评论区情感字段都已有值
    pub fn has_comment_sentiment(&self) -> bool {
        self.overall_sentiment.is_some() && self.pn_sentiment.is_some()
    }

    pub fn image_mut(&mut self, id: &ImageId) -> Option<&mut ImageComment> {
        self.images.iter_mut().find(|image| &image.id == id)
    }

    pub fn harmful_count(&self) -> usize {
        self.images
            .iter()
            .filter(|image| image.sentiment == Some(ImageSentiment::Harmful))
            .count()
    }
}

/// 标题缺失时的默认标题
pub fn default_title(video_id: &str) -> String {
    format!("无标题_{}", video_id)
}
