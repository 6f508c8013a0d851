// LLM插件系统 - 定义判定接口和数据结构

use crate::models::{CommentSentiment, ImageSentiment, ImageSource};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use llm_json::{loads, repair_json, RepairOptions};
use serde::{
    de::{self, DeserializeOwned, Deserializer},
    Deserialize, Serialize,
};
use serde_json::Value;

/// 评论区整体氛围分析请求
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CommentSentimentRequest {
    /// 视频标题
    pub video_title: String,
    /// 视频封面（可选）
    pub video_cover: Option<ImageSource>,
    /// 高赞评论与抽样评论，以换行分隔
    pub comments: String,
}

/// 评论区整体氛围分析结果
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CommentSentimentVerdict {
    /// 评论区整体氛围描述
    #[serde(
        rename = "video_comment_sentiment_analysis",
        alias = "analysis",
        alias = "overall_sentiment"
    )]
    pub analysis: String,
    /// 除去难以判断的评论后，哪种声音更多
    #[serde(deserialize_with = "deserialize_label")]
    pub sentiment: CommentSentiment,
}

/// 图片有害性判定请求
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ImageJudgmentRequest {
    pub video_title: String,
    /// 评论区对跨种族关系的整体情感氛围
    pub video_comment_sentiment: String,
    pub image: ImageSource,
    /// 与图片一同出现的评论文字
    pub comments: Option<String>,
    /// 分辨有害图片的原则（可选）
    pub principles: Option<String>,
}

/// 图片有害性判定结果
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ImageVerdict {
    #[serde(deserialize_with = "deserialize_label")]
    pub sentiment: ImageSentiment,
    /// 判定理由
    #[serde(default, deserialize_with = "deserialize_optional_text")]
    pub analysis: Option<String>,
}

/// 有害图片模因提取请求
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MemeRequest {
    pub video_title: String,
    pub video_comment_sentiment: String,
    pub image: ImageSource,
}

/// 有害图片模因提取结果
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct MemeVerdict {
    #[serde(
        rename = "memes_of_harmful_images",
        alias = "memes",
        default,
        deserialize_with = "deserialize_memes"
    )]
    pub memes: Vec<String>,
}

/// 反序列化封闭枚举标签，容忍大小写、连字符与中文写法
fn deserialize_label<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: std::str::FromStr<Err = String>,
{
    let value = Value::deserialize(deserializer)?;
    match value {
        Value::String(text) => text.parse::<T>().map_err(de::Error::custom),
        other => Err(de::Error::custom(format!("标签必须是字符串: {}", other))),
    }
}

fn deserialize_optional_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) if s.trim().is_empty() => None,
        Some(Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

/// 模因列表可能是数组、单个字符串（按行拆分）或对象数组
fn deserialize_memes<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    let mut memes = Vec::new();
    if let Some(value) = value {
        collect_memes(value, &mut memes);
    }
    Ok(memes)
}

fn collect_memes(value: Value, acc: &mut Vec<String>) {
    match value {
        Value::Null => {}
        Value::String(text) => {
            acc.extend(
                text.lines()
                    .map(str::trim)
                    .filter(|line| !line.is_empty())
                    .map(str::to_string),
            );
        }
        Value::Array(items) => {
            for item in items {
                collect_memes(item, acc);
            }
        }
        Value::Object(map) => {
            // {"technique": "...", "description": "..."} 这类结构拼成一行
            let parts: Vec<String> = map
                .into_iter()
                .filter_map(|(key, value)| match value {
                    Value::String(s) if !s.trim().is_empty() => Some(format!("{}: {}", key, s)),
                    Value::Null => None,
                    other => Some(format!("{}: {}", key, other)),
                })
                .collect();
            if !parts.is_empty() {
                acc.push(parts.join("; "));
            }
        }
        other => acc.push(other.to_string()),
    }
}

/// 去掉 Markdown 代码块围栏
pub(crate) fn strip_code_fence(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.starts_with("```") {
        let mut lines = trimmed.lines();
        // 跳过 ```json 或 ``` 开头
        lines.next();
        let mut body = Vec::new();
        for line in lines {
            if line.trim_start().starts_with("```") {
                break;
            }
            body.push(line);
        }
        body.join("\n")
    } else {
        trimmed.to_string()
    }
}

/// 解析模型返回的 JSON，失败时尝试修复
pub fn parse_json<T: DeserializeOwned>(raw: &str) -> Result<T> {
    let cleaned = strip_code_fence(raw);
    if cleaned.is_empty() {
        return Err(anyhow!("模型没有返回内容"));
    }

    if let Ok(value) = serde_json::from_str::<T>(&cleaned) {
        return Ok(value);
    }

    let repaired = repair_json(&cleaned, &RepairOptions::default())
        .map_err(|e| anyhow!("无法修复模型返回的 JSON: {}", e))?;
    let value = loads(&repaired, &RepairOptions::default())
        .map_err(|e| anyhow!("解析修复后的 JSON 失败: {}", e))?;
    serde_json::from_value(value).map_err(|e| anyhow!("JSON 结构不符合预期: {}", e))
}

/// LLM 判定提供商接口
///
/// 每个方法对应一次模型调用，调用方负责按顺序逐条调用
#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// 获取提供商名称
    fn name(&self) -> &str;

    /// 配置提供商
    ///
    /// # 参数
    /// * `config` - JSON格式的配置
    fn configure(&mut self, config: Value) -> Result<()>;

    /// 检查提供商是否已配置
    fn is_configured(&self) -> bool;

    /// 总结评论区整体氛围，并给出 positive/negative 分类
    async fn summarize_comments(
        &self,
        request: &CommentSentimentRequest,
    ) -> Result<CommentSentimentVerdict>;

    /// 判断单张图片是 harmful 还是 non_harmful
    async fn classify_image(&self, request: &ImageJudgmentRequest) -> Result<ImageVerdict>;

    /// 分析有害图片使用的模因手法
    async fn extract_memes(&self, request: &MemeRequest) -> Result<Vec<String>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_comment_verdict_deserialization() {
        let verdict: CommentSentimentVerdict = serde_json::from_value(json!({
            "video_comment_sentiment_analysis": "评论区多为调侃与反语",
            "sentiment": "Negative"
        }))
        .unwrap();
        assert_eq!(verdict.sentiment, CommentSentiment::Negative);
        assert_eq!(verdict.analysis, "评论区多为调侃与反语");

        let err = serde_json::from_value::<CommentSentimentVerdict>(json!({
            "analysis": "说不清",
            "sentiment": "neutral"
        }));
        assert!(err.is_err());
    }

    #[test]
    fn test_image_verdict_deserialization() {
        let verdict: ImageVerdict =
            serde_json::from_value(json!({ "sentiment": "non-harmful" })).unwrap();
        assert_eq!(verdict.sentiment, ImageSentiment::NonHarmful);
        assert!(verdict.analysis.is_none());

        let verdict: ImageVerdict = serde_json::from_value(json!({
            "analysis": "夸张丑化面部特征",
            "sentiment": "harmful"
        }))
        .unwrap();
        assert_eq!(verdict.sentiment, ImageSentiment::Harmful);
        assert_eq!(verdict.analysis.as_deref(), Some("夸张丑化面部特征"));
    }

    #[test]
    fn test_meme_verdict_shapes() {
        let verdict: MemeVerdict = serde_json::from_value(json!({
            "memes_of_harmful_images": ["反语", "刻板印象"]
        }))
        .unwrap();
        assert_eq!(verdict.memes, vec!["反语", "刻板印象"]);

        let verdict: MemeVerdict = serde_json::from_value(json!({
            "memes_of_harmful_images": "1. 性暗示\n\n2. 污名化"
        }))
        .unwrap();
        assert_eq!(verdict.memes, vec!["1. 性暗示", "2. 污名化"]);

        let verdict: MemeVerdict = serde_json::from_value(json!({
            "memes": [{ "technique": "比喻" }, null]
        }))
        .unwrap();
        assert_eq!(verdict.memes, vec!["technique: 比喻"]);

        let verdict: MemeVerdict = serde_json::from_value(json!({})).unwrap();
        assert!(verdict.memes.is_empty());
    }

    #[test]
    fn test_parse_json_with_code_fence() {
        let raw = "```json\n{\"sentiment\": \"harmful\"}\n```";
        let verdict: ImageVerdict = parse_json(raw).unwrap();
        assert_eq!(verdict.sentiment, ImageSentiment::Harmful);
    }

    #[test]
    fn test_parse_json_repairs_trailing_comma() {
        let raw = "{\"sentiment\": \"non_harmful\", \"analysis\": \"普通表情包\",}";
        let verdict: ImageVerdict = parse_json(raw).unwrap();
        assert_eq!(verdict.sentiment, ImageSentiment::NonHarmful);
    }

    #[test]
    fn test_parse_json_empty() {
        assert!(parse_json::<ImageVerdict>("   ").is_err());
    }
}
