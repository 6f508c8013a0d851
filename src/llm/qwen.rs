// 阿里通义千问提供商实现 - 通过 OpenAI 兼容接口调用视觉语言模型

use super::plugin::*;
use super::prompts;
use crate::models::ImageSource;
use anyhow::{Context, Result};
use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::path::Path;
use tracing::{debug, error, info, warn};

/// Qwen提供商（阿里通义千问，兼容 OpenAI chat/completions 接口）
pub struct QwenProvider {
    api_key: Option<String>,
    model: String,
    client: Client,
    base_url: String,
    temperature: f32,
    max_tokens: u32,
}

impl QwenProvider {
    /// 创建新的Qwen提供商（接受共享的HTTP客户端以复用连接池）
    pub fn new(client: Client) -> Self {
        Self {
            api_key: None,
            model: super::default_model(),
            client,
            base_url: super::default_base_url(),
            temperature: 0.3,
            max_tokens: 2000,
        }
    }

    /// chat/completions 完整地址
    fn endpoint(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        if base.ends_with("/chat/completions") {
            base.to_string()
        } else {
            format!("{}/chat/completions", base)
        }
    }

    /// 将图片转为模型可接受的 URL（本地文件转为 base64 data URL）
    async fn image_to_url(image: &ImageSource) -> Result<String> {
        match image {
            ImageSource::Url(url) => Ok(url.clone()),
            ImageSource::Path(path) => {
                let image_data = tokio::fs::read(path)
                    .await
                    .with_context(|| format!("读取图片失败: {:?}", path))?;
                Ok(format!(
                    "data:{};base64,{}",
                    mime_for(path),
                    general_purpose::STANDARD.encode(&image_data)
                ))
            }
        }
    }

    fn build_request_body(&self, prompt: &str, image_urls: Vec<String>) -> Value {
        let mut content_parts: Vec<Value> = image_urls
            .into_iter()
            .map(|url| {
                json!({
                    "type": "image_url",
                    "image_url": { "url": url }
                })
            })
            .collect();

        content_parts.push(json!({
            "type": "text",
            "text": prompt
        }));

        json!({
            "model": self.model,
            "response_format": {"type": "json_object"},  // 保证结构化输出
            "messages": [
                {
                    "role": "user",
                    "content": content_parts
                }
            ],
            "max_tokens": self.max_tokens,
            "temperature": self.temperature
        })
    }

    /// 调用Qwen API，返回模型输出文本
    async fn call_qwen_api(
        &self,
        prompt: String,
        images: &[ImageSource],
        call_type: &str,
    ) -> Result<String> {
        let api_key = self
            .api_key
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("Qwen API key未配置"))?;

        let start_time = std::time::Instant::now();

        let mut image_urls = Vec::with_capacity(images.len());
        for image in images {
            image_urls.push(Self::image_to_url(image).await?);
        }

        let request_body = self.build_request_body(&prompt, image_urls);

        debug!(
            "调用Qwen API: call_type={}, model={}, images={}",
            call_type,
            self.model,
            images.len()
        );

        let response = self
            .client
            .post(self.endpoint())
            .header("Authorization", format!("Bearer {}", api_key))
            .header("Content-Type", "application/json")
            .json(&request_body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            error!("Qwen API错误 ({}): {}", status, error_text);
            return Err(anyhow::anyhow!(
                "Qwen API调用失败 ({}): {}",
                status,
                error_text
            ));
        }

        let response_text = response.text().await?;
        let response_data: QwenResponse = serde_json::from_str(&response_text)
            .with_context(|| format!("无法解析 Qwen 响应: {}", truncate(&response_text, 500)))?;

        let choice = response_data
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| anyhow::anyhow!("Qwen 响应中没有 choices"))?;

        // 如果响应被截断，返回错误而不是不完整的 JSON
        if choice.finish_reason.as_deref() == Some("length") {
            warn!("LLM 响应因达到 token 限制而被截断 (finish_reason=length)");
            return Err(anyhow::anyhow!(
                "LLM 响应被截断（达到 max_tokens 限制）。内容长度: {} 字符",
                choice.message.content.len()
            ));
        }

        debug!(
            "Qwen API 返回: call_type={}, 耗时 {} ms",
            call_type,
            start_time.elapsed().as_millis()
        );

        Ok(choice.message.content)
    }
}

#[async_trait]
impl LLMProvider for QwenProvider {
    fn name(&self) -> &str {
        "Qwen"
    }

    fn configure(&mut self, config: Value) -> Result<()> {
        // 配置 API key（只接受非空字符串）
        if let Some(api_key) = config.get("api_key").and_then(|v| v.as_str()) {
            if !api_key.trim().is_empty() {
                self.api_key = Some(api_key.trim().to_string());
                info!("✓ Qwen API key 已设置 (长度: {} 字符)", api_key.trim().len());
            } else {
                warn!("✗ 收到空的 API key，忽略");
            }
        }

        if let Some(model) = config.get("model").and_then(|v| v.as_str()) {
            self.model = model.to_string();
        }

        if let Some(base_url) = config.get("base_url").and_then(|v| v.as_str()) {
            self.base_url = base_url.to_string();
        }

        if let Some(temperature) = config.get("temperature").and_then(|v| v.as_f64()) {
            self.temperature = temperature as f32;
        }

        if let Some(max_tokens) = config.get("max_tokens").and_then(|v| v.as_u64()) {
            self.max_tokens = max_tokens as u32;
        }

        info!(
            "✓ Qwen提供商配置完成: model={}, endpoint={}, api_key_configured={}",
            self.model,
            self.endpoint(),
            self.api_key.is_some()
        );
        Ok(())
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn summarize_comments(
        &self,
        request: &CommentSentimentRequest,
    ) -> Result<CommentSentimentVerdict> {
        let prompt = prompts::comment_sentiment_prompt(request);
        let images: Vec<ImageSource> = request.video_cover.iter().cloned().collect();
        let content = self
            .call_qwen_api(prompt, &images, "comment_sentiment")
            .await?;
        parse_json(&content)
    }

    async fn classify_image(&self, request: &ImageJudgmentRequest) -> Result<ImageVerdict> {
        let prompt = prompts::image_judgment_prompt(request);
        let content = self
            .call_qwen_api(prompt, std::slice::from_ref(&request.image), "image_judgment")
            .await?;
        parse_json(&content)
    }

    async fn extract_memes(&self, request: &MemeRequest) -> Result<Vec<String>> {
        let prompt = prompts::meme_prompt(request);
        let content = self
            .call_qwen_api(prompt, std::slice::from_ref(&request.image), "meme_extraction")
            .await?;
        let verdict: MemeVerdict = parse_json(&content)?;
        Ok(verdict.memes)
    }
}

/// 按扩展名推断图片 MIME 类型
fn mime_for(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "image/jpeg",
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let head: String = text.chars().take(max_chars).collect();
        format!("{}...", head)
    }
}

/// Qwen API响应结构
#[derive(Debug, Deserialize)]
struct QwenResponse {
    choices: Vec<QwenChoice>,
}

#[derive(Debug, Deserialize)]
struct QwenChoice {
    message: QwenMessage,
    finish_reason: Option<String>, // 完成原因：stop, length, etc
}

#[derive(Debug, Deserialize)]
struct QwenMessage {
    content: String,
}
