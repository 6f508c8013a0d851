// LLM模块 - 管理评论与图片的判定服务

pub mod plugin;
pub mod prompts;
pub mod qwen;

pub use plugin::{
    CommentSentimentRequest, CommentSentimentVerdict, ImageJudgmentRequest, ImageVerdict,
    LLMProvider, MemeRequest, MemeVerdict,
};
pub use prompts::HARM_PRINCIPLES;
pub use qwen::QwenProvider;

use anyhow::{anyhow, Result};
use std::time::Duration;
use tracing::info;

/// 从环境变量读取 API key 时使用的变量名
pub const API_KEY_ENV: &str = "DASHSCOPE_API_KEY";

/// LLM配置
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct LLMConfig {
    /// 当前使用的 provider: "qwen"（"openai" 为别名）
    pub provider: String,
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub temperature: f32,
    pub max_tokens: u32,
    /// 单次请求超时（秒）
    pub request_timeout_secs: u64,
}

pub(crate) fn default_model() -> String {
    "qwen-vl-max-latest".to_string()
}

pub(crate) fn default_base_url() -> String {
    "https://dashscope.aliyuncs.com/compatible-mode/v1".to_string()
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            provider: "qwen".to_string(),
            api_key: String::new(),
            model: default_model(),
            base_url: default_base_url(),
            temperature: 0.3,
            max_tokens: 2000,
            request_timeout_secs: 300,
        }
    }
}

impl LLMConfig {
    /// 配置文件中的 key 为空时回退到环境变量
    pub fn resolved_api_key(&self) -> Option<String> {
        if !self.api_key.trim().is_empty() {
            return Some(self.api_key.trim().to_string());
        }
        std::env::var(API_KEY_ENV)
            .ok()
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
    }
}

/// LLM管理器
pub struct LLMManager {
    /// 当前使用的提供商
    provider: Box<dyn LLMProvider>,
}

impl LLMManager {
    /// 按配置创建提供商（共享一个 HTTP 客户端）
    pub fn from_config(config: &LLMConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .pool_max_idle_per_host(10)
            .build()?;

        let mut provider: Box<dyn LLMProvider> = match config.provider.as_str() {
            // "openai" 是 Qwen 的别名（因为使用 OpenAI 兼容接口）
            "qwen" | "openai" => Box::new(QwenProvider::new(client)),
            other => return Err(anyhow!("不支持的 provider: {}", other)),
        };

        let api_key = config
            .resolved_api_key()
            .ok_or_else(|| anyhow!("请在配置文件或环境变量 {} 中设置 API Key", API_KEY_ENV))?;

        provider.configure(serde_json::json!({
            "api_key": api_key,
            "model": config.model,
            "base_url": config.base_url,
            "temperature": config.temperature,
            "max_tokens": config.max_tokens,
        }))?;

        info!("使用 {} provider，模型 {}", provider.name(), config.model);
        Ok(Self { provider })
    }

    /// 直接使用给定的提供商
    pub fn with_provider(provider: Box<dyn LLMProvider>) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &dyn LLMProvider {
        self.provider.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_llm_config_defaults() {
        let config: LLMConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.provider, "qwen");
        assert_eq!(config.model, "qwen-vl-max-latest");
        assert_eq!(config.request_timeout_secs, 300);
    }

    #[test]
    fn test_unknown_provider_rejected() {
        let config = LLMConfig {
            provider: "claude".to_string(),
            api_key: "sk-test".to_string(),
            ..LLMConfig::default()
        };
        assert!(LLMManager::from_config(&config).is_err());
    }

    #[test]
    fn test_manager_from_config() {
        let config = LLMConfig {
            provider: "openai".to_string(),
            api_key: "sk-test".to_string(),
            ..LLMConfig::default()
        };
        let manager = LLMManager::from_config(&config).unwrap();
        assert_eq!(manager.provider().name(), "Qwen");
        assert!(manager.provider().is_configured());
    }
}
