use std::fmt;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use nd_core::{ArticleRecord, Error, InferenceModel, Result};
use tracing::debug;
use url::Url;
use crate::keywords::{filter_echoed_keywords, parse_keywords};
use crate::Config;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_CHAT_MODEL: &str = "gpt-3.5-turbo";

const KEYWORD_PROMPT: &str = "반드시 JSON 형식으로 응답. 예시: {\"keywords\": [\"키워드1\",\"키워드2\"]}\n\
- 설명문 절대 금지\n\
- JSON 포맷 준수 필수";

const SUMMARY_PROMPT: &str = "다음 뉴스 기사 목록을 요약해줘. 5문장 이내로 전체 흐름을 설명하듯 써줘. 반드시 요약문만 응답해.";

const REPORT_PROMPT: &str = "다음은 뉴스 요약입니다. 아래 키워드들과 요약문을 참고하여 \
자연스러운 보고서 형태로 작성해주세요. \
키워드 정의 없이, 요약문을 중심으로 전체 내용을 설명해 주세요. \
글머리표, 리스트, 구분선 없이 단락 형태로만 써주세요.";

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Deserialize)]
struct Message {
    content: Option<String>,
}

/// The slice of an article the model gets to see.
#[derive(Serialize)]
struct ArticleDigest<'a> {
    title: &'a str,
    description: &'a str,
}

fn digest(articles: &[ArticleRecord]) -> Result<String> {
    let digests: Vec<ArticleDigest<'_>> = articles
        .iter()
        .map(|a| ArticleDigest { title: &a.title, description: &a.description })
        .collect();
    Ok(serde_json::to_string(&digests)?)
}

/// Chat-completions client for OpenAI-compatible endpoints.
pub struct OpenAIModel {
    client: Client,
    api_key: String,
    base_url: String,
    chat_model: String,
}

impl fmt::Debug for OpenAIModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAIModel")
            .field("client", &"<reqwest::Client>")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("chat_model", &self.chat_model)
            .finish()
    }
}

impl OpenAIModel {
    pub fn new(config: &Config) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| Error::Inference("OpenAI API key is required".to_string()))?;

        let base_url = config.base_url.clone().unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        Url::parse(&base_url).map_err(|e| Error::InvalidUrl(format!("{}: {}", base_url, e)))?;

        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            chat_model: config.chat_model.clone().unwrap_or_else(|| DEFAULT_CHAT_MODEL.to_string()),
        })
    }

    async fn chat(&self, system: Option<&str>, user: String, json_mode: bool) -> Result<String> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = system {
            messages.push(ChatMessage { role: "system".to_string(), content: system.to_string() });
        }
        messages.push(ChatMessage { role: "user".to_string(), content: user });

        let request = ChatRequest {
            model: self.chat_model.clone(),
            messages,
            response_format: json_mode.then(|| ResponseFormat { kind: "json_object".to_string() }),
        };

        let response = self.client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json::<ChatResponse>()
            .await?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .ok_or_else(|| Error::MalformedResponse("completion had no content".to_string()))
    }
}

#[async_trait]
impl InferenceModel for OpenAIModel {
    fn name(&self) -> &str {
        "OpenAI"
    }

    async fn extract_keywords(&self, articles: &[ArticleRecord]) -> Result<Vec<String>> {
        let raw = self.chat(Some(KEYWORD_PROMPT), digest(articles)?, true).await?;
        debug!("Keyword reply: {}", raw);
        let keywords = parse_keywords(&raw)?;
        Ok(filter_echoed_keywords(keywords, articles))
    }

    async fn summarize_articles(&self, articles: &[ArticleRecord]) -> Result<String> {
        self.chat(Some(SUMMARY_PROMPT), digest(articles)?, false).await
    }

    async fn generate_report(&self, keywords: &[String], summary: &str) -> Result<String> {
        let prompt = format!("{}\n\n키워드: {}\n요약문: {}", REPORT_PROMPT, keywords.join(", "), summary);
        self.chat(None, prompt, false).await
    }
}
