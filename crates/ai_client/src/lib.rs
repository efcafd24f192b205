use anyhow::{anyhow, Context, Result};
use models::AssistantSettings;
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const DEFAULT_API_URL: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash-exp:generateContent";

const ROLE_PROMPT: &str = "You are a helpful assistant for startup risk assessment. You help users with:
- Understanding startup costs and financial planning
- Sales forecasting and revenue projections
- COGS (Cost of Goods Sold) calculations
- Salary planning and personnel costs
- Risk assessment and mitigation strategies
- Business model validation
- Market analysis and competitive positioning

Provide clear, actionable advice and help users navigate through the startup risk assessment process. Be concise but thorough in your responses.";

/// Configuration for the text-generation endpoint.
#[derive(Debug, Clone)]
pub struct AssistantConfig {
    pub api_url: String,
    pub api_key: String,
    pub temperature: f64,
    pub max_output_tokens: u32,
}

impl AssistantConfig {
    /// Loads config from env vars:
    /// - `GEMINI_API_KEY` (required)
    /// - `GEMINI_API_URL` (default: the public `generateContent` endpoint)
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup("GEMINI_API_KEY")
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| anyhow!("Gemini API key not configured (set GEMINI_API_KEY)"))?;
        let api_url = lookup("GEMINI_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string());
        validate_base_url(&api_url)?;

        Ok(Self {
            api_url,
            api_key,
            temperature: 0.7,
            max_output_tokens: 1024,
        })
    }

    /// Applies the optional `assistant` block of settings.json.
    pub fn with_settings(mut self, settings: &AssistantSettings) -> Result<Self> {
        if let Some(url) = &settings.api_url {
            validate_base_url(url)?;
            self.api_url = url.clone();
        }
        if let Some(temperature) = settings.temperature {
            self.temperature = temperature;
        }
        if let Some(max) = settings.max_output_tokens {
            self.max_output_tokens = max;
        }
        Ok(self)
    }
}

/// One prior turn of the conversation as the widget sends it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: String,
    pub content: String,
}

/// What the user is looking at when they ask.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageContext {
    #[serde(default)]
    pub page_title: String,
    #[serde(default)]
    pub current_path: String,
    #[serde(default)]
    pub visible_text: String,
    #[serde(default)]
    pub form_data: Option<Value>,
    #[serde(default)]
    pub table_data: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub history: Vec<ChatTurn>,
    #[serde(default)]
    pub context: Option<PageContext>,
}

pub fn build_system_prompt(context: Option<&PageContext>) -> String {
    let mut prompt = ROLE_PROMPT.to_string();
    let Some(context) = context else {
        return prompt;
    };

    prompt.push_str(&format!(
        "\n\n**Current Page Context:**\n- Page Title: {}\n- Current Path: {}\n- Page Content: {}",
        context.page_title, context.current_path, context.visible_text
    ));
    if let Some(form_data) = &context.form_data {
        let pretty = serde_json::to_string_pretty(form_data).unwrap_or_else(|_| form_data.to_string());
        prompt.push_str(&format!("\n- Form Data: {pretty}"));
    }
    if let Some(table_data) = &context.table_data {
        prompt.push_str(&format!("\n- Table Data:\n{}", table_data.join("\n")));
    }
    prompt.push_str(
        "\n\nUse this context to provide more relevant and specific help. If the user is asking about data on the current page, refer to the specific information shown above.",
    );
    prompt
}

/// Blocking `generateContent` client. Build it off the async runtime.
#[derive(Debug, Clone)]
pub struct AssistantClient {
    http: Client,
    endpoint: Url,
    config: AssistantConfig,
}

impl AssistantClient {
    pub fn new(config: AssistantConfig) -> Result<Self> {
        let endpoint = validate_base_url(&config.api_url)?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let mut key = HeaderValue::from_str(&config.api_key).context("API key is not a valid header value")?;
        key.set_sensitive(true);
        headers.insert("x-goog-api-key", key);

        let http = Client::builder()
            .default_headers(headers)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            endpoint,
            config,
        })
    }

    /// Sends one question with its history and page context; returns the reply text.
    pub fn chat(&self, request: &ChatRequest) -> Result<String> {
        let system_prompt = build_system_prompt(request.context.as_ref());
        let body = build_request_body(&self.config, &system_prompt, &request.message, &request.history);

        let response: GenerateContentResponse = self
            .http
            .post(self.endpoint.clone())
            .json(&body)
            .send()
            .with_context(|| format!("POST {} failed", self.endpoint))?
            .error_for_status()
            .with_context(|| format!("POST {} returned non-success status", self.endpoint))?
            .json()
            .with_context(|| format!("Failed to parse JSON response from {}", self.endpoint))?;

        extract_reply(response)
    }
}

/// Widget roles are `user`/`assistant`; the API calls the latter `model`.
fn api_role(role: &str) -> &'static str {
    if role.eq_ignore_ascii_case("user") {
        "user"
    } else {
        "model"
    }
}

pub fn build_request_body(
    config: &AssistantConfig,
    system_prompt: &str,
    message: &str,
    history: &[ChatTurn],
) -> GenerateContentRequest {
    let mut contents: Vec<Content> = history
        .iter()
        .map(|turn| Content {
            role: api_role(&turn.role).to_string(),
            parts: vec![Part {
                text: turn.content.clone(),
            }],
        })
        .collect();
    contents.push(Content {
        role: "user".to_string(),
        parts: vec![Part {
            text: format!("{system_prompt}\n\nUser message: {message}"),
        }],
    });

    let safety_settings = [
        "HARM_CATEGORY_HARASSMENT",
        "HARM_CATEGORY_HATE_SPEECH",
        "HARM_CATEGORY_SEXUALLY_EXPLICIT",
        "HARM_CATEGORY_DANGEROUS_CONTENT",
    ]
    .iter()
    .map(|category| SafetySetting {
        category: category.to_string(),
        threshold: "BLOCK_MEDIUM_AND_ABOVE".to_string(),
    })
    .collect();

    GenerateContentRequest {
        contents,
        generation_config: GenerationConfig {
            temperature: config.temperature,
            top_k: 40,
            top_p: 0.95,
            max_output_tokens: config.max_output_tokens,
        },
        safety_settings,
    }
}

fn extract_reply(response: GenerateContentResponse) -> Result<String> {
    response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .and_then(|c| c.parts.into_iter().next())
        .map(|p| p.text)
        .ok_or_else(|| anyhow!("Invalid response from Gemini API"))
}

/// Accepts https anywhere and plain http only on loopback hosts.
pub fn validate_base_url(base_url: &str) -> Result<Url> {
    let url = Url::parse(base_url).with_context(|| format!("Invalid GEMINI_API_URL: {base_url}"))?;

    let host = url
        .host_str()
        .ok_or_else(|| anyhow!("GEMINI_API_URL is missing a host"))?;

    match url.scheme() {
        "https" => {}
        "http" => {
            let is_local = host.eq_ignore_ascii_case("localhost")
                || host == "127.0.0.1"
                || host == "[::1]"
                || host == "::1";
            if !is_local {
                return Err(anyhow!(
                    "Refusing plain http to non-local host '{host}'. Use https or a loopback address."
                ));
            }
        }
        other => {
            return Err(anyhow!("Unsupported scheme '{other}' for GEMINI_API_URL"));
        }
    }

    Ok(url)
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Part {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Content {
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub temperature: f64,
    pub top_k: u32,
    pub top_p: f64,
    pub max_output_tokens: u32,
}

#[derive(Debug, Serialize)]
pub struct SafetySetting {
    pub category: String,
    pub threshold: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    pub generation_config: GenerationConfig,
    pub safety_settings: Vec<SafetySetting>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}
