//! Gemini REST transport.

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use eventsource_stream::Eventsource;
use futures_util::StreamExt;
use reqwest::Client as HttpClient;
use serde::Serialize;

use super::{ChatRequest, FragmentStream, GeneratedImage, ImageRequest, Transport};
use crate::config::{AssistConfig, KeyStatus};
use crate::error::{AssistError, Result, classify_api_failure};
use crate::protocol::{
    Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig, PredictInstance,
    PredictParameters, PredictRequest, PredictResponse, chunk_to_fragment, parse_chunk,
};

/// Transport backed by the Gemini `generateContent` family of endpoints.
#[derive(Clone, Debug)]
pub struct GeminiTransport {
    http_client: HttpClient,
    config: AssistConfig,
}

impl GeminiTransport {
    /// Create a transport with its own HTTP client.
    pub fn new(config: AssistConfig) -> Result<Self> {
        let mut builder = HttpClient::builder();
        if let Some(t) = config.connect_timeout {
            builder = builder.connect_timeout(t);
        }
        let http_client = builder.build().map_err(|e| {
            AssistError::ConfigurationError(format!("Failed to create HTTP client: {e}"))
        })?;
        Self::with_http_client(config, http_client)
    }

    /// Create a transport sharing an existing HTTP client.
    pub fn with_http_client(config: AssistConfig, http_client: HttpClient) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            http_client,
            config,
        })
    }

    pub fn config(&self) -> &AssistConfig {
        &self.config
    }

    fn endpoint(&self, model: &str, method: &str) -> String {
        format!(
            "{}/models/{}:{}",
            self.config.base_url.trim_end_matches('/'),
            model,
            method
        )
    }

    fn build_body(&self, request: ChatRequest) -> GenerateContentRequest {
        let sampling = &self.config.sampling;
        let generation_config = GenerationConfig {
            max_output_tokens: sampling.max_output_tokens,
            temperature: sampling.temperature,
            top_p: sampling.top_p,
            top_k: sampling.top_k,
        };
        GenerateContentRequest {
            contents: request
                .messages
                .into_iter()
                .map(|m| Content::text(Some(m.role.as_str()), m.text))
                .collect(),
            system_instruction: request
                .system_instruction
                .filter(|s| !s.trim().is_empty())
                .map(|s| Content::text(None, s)),
            generation_config: (!generation_config.is_empty()).then_some(generation_config),
        }
    }

    /// POST a JSON body, failing on non-success status.
    async fn post<B: Serialize + ?Sized>(
        &self,
        url: &str,
        body: &B,
        timeout: Option<Duration>,
    ) -> Result<reqwest::Response> {
        let api_key = self.config.credentials.require()?;
        let headers = super::build_gemini_headers(api_key, &self.config.http_headers)?;

        let mut req = self.http_client.post(url).headers(headers).json(body);
        if let Some(t) = timeout {
            req = req.timeout(t);
        }
        let response = req.send().await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let err = classify_api_failure(status.as_u16(), &text);
            tracing::warn!(status = status.as_u16(), error = %err, "Gemini request failed");
            return Err(err);
        }
        Ok(response)
    }
}

impl KeyStatus for GeminiTransport {
    fn is_key_configured(&self) -> bool {
        self.config.is_key_configured()
    }

    fn config_error_message(&self) -> String {
        self.config.config_error_message()
    }
}

#[async_trait]
impl Transport for GeminiTransport {
    async fn generate(&self, request: ChatRequest) -> Result<String> {
        self.ensure_configured()?;
        let model = request
            .model
            .clone()
            .unwrap_or_else(|| self.config.model.clone());
        let url = self.endpoint(&model, "generateContent");
        let body = self.build_body(request);
        tracing::debug!(%model, "generateContent");

        let response = self.post(&url, &body, self.config.timeout).await?;
        let parsed: GenerateContentResponse = response.json().await?;

        if let Some(reason) = parsed.block_reason() {
            return Err(AssistError::ContentBlocked(format!(
                "The prompt was blocked ({reason})."
            )));
        }
        match parsed.text() {
            Some(text) if !text.trim().is_empty() => Ok(text),
            _ => Err(AssistError::EmptyResponse(
                "Received an empty response from the API.".to_string(),
            )),
        }
    }

    async fn stream(&self, request: ChatRequest) -> Result<FragmentStream> {
        self.ensure_configured()?;
        let model = request
            .model
            .clone()
            .unwrap_or_else(|| self.config.model.clone());
        let url = format!(
            "{}?alt=sse",
            self.endpoint(&model, "streamGenerateContent")
        );
        let body = self.build_body(request);
        tracing::debug!(%model, messages = body.contents.len(), "streamGenerateContent");

        // No whole-request timeout: a long answer is not a stalled one. The idle
        // limit also bounds the wait for response headers.
        let idle = self.config.stream_idle_timeout;
        let response = match idle {
            Some(limit) => tokio::time::timeout(limit, self.post(&url, &body, None))
                .await
                .map_err(|_| {
                    AssistError::TimeoutError(format!(
                        "no response from Gemini stream within {}ms",
                        limit.as_millis()
                    ))
                })??,
            None => self.post(&url, &body, None).await?,
        };
        let policy = self.config.terminal_policy.clone();

        let s = async_stream::stream! {
            let mut events = Box::pin(response.bytes_stream().eventsource());
            loop {
                let next = match idle {
                    Some(limit) => match tokio::time::timeout(limit, events.next()).await {
                        Ok(item) => item,
                        Err(_) => {
                            yield Err(AssistError::TimeoutError(format!(
                                "no data from Gemini stream for {}ms",
                                limit.as_millis()
                            )));
                            return;
                        }
                    },
                    None => events.next().await,
                };
                let Some(item) = next else { break };

                let event = match item {
                    Ok(ev) => ev,
                    Err(e) => {
                        yield Err(AssistError::StreamError(format!("SSE stream error (gemini): {e}")));
                        return;
                    }
                };

                let data = event.data.trim();
                if data.is_empty() || data == "[DONE]" {
                    continue;
                }

                match parse_chunk(data) {
                    Ok(chunk) => {
                        yield Ok(chunk_to_fragment(&chunk, &policy));
                    }
                    Err(e) => {
                        yield Err(e);
                        return;
                    }
                }
            }
        };
        Ok(Box::pin(s))
    }

    async fn generate_images(&self, request: ImageRequest) -> Result<Vec<GeneratedImage>> {
        self.ensure_configured()?;
        if request.prompt.trim().is_empty() {
            return Err(AssistError::InvalidInput(
                "Please enter a prompt to generate an image.".to_string(),
            ));
        }
        let model = request
            .model
            .clone()
            .unwrap_or_else(|| self.config.image_model.clone());
        let url = self.endpoint(&model, "predict");
        let body = PredictRequest {
            instances: vec![PredictInstance {
                prompt: request.prompt,
            }],
            parameters: PredictParameters {
                sample_count: request.count.max(1),
                aspect_ratio: request.aspect_ratio,
            },
        };
        tracing::debug!(%model, count = body.parameters.sample_count, "predict");

        let response = self.post(&url, &body, self.config.timeout).await?;
        let parsed: PredictResponse = response.json().await?;

        let mut images = Vec::with_capacity(parsed.predictions.len());
        let mut filtered = Vec::new();
        for prediction in parsed.predictions {
            match prediction.bytes_base64_encoded {
                Some(b64) => {
                    let bytes = base64::engine::general_purpose::STANDARD
                        .decode(b64.as_bytes())
                        .map_err(|e| {
                            AssistError::ParseError(format!("invalid image payload: {e}"))
                        })?;
                    images.push(GeneratedImage {
                        bytes,
                        mime_type: prediction
                            .mime_type
                            .unwrap_or_else(|| "image/png".to_string()),
                    });
                }
                None => filtered.extend(prediction.rai_filtered_reason),
            }
        }

        if images.is_empty() {
            if !filtered.is_empty() {
                return Err(AssistError::ContentBlocked(filtered.join("; ")));
            }
            return Err(AssistError::EmptyResponse(
                "No images were generated.".to_string(),
            ));
        }
        Ok(images)
    }
}
