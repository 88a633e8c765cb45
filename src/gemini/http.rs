use crate::{
    config::GeminiConfig,
    error::{LensError, Result},
    gemini::ContentApi,
    models::{ApiErrorBody, GenerateContentRequest, GenerateContentResponse},
};
use async_trait::async_trait;
use reqwest::Client;

/// `generateContent` over HTTPS, authenticated with an API key header.
pub struct HttpContentApi {
    client: Client,
    config: GeminiConfig,
}

impl HttpContentApi {
    pub fn new(config: &GeminiConfig) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| LensError::ConfigError(format!("failed to build HTTP client: {}", e)))?;

        if config.api_key.is_none() {
            log::warn!("No GEMINI_API_KEY configured, generation requests will fail");
        }

        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    fn endpoint(&self, model_id: &str) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            model_id
        )
    }
}

#[async_trait]
impl ContentApi for HttpContentApi {
    async fn generate_content(
        &self,
        model_id: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse> {
        let api_key = self.config.require_api_key()?;

        log::debug!(
            "POST {} ({} part(s))",
            self.endpoint(model_id),
            request
                .contents
                .iter()
                .map(|c| c.parts.as_ref().map_or(0, Vec::len))
                .sum::<usize>()
        );

        let response = self
            .client
            .post(self.endpoint(model_id))
            .header("x-goog-api-key", api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| LensError::TransportError(e.to_string()))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| LensError::TransportError(e.to_string()))?;

        if !status.is_success() {
            return Err(LensError::TransportError(error_message(status.as_u16(), &body)));
        }

        serde_json::from_slice(&body).map_err(|e| {
            log::error!("Could not decode generateContent response: {}", e);
            LensError::EmptyResponseError
        })
    }
}

/// The API's own error message when the body carries one.
fn error_message(status: u16, body: &[u8]) -> String {
    match serde_json::from_slice::<ApiErrorBody>(body) {
        Ok(parsed) if !parsed.error.message.is_empty() => parsed.error.message,
        _ => {
            let text = String::from_utf8_lossy(body);
            if text.trim().is_empty() {
                format!("HTTP {}", status)
            } else {
                format!("HTTP {}: {}", status, text.trim())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let api = HttpContentApi::new(
            &GeminiConfig::new()
                .with_api_key("k")
                .with_base_url("http://localhost:8080/"),
        )
        .unwrap();
        assert_eq!(
            api.endpoint("gemini-2.5-flash-image"),
            "http://localhost:8080/v1beta/models/gemini-2.5-flash-image:generateContent"
        );
    }

    #[test]
    fn test_error_message_prefers_api_message() {
        let body = br#"{"error":{"code":404,"message":"Requested entity was not found.","status":"NOT_FOUND"}}"#;
        assert_eq!(error_message(404, body), "Requested entity was not found.");
        assert_eq!(error_message(502, b"bad gateway"), "HTTP 502: bad gateway");
        assert_eq!(error_message(500, b""), "HTTP 500");
    }

    #[tokio::test]
    async fn test_missing_key_fails_without_network() {
        let api = HttpContentApi::new(&GeminiConfig::new().with_base_url("http://127.0.0.1:9")).unwrap();
        let request = crate::gemini::image_client::build_request(
            &crate::models::GenerationRequest::new("x"),
        );
        let err = api.generate_content("m", &request).await.unwrap_err();
        assert!(matches!(err, LensError::ConfigError(_)));
        assert_eq!(
            err.to_string(),
            GeminiConfig::new().require_api_key().unwrap_err().to_string()
        );
    }
}
