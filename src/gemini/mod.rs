pub mod http;
pub mod image_client;

use crate::{
    config::GeminiConfig,
    error::Result,
    models::{GenerateContentRequest, GenerateContentResponse},
};
use async_trait::async_trait;
use std::sync::Arc;

pub use http::HttpContentApi;
pub use image_client::ImageClient;

/// Transport for the remote `generateContent` call.
#[async_trait]
pub trait ContentApi: Send + Sync {
    async fn generate_content(
        &self,
        model_id: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse>;
}

#[derive(Clone)]
pub struct GeminiClient {
    image_client: ImageClient,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Result<Self> {
        let api = HttpContentApi::new(&config)?;
        Ok(Self::with_api(Arc::new(api)))
    }

    pub fn with_api(api: Arc<dyn ContentApi>) -> Self {
        Self {
            image_client: ImageClient::new(api),
        }
    }

    pub fn image(&self) -> &ImageClient {
        &self.image_client
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::error::LensError;
    use crate::models::ContentPart;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Debug, Clone)]
    pub(crate) enum Reply {
        Image,
        Text(String),
        Transport(String),
    }

    /// Scripted fake of the remote API. Reply `n` answers call `n`; the
    /// last reply repeats once the script runs out.
    pub(crate) struct MockContentApi {
        script: Vec<Reply>,
        delay: Duration,
        counter: AtomicUsize,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
        calls: Mutex<Vec<(String, GenerateContentRequest)>>,
    }

    impl MockContentApi {
        pub(crate) fn scripted(script: Vec<Reply>) -> Self {
            Self {
                script,
                delay: Duration::from_millis(0),
                counter: AtomicUsize::new(0),
                in_flight: AtomicUsize::new(0),
                max_in_flight: AtomicUsize::new(0),
                calls: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn succeeding() -> Self {
            Self::scripted(vec![Reply::Image])
        }

        pub(crate) fn failing_with(message: &str) -> Self {
            Self::scripted(vec![Reply::Transport(message.to_string())])
        }

        pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }

        pub(crate) fn calls(&self) -> Vec<(String, GenerateContentRequest)> {
            self.calls.lock().unwrap().clone()
        }

        pub(crate) fn max_in_flight(&self) -> usize {
            self.max_in_flight.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ContentApi for MockContentApi {
        async fn generate_content(
            &self,
            model_id: &str,
            request: &GenerateContentRequest,
        ) -> Result<GenerateContentResponse> {
            let n = self.counter.fetch_add(1, Ordering::SeqCst);
            self.calls
                .lock()
                .unwrap()
                .push((model_id.to_string(), request.clone()));

            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            let reply = self
                .script
                .get(n)
                .or_else(|| self.script.last())
                .cloned()
                .unwrap_or(Reply::Image);

            let part = match reply {
                Reply::Image => ContentPart::image("image/png", format!("aW1hZ2Ut{}", n)),
                Reply::Text(text) => ContentPart::text(text),
                Reply::Transport(message) => return Err(LensError::TransportError(message)),
            };
            Ok(GenerateContentResponse {
                candidates: Some(vec![crate::models::Candidate {
                    content: Some(crate::models::Content {
                        role: Some("model".into()),
                        parts: Some(vec![part]),
                    }),
                    finish_reason: None,
                }]),
            })
        }
    }
}
