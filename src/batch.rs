use crate::{
    credentials::{is_entity_not_found, CredentialSelector},
    error::{LensError, Result},
    gemini::ImageClient,
    logger,
    models::{
        AspectRatio, EncodedImage, GenerationRequest, HistoryEntry, ImageSize, ModelVariant,
    },
};
use chrono::{SubsecRound, Utc};
use futures::future::join_all;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

pub const MIN_BATCH_SIZE: u8 = 1;
pub const MAX_BATCH_SIZE: u8 = 4;

/// Settings snapshot for one submission.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchRequest {
    pub prompt: String,
    pub model: ModelVariant,
    pub aspect_ratio: AspectRatio,
    pub image_size: ImageSize,
    pub base_image: Option<EncodedImage>,
    pub count: u8,
}

impl BatchRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            model: ModelVariant::default(),
            aspect_ratio: AspectRatio::default(),
            image_size: ImageSize::default(),
            base_image: None,
            count: MIN_BATCH_SIZE,
        }
    }

    pub fn with_model(mut self, model: ModelVariant) -> Self {
        self.model = model;
        self
    }

    pub fn with_aspect_ratio(mut self, aspect_ratio: AspectRatio) -> Self {
        self.aspect_ratio = aspect_ratio;
        self
    }

    pub fn with_image_size(mut self, image_size: ImageSize) -> Self {
        self.image_size = image_size;
        self
    }

    pub fn with_base_image(mut self, image: EncodedImage) -> Self {
        self.base_image = Some(image);
        self
    }

    pub fn with_count(mut self, count: u8) -> Self {
        self.count = count;
        self
    }

    fn generation_request(&self) -> GenerationRequest {
        GenerationRequest {
            prompt: self.prompt.clone(),
            model: self.model,
            aspect_ratio: self.aspect_ratio,
            image_size: Some(self.image_size),
            base_image: self.base_image.clone(),
        }
    }

    fn recorded_size(&self) -> Option<ImageSize> {
        self.model.supports_image_size().then_some(self.image_size)
    }
}

/// Fans one submission out to `count` concurrent generations.
///
/// Every call is awaited before the outcome is decided, so a batch either
/// yields all of its entries or none of them.
pub struct BatchOrchestrator {
    client: ImageClient,
    credentials: Option<Arc<dyn CredentialSelector>>,
    last_id: AtomicI64,
}

impl BatchOrchestrator {
    pub fn new(client: ImageClient) -> Self {
        Self {
            client,
            credentials: None,
            last_id: AtomicI64::new(0),
        }
    }

    pub fn with_credentials(mut self, selector: Arc<dyn CredentialSelector>) -> Self {
        self.credentials = Some(selector);
        self
    }

    pub async fn run_batch(&self, request: &BatchRequest) -> Result<Vec<HistoryEntry>> {
        if request.prompt.trim().is_empty() {
            return Err(LensError::ValidationError("prompt is empty".into()));
        }
        if !(MIN_BATCH_SIZE..=MAX_BATCH_SIZE).contains(&request.count) {
            return Err(LensError::ValidationError(format!(
                "batch size must be between {} and {}, got {}",
                MIN_BATCH_SIZE, MAX_BATCH_SIZE, request.count
            )));
        }

        self.ensure_key_selected(request.model).await;

        let _timer = logger::timer(&format!("batch of {} ({})", request.count, request.model));
        let generation = request.generation_request();
        let calls = (0..request.count).map(|_| self.client.generate(&generation));
        let outcomes = join_all(calls).await;

        let images = match outcomes.into_iter().collect::<Result<Vec<_>>>() {
            Ok(images) => images,
            Err(e) => return Err(self.remediate(e)),
        };

        let base = self.next_id_base(images.len());
        let created_at = Utc::now().trunc_subsecs(3);
        let entries: Vec<HistoryEntry> = images
            .into_iter()
            .enumerate()
            .map(|(i, image_url)| HistoryEntry {
                id: (base + i as i64).to_string(),
                image_url,
                prompt_text: request.prompt.clone(),
                created_at,
                model: request.model,
                aspect_ratio: request.aspect_ratio,
                size: request.recorded_size(),
            })
            .collect();

        log::info!("Batch produced {} image(s)", entries.len());
        Ok(entries)
    }

    async fn ensure_key_selected(&self, model: ModelVariant) {
        if model != ModelVariant::HighQuality {
            return;
        }
        if let Some(selector) = &self.credentials {
            if !selector.has_selected_key().await {
                log::info!("No key selected for {}, opening key selection", model);
                selector.open_select_key().await;
            }
        }
    }

    /// Invalid-key failures get a fixed message and reopen key selection.
    fn remediate(&self, error: LensError) -> LensError {
        let message = error.user_message();
        log::error!("Batch failed: {}", message);

        if !is_entity_not_found(&message) {
            return error;
        }
        if let Some(selector) = self.credentials.clone() {
            tokio::spawn(async move {
                selector.open_select_key().await;
            });
        }
        LensError::CredentialError
    }

    /// Millisecond base for ids, strictly after anything issued before.
    fn next_id_base(&self, count: usize) -> i64 {
        let now = Utc::now().timestamp_millis();
        let span = count.max(1) as i64;
        let mut base = now;
        let _ = self
            .last_id
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                base = now.max(last + 1);
                Some(base + span - 1)
            });
        base
    }
}
