use crate::{
    error::{LensError, Result, GENERIC_FAILURE_MESSAGE},
    gemini::ContentApi,
    models::{
        Content, ContentPart, EncodedImage, GenerateContentRequest, GenerateContentResponse,
        GenerationConfig, GenerationRequest, GenerationResult, ImageConfig,
    },
};
use std::sync::Arc;

/// Turns one [`GenerationRequest`] into one remote call and one image.
#[derive(Clone)]
pub struct ImageClient {
    api: Arc<dyn ContentApi>,
}

impl ImageClient {
    pub fn new(api: Arc<dyn ContentApi>) -> Self {
        Self { api }
    }

    pub async fn generate(&self, request: &GenerationRequest) -> GenerationResult {
        let model_id = request.model.model_id();
        let body = build_request(request);

        log::info!(
            "Generating image with model: {} (ratio {}, size {})",
            model_id,
            request.aspect_ratio,
            request
                .effective_image_size()
                .map(|s| s.as_str())
                .unwrap_or("default")
        );

        let response = self
            .api
            .generate_content(model_id, &body)
            .await
            .map_err(|e| {
                log::error!("Gemini image generation error: {}", e);
                e
            })?;

        extract_image(&response).map_err(|e| {
            log::warn!("Model {} returned no image: {}", model_id, e);
            e
        })
    }
}

/// Inline image part first (when attached), then the prompt text.
pub fn build_request(request: &GenerationRequest) -> GenerateContentRequest {
    let mut parts = Vec::with_capacity(2);

    if let Some(base) = request.base_image.as_ref().and_then(|i| i.to_base_image()) {
        parts.push(ContentPart::image(base.mime_type, base.data));
    }
    parts.push(ContentPart::text(request.prompt.clone()));

    GenerateContentRequest {
        contents: vec![Content {
            role: None,
            parts: Some(parts),
        }],
        generation_config: GenerationConfig {
            image_config: ImageConfig {
                aspect_ratio: request.aspect_ratio.as_str().to_string(),
                image_size: request
                    .effective_image_size()
                    .map(|s| s.as_str().to_string()),
            },
        },
    }
}

/// First image part wins; otherwise the first text part becomes the failure reason.
pub fn extract_image(response: &GenerateContentResponse) -> Result<EncodedImage> {
    let parts = response
        .first_parts()
        .ok_or(LensError::EmptyResponseError)?;

    if let Some(inline) = parts.iter().find_map(ContentPart::as_image) {
        return Ok(EncodedImage::png_from_base64(&inline.data));
    }

    let reason = parts
        .iter()
        .find_map(ContentPart::as_text)
        .unwrap_or(GENERIC_FAILURE_MESSAGE);
    Err(LensError::ContentRejectedError(reason.to_string()))
}
