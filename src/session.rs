//! Request lifecycle as a pure reducer.
//!
//! [`transition`] maps `(state, event)` to the next state plus the effects the
//! driver must carry out. Nothing here touches the network, disk or clock.

use crate::{
    batch::{BatchRequest, MAX_BATCH_SIZE, MIN_BATCH_SIZE},
    models::{AspectRatio, EncodedImage, History, HistoryEntry, ImageSize, ModelVariant},
    progress::progress_message,
};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Submitting,
    /// Idle with the last failure on display. Input stays usable.
    Error(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    pub prompt: String,
    pub model: ModelVariant,
    pub aspect_ratio: AspectRatio,
    pub image_size: ImageSize,
    pub batch_size: u8,
    pub attached_image: Option<EncodedImage>,
    pub history: History,
    pub phase: Phase,
    pub progress_index: usize,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            prompt: String::new(),
            model: ModelVariant::Fast,
            aspect_ratio: AspectRatio::Square,
            image_size: ImageSize::OneK,
            batch_size: MIN_BATCH_SIZE,
            attached_image: None,
            history: History::new(),
            phase: Phase::Idle,
            progress_index: 0,
        }
    }
}

impl SessionState {
    pub fn is_generating(&self) -> bool {
        self.phase == Phase::Submitting
    }

    pub fn error(&self) -> Option<&str> {
        match &self.phase {
            Phase::Error(message) => Some(message.as_str()),
            _ => None,
        }
    }

    pub fn progress_message(&self) -> &'static str {
        progress_message(self.progress_index)
    }

    /// Whether a submit would be accepted right now.
    pub fn can_submit(&self) -> bool {
        !self.is_generating() && !self.prompt.trim().is_empty()
    }

    fn batch_request(&self) -> BatchRequest {
        BatchRequest {
            prompt: self.prompt.clone(),
            model: self.model,
            aspect_ratio: self.aspect_ratio,
            image_size: self.image_size,
            base_image: self.attached_image.clone(),
            count: self.batch_size,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    SetPrompt(String),
    SelectModel(ModelVariant),
    SelectAspectRatio(AspectRatio),
    SelectImageSize(ImageSize),
    SetBatchSize(u8),
    AttachImage(Option<EncodedImage>),
    HistoryLoaded(History),
    Submit,
    ProgressTick,
    BatchSucceeded(Vec<HistoryEntry>),
    BatchFailed(String),
}

/// Work the driver performs after a transition.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    IssueBatch(BatchRequest),
    StartProgress,
    StopProgress,
    PersistHistory,
    ScrollToTop,
}

pub fn transition(state: &SessionState, event: SessionEvent) -> (SessionState, Vec<Effect>) {
    let mut next = state.clone();
    let mut effects = Vec::new();

    match event {
        SessionEvent::SetPrompt(prompt) => {
            if !state.is_generating() {
                next.prompt = prompt;
            }
        }
        SessionEvent::SelectModel(model) => next.model = model,
        SessionEvent::SelectAspectRatio(ratio) => next.aspect_ratio = ratio,
        SessionEvent::SelectImageSize(size) => next.image_size = size,
        SessionEvent::SetBatchSize(size) => {
            next.batch_size = size.clamp(MIN_BATCH_SIZE, MAX_BATCH_SIZE);
        }
        SessionEvent::AttachImage(image) => {
            next.attached_image = image.filter(|i| !i.is_blank());
        }
        SessionEvent::HistoryLoaded(history) => next.history = history,
        SessionEvent::Submit => {
            if state.can_submit() {
                next.phase = Phase::Submitting;
                next.progress_index = 0;
                effects.push(Effect::IssueBatch(state.batch_request()));
                effects.push(Effect::StartProgress);
            }
        }
        SessionEvent::ProgressTick => {
            if state.is_generating() {
                next.progress_index = state.progress_index.wrapping_add(1);
            }
        }
        SessionEvent::BatchSucceeded(entries) => {
            if state.is_generating() {
                next.phase = Phase::Idle;
                next.history = state.history.append(entries);
                effects.push(Effect::StopProgress);
                effects.push(Effect::PersistHistory);
                effects.push(Effect::ScrollToTop);
            }
        }
        SessionEvent::BatchFailed(message) => {
            if state.is_generating() {
                next.phase = Phase::Error(message);
                effects.push(Effect::StopProgress);
            }
        }
    }

    (next, effects)
}
