use crate::{
    batch::BatchOrchestrator,
    models::HistoryEntry,
    progress::{ProgressTicker, PROGRESS_INTERVAL},
    session::{transition, Effect, SessionEvent, SessionState},
    storage::HistoryCache,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Shown when a submission is abandoned before its batch settles.
pub const CANCELLED_MESSAGE: &str = "Generation cancelled.";

/// Gallery surface owned by the front end.
pub trait GalleryView: Send + Sync {
    fn scroll_to_top(&self);
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// Blank prompt or a batch already in flight.
    Ignored,
    Completed(Vec<HistoryEntry>),
    Failed(String),
}

/// Runs the session reducer against the real collaborators.
///
/// State is published through a watch channel; every transition replaces
/// the whole snapshot, so readers never see a half-applied update.
pub struct LensApp {
    state: watch::Sender<SessionState>,
    orchestrator: BatchOrchestrator,
    cache: HistoryCache,
    gallery: Option<Arc<dyn GalleryView>>,
    progress_period: Duration,
}

impl LensApp {
    pub fn new(orchestrator: BatchOrchestrator, cache: HistoryCache) -> Self {
        let (state, _) = watch::channel(SessionState::default());
        Self {
            state,
            orchestrator,
            cache,
            gallery: None,
            progress_period: PROGRESS_INTERVAL,
        }
    }

    pub fn with_gallery(mut self, gallery: Arc<dyn GalleryView>) -> Self {
        self.gallery = Some(gallery);
        self
    }

    pub fn with_progress_period(mut self, period: Duration) -> Self {
        self.progress_period = period;
        self
    }

    /// Read the saved gallery once, at startup.
    pub async fn load_history(&self) {
        let history = self.cache.load().await;
        self.dispatch(SessionEvent::HistoryLoaded(history));
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Apply one event and return the effects it asks for.
    pub fn dispatch(&self, event: SessionEvent) -> Vec<Effect> {
        let mut effects = Vec::new();
        self.state.send_modify(|state| {
            let (next, requested) = transition(state, event);
            *state = next;
            effects = requested;
        });
        effects
    }

    pub async fn submit(&self) -> SubmitOutcome {
        let effects = self.dispatch(SessionEvent::Submit);
        let request = effects.iter().find_map(|effect| match effect {
            Effect::IssueBatch(request) => Some(request.clone()),
            _ => None,
        });
        let Some(request) = request else {
            log::debug!("Submit ignored");
            return SubmitOutcome::Ignored;
        };

        let mut in_flight = InFlight {
            state: &self.state,
            settled: false,
        };
        let mut ticker = None;
        self.run_effects(&effects, &mut ticker).await;

        log::info!(
            "Submitting {} x {} ({})",
            request.count,
            request.model,
            request.aspect_ratio
        );
        let batch = self.orchestrator.run_batch(&request);
        tokio::pin!(batch);

        let outcome = loop {
            tokio::select! {
                biased;
                outcome = &mut batch => break outcome,
                _ = next_tick(&mut ticker) => {
                    self.dispatch(SessionEvent::ProgressTick);
                }
            }
        };

        let (event, result) = match outcome {
            Ok(entries) => (
                SessionEvent::BatchSucceeded(entries.clone()),
                SubmitOutcome::Completed(entries),
            ),
            Err(e) => {
                let message = e.user_message();
                (
                    SessionEvent::BatchFailed(message.clone()),
                    SubmitOutcome::Failed(message),
                )
            }
        };

        in_flight.settled = true;
        let effects = self.dispatch(event);
        self.run_effects(&effects, &mut ticker).await;
        result
    }

    async fn run_effects(&self, effects: &[Effect], ticker: &mut Option<ProgressTicker>) {
        for effect in effects {
            match effect {
                Effect::IssueBatch(_) => {}
                Effect::StartProgress => {
                    *ticker = Some(ProgressTicker::start(self.progress_period));
                }
                Effect::StopProgress => {
                    if let Some(mut running) = ticker.take() {
                        running.cancel();
                    }
                }
                Effect::PersistHistory => {
                    let history = self.state.borrow().history.clone();
                    if let Err(e) = self.cache.persist(&history).await {
                        log::error!("Failed to persist history: {}", e);
                    }
                }
                Effect::ScrollToTop => {
                    if let Some(gallery) = &self.gallery {
                        gallery.scroll_to_top();
                    }
                }
            }
        }
    }
}

/// Leaves `Submitting` if the submit future is dropped before the batch
/// settles, so later submits are accepted again.
struct InFlight<'a> {
    state: &'a watch::Sender<SessionState>,
    settled: bool,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        log::warn!("Submission dropped before the batch settled");
        self.state.send_modify(|state| {
            let (next, _) = transition(state, SessionEvent::BatchFailed(CANCELLED_MESSAGE.into()));
            *state = next;
        });
    }
}

/// Next progress tick, or never when no ticker is running.
async fn next_tick(ticker: &mut Option<ProgressTicker>) {
    match ticker {
        Some(running) => {
            if running.tick().await.is_none() {
                std::future::pending::<()>().await;
            }
        }
        None => std::future::pending::<()>().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gemini::testing::{MockContentApi, Reply};
    use crate::gemini::ImageClient;
    use crate::models::history::tests::entry;
    use crate::models::History;
    use crate::storage::{KeyValueStore, MemoryStore};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingGallery(AtomicUsize);

    impl GalleryView for CountingGallery {
        fn scroll_to_top(&self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn app(api: MockContentApi) -> (Arc<MemoryStore>, Arc<CountingGallery>, LensApp) {
        let store = Arc::new(MemoryStore::new());
        let gallery = Arc::new(CountingGallery::default());
        let app = LensApp::new(
            BatchOrchestrator::new(ImageClient::new(Arc::new(api))),
            HistoryCache::new(store.clone(), "banana_lens_v2"),
        )
        .with_gallery(gallery.clone());
        (store, gallery, app)
    }

    #[tokio::test]
    async fn test_success_commits_persists_and_scrolls() {
        let (store, gallery, app) = app(MockContentApi::succeeding());
        app.dispatch(SessionEvent::SetPrompt("a cat".into()));
        app.dispatch(SessionEvent::SetBatchSize(2));

        let outcome = app.submit().await;
        let SubmitOutcome::Completed(entries) = outcome else {
            panic!("expected completion, got {:?}", outcome);
        };
        assert_eq!(entries.len(), 2);

        let state = app.snapshot();
        assert!(!state.is_generating());
        assert_eq!(state.history.len(), 2);
        assert_eq!(gallery.0.load(Ordering::SeqCst), 1);

        let saved = store.get("banana_lens_v2").await.unwrap().unwrap();
        let saved: History = serde_json::from_str(&saved).unwrap();
        assert_eq!(saved, state.history);
    }

    #[tokio::test]
    async fn test_failure_sets_error_and_keeps_history() {
        let (store, gallery, app) = app(MockContentApi::scripted(vec![
            Reply::Image,
            Reply::Text("Blocked by safety filter".into()),
        ]));
        app.dispatch(SessionEvent::HistoryLoaded(History::new().append(vec![entry("old")])));
        app.dispatch(SessionEvent::SetPrompt("x".into()));
        app.dispatch(SessionEvent::SetBatchSize(2));

        let outcome = app.submit().await;
        assert_eq!(outcome, SubmitOutcome::Failed("Blocked by safety filter".into()));

        let state = app.snapshot();
        assert_eq!(state.error(), Some("Blocked by safety filter"));
        assert_eq!(state.history.len(), 1);
        assert_eq!(gallery.0.load(Ordering::SeqCst), 0);
        assert!(store.get("banana_lens_v2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_blank_submit_is_ignored() {
        let (_, _, app) = app(MockContentApi::succeeding());
        app.dispatch(SessionEvent::SetPrompt("   ".into()));
        let before = app.snapshot();
        assert_eq!(app.submit().await, SubmitOutcome::Ignored);
        assert_eq!(app.snapshot(), before);
    }

    #[tokio::test(start_paused = true)]
    async fn test_progress_rotates_during_slow_batch() {
        let (_, _, app) = app(MockContentApi::succeeding().with_delay(Duration::from_secs(5)));
        app.dispatch(SessionEvent::SetPrompt("x".into()));
        let mut rx = app.subscribe();

        let watcher = tokio::spawn(async move {
            let mut seen = Vec::new();
            while rx.changed().await.is_ok() {
                let state = rx.borrow().clone();
                if state.is_generating() {
                    seen.push(state.progress_index);
                } else if !state.history.is_empty() {
                    break;
                }
            }
            seen
        });

        let outcome = app.submit().await;
        assert!(matches!(outcome, SubmitOutcome::Completed(_)));
        let seen = watcher.await.unwrap();
        assert!(seen.contains(&2), "saw {:?}", seen);
        assert_eq!(app.snapshot().progress_index, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_submit_returns_to_usable_state() {
        let (store, _, app) = app(MockContentApi::succeeding().with_delay(Duration::from_secs(30)));
        app.dispatch(SessionEvent::SetPrompt("x".into()));

        let abandoned = tokio::time::timeout(Duration::from_secs(1), app.submit()).await;
        assert!(abandoned.is_err());

        let state = app.snapshot();
        assert!(!state.is_generating());
        assert_eq!(state.error(), Some(CANCELLED_MESSAGE));
        assert!(state.history.is_empty());
        assert!(store.get("banana_lens_v2").await.unwrap().is_none());

        let outcome = app.submit().await;
        assert!(matches!(outcome, SubmitOutcome::Completed(ref e) if e.len() == 1));
        assert!(!app.snapshot().is_generating());
    }

    #[tokio::test]
    async fn test_load_history_reads_saved_gallery() {
        let (store, _, app) = app(MockContentApi::succeeding());
        let saved = History::new().append(vec![entry("a"), entry("b")]);
        store
            .set("banana_lens_v2", serde_json::to_string(&saved).unwrap())
            .await
            .unwrap();
        app.load_history().await;
        assert_eq!(app.snapshot().history, saved);
    }
}
