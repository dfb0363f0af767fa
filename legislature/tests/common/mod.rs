//! Shared fixtures for lifecycle integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use legislature::{
    Announcement, Announcer, EventBus, Legislature, LegislatureConfig, LifecycleEvent, MessageRef,
    RenderError, SharedProposalStore,
};
use tokio::sync::broadcast;

pub const BODY: &str = "An act to establish a public park in every district.";

/// Announcer that records everything it is asked to post.
#[derive(Default)]
pub struct RecordingAnnouncer {
    posts: Mutex<Vec<Announcement>>,
    threads: Mutex<Vec<String>>,
    next: AtomicU64,
    fail: bool,
}

impl RecordingAnnouncer {
    /// An announcer whose every post fails.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn posts(&self) -> Vec<Announcement> {
        self.posts.lock().unwrap().clone()
    }

    pub fn kinds(&self) -> Vec<&'static str> {
        self.posts().iter().map(Announcement::kind).collect()
    }

    pub fn threads(&self) -> Vec<String> {
        self.threads.lock().unwrap().clone()
    }
}

#[async_trait]
impl Announcer for RecordingAnnouncer {
    async fn post(&self, announcement: &Announcement) -> Result<MessageRef, RenderError> {
        self.posts.lock().unwrap().push(announcement.clone());
        if self.fail {
            return Err(RenderError::Delivery("channel offline".into()));
        }
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        Ok(MessageRef::new(format!("msg-{}", n)))
    }

    async fn create_thread(
        &self,
        _message: &MessageRef,
        name: &str,
    ) -> Result<MessageRef, RenderError> {
        self.threads.lock().unwrap().push(name.to_string());
        Ok(MessageRef::new(format!("thread-{}", name)))
    }
}

pub struct Harness {
    pub legislature: Arc<Legislature>,
    pub announcer: Arc<RecordingAnnouncer>,
    pub events: broadcast::Receiver<LifecycleEvent>,
}

pub fn harness(store: SharedProposalStore) -> Harness {
    harness_with(store, RecordingAnnouncer::default())
}

/// Route library logs to the test output; `RUST_LOG=legislature=debug` to see them.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_test_writer()
        .try_init();
}

pub fn harness_with(store: SharedProposalStore, announcer: RecordingAnnouncer) -> Harness {
    init_tracing();
    let announcer = Arc::new(announcer);
    let legislature = Legislature::new(
        store,
        announcer.clone(),
        EventBus::new().shared(),
        LegislatureConfig::default(),
    );
    let events = legislature.events().subscribe();
    Harness {
        legislature,
        announcer,
        events,
    }
}

/// Wait (in Tokio time) for the first event matching `pred`.
pub async fn wait_for<F>(
    events: &mut broadcast::Receiver<LifecycleEvent>,
    mut pred: F,
) -> LifecycleEvent
where
    F: FnMut(&LifecycleEvent) -> bool,
{
    tokio::time::timeout(Duration::from_secs(30 * 24 * 3600), async {
        loop {
            match events.recv().await {
                Ok(event) if pred(&event) => return event,
                Ok(_) => continue,
                Err(e) => panic!("event stream failed: {}", e),
            }
        }
    })
    .await
    .expect("event was not observed")
}

/// Events already delivered, without waiting.
pub fn drain(events: &mut broadcast::Receiver<LifecycleEvent>) -> Vec<LifecycleEvent> {
    let mut drained = Vec::new();
    while let Ok(event) = events.try_recv() {
        drained.push(event);
    }
    drained
}

/// Let spawned timer tasks run.
pub async fn settle() {
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
}
