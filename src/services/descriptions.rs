//! # Enemy Descriptions
//!
//! Flavour text for inspected enemies, fetched asynchronously.
//!
//! [`DescriptionTracker`] runs one lookup at a time on a tokio runtime. Every
//! request carries a token; a result whose token no longer matches the open
//! inspection is dropped, so a late answer never lands on the wrong view.
//! Failures and timeouts degrade to [`FALLBACK_DESCRIPTION`].

use crate::game::{EnemyKind, EntityId};
use crate::GravewalkResult;
use log::{debug, warn};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;

/// Shown when the description service fails or is too slow.
pub const FALLBACK_DESCRIPTION: &str = "Its nature eludes you. Best keep your distance.";

/// Default time allowed for one lookup
pub const DESCRIPTION_TIMEOUT: Duration = Duration::from_secs(5);

pub type DescriptionFuture = Pin<Box<dyn Future<Output = GravewalkResult<String>> + Send>>;

/// A source of enemy descriptions with arbitrary latency.
pub trait LoreService: Send + Sync {
    fn describe(&self, kind: EnemyKind, dungeon_level: u32) -> DescriptionFuture;
}

/// Built-in bestiary entries.
#[derive(Debug, Clone, Default)]
pub struct LocalLore {
    latency: Duration,
}

impl LocalLore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answers after a fixed delay.
    pub fn with_latency(latency: Duration) -> Self {
        Self { latency }
    }
}

fn bestiary(kind: EnemyKind) -> &'static str {
    match kind {
        EnemyKind::Rat => "A bloated crypt rat, fat on what the dead left behind.",
        EnemyKind::Bat => "A pale bat that never learned to fear torchlight.",
        EnemyKind::Spider => "A tomb spider. Its bite festers long after the wound closes.",
        EnemyKind::Skeleton => "Old bones held together by an older grudge.",
        EnemyKind::Slime => "A quivering slime. Cut it and it only multiplies.",
        EnemyKind::Slimeling => "A fragment of slime, still hungry.",
        EnemyKind::Orc => "A scarred orc wearing the armour of someone who was less lucky.",
    }
}

impl LoreService for LocalLore {
    fn describe(&self, kind: EnemyKind, dungeon_level: u32) -> DescriptionFuture {
        let latency = self.latency;
        Box::pin(async move {
            if !latency.is_zero() {
                tokio::time::sleep(latency).await;
            }
            let depth = if dungeon_level > 3 {
                " The deep places have made it stronger."
            } else {
                ""
            };
            Ok(format!("{}{}", bestiary(kind), depth))
        })
    }
}

/// What the inspection view should show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptionStatus<'a> {
    /// No lookup for this enemy
    Idle,
    Loading,
    Ready(&'a str),
}

struct Delivery {
    token: u64,
    text: String,
}

struct PendingRequest {
    token: u64,
    enemy: EntityId,
    task: JoinHandle<()>,
}

/// Tracks the single open description lookup.
pub struct DescriptionTracker {
    service: Arc<dyn LoreService>,
    runtime: Handle,
    timeout: Duration,
    sender: UnboundedSender<Delivery>,
    receiver: UnboundedReceiver<Delivery>,
    next_token: u64,
    pending: Option<PendingRequest>,
    ready: Option<(EntityId, String)>,
}

impl DescriptionTracker {
    /// Creates a tracker that spawns lookups on `runtime`.
    pub fn new(service: Arc<dyn LoreService>, runtime: Handle) -> Self {
        let (sender, receiver) = unbounded_channel();
        Self {
            service,
            runtime,
            timeout: DESCRIPTION_TIMEOUT,
            sender,
            receiver,
            next_token: 0,
            pending: None,
            ready: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Starts a lookup, replacing whatever was open. Returns its token.
    pub fn request(&mut self, enemy: EntityId, kind: EnemyKind, dungeon_level: u32) -> u64 {
        self.cancel();
        let token = self.next_token;
        self.next_token += 1;

        let service = Arc::clone(&self.service);
        let sender = self.sender.clone();
        let timeout = self.timeout;
        let task = self.runtime.spawn(async move {
            let text = match tokio::time::timeout(timeout, service.describe(kind, dungeon_level))
                .await
            {
                Ok(Ok(text)) => text,
                Ok(Err(err)) => {
                    warn!("Description of {} failed: {}", kind.name(), err);
                    FALLBACK_DESCRIPTION.to_string()
                }
                Err(_) => {
                    warn!("Description of {} timed out", kind.name());
                    FALLBACK_DESCRIPTION.to_string()
                }
            };
            // The receiver is gone once the session shut down
            let _ = sender.send(Delivery { token, text });
        });

        debug!("Requested description {} for {}", token, kind.name());
        self.pending = Some(PendingRequest { token, enemy, task });
        token
    }

    /// Aborts the open lookup and forgets any shown text.
    pub fn cancel(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.task.abort();
            debug!("Cancelled description {}", pending.token);
        }
        self.ready = None;
    }

    /// Collects finished lookups. Returns true when new text became ready.
    pub fn poll(&mut self) -> bool {
        let mut updated = false;
        while let Ok(delivery) = self.receiver.try_recv() {
            match &self.pending {
                Some(pending) if pending.token == delivery.token => {
                    let enemy = pending.enemy;
                    self.pending = None;
                    self.ready = Some((enemy, delivery.text));
                    updated = true;
                }
                _ => debug!("Discarding stale description {}", delivery.token),
            }
        }
        updated
    }

    pub fn status(&self, enemy: EntityId) -> DescriptionStatus<'_> {
        match (&self.ready, &self.pending) {
            (Some((ready, text)), _) if *ready == enemy => DescriptionStatus::Ready(text),
            (_, Some(pending)) if pending.enemy == enemy => DescriptionStatus::Loading,
            _ => DescriptionStatus::Idle,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::new_entity_id;
    use crate::GravewalkError;

    struct Broken;

    impl LoreService for Broken {
        fn describe(&self, _kind: EnemyKind, _dungeon_level: u32) -> DescriptionFuture {
            Box::pin(async { Err::<String, _>(GravewalkError::Description("offline".to_string())) })
        }
    }

    async fn settle(tracker: &mut DescriptionTracker) -> bool {
        for _ in 0..200 {
            if tracker.poll() {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
        false
    }

    #[test]
    fn test_local_lore_mentions_depth() {
        let lore = LocalLore::new();
        let shallow = tokio_test::block_on(lore.describe(EnemyKind::Rat, 1)).unwrap();
        let deep = tokio_test::block_on(lore.describe(EnemyKind::Rat, 6)).unwrap();
        assert!(shallow.contains("rat"));
        assert!(deep.len() > shallow.len());
    }

    #[tokio::test]
    async fn test_description_arrives() {
        let mut tracker = DescriptionTracker::new(Arc::new(LocalLore::new()), Handle::current());
        let enemy = new_entity_id();

        tracker.request(enemy, EnemyKind::Spider, 2);
        assert_eq!(tracker.status(enemy), DescriptionStatus::Loading);

        assert!(settle(&mut tracker).await);
        match tracker.status(enemy) {
            DescriptionStatus::Ready(text) => assert!(text.contains("spider")),
            other => panic!("unexpected status {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_failure_uses_fallback() {
        let mut tracker = DescriptionTracker::new(Arc::new(Broken), Handle::current());
        let enemy = new_entity_id();

        tracker.request(enemy, EnemyKind::Orc, 5);

        assert!(settle(&mut tracker).await);
        assert_eq!(
            tracker.status(enemy),
            DescriptionStatus::Ready(FALLBACK_DESCRIPTION)
        );
    }

    #[tokio::test]
    async fn test_timeout_uses_fallback() {
        let slow = LocalLore::with_latency(Duration::from_secs(30));
        let mut tracker = DescriptionTracker::new(Arc::new(slow), Handle::current())
            .with_timeout(Duration::from_millis(10));
        let enemy = new_entity_id();

        tracker.request(enemy, EnemyKind::Bat, 1);

        assert!(settle(&mut tracker).await);
        assert_eq!(
            tracker.status(enemy),
            DescriptionStatus::Ready(FALLBACK_DESCRIPTION)
        );
    }

    #[tokio::test]
    async fn test_replaced_request_is_discarded() {
        let slow = LocalLore::with_latency(Duration::from_millis(20));
        let mut tracker = DescriptionTracker::new(Arc::new(slow), Handle::current());
        let first = new_entity_id();
        let second = new_entity_id();

        tracker.request(first, EnemyKind::Rat, 1);
        tracker.request(second, EnemyKind::Slime, 1);
        assert_eq!(tracker.status(first), DescriptionStatus::Idle);

        assert!(settle(&mut tracker).await);
        assert!(matches!(tracker.status(second), DescriptionStatus::Ready(_)));
        assert_eq!(tracker.status(first), DescriptionStatus::Idle);
    }

    #[tokio::test]
    async fn test_cancel_drops_late_result() {
        let slow = LocalLore::with_latency(Duration::from_millis(10));
        let mut tracker = DescriptionTracker::new(Arc::new(slow), Handle::current());
        let enemy = new_entity_id();

        tracker.request(enemy, EnemyKind::Skeleton, 3);
        tracker.cancel();

        assert!(!settle(&mut tracker).await);
        assert_eq!(tracker.status(enemy), DescriptionStatus::Idle);
        assert!(!tracker.is_loading());
    }
}
