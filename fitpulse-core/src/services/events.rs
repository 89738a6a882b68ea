//! Post-commit activity notifications
//!
//! Writes that can unlock achievements (workouts, meals, weight check-ins)
//! publish an [`ActivityEvent`] after they commit. The write never waits
//! on, or fails because of, whatever listens.
//!
//! [`AchievementQueue`] is the standard listener: it forwards user ids over
//! an unbounded channel to an [`AchievementWorker`] task that runs the
//! evaluator off the caller's path.

use std::sync::{Arc, RwLock};

use serde::Serialize;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::domain::AchievementKind;
use crate::services::achievement::AchievementService;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActivityEvent {
    WorkoutLogged { user_id: Uuid, workout_id: Uuid },
    MealLogged { user_id: Uuid, meal_id: Uuid },
    WeightRecorded { user_id: Uuid },
}

impl ActivityEvent {
    pub fn user_id(&self) -> Uuid {
        match self {
            ActivityEvent::WorkoutLogged { user_id, .. }
            | ActivityEvent::MealLogged { user_id, .. }
            | ActivityEvent::WeightRecorded { user_id } => *user_id,
        }
    }
}

/// Receives events after the triggering write has committed
pub trait ActivityObserver: Send + Sync {
    fn on_committed(&self, event: &ActivityEvent);
}

/// Shared, swappable observer registration
///
/// Cloned into every service that publishes events, so attaching an
/// observer once covers all of them.
#[derive(Clone, Default)]
pub struct ObserverSlot {
    inner: Arc<RwLock<Option<Arc<dyn ActivityObserver>>>>,
}

impl ObserverSlot {
    pub fn set(&self, observer: Arc<dyn ActivityObserver>) {
        match self.inner.write() {
            Ok(mut slot) => *slot = Some(observer),
            Err(e) => tracing::warn!("observer slot poisoned, observer not attached: {}", e),
        }
    }

    /// Detach the observer, dropping the slot's reference to it
    pub fn clear(&self) {
        match self.inner.write() {
            Ok(mut slot) => *slot = None,
            Err(e) => tracing::warn!("observer slot poisoned, observer not cleared: {}", e),
        }
    }

    pub fn is_set(&self) -> bool {
        self.inner.read().map(|slot| slot.is_some()).unwrap_or(false)
    }

    pub fn notify(&self, event: ActivityEvent) {
        let observer = match self.inner.read() {
            Ok(slot) => slot.clone(),
            Err(e) => {
                tracing::warn!("observer slot poisoned, dropping {:?}: {}", event, e);
                return;
            }
        };
        if let Some(observer) = observer {
            observer.on_committed(&event);
        }
    }
}

/// Observer that queues achievement checks for an [`AchievementWorker`]
pub struct AchievementQueue {
    tx: UnboundedSender<Uuid>,
}

impl ActivityObserver for AchievementQueue {
    fn on_committed(&self, event: &ActivityEvent) {
        if self.tx.send(event.user_id()).is_err() {
            tracing::debug!(?event, "achievement worker gone, check skipped");
        }
    }
}

/// An achievement unlocked by the background worker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Unlock {
    pub user_id: Uuid,
    pub kind: AchievementKind,
}

/// Background task draining an [`AchievementQueue`]
pub struct AchievementWorker {
    handle: JoinHandle<Vec<Unlock>>,
}

impl AchievementWorker {
    /// Start the worker on the current tokio runtime
    ///
    /// The worker stops once every clone of the returned queue (including
    /// any registered in an [`ObserverSlot`]) is dropped.
    pub fn spawn(service: Arc<AchievementService>) -> (AchievementQueue, AchievementWorker) {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(run(service, rx));
        (AchievementQueue { tx }, AchievementWorker { handle })
    }

    /// Wait for the queue to drain and return every unlock it produced
    pub async fn finish(self) -> Vec<Unlock> {
        match self.handle.await {
            Ok(unlocks) => unlocks,
            Err(e) => {
                tracing::warn!("achievement worker failed: {}", e);
                Vec::new()
            }
        }
    }
}

async fn run(service: Arc<AchievementService>, mut rx: UnboundedReceiver<Uuid>) -> Vec<Unlock> {
    let mut unlocks = Vec::new();
    while let Some(user_id) = rx.recv().await {
        let service = Arc::clone(&service);
        // The evaluator does blocking DuckDB I/O
        match tokio::task::spawn_blocking(move || service.check_achievements(user_id)).await {
            Ok(kinds) => unlocks.extend(kinds.into_iter().map(|kind| Unlock { user_id, kind })),
            Err(e) => tracing::warn!(%user_id, "achievement check panicked: {}", e),
        }
    }
    unlocks
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<ActivityEvent>>,
    }

    impl ActivityObserver for Recorder {
        fn on_committed(&self, event: &ActivityEvent) {
            self.seen.lock().unwrap().push(*event);
        }
    }

    #[test]
    fn test_slot_notifies_until_cleared() {
        let slot = ObserverSlot::default();
        let recorder = Arc::new(Recorder::default());
        let user_id = Uuid::new_v4();

        slot.notify(ActivityEvent::WeightRecorded { user_id });
        slot.set(recorder.clone());
        assert!(slot.is_set());
        slot.notify(ActivityEvent::WeightRecorded { user_id });
        slot.clone().clear();
        assert!(!slot.is_set());
        slot.notify(ActivityEvent::WeightRecorded { user_id });

        assert_eq!(recorder.seen.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_event_user_id() {
        let user_id = Uuid::new_v4();
        let event = ActivityEvent::MealLogged {
            user_id,
            meal_id: Uuid::new_v4(),
        };
        assert_eq!(event.user_id(), user_id);
    }
}
