//! Dashboard controller: owns the state, runs reducer effects on tokio.
//!
//! Every action is applied under the write lock and mirrored into the store
//! before its effects are spawned. Refill and insight tasks are tracked so
//! [`Controller::settle`] can wait for them; toast timers are tracked
//! separately and only aborted on [`Controller::shutdown`].

use async_trait::async_trait;
use gas_insight::{InsightProvider, fetch_tip};
use gas_persist::KvStore;
use gas_proto::{Toast, format_order_date, generate_order_id};
use gas_state::{Action, AppState, Effect, hydrate, mirror, reduce};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{RwLock, watch};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Asks the user to confirm a destructive action.
#[async_trait]
pub trait Confirm: Send + Sync {
    async fn confirm(&self, prompt: &str) -> bool;
}

/// A confirmation answered up front.
#[derive(Debug, Clone, Copy)]
pub struct FixedAnswer(pub bool);

#[async_trait]
impl Confirm for FixedAnswer {
    async fn confirm(&self, _prompt: &str) -> bool {
        self.0
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Timing {
    pub refill_delay: Duration,
    pub toast_ttl: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            refill_delay: Duration::from_secs(1),
            toast_ttl: Duration::from_secs(3),
        }
    }
}

struct Inner {
    state: AppState,
    store: Box<dyn KvStore>,
}

#[derive(Clone)]
pub struct Controller {
    inner: Arc<RwLock<Inner>>,
    provider: Arc<dyn InsightProvider>,
    timing: Timing,
    work: Arc<Mutex<JoinSet<()>>>,
    timers: Arc<Mutex<JoinSet<()>>>,
    toasts: Arc<watch::Sender<Option<Toast>>>,
}

impl Controller {
    /// Hydrate state from `store`. Nothing is fetched until [`Controller::resume`].
    pub fn new(store: Box<dyn KvStore>, provider: Arc<dyn InsightProvider>, timing: Timing) -> Self {
        let state = hydrate(store.as_ref());
        let (toasts, _) = watch::channel(None);
        Self {
            inner: Arc::new(RwLock::new(Inner { state, store })),
            provider,
            timing,
            work: Arc::new(Mutex::new(JoinSet::new())),
            timers: Arc::new(Mutex::new(JoinSet::new())),
            toasts: Arc::new(toasts),
        }
    }

    /// Startup hook: fetches an insight if the restored view is the dashboard.
    pub async fn resume(&self) {
        self.dispatch(Action::Resume).await;
    }

    pub async fn dispatch(&self, action: Action) {
        let effects = apply(&self.inner, &self.toasts, action).await;
        self.run_effects(effects);
    }

    pub async fn snapshot(&self) -> AppState {
        self.inner.read().await.state.clone()
    }

    /// Raw value currently held by the store.
    pub async fn stored(&self, key: &str) -> Option<String> {
        self.inner.read().await.store.get(key)
    }

    pub fn subscribe_toasts(&self) -> watch::Receiver<Option<Toast>> {
        self.toasts.subscribe()
    }

    pub async fn place_order(&self) -> String {
        let id = generate_order_id();
        self.dispatch(Action::PlaceOrder {
            id: id.clone(),
            date: format_order_date(chrono::Utc::now()),
        })
        .await;
        id
    }

    /// Two-step delete. Returns true when the order was removed; otherwise
    /// the list is left untouched.
    pub async fn delete_order(&self, id: &str, confirm: &dyn Confirm) -> bool {
        self.dispatch(Action::RequestDeleteOrder { id: id.to_string() })
            .await;
        let pending = self.inner.read().await.state.pending_deletion.clone();
        if pending.as_deref() != Some(id) {
            return false;
        }

        let id = id.to_string();
        if confirm.confirm(&format!("Clear order #{id}?")).await {
            self.dispatch(Action::ConfirmDelete { id: id.clone() }).await;
            // a newer request may have replaced the pending id meanwhile
            let guard = self.inner.read().await;
            !guard.state.orders.iter().any(|o| o.id == id)
        } else {
            self.dispatch(Action::CancelDelete { id }).await;
            false
        }
    }

    /// Wait for outstanding refill and insight tasks, including any they spawn.
    pub async fn settle(&self) {
        loop {
            let mut batch = std::mem::take(&mut *self.work.lock());
            if batch.is_empty() {
                return;
            }
            while let Some(res) = batch.join_next().await {
                if let Err(e) = res {
                    warn!(error = %e, "background task failed");
                }
            }
        }
    }

    /// Abort every outstanding task so nothing writes after teardown.
    pub fn shutdown(&self) {
        self.work.lock().abort_all();
        self.timers.lock().abort_all();
        debug!("controller shut down");
    }

    fn run_effects(&self, effects: Vec<Effect>) {
        reap(&self.work);
        reap(&self.timers);
        for effect in effects {
            match effect {
                Effect::StartRefill => {
                    let ctrl = self.clone();
                    let delay = self.timing.refill_delay;
                    self.work.lock().spawn(async move {
                        tokio::time::sleep(delay).await;
                        ctrl.dispatch_from_task(Action::RefillCompleted).await;
                    });
                }
                Effect::ScheduleToastDismiss { id } => {
                    let ctrl = self.clone();
                    let ttl = self.timing.toast_ttl;
                    self.timers.lock().spawn(async move {
                        tokio::time::sleep(ttl).await;
                        ctrl.dispatch_from_task(Action::DismissToast { id }).await;
                    });
                }
                Effect::FetchInsight { seq, level } => {
                    let ctrl = self.clone();
                    let provider = Arc::clone(&self.provider);
                    self.work.lock().spawn(async move {
                        debug!(seq, level, provider = provider.name(), "fetching insight");
                        let text = fetch_tip(provider.as_ref(), level).await;
                        ctrl.dispatch_from_task(Action::InsightResolved { seq, text })
                            .await;
                    });
                }
            }
        }
    }

    // Plain fn returning a boxed future so spawned tasks can re-enter the
    // controller without a recursive opaque type.
    fn dispatch_from_task(
        &self,
        action: Action,
    ) -> std::pin::Pin<Box<dyn std::future::Future<Output = ()> + Send + '_>> {
        Box::pin(async move {
            let effects = apply(&self.inner, &self.toasts, action).await;
            self.run_effects(effects);
        })
    }
}

/// Drop finished tasks so a long session does not accumulate them.
fn reap(set: &Mutex<JoinSet<()>>) {
    let mut set = set.lock();
    while let Some(res) = set.try_join_next() {
        if let Err(e) = res {
            if !e.is_cancelled() {
                warn!(error = %e, "background task failed");
            }
        }
    }
}

async fn apply(
    inner: &RwLock<Inner>,
    toasts: &watch::Sender<Option<Toast>>,
    action: Action,
) -> Vec<Effect> {
    let mut guard = inner.write().await;
    let Inner { state, store } = &mut *guard;
    let effects = reduce(state, action);
    mirror(state, store.as_mut());

    let current = state.toast.clone();
    toasts.send_if_modified(|shown| {
        if *shown == current {
            false
        } else {
            if let Some(t) = &current {
                info!(kind = ?t.kind, "{}", t.message);
            }
            *shown = current;
            true
        }
    });
    effects
}
