//! Application state store for the banner console.
//!
//! [`AppStore`] owns the signed-in user and the banner collection and is the
//! only place either is mutated. Every action suspends on the injected
//! [`Latency`] before touching state, mirroring a backend round trip, and the
//! state lock is never held across that suspension: overlapping actions each
//! apply against the state they find when they resume.

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use shared::{
    domain::{
        Banner, BannerFilter, BannerId, BannerPatch, BannerStatus, NewBanner, User, UserId,
        UNKNOWN_CREATOR,
    },
    protocol::StoreEvent,
};
use storage::{BannerTable, UserDirectory};
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info, warn};

mod clock;
mod latency;

pub use clock::{Clock, ManualClock, SystemClock};
pub use latency::{
    Latency, NoLatency, Timings, TokioLatency, DEFAULT_ACTION_LATENCY, DEFAULT_FETCH_LATENCY,
};

const EVENT_CAPACITY: usize = 256;

/// Injected seams of the store.
#[derive(Clone)]
pub struct StoreDeps {
    pub clock: Arc<dyn Clock>,
    pub latency: Arc<dyn Latency>,
    pub timings: Timings,
}

impl StoreDeps {
    pub fn new(clock: Arc<dyn Clock>, latency: Arc<dyn Latency>, timings: Timings) -> Self {
        Self {
            clock,
            latency,
            timings,
        }
    }

    /// Wall clock and real tokio sleeps.
    pub fn realtime(timings: Timings) -> Self {
        Self::new(Arc::new(SystemClock), Arc::new(TokioLatency), timings)
    }

    /// Given clock, no sleeping.
    pub fn immediate(clock: Arc<dyn Clock>) -> Self {
        Self::new(clock, Arc::new(NoLatency), Timings::default())
    }
}

#[derive(Debug, Clone, Default)]
pub struct StoreState {
    pub current_user: Option<User>,
    pub banners: BannerTable,
}

pub struct AppStore {
    state: RwLock<StoreState>,
    users: UserDirectory,
    in_flight: AtomicUsize,
    clock: Arc<dyn Clock>,
    latency: Arc<dyn Latency>,
    timings: Timings,
    events: broadcast::Sender<StoreEvent>,
}

/// Holds the loading flag up for the lifetime of one action.
struct LoadingGuard<'a> {
    store: &'a AppStore,
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        if self.store.in_flight.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.store.emit(StoreEvent::LoadingChanged { loading: false });
        }
    }
}

impl AppStore {
    pub fn new(deps: StoreDeps, users: UserDirectory, banners: BannerTable) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            state: RwLock::new(StoreState {
                current_user: None,
                banners,
            }),
            users,
            in_flight: AtomicUsize::new(0),
            clock: deps.clock,
            latency: deps.latency,
            timings: deps.timings,
            events,
        }
    }

    /// Store loaded with the mock accounts and banners, scheduled around the clock's now.
    pub fn seeded(deps: StoreDeps) -> Self {
        let banners = BannerTable::seeded(deps.clock.now());
        Self::new(deps, UserDirectory::seeded(), banners)
    }

    pub fn directory(&self) -> &UserDirectory {
        &self.users
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }

    pub async fn current_user(&self) -> Option<User> {
        self.state.read().await.current_user.clone()
    }

    pub async fn banners(&self) -> Vec<Banner> {
        self.state.read().await.banners.snapshot()
    }

    pub async fn banner(&self, id: &BannerId) -> Option<Banner> {
        self.state.read().await.banners.get(id).cloned()
    }

    /// Signs in by email. An unknown email signs in as the directory's
    /// default account instead of failing.
    pub async fn login(&self, email: &str) -> User {
        let _loading = self.begin_loading();
        self.latency.delay(self.timings.action).await;

        let user = match self.users.find_by_email(email) {
            Some(user) => user.clone(),
            None => {
                let fallback = self.users.default_user().clone();
                warn!(
                    email,
                    fallback = %fallback.email,
                    "login: unknown email, using default account"
                );
                fallback
            }
        };

        self.state.write().await.current_user = Some(user.clone());
        info!(user_id = %user.id, role = %user.role, "login: signed in");
        self.emit(StoreEvent::SessionChanged {
            user: Some(user.clone()),
        });
        user
    }

    /// Clears the session without a simulated delay. Banners are kept.
    pub async fn logout(&self) {
        let previous = self.state.write().await.current_user.take();
        if let Some(user) = previous {
            info!(user_id = %user.id, "logout: signed out");
        }
        self.emit(StoreEvent::SessionChanged { user: None });
    }

    /// Returns the stored banners narrowed by `filter`. Never mutates the collection.
    pub async fn fetch_banners(&self, filter: Option<&BannerFilter>) -> Vec<Banner> {
        let _loading = self.begin_loading();
        self.latency.delay(self.timings.fetch).await;

        let state = self.state.read().await;
        let banners = match filter {
            Some(filter) if !filter.is_empty() => state.banners.filtered(filter),
            _ => state.banners.snapshot(),
        };
        debug!(
            returned = banners.len(),
            stored = state.banners.len(),
            "fetch_banners"
        );
        banners
    }

    pub async fn add_banner(&self, new_banner: NewBanner) -> Banner {
        let _loading = self.begin_loading();
        self.latency.delay(self.timings.action).await;

        let banner = {
            let mut state = self.state.write().await;
            let now = self.clock.now();
            let id = state.banners.next_id(now);
            let created_by = state
                .current_user
                .as_ref()
                .map(|user| user.id.clone())
                .unwrap_or_else(|| UserId::from(UNKNOWN_CREATOR));
            let banner = new_banner.into_banner(id, created_by, now);
            state.banners.prepend(banner.clone());
            banner
        };

        info!(
            banner_id = %banner.id,
            created_by = %banner.created_by,
            status = %banner.status,
            "add_banner"
        );
        self.emit(StoreEvent::BannerCreated {
            banner: banner.clone(),
        });
        banner
    }

    /// Applies `patch` to the banner with `id`. `None` when no such banner exists.
    pub async fn update_banner(&self, id: &BannerId, patch: BannerPatch) -> Option<Banner> {
        let _loading = self.begin_loading();
        self.latency.delay(self.timings.action).await;

        let updated = {
            let mut state = self.state.write().await;
            let now = self.clock.now();
            state.banners.update(id, &patch, now)
        };

        match &updated {
            Some(banner) => {
                info!(banner_id = %id, updated_at = %banner.updated_at, "update_banner");
                self.emit(StoreEvent::BannerUpdated {
                    banner: banner.clone(),
                });
            }
            None => debug!(banner_id = %id, "update_banner: no such banner"),
        }
        updated
    }

    /// `false` when no banner had `id`.
    pub async fn delete_banner(&self, id: &BannerId) -> bool {
        let _loading = self.begin_loading();
        self.latency.delay(self.timings.action).await;

        let removed = self.state.write().await.banners.remove(id);
        match removed {
            Some(_) => {
                info!(banner_id = %id, "delete_banner");
                self.emit(StoreEvent::BannerDeleted { id: id.clone() });
                true
            }
            None => {
                debug!(banner_id = %id, "delete_banner: no such banner");
                false
            }
        }
    }

    /// Sets `status` on every listed banner; returns how many matched.
    pub async fn batch_update_status(&self, ids: &[BannerId], status: BannerStatus) -> usize {
        let _loading = self.begin_loading();
        self.latency.delay(self.timings.action).await;

        let touched = {
            let mut state = self.state.write().await;
            let now = self.clock.now();
            state.banners.set_status(ids, status, now)
        };

        info!(
            requested = ids.len(),
            matched = touched.len(),
            %status,
            "batch_update_status"
        );
        let count = touched.len();
        if count > 0 {
            self.emit(StoreEvent::StatusBatchApplied {
                ids: touched,
                status,
            });
        }
        count
    }

    fn begin_loading(&self) -> LoadingGuard<'_> {
        if self.in_flight.fetch_add(1, Ordering::SeqCst) == 0 {
            self.emit(StoreEvent::LoadingChanged { loading: true });
        }
        LoadingGuard { store: self }
    }

    fn emit(&self, event: StoreEvent) {
        let _ = self.events.send(event);
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
