use chrono::{DateTime, Duration, Utc};
use shared::domain::{Banner, BannerFilter, BannerId, BannerPatch, BannerStatus, User};
use tracing::debug;

pub mod seed;

pub use seed::{fallback_image_url, placeholder_image_url, seed_banners, seed_users};

/// Known console accounts. Never empty, so a login always has a default.
#[derive(Debug, Clone)]
pub struct UserDirectory {
    users: Vec<User>,
}

impl UserDirectory {
    pub fn new(users: Vec<User>) -> Option<Self> {
        if users.is_empty() {
            return None;
        }
        Some(Self { users })
    }

    pub fn seeded() -> Self {
        Self {
            users: seed_users(),
        }
    }

    pub fn users(&self) -> &[User] {
        &self.users
    }

    pub fn find_by_email(&self, email: &str) -> Option<&User> {
        let email = email.trim();
        self.users.iter().find(|user| user.email == email)
    }

    /// First account in the directory; unknown logins resolve to it.
    pub fn default_user(&self) -> &User {
        &self.users[0]
    }
}

/// Ordered in-memory banner collection. Newest creations sit at the front.
#[derive(Debug, Clone, Default)]
pub struct BannerTable {
    rows: Vec<Banner>,
}

impl BannerTable {
    pub fn new(rows: Vec<Banner>) -> Self {
        Self { rows }
    }

    pub fn seeded(now: DateTime<Utc>) -> Self {
        Self::new(seed_banners(now))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Banner> {
        self.rows.iter()
    }

    pub fn snapshot(&self) -> Vec<Banner> {
        self.rows.clone()
    }

    pub fn get(&self, id: &BannerId) -> Option<&Banner> {
        self.rows.iter().find(|banner| &banner.id == id)
    }

    pub fn contains(&self, id: &BannerId) -> bool {
        self.get(id).is_some()
    }

    pub fn filtered(&self, filter: &BannerFilter) -> Vec<Banner> {
        self.rows
            .iter()
            .filter(|banner| filter.matches(banner))
            .cloned()
            .collect()
    }

    /// `b<unix-millis>`, bumped forward until no existing row uses it.
    pub fn next_id(&self, now: DateTime<Utc>) -> BannerId {
        let mut millis = now.timestamp_millis();
        loop {
            let candidate = BannerId(format!("b{millis}"));
            if !self.contains(&candidate) {
                return candidate;
            }
            millis += 1;
        }
    }

    pub fn prepend(&mut self, banner: Banner) {
        self.rows.insert(0, banner);
    }

    pub fn update(
        &mut self,
        id: &BannerId,
        patch: &BannerPatch,
        now: DateTime<Utc>,
    ) -> Option<Banner> {
        let banner = self.rows.iter_mut().find(|banner| &banner.id == id)?;
        patch.apply_to(banner);
        banner.updated_at = refreshed_stamp(banner.updated_at, now);
        Some(banner.clone())
    }

    pub fn remove(&mut self, id: &BannerId) -> Option<Banner> {
        let index = self.rows.iter().position(|banner| &banner.id == id)?;
        Some(self.rows.remove(index))
    }

    /// Returns the ids that were touched, in collection order.
    pub fn set_status(
        &mut self,
        ids: &[BannerId],
        status: BannerStatus,
        now: DateTime<Utc>,
    ) -> Vec<BannerId> {
        let mut touched = Vec::new();
        for banner in self.rows.iter_mut().filter(|banner| ids.contains(&banner.id)) {
            banner.status = status;
            banner.updated_at = refreshed_stamp(banner.updated_at, now);
            touched.push(banner.id.clone());
        }
        if touched.len() < ids.len() {
            debug!(
                requested = ids.len(),
                matched = touched.len(),
                "status batch ignored unknown ids"
            );
        }
        touched
    }
}

/// Keeps `updated_at` strictly increasing even when the clock has not moved.
pub fn refreshed_stamp(previous: DateTime<Utc>, now: DateTime<Utc>) -> DateTime<Utc> {
    if now > previous {
        now
    } else {
        previous + Duration::milliseconds(1)
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
