use serde::{Deserialize, Serialize};

use crate::domain::{Banner, BannerId, BannerStatus, User};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub total: usize,
    pub online: usize,
    pub pending: usize,
    pub offline: usize,
    pub draft: usize,
    pub rejected: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BannerPage {
    pub items: Vec<Banner>,
    pub total: usize,
    pub page: usize,
    pub page_size: usize,
}

/// Creative shown when no banner's targeting rule matches the viewer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FallbackCreative {
    pub image_url: String,
    pub link_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum SlotResolution {
    Banners { banners: Vec<Banner> },
    Fallback { creative: FallbackCreative },
}

/// Change notifications broadcast by the application store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum StoreEvent {
    SessionChanged {
        #[serde(default)]
        user: Option<User>,
    },
    LoadingChanged {
        loading: bool,
    },
    BannerCreated {
        banner: Banner,
    },
    BannerUpdated {
        banner: Banner,
    },
    BannerDeleted {
        id: BannerId,
    },
    StatusBatchApplied {
        ids: Vec<BannerId>,
        status: BannerStatus,
    },
}
