use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// City code sentinel meaning "every region".
pub const ALL_CITIES: &str = "all";

/// Creator recorded when a banner is added without a signed-in user.
pub const UNKNOWN_CREATOR: &str = "unknown";

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }
    };
}

id_newtype!(UserId);
id_newtype!(BannerId);

/// Closed attribute domain with a wire value and a console display label.
macro_rules! labelled_enum {
    ($(#[$meta:meta])* $name:ident, $kind:literal { $($variant:ident => ($wire:literal, $label:literal)),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $wire),+
                }
            }

            pub fn label(self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ApiError;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                match value.trim() {
                    $($wire => Ok($name::$variant),)+
                    other => Err(ApiError::validation(format!(
                        "unknown {} '{other}'",
                        $kind
                    ))),
                }
            }
        }
    };
}

labelled_enum!(Role, "role" {
    SuperAdmin => ("super_admin", "超级管理员"),
    Operator => ("operator", "运营人员"),
    Auditor => ("auditor", "审核员"),
});

labelled_enum!(
    /// Homepage slot a banner is rendered into.
    BannerPosition, "position" {
    HomepageTop => ("homepage_top", "首页顶部"),
    HomepageMiddle => ("homepage_middle", "首页中部"),
    HomepageBottom => ("homepage_bottom", "首页底部"),
});

labelled_enum!(BannerChannel, "channel" {
    Android => ("android", "Android"),
    Ios => ("ios", "iOS"),
    H5 => ("h5", "H5"),
    All => ("all", "全部"),
});

labelled_enum!(UserType, "user type" {
    New => ("new", "新用户"),
    Old => ("old", "老用户"),
    All => ("all", "全部"),
});

labelled_enum!(LoginStatus, "login status" {
    LoggedIn => ("logged_in", "已登录"),
    NotLoggedIn => ("not_logged_in", "未登录"),
    All => ("all", "全部"),
});

labelled_enum!(
    /// Lifecycle stage. Any status may be set from any other.
    BannerStatus, "status" {
    Draft => ("draft", "草稿"),
    Pending => ("pending", "待审核"),
    Online => ("online", "已上线"),
    Offline => ("offline", "已下线"),
    Rejected => ("rejected", "已拒绝"),
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub name: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

/// Who may see a banner. `all` values act as wildcards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetingRule {
    pub position: BannerPosition,
    pub channel: BannerChannel,
    pub city_codes: Vec<String>,
    pub user_type: UserType,
    pub login_status: LoginStatus,
}

impl Default for TargetingRule {
    fn default() -> Self {
        Self {
            position: BannerPosition::HomepageTop,
            channel: BannerChannel::All,
            city_codes: vec![ALL_CITIES.to_string()],
            user_type: UserType::All,
            login_status: LoginStatus::All,
        }
    }
}

impl TargetingRule {
    /// Replaces an empty city list with the `all` sentinel.
    pub fn normalized(mut self) -> Self {
        self.city_codes.retain(|code| !code.trim().is_empty());
        if self.city_codes.is_empty() {
            self.city_codes.push(ALL_CITIES.to_string());
        }
        self
    }

    pub fn covers_all_cities(&self) -> bool {
        self.city_codes.iter().any(|code| code == ALL_CITIES)
    }

    pub fn matches(&self, audience: &Audience) -> bool {
        let channel = self.channel == BannerChannel::All
            || audience.channel == BannerChannel::All
            || self.channel == audience.channel;
        let user_type = self.user_type == UserType::All
            || audience.user_type == UserType::All
            || self.user_type == audience.user_type;
        let login_status = self.login_status == LoginStatus::All
            || audience.login_status == LoginStatus::All
            || self.login_status == audience.login_status;
        let city = self.covers_all_cities()
            || audience
                .city_code
                .as_deref()
                .is_some_and(|city| self.city_codes.iter().any(|code| code == city));

        channel && user_type && login_status && city
    }
}

/// Viewer attributes a targeting rule is evaluated against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Audience {
    pub channel: BannerChannel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city_code: Option<String>,
    pub user_type: UserType,
    pub login_status: LoginStatus,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Banner {
    pub id: BannerId,
    pub title: String,
    pub image_url: String,
    pub link_url: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[serde(flatten)]
    pub targeting: TargetingRule,
    pub weight: i32,
    pub status: BannerStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remark: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub created_by: UserId,
}

impl Banner {
    /// Display window is half-open: `[start_time, end_time)`.
    pub fn is_live_at(&self, at: DateTime<Utc>) -> bool {
        self.start_time <= at && at < self.end_time
    }

    /// Whether the display window intersects the given range; open bounds match anything.
    pub fn overlaps(&self, start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> bool {
        let before_end = end.map_or(true, |end| self.start_time <= end);
        let after_start = start.map_or(true, |start| self.end_time >= start);
        before_end && after_start
    }
}

/// Creation payload: everything except identity and audit stamps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBanner {
    pub title: String,
    pub image_url: String,
    pub link_url: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[serde(flatten)]
    pub targeting: TargetingRule,
    pub weight: i32,
    pub status: BannerStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remark: Option<String>,
}

impl NewBanner {
    pub fn into_banner(self, id: BannerId, created_by: UserId, now: DateTime<Utc>) -> Banner {
        Banner {
            id,
            title: self.title,
            image_url: self.image_url,
            link_url: self.link_url,
            start_time: self.start_time,
            end_time: self.end_time,
            targeting: self.targeting,
            weight: self.weight,
            status: self.status,
            remark: self.remark,
            created_at: now,
            updated_at: now,
            created_by,
        }
    }
}

/// Field-by-field partial update. `remark: Some(None)` clears the remark.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BannerPatch {
    pub title: Option<String>,
    pub image_url: Option<String>,
    pub link_url: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub position: Option<BannerPosition>,
    pub channel: Option<BannerChannel>,
    pub city_codes: Option<Vec<String>>,
    pub user_type: Option<UserType>,
    pub login_status: Option<LoginStatus>,
    pub weight: Option<i32>,
    pub status: Option<BannerStatus>,
    pub remark: Option<Option<String>>,
}

impl BannerPatch {
    pub fn weight(weight: i32) -> Self {
        Self {
            weight: Some(weight),
            ..Self::default()
        }
    }

    pub fn status(status: BannerStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Applies the present fields; audit stamps are the caller's concern.
    pub fn apply_to(&self, banner: &mut Banner) {
        if let Some(title) = &self.title {
            banner.title = title.clone();
        }
        if let Some(image_url) = &self.image_url {
            banner.image_url = image_url.clone();
        }
        if let Some(link_url) = &self.link_url {
            banner.link_url = link_url.clone();
        }
        if let Some(start_time) = self.start_time {
            banner.start_time = start_time;
        }
        if let Some(end_time) = self.end_time {
            banner.end_time = end_time;
        }
        if let Some(position) = self.position {
            banner.targeting.position = position;
        }
        if let Some(channel) = self.channel {
            banner.targeting.channel = channel;
        }
        if let Some(city_codes) = &self.city_codes {
            banner.targeting.city_codes = city_codes.clone();
        }
        if let Some(user_type) = self.user_type {
            banner.targeting.user_type = user_type;
        }
        if let Some(login_status) = self.login_status {
            banner.targeting.login_status = login_status;
        }
        if let Some(weight) = self.weight {
            banner.weight = weight;
        }
        if let Some(status) = self.status {
            banner.status = status;
        }
        if let Some(remark) = &self.remark {
            banner.remark = remark.clone();
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BannerFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keyword: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<BannerStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
}

impl BannerFilter {
    pub fn is_empty(&self) -> bool {
        self.keyword().is_none()
            && self.status.is_none()
            && self.start_time.is_none()
            && self.end_time.is_none()
    }

    fn keyword(&self) -> Option<&str> {
        self.keyword
            .as_deref()
            .map(str::trim)
            .filter(|keyword| !keyword.is_empty())
    }

    pub fn matches(&self, banner: &Banner) -> bool {
        if let Some(keyword) = self.keyword() {
            if !banner
                .title
                .to_lowercase()
                .contains(&keyword.to_lowercase())
            {
                return false;
            }
        }
        if self.status.is_some_and(|status| status != banner.status) {
            return false;
        }
        banner.overlaps(self.start_time, self.end_time)
    }
}
