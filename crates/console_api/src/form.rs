use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::{
    domain::{
        Banner, BannerChannel, BannerPatch, BannerPosition, BannerStatus, LoginStatus, NewBanner,
        TargetingRule, UserType, ALL_CITIES,
    },
    error::ApiError,
};

pub const MIN_WEIGHT: i32 = 0;
pub const MAX_WEIGHT: i32 = 1000;

/// Input of the create/edit screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BannerForm {
    pub title: String,
    pub position: BannerPosition,
    #[serde(default)]
    pub image_url: Option<String>,
    pub link_url: String,
    #[serde(default)]
    pub time_range: Option<(DateTime<Utc>, DateTime<Utc>)>,
    pub channel: BannerChannel,
    pub user_type: UserType,
    pub login_status: LoginStatus,
    pub city_codes: Vec<String>,
    pub weight: i32,
    #[serde(default)]
    pub remark: Option<String>,
}

impl Default for BannerForm {
    fn default() -> Self {
        Self {
            title: String::new(),
            position: BannerPosition::HomepageTop,
            image_url: None,
            link_url: String::new(),
            time_range: None,
            channel: BannerChannel::All,
            user_type: UserType::All,
            login_status: LoginStatus::All,
            city_codes: vec![ALL_CITIES.to_string()],
            weight: 0,
            remark: None,
        }
    }
}

pub fn validate_weight(weight: i32) -> Result<i32, ApiError> {
    if !(MIN_WEIGHT..=MAX_WEIGHT).contains(&weight) {
        return Err(ApiError::validation(format!(
            "weight must be between {MIN_WEIGHT} and {MAX_WEIGHT}, got {weight}"
        )));
    }
    Ok(weight)
}

impl BannerForm {
    pub fn from_banner(banner: &Banner) -> Self {
        Self {
            title: banner.title.clone(),
            position: banner.targeting.position,
            image_url: Some(banner.image_url.clone()),
            link_url: banner.link_url.clone(),
            time_range: Some((banner.start_time, banner.end_time)),
            channel: banner.targeting.channel,
            user_type: banner.targeting.user_type,
            login_status: banner.targeting.login_status,
            city_codes: banner.targeting.city_codes.clone(),
            weight: banner.weight,
            remark: banner.remark.clone(),
        }
    }

    /// Checks required fields and returns the display window.
    pub fn validate(&self) -> Result<(DateTime<Utc>, DateTime<Utc>), ApiError> {
        if self.title.trim().is_empty() {
            return Err(ApiError::validation("title is required"));
        }
        if self.link_url.trim().is_empty() {
            return Err(ApiError::validation("link url is required"));
        }
        validate_weight(self.weight)?;
        let Some((start, end)) = self.time_range else {
            return Err(ApiError::validation("display time range is required"));
        };
        if start >= end {
            return Err(ApiError::validation(
                "display time range must start before it ends",
            ));
        }
        Ok((start, end))
    }

    pub fn targeting(&self) -> TargetingRule {
        TargetingRule {
            position: self.position,
            channel: self.channel,
            city_codes: self.city_codes.clone(),
            user_type: self.user_type,
            login_status: self.login_status,
        }
        .normalized()
    }

    fn image_url_or(&self, placeholder: &str) -> String {
        self.image_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .unwrap_or(placeholder)
            .to_string()
    }

    fn remark(&self) -> Option<String> {
        self.remark
            .as_deref()
            .map(str::trim)
            .filter(|remark| !remark.is_empty())
            .map(str::to_string)
    }

    /// New banners always start as drafts.
    pub fn to_new_banner(&self, placeholder_image_url: &str) -> Result<NewBanner, ApiError> {
        let (start_time, end_time) = self.validate()?;
        Ok(NewBanner {
            title: self.title.trim().to_string(),
            image_url: self.image_url_or(placeholder_image_url),
            link_url: self.link_url.trim().to_string(),
            start_time,
            end_time,
            targeting: self.targeting(),
            weight: self.weight,
            status: BannerStatus::Draft,
            remark: self.remark(),
        })
    }

    /// Full patch of every form field; status is left alone.
    pub fn to_patch(&self, placeholder_image_url: &str) -> Result<BannerPatch, ApiError> {
        let (start_time, end_time) = self.validate()?;
        let targeting = self.targeting();
        Ok(BannerPatch {
            title: Some(self.title.trim().to_string()),
            image_url: Some(self.image_url_or(placeholder_image_url)),
            link_url: Some(self.link_url.trim().to_string()),
            start_time: Some(start_time),
            end_time: Some(end_time),
            position: Some(targeting.position),
            channel: Some(targeting.channel),
            city_codes: Some(targeting.city_codes),
            user_type: Some(targeting.user_type),
            login_status: Some(targeting.login_status),
            weight: Some(self.weight),
            status: None,
            remark: Some(self.remark()),
        })
    }
}
