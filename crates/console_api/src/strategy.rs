//! Priority strategy: higher weight wins, and a fallback creative covers
//! viewers no targeting rule matches.

use shared::{
    domain::{Audience, Banner, BannerId, BannerPatch, BannerPosition, BannerStatus},
    error::ApiError,
    protocol::{FallbackCreative, SlotResolution},
};
use tracing::debug;

use crate::{form::validate_weight, ConsoleContext};

/// Online banners, heaviest first. Ties keep collection order.
pub async fn weighted_online(ctx: &ConsoleContext) -> Vec<Banner> {
    let mut online: Vec<Banner> = ctx
        .store
        .banners()
        .await
        .into_iter()
        .filter(|banner| banner.status == BannerStatus::Online)
        .collect();
    online.sort_by(|a, b| b.weight.cmp(&a.weight));
    online
}

pub async fn set_weight(
    ctx: &ConsoleContext,
    id: &BannerId,
    weight: i32,
) -> Result<Banner, ApiError> {
    validate_weight(weight)?;
    ctx.store
        .update_banner(id, BannerPatch::weight(weight))
        .await
        .ok_or_else(|| ApiError::not_found(format!("banner {id} not found")))
}

pub fn fallback(ctx: &ConsoleContext) -> FallbackCreative {
    FallbackCreative {
        image_url: ctx.settings.fallback_image_url.clone(),
        link_url: ctx.settings.fallback_link_url.clone(),
    }
}

/// What a viewer sees in `position`: matching live banners by weight, or the fallback.
pub async fn resolve_slot(
    ctx: &ConsoleContext,
    position: BannerPosition,
    audience: &Audience,
) -> SlotResolution {
    let banners: Vec<Banner> = weighted_online(ctx)
        .await
        .into_iter()
        .filter(|banner| banner.targeting.position == position)
        .filter(|banner| banner.is_live_at(audience.at))
        .filter(|banner| banner.targeting.matches(audience))
        .collect();

    debug!(
        position = position.as_str(),
        matched = banners.len(),
        "resolve_slot"
    );
    if banners.is_empty() {
        SlotResolution::Fallback {
            creative: fallback(ctx),
        }
    } else {
        SlotResolution::Banners { banners }
    }
}
