use std::sync::Arc;

use console_core::AppStore;
use serde::{Deserialize, Serialize};
use shared::{
    domain::{Banner, BannerFilter, BannerId, BannerStatus, User},
    error::ApiError,
    protocol::{BannerPage, DashboardSummary},
};
use tracing::info;

mod form;
mod strategy;

pub use form::{validate_weight, BannerForm, MAX_WEIGHT, MIN_WEIGHT};
pub use strategy::{fallback, resolve_slot, set_weight, weighted_online};

pub const DEFAULT_PAGE_SIZE: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewSettings {
    /// Reject emails that are not in the account directory instead of
    /// signing in as the default account.
    pub strict_login: bool,
    pub page_size: usize,
    pub placeholder_image_url: String,
    pub fallback_image_url: String,
    pub fallback_link_url: String,
}

impl Default for ViewSettings {
    fn default() -> Self {
        Self {
            strict_login: false,
            page_size: DEFAULT_PAGE_SIZE,
            placeholder_image_url: storage::placeholder_image_url(),
            fallback_image_url: storage::fallback_image_url(),
            fallback_link_url: "https://example.com".into(),
        }
    }
}

#[derive(Clone)]
pub struct ConsoleContext {
    pub store: Arc<AppStore>,
    pub settings: ViewSettings,
}

impl ConsoleContext {
    pub fn new(store: Arc<AppStore>, settings: ViewSettings) -> Self {
        Self { store, settings }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightOrder {
    /// Collection order, newest creations first.
    #[default]
    Stored,
    Ascending,
    Descending,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BannerListQuery {
    #[serde(default)]
    pub filter: BannerFilter,
    #[serde(default)]
    pub order: WeightOrder,
    /// 1-based; 0 is read as 1.
    #[serde(default)]
    pub page: usize,
    #[serde(default)]
    pub page_size: Option<usize>,
}

pub async fn sign_in(ctx: &ConsoleContext, email: &str) -> Result<User, ApiError> {
    if ctx.settings.strict_login && ctx.store.directory().find_by_email(email).is_none() {
        return Err(ApiError::unauthorized(format!("unknown account '{email}'")));
    }
    Ok(ctx.store.login(email).await)
}

pub async fn sign_out(ctx: &ConsoleContext) {
    ctx.store.logout().await;
}

pub async fn dashboard(ctx: &ConsoleContext) -> DashboardSummary {
    summarize(&ctx.store.banners().await)
}

pub fn summarize(banners: &[Banner]) -> DashboardSummary {
    let mut summary = DashboardSummary {
        total: banners.len(),
        ..DashboardSummary::default()
    };
    for banner in banners {
        match banner.status {
            BannerStatus::Online => summary.online += 1,
            BannerStatus::Pending => summary.pending += 1,
            BannerStatus::Offline => summary.offline += 1,
            BannerStatus::Draft => summary.draft += 1,
            BannerStatus::Rejected => summary.rejected += 1,
        }
    }
    summary
}

pub async fn list_banners(ctx: &ConsoleContext, query: &BannerListQuery) -> BannerPage {
    let mut banners = ctx.store.fetch_banners(Some(&query.filter)).await;
    match query.order {
        WeightOrder::Stored => {}
        WeightOrder::Ascending => banners.sort_by_key(|banner| banner.weight),
        WeightOrder::Descending => banners.sort_by(|a, b| b.weight.cmp(&a.weight)),
    }

    let page = query.page.max(1);
    let page_size = query
        .page_size
        .unwrap_or(ctx.settings.page_size)
        .max(1);
    let total = banners.len();
    let items = banners
        .into_iter()
        .skip((page - 1).saturating_mul(page_size))
        .take(page_size)
        .collect();

    BannerPage {
        items,
        total,
        page,
        page_size,
    }
}

pub async fn view_banner(ctx: &ConsoleContext, id: &BannerId) -> Result<Banner, ApiError> {
    ctx.store
        .banner(id)
        .await
        .ok_or_else(|| banner_not_found(id))
}

pub async fn edit_form(ctx: &ConsoleContext, id: &BannerId) -> Result<BannerForm, ApiError> {
    let banner = view_banner(ctx, id).await?;
    Ok(BannerForm::from_banner(&banner))
}

pub async fn create_banner(ctx: &ConsoleContext, form: &BannerForm) -> Result<Banner, ApiError> {
    let new_banner = form.to_new_banner(&ctx.settings.placeholder_image_url)?;
    Ok(ctx.store.add_banner(new_banner).await)
}

/// Looks the banner up before writing so a missing id surfaces as `NotFound`.
pub async fn save_banner(
    ctx: &ConsoleContext,
    id: &BannerId,
    form: &BannerForm,
) -> Result<Banner, ApiError> {
    view_banner(ctx, id).await?;
    let patch = form.to_patch(&ctx.settings.placeholder_image_url)?;
    ctx.store
        .update_banner(id, patch)
        .await
        .ok_or_else(|| banner_not_found(id))
}

pub async fn remove_banner(ctx: &ConsoleContext, id: &BannerId) -> bool {
    ctx.store.delete_banner(id).await
}

pub async fn set_status(
    ctx: &ConsoleContext,
    ids: &[BannerId],
    status: BannerStatus,
) -> Result<usize, ApiError> {
    if ids.is_empty() {
        return Err(ApiError::validation("no banners selected"));
    }
    let matched = ctx.store.batch_update_status(ids, status).await;
    info!(
        selected = ids.len(),
        matched,
        status = status.label(),
        "status change"
    );
    Ok(matched)
}

pub async fn set_online(ctx: &ConsoleContext, ids: &[BannerId]) -> Result<usize, ApiError> {
    set_status(ctx, ids, BannerStatus::Online).await
}

pub async fn set_offline(ctx: &ConsoleContext, ids: &[BannerId]) -> Result<usize, ApiError> {
    set_status(ctx, ids, BannerStatus::Offline).await
}

fn banner_not_found(id: &BannerId) -> ApiError {
    ApiError::not_found(format!("banner {id} not found"))
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};
    use console_core::{ManualClock, StoreDeps};
    use shared::{
        domain::{Role, UserId},
        error::ErrorCode,
    };

    use super::*;

    fn setup() -> ConsoleContext {
        setup_with(ViewSettings::default())
    }

    fn setup_with(settings: ViewSettings) -> ConsoleContext {
        let start = Utc
            .with_ymd_and_hms(2025, 1, 20, 8, 0, 0)
            .single()
            .expect("valid timestamp");
        let store = AppStore::seeded(StoreDeps::immediate(Arc::new(ManualClock::new(start))));
        ConsoleContext::new(Arc::new(store), settings)
    }

    fn form(title: &str) -> BannerForm {
        let start = Utc
            .with_ymd_and_hms(2025, 2, 1, 0, 0, 0)
            .single()
            .expect("valid timestamp");
        BannerForm {
            title: title.into(),
            link_url: "https://example.com/form".into(),
            time_range: Some((start, start + Duration::days(7))),
            ..BannerForm::default()
        }
    }

    #[tokio::test]
    async fn seed_dashboard_counts() {
        let ctx = setup();
        let summary = dashboard(&ctx).await;
        assert_eq!(summary.total, 3);
        assert_eq!(summary.online, 2);
        assert_eq!(summary.pending, 0);
        assert_eq!(summary.draft, 1);
    }

    #[tokio::test]
    async fn strict_login_rejects_unknown_email_without_touching_session() {
        let ctx = setup_with(ViewSettings {
            strict_login: true,
            ..ViewSettings::default()
        });
        let err = sign_in(&ctx, "nonexistent@x.com")
            .await
            .expect_err("should fail");
        assert_eq!(err.code, ErrorCode::Unauthorized);
        assert!(ctx.store.current_user().await.is_none());

        let user = sign_in(&ctx, "operator@example.com").await.expect("known");
        assert_eq!(user.role, Role::Operator);
    }

    #[tokio::test]
    async fn lenient_login_keeps_default_account_fallback() {
        let ctx = setup();
        let user = sign_in(&ctx, "nonexistent@x.com").await.expect("fallback");
        assert_eq!(user.id, UserId::from("u1"));
    }

    #[tokio::test]
    async fn list_sorts_by_weight_and_paginates() {
        let ctx = setup();
        let page = list_banners(
            &ctx,
            &BannerListQuery {
                order: WeightOrder::Ascending,
                page: 1,
                page_size: Some(2),
                ..BannerListQuery::default()
            },
        )
        .await;
        assert_eq!(page.total, 3);
        let weights: Vec<_> = page.items.iter().map(|b| b.weight).collect();
        assert_eq!(weights, vec![60, 80]);

        let second = list_banners(
            &ctx,
            &BannerListQuery {
                order: WeightOrder::Ascending,
                page: 2,
                page_size: Some(2),
                ..BannerListQuery::default()
            },
        )
        .await;
        assert_eq!(second.items.len(), 1);
        assert_eq!(second.items[0].weight, 100);

        let beyond = list_banners(
            &ctx,
            &BannerListQuery {
                page: 9,
                ..BannerListQuery::default()
            },
        )
        .await;
        assert!(beyond.items.is_empty());
        assert_eq!(beyond.page_size, DEFAULT_PAGE_SIZE);
    }

    #[tokio::test]
    async fn list_applies_status_filter() {
        let ctx = setup();
        let page = list_banners(
            &ctx,
            &BannerListQuery {
                filter: BannerFilter {
                    status: Some(BannerStatus::Online),
                    ..BannerFilter::default()
                },
                order: WeightOrder::Descending,
                ..BannerListQuery::default()
            },
        )
        .await;
        let ids: Vec<_> = page.items.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, vec!["b1", "b2"]);
        assert_eq!(page.total, 2);
        assert_eq!(page.page, 1);
    }

    #[tokio::test]
    async fn create_banner_records_signed_in_creator_as_draft() {
        let ctx = setup();
        sign_in(&ctx, "operator@example.com").await.expect("login");

        let banner = create_banner(&ctx, &form("会员日")).await.expect("created");
        assert_eq!(banner.status, BannerStatus::Draft);
        assert_eq!(banner.created_by, UserId::from("u2"));
        assert_eq!(ctx.store.banners().await[0].id, banner.id);
    }

    #[tokio::test]
    async fn invalid_form_does_not_reach_the_store() {
        let ctx = setup();
        let err = create_banner(&ctx, &form(""))
            .await
            .expect_err("should fail");
        assert_eq!(err.code, ErrorCode::Validation);
        assert_eq!(ctx.store.banners().await.len(), 3);
    }

    #[tokio::test]
    async fn editing_missing_banner_is_not_found() {
        let ctx = setup();
        let missing = BannerId::from("b404");
        assert_eq!(
            edit_form(&ctx, &missing).await.unwrap_err().code,
            ErrorCode::NotFound
        );
        assert_eq!(
            save_banner(&ctx, &missing, &form("x"))
                .await
                .unwrap_err()
                .code,
            ErrorCode::NotFound
        );
    }

    #[tokio::test]
    async fn edit_round_trip_keeps_status_and_updates_fields() {
        let ctx = setup();
        let id = BannerId::from("b1");
        let mut loaded = edit_form(&ctx, &id).await.expect("b1 form");
        loaded.title = "春节大促活动（加推）".into();
        loaded.weight = 120;

        let saved = save_banner(&ctx, &id, &loaded).await.expect("saved");
        assert_eq!(saved.title, "春节大促活动（加推）");
        assert_eq!(saved.weight, 120);
        assert_eq!(saved.status, BannerStatus::Online);
        assert_eq!(saved.remark.as_deref(), Some("春节主会场Banner"));
    }

    #[tokio::test]
    async fn status_toggles_require_a_selection() {
        let ctx = setup();
        assert_eq!(
            set_online(&ctx, &[]).await.unwrap_err().code,
            ErrorCode::Validation
        );

        let matched = set_online(&ctx, &[BannerId::from("b3")])
            .await
            .expect("online");
        assert_eq!(matched, 1);
        assert_eq!(dashboard(&ctx).await.online, 3);

        set_offline(&ctx, &[BannerId::from("b1"), BannerId::from("b2")])
            .await
            .expect("offline");
        let summary = dashboard(&ctx).await;
        assert_eq!((summary.online, summary.offline), (1, 2));
    }

    #[tokio::test]
    async fn remove_reports_whether_anything_was_deleted() {
        let ctx = setup();
        assert!(remove_banner(&ctx, &BannerId::from("b2")).await);
        assert!(!remove_banner(&ctx, &BannerId::from("b2")).await);
        assert_eq!(dashboard(&ctx).await.total, 2);
    }

    #[test]
    fn list_query_deserializes_with_defaults() {
        let query: BannerListQuery =
            serde_json::from_str(r#"{"filter":{"keyword":"春节"},"order":"descending"}"#)
                .expect("query");
        assert_eq!(query.order, WeightOrder::Descending);
        assert_eq!(query.filter.keyword.as_deref(), Some("春节"));
        assert_eq!(query.page, 0);
        assert_eq!(query.page_size, None);
    }
}
