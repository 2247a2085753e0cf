use std::{collections::HashSet, sync::Arc, time::Duration};

use chrono::{TimeZone, Utc};
use console_core::{AppStore, ManualClock, StoreDeps, Timings, TokioLatency};
use shared::domain::{BannerId, BannerStatus, NewBanner, TargetingRule};

fn deps() -> StoreDeps {
    let start = Utc
        .with_ymd_and_hms(2025, 1, 20, 8, 0, 0)
        .single()
        .expect("valid timestamp");
    StoreDeps::new(
        Arc::new(ManualClock::new(start)),
        Arc::new(TokioLatency),
        Timings {
            action: Duration::from_millis(500),
            fetch: Duration::from_millis(300),
        },
    )
}

fn draft(title: &str) -> NewBanner {
    let start = Utc
        .with_ymd_and_hms(2025, 2, 1, 0, 0, 0)
        .single()
        .expect("valid timestamp");
    NewBanner {
        title: title.to_string(),
        image_url: "https://img.example.com/x.png".into(),
        link_url: "https://example.com/x".into(),
        start_time: start,
        end_time: start + chrono::Duration::days(1),
        targeting: TargetingRule::default(),
        weight: 0,
        status: BannerStatus::Draft,
        remark: None,
    }
}

#[tokio::test(start_paused = true)]
async fn loading_stays_set_until_the_last_overlapping_action_finishes() {
    let store = Arc::new(AppStore::seeded(deps()));

    let slow = tokio::spawn({
        let store = Arc::clone(&store);
        async move {
            store
                .batch_update_status(&[BannerId::from("b1")], BannerStatus::Offline)
                .await
        }
    });
    let fast = tokio::spawn({
        let store = Arc::clone(&store);
        async move { store.fetch_banners(None).await }
    });

    tokio::task::yield_now().await;
    assert!(store.is_loading());

    tokio::time::advance(Duration::from_millis(350)).await;
    let fetched = fast.await.expect("fetch task");
    assert_eq!(fetched.len(), 3);
    assert!(store.is_loading(), "status batch is still waiting");

    assert_eq!(slow.await.expect("batch task"), 1);
    assert!(!store.is_loading());
}

#[tokio::test(start_paused = true)]
async fn concurrent_adds_both_apply_with_distinct_ids() {
    let store = Arc::new(AppStore::seeded(deps()));

    let (first, second) = tokio::join!(
        store.add_banner(draft("first")),
        store.add_banner(draft("second"))
    );

    assert_ne!(first.id, second.id);
    let banners = store.banners().await;
    assert_eq!(banners.len(), 5);

    let front: HashSet<_> = banners[..2].iter().map(|b| b.title.as_str()).collect();
    assert_eq!(front, HashSet::from(["first", "second"]));
}

#[tokio::test(start_paused = true)]
async fn delete_racing_an_update_leaves_no_resurrected_record() {
    let store = Arc::new(AppStore::seeded(deps()));
    let id = BannerId::from("b2");

    let (updated, deleted) = tokio::join!(
        store.update_banner(&id, shared::domain::BannerPatch::weight(1)),
        store.delete_banner(&id)
    );

    assert!(deleted);
    // Whichever resumed first wins; the record is gone either way.
    if let Some(banner) = updated {
        assert_eq!(banner.weight, 1);
    }
    assert!(store.banner(&id).await.is_none());
}
