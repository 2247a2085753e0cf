//! Static mock records the console starts from.

use chrono::{DateTime, Duration, Utc};
use shared::domain::{
    Banner, BannerChannel, BannerId, BannerPosition, BannerStatus, LoginStatus, Role,
    TargetingRule, User, UserId, UserType, ALL_CITIES,
};

const IMAGE_ENDPOINT: &str = "https://coreva-normal.trae.ai/api/ide/v1/text_to_image";

fn generated_image(prompt: &str) -> String {
    format!("{IMAGE_ENDPOINT}?prompt={prompt}&image_size=landscape_16_9")
}

pub fn seed_users() -> Vec<User> {
    vec![
        User {
            id: UserId::from("u1"),
            email: "admin@example.com".into(),
            name: "超级管理员".into(),
            role: Role::SuperAdmin,
            avatar: Some("https://api.dicebear.com/7.x/avataaars/svg?seed=admin".into()),
        },
        User {
            id: UserId::from("u2"),
            email: "operator@example.com".into(),
            name: "运营人员".into(),
            role: Role::Operator,
            avatar: Some("https://api.dicebear.com/7.x/avataaars/svg?seed=operator".into()),
        },
    ]
}

/// Seed banners with schedules relative to `now`.
pub fn seed_banners(now: DateTime<Utc>) -> Vec<Banner> {
    let operator = UserId::from("u2");
    vec![
        Banner {
            id: BannerId::from("b1"),
            title: "春节大促活动".into(),
            image_url: generated_image(
                "Chinese%20New%20Year%20promotion%20banner%2C%20red%20and%20gold%20theme%2C%20festive%20atmosphere",
            ),
            link_url: "https://example.com/cny2025".into(),
            start_time: now + Duration::days(1),
            end_time: now + Duration::days(15),
            targeting: TargetingRule {
                position: BannerPosition::HomepageTop,
                channel: BannerChannel::All,
                city_codes: vec![ALL_CITIES.into()],
                user_type: UserType::All,
                login_status: LoginStatus::All,
            },
            weight: 100,
            status: BannerStatus::Online,
            remark: Some("春节主会场Banner".into()),
            created_at: now - Duration::days(2),
            updated_at: now - Duration::days(1),
            created_by: operator.clone(),
        },
        Banner {
            id: BannerId::from("b2"),
            title: "新人注册礼包".into(),
            image_url: generated_image(
                "New%20user%20gift%20package%20banner%2C%20gift%20box%20illustration%2C%20bright%20colors",
            ),
            link_url: "https://example.com/newuser".into(),
            start_time: now - Duration::days(5),
            end_time: now + Duration::days(25),
            targeting: TargetingRule {
                position: BannerPosition::HomepageMiddle,
                channel: BannerChannel::Android,
                city_codes: vec![ALL_CITIES.into()],
                user_type: UserType::New,
                login_status: LoginStatus::NotLoggedIn,
            },
            weight: 80,
            status: BannerStatus::Online,
            remark: Some("针对安卓新用户的引导".into()),
            created_at: now - Duration::days(5),
            updated_at: now - Duration::days(5),
            created_by: operator.clone(),
        },
        Banner {
            id: BannerId::from("b3"),
            title: "周末限时折扣".into(),
            image_url: generated_image(
                "Weekend%20flash%20sale%20banner%2C%20shopping%20cart%20and%20discount%20tags%2C%20modern%20style",
            ),
            link_url: "https://example.com/weekend".into(),
            start_time: now + Duration::days(5),
            end_time: now + Duration::days(7),
            targeting: TargetingRule {
                position: BannerPosition::HomepageTop,
                channel: BannerChannel::All,
                city_codes: vec!["110000".into(), "310000".into()],
                user_type: UserType::Old,
                login_status: LoginStatus::LoggedIn,
            },
            weight: 60,
            status: BannerStatus::Draft,
            remark: Some("周末活动待审核".into()),
            created_at: now,
            updated_at: now,
            created_by: operator,
        },
    ]
}

/// Image used by the edit form when no creative was uploaded.
pub fn placeholder_image_url() -> String {
    "https://via.placeholder.com/800x400".into()
}

/// Default creative for the strategy screen.
pub fn fallback_image_url() -> String {
    generated_image("Default%20fallback%20banner%2C%20simple%20brand%20logo%2C%20minimalist")
}
