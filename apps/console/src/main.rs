use std::{path::PathBuf, sync::Arc};

use anyhow::{bail, Result};
use chrono::{DateTime, Duration, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use console_api::{BannerForm, BannerListQuery, ConsoleContext, WeightOrder};
use console_core::{AppStore, Clock, StoreDeps};
use serde::Serialize;
use shared::domain::{
    Audience, BannerChannel, BannerFilter, BannerId, BannerPosition, BannerStatus, LoginStatus,
    UserType, ALL_CITIES,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;

use config::load_settings;

/// Banner console over the in-memory demo store. Every run starts from the seed data.
#[derive(Parser, Debug)]
#[command(name = "banner-console")]
struct Cli {
    /// TOML settings file; `console.toml` is read when present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Account to sign in as; defaults to the configured default email.
    #[arg(long, global = true)]
    email: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum SortArg {
    Asc,
    Desc,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Counts by status.
    Dashboard,
    List {
        #[arg(long)]
        keyword: Option<String>,
        #[arg(long)]
        status: Option<BannerStatus>,
        #[arg(long)]
        from: Option<DateTime<Utc>>,
        #[arg(long)]
        to: Option<DateTime<Utc>>,
        #[arg(long, value_enum)]
        sort: Option<SortArg>,
        #[arg(long, default_value_t = 1)]
        page: usize,
        #[arg(long)]
        page_size: Option<usize>,
    },
    Show {
        id: String,
    },
    /// Creates a draft banner.
    Create {
        #[arg(long)]
        title: String,
        #[arg(long)]
        link: String,
        #[arg(long)]
        image: Option<String>,
        #[arg(long, default_value = "homepage_top")]
        position: BannerPosition,
        #[arg(long, default_value = "all")]
        channel: BannerChannel,
        #[arg(long = "city")]
        cities: Vec<String>,
        #[arg(long, default_value = "all")]
        user_type: UserType,
        #[arg(long, default_value = "all")]
        login_status: LoginStatus,
        #[arg(long, default_value_t = 0)]
        weight: i32,
        #[arg(long)]
        remark: Option<String>,
        /// Defaults to now.
        #[arg(long)]
        start: Option<DateTime<Utc>>,
        /// Defaults to seven days after the start.
        #[arg(long)]
        end: Option<DateTime<Utc>>,
    },
    Online {
        #[arg(required = true)]
        ids: Vec<String>,
    },
    Offline {
        #[arg(required = true)]
        ids: Vec<String>,
    },
    Delete {
        id: String,
    },
    Weight {
        id: String,
        weight: i32,
    },
    /// Online banners by weight plus the fallback creative.
    Strategy,
    /// Shows what a viewer with the given attributes would see in a slot.
    Resolve {
        #[arg(long)]
        position: BannerPosition,
        #[arg(long, default_value = "all")]
        channel: BannerChannel,
        #[arg(long)]
        city: Option<String>,
        #[arg(long, default_value = "all")]
        user_type: UserType,
        #[arg(long, default_value = "all")]
        login_status: LoginStatus,
        #[arg(long)]
        at: Option<DateTime<Utc>>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = load_settings(cli.config.as_deref())?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.log_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let store = AppStore::seeded(StoreDeps::realtime(settings.timings()));
    let ctx = ConsoleContext::new(Arc::new(store), settings.view_settings());

    let email = cli.email.as_deref().unwrap_or(&settings.default_email);
    let user = console_api::sign_in(&ctx, email).await?;
    info!(user = %user.email, role = user.role.label(), "console session started");

    run(&ctx, cli.command).await
}

async fn run(ctx: &ConsoleContext, command: Command) -> Result<()> {
    match command {
        Command::Dashboard => print_json(&console_api::dashboard(ctx).await),
        Command::List {
            keyword,
            status,
            from,
            to,
            sort,
            page,
            page_size,
        } => {
            let query = BannerListQuery {
                filter: BannerFilter {
                    keyword,
                    status,
                    start_time: from,
                    end_time: to,
                },
                order: match sort {
                    None => WeightOrder::Stored,
                    Some(SortArg::Asc) => WeightOrder::Ascending,
                    Some(SortArg::Desc) => WeightOrder::Descending,
                },
                page,
                page_size,
            };
            print_json(&console_api::list_banners(ctx, &query).await)
        }
        Command::Show { id } => {
            print_json(&console_api::view_banner(ctx, &BannerId::new(id)).await?)
        }
        Command::Create {
            title,
            link,
            image,
            position,
            channel,
            cities,
            user_type,
            login_status,
            weight,
            remark,
            start,
            end,
        } => {
            let start = start.unwrap_or_else(|| ctx.store.clock().now());
            let end = end.unwrap_or(start + Duration::days(7));
            let form = BannerForm {
                title,
                position,
                image_url: image,
                link_url: link,
                time_range: Some((start, end)),
                channel,
                user_type,
                login_status,
                city_codes: if cities.is_empty() {
                    vec![ALL_CITIES.to_string()]
                } else {
                    cities
                },
                weight,
                remark,
            };
            print_json(&console_api::create_banner(ctx, &form).await?)
        }
        Command::Online { ids } => {
            let matched = console_api::set_online(ctx, &to_ids(ids)).await?;
            print_json(&serde_json::json!({ "matched": matched }))
        }
        Command::Offline { ids } => {
            let matched = console_api::set_offline(ctx, &to_ids(ids)).await?;
            print_json(&serde_json::json!({ "matched": matched }))
        }
        Command::Delete { id } => {
            let id = BannerId::new(id);
            if !console_api::remove_banner(ctx, &id).await {
                bail!("banner {id} not found");
            }
            print_json(&serde_json::json!({ "deleted": id }))
        }
        Command::Weight { id, weight } => {
            print_json(&console_api::set_weight(ctx, &BannerId::new(id), weight).await?)
        }
        Command::Strategy => print_json(&serde_json::json!({
            "fallback": console_api::fallback(ctx),
            "online": console_api::weighted_online(ctx).await,
        })),
        Command::Resolve {
            position,
            channel,
            city,
            user_type,
            login_status,
            at,
        } => {
            let audience = Audience {
                channel,
                city_code: city,
                user_type,
                login_status,
                at: at.unwrap_or_else(|| ctx.store.clock().now()),
            };
            print_json(&console_api::resolve_slot(ctx, position, &audience).await)
        }
    }
}

fn to_ids(ids: Vec<String>) -> Vec<BannerId> {
    ids.into_iter().map(BannerId::new).collect()
}

fn print_json(value: &impl Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
