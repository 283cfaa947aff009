mod catalog;
mod config;
mod health;
mod logging;
mod slack;

use core::{net::SocketAddr, time::Duration};
use std::{io::IsTerminal as _, path::PathBuf, sync::Arc};

use anyhow::{Context as _, Result};
use clap::Parser;
use tokio::{sync::mpsc, task::JoinSet};
use tracing::{debug, info, warn};

use handler_core::{
    BotIdentity, Dispatcher, Handler, JoinHandler, Notifier, Responder, RetryPolicy, ThreadRandom,
};
use plugin_gerrit::{GerritPoller, JsonFileStore, MemoryStore, Store};
use plugin_gotime::GoTime;
use plugin_playground::Playground;

use crate::{
    catalog::Services,
    config::{BotConfig, load_config},
    logging::init_tracing,
    slack::{
        DryRun, InboundEvent, SlackApi, SlackFiles, SlackJoinResponder, SlackNotifier,
        SlackResponder, SocketMode,
    },
};

const EVENT_BUFFER: usize = 256;

/// Socket Mode reconnects. The changeset poller uses `RetryPolicy::default()`.
const RECONNECT: RetryPolicy = RetryPolicy {
    max_failures: 10,
    base_delay: Duration::from_secs(5),
    max_delay: Duration::from_secs(30),
};

#[derive(Parser, Debug)]
#[command(name = "gopher", version, about = "Gophers Slack community bot")]
struct Args {
    /// Bot user OAuth token (`xoxb-...`).
    #[arg(long, env = "GOPHERS_SLACK_BOT_TOKEN", hide_env_values = true)]
    bot_token: String,

    /// App-level token with `connections:write` for Socket Mode (`xapp-...`).
    #[arg(long, env = "GOPHERS_SLACK_APP_TOKEN", hide_env_values = true)]
    app_token: String,

    /// Name people use to address the bot.
    #[arg(long, env = "GOPHERS_SLACK_BOT_NAME", default_value = "gopher")]
    name: String,

    /// Log every reply instead of sending it.
    #[arg(short = 'd', long = "dev", env = "GOPHERS_SLACK_BOT_DEV_MODE")]
    dev: bool,

    /// YAML config with channels, aliases and notification targets.
    #[arg(long, env = "GOPHERS_CONFIG", default_value = "./config.yaml")]
    config: PathBuf,

    /// Serve `/healthz` on this address.
    #[arg(long, env = "HEALTH_ADDR")]
    health_addr: Option<SocketAddr>,

    #[arg(long, env = "GERRIT_POLL_SECS", default_value_t = 60)]
    gerrit_poll_secs: u64,

    #[arg(long, env = "GOTIME_POLL_SECS", default_value_t = 60)]
    gotime_poll_secs: u64,

    /// JSON file for crawled changesets. Kept in memory when unset.
    #[arg(long, env = "GOPHERS_STORE")]
    store: Option<PathBuf>,

    /// Version reported by `version` and the deploy announcement.
    #[arg(long, env = "BOT_VERSION", default_value = env!("CARGO_PKG_VERSION"))]
    bot_version: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    // Load .env if present so clap can pick up env vars.
    let _ = dotenvy::dotenv();
    let args = Args::parse();
    let config = load_config(&args.config)?;

    let http = reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(10))
        .timeout(Duration::from_secs(30))
        .build()
        .context("building HTTP client")?;
    let api = Arc::new(SlackApi::new(http.clone(), &args.bot_token, &args.app_token));

    let auth = api.auth_test().await.context("checking the bot token")?;
    info!(user_id = %auth.user_id, user = %auth.user, "Authenticated with Slack");
    let identity = BotIdentity::new(auth.user_id, args.name.as_str());

    print_mode_banner(args.dev, &identity);

    let store: Arc<dyn Store> = match &args.store {
        Some(path) => Arc::new(JsonFileStore::open(path).await?),
        None => {
            info!("No GOPHERS_STORE set, changesets are kept in memory");
            Arc::new(MemoryStore::new())
        }
    };

    let root = catalog::build(
        &config,
        Services {
            version: args.bot_version.clone(),
            playground: Playground::new(http.clone()),
            files: Arc::new(SlackFiles::new(Arc::clone(&api))),
            store: Arc::clone(&store),
            cl_public: config
                .cl_channel
                .as_deref()
                .map(|channel| notifier(&api, channel, args.dev)),
            random: Arc::new(ThreadRandom),
        },
    );
    info!(handlers = ?root.ids(), "Registered handlers");
    let dispatcher = Arc::new(
        Dispatcher::new(identity, Arc::new(root) as Arc<dyn Handler>)
            .with_join_handler(Arc::new(catalog::welcome(&config)) as Arc<dyn JoinHandler>),
    );

    let mut background = JoinSet::new();
    spawn_pollers(&args, &config, &api, &http, &store, &mut background).await?;
    if let Some(addr) = args.health_addr {
        background.spawn(health::serve(addr));
    }

    if let Some(operator) = &config.operator_channel {
        let text = format!("Deployed version: {}", args.bot_version);
        if !notifier(&api, operator, args.dev).notify(&text).await {
            warn!(channel = %operator, "Could not announce deployment");
        }
    }

    let (tx, mut rx) = mpsc::channel(EVENT_BUFFER);
    let mut socket = tokio::spawn(SocketMode::new(Arc::clone(&api), tx, RECONNECT).run());
    info!("Listening for Slack events… Press Ctrl+C to stop.");

    loop {
        tokio::select! {
            Some(event) = rx.recv() => handle_event(event, &dispatcher, &api, args.dev),
            res = &mut socket => {
                res.context("Socket Mode task panicked")??;
                info!("Socket Mode stopped");
                return Ok(());
            }
            Some(res) = background.join_next() => {
                res.context("background task panicked")??;
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down");
                socket.abort();
                background.abort_all();
                return Ok(());
            }
        }
    }
}

/// Posts to `channel`, or only logs in dev mode.
fn notifier(api: &Arc<SlackApi>, channel: &str, dev: bool) -> Arc<dyn Notifier> {
    if dev {
        Arc::new(DryRun::new(channel, ""))
    } else {
        Arc::new(SlackNotifier::new(Arc::clone(api), channel))
    }
}

/// Starts the changeset and livestream pollers that have a target channel.
/// A changeset poller that gives up ends the process through `background`.
async fn spawn_pollers(
    args: &Args,
    config: &BotConfig,
    api: &Arc<SlackApi>,
    http: &reqwest::Client,
    store: &Arc<dyn Store>,
    background: &mut JoinSet<Result<()>>,
) -> Result<()> {
    if let Some(channel) = &config.cl_private_channel {
        let poller = GerritPoller::new(
            Arc::clone(store),
            http.clone(),
            notifier(api, channel, args.dev),
        )
        .await?;
        let every = Duration::from_secs(args.gerrit_poll_secs);
        background.spawn(poller.run(every, RetryPolicy::default()));
        info!(channel = %channel, ?every, "Changeset poller started");
    } else {
        info!("No cl_private_channel configured, changeset poller disabled");
    }

    if let Some(channel) = &config.gotime_channel {
        let variance = time::Duration::minutes(config.gotime_start_variance_mins);
        let gotime = GoTime::new(http.clone(), variance, notifier(api, channel, args.dev));
        let every = Duration::from_secs(args.gotime_poll_secs);
        background.spawn(async move {
            gotime.run(every).await;
            Ok(())
        });
        info!(channel = %channel, ?every, "Livestream poller started");
    }
    Ok(())
}

fn handle_event(
    event: InboundEvent,
    dispatcher: &Arc<Dispatcher>,
    api: &Arc<SlackApi>,
    dev: bool,
) {
    let dispatcher = Arc::clone(dispatcher);
    let api = Arc::clone(api);
    match event {
        InboundEvent::Message(ev) => {
            tokio::spawn(async move {
                let responder: Box<dyn Responder> = if dev {
                    Box::new(DryRun::new(&ev.channel, &ev.user))
                } else {
                    Box::new(SlackResponder::new(api, &ev))
                };
                let outcome = dispatcher.dispatch(ev, responder.as_ref()).await;
                debug!(?outcome, "Message dispatched");
            });
        }
        InboundEvent::Join(ev) => {
            if dev {
                info!(user = %ev.user_name, "Dry run, not welcoming new member");
                return;
            }
            tokio::spawn(async move {
                let responder = SlackJoinResponder::new(api, &ev.user_id);
                if !dispatcher.dispatch_join(&ev, &responder).await {
                    warn!(user = %ev.user_id, "New member was not welcomed");
                }
            });
        }
    }
}

fn print_mode_banner(dev: bool, identity: &BotIdentity) {
    let is_tty = std::io::stderr().is_terminal()
        || std::env::var("FORCE_COLOR").is_ok_and(|v| !v.is_empty());
    let (title, sub, color) = if dev {
        (
            "DRY RUN MODE",
            format!("@{} logs replies instead of sending them", identity.alias()),
            "\x1b[1;33m", // bold yellow
        )
    } else {
        (
            "PRODUCTION MODE",
            format!("@{} ({}) replies in Slack", identity.alias(), identity.id()),
            "\x1b[1;32m", // bold green
        )
    };
    if is_tty {
        eprintln!(
            "{color}==============================\n  {title}\n  {sub}\n==============================\x1b[0m"
        );
    } else {
        eprintln!(
            "==============================\n  {title}\n  {sub}\n=============================="
        );
    }
    if dev {
        info!("Dry run mode: Slack writes disabled");
    } else {
        info!("Production mode: Slack writes enabled");
    }
}
