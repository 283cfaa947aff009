use std::sync::Arc;

use tracing::{info, warn};

use handler_core::{Handler, Linear, Notifier, RandomSource, WhenDirected, WithProbability};
use plugin_gerrit::{ShareChangeset, Store};
use plugin_links::{LinkToGoDoc, SearchForLibrary, Songs, Xkcd, xkcd::default_aliases};
use plugin_playground::{FileFetcher, Playground, SuggestPlayground};
use plugin_responses::{
    BotStack, BotVersion, CannedResponses, CoinFlip, NewbieResources, React, RecommendedChannels,
    Respond, Welcome,
};

use crate::config::BotConfig;

const UNFLIPPED_TABLE: &str = "┬─┬ノ( º _ ºノ)";

/// Reactions to anything said anywhere, directed or not.
const REACTIONS: &[(&str, &[&str])] = &[
    ("my adorable little gophers", &["gopher"]),
    ("bbq", &["bbqgopher"]),
    ("buffalo", &["gobuffalo"]),
    ("gobuffalo", &["gobuffalo"]),
    ("ghost", &["ghost"]),
    ("ermergerd", &["dragon"]),
    ("ermahgerd", &["dragon"]),
    ("dragon", &["dragon"]),
    ("spacex", &["rocket"]),
    ("beer me", &["beer", "beers"]),
];

/// Occasional editor-war reactions.
const RARE_REACTIONS: &[(&str, &str)] = &[("emacs", "vim"), ("vim", "emacs")];

/// Reactions to messages addressed to the bot.
const DIRECTED_REACTIONS: &[(&str, &[&str])] = &[
    ("thank", &["gopher"]),
    ("cheers", &["gopher"]),
    ("hello", &["gopher"]),
];

/// Collaborators the catalog wires into handlers.
pub(crate) struct Services {
    pub(crate) version: String,
    pub(crate) playground: Playground,
    pub(crate) files: Arc<dyn FileFetcher>,
    pub(crate) store: Arc<dyn Store>,
    /// Where `share cl` posts. Without it the command is not registered.
    pub(crate) cl_public: Option<Arc<dyn Notifier>>,
    pub(crate) random: Arc<dyn RandomSource>,
}

impl core::fmt::Debug for Services {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Services")
            .field("version", &self.version)
            .field("playground", &self.playground)
            .field("random", &self.random)
            .finish_non_exhaustive()
    }
}

/// Builds the root handler. Every child sees every message, in the order
/// registered here.
pub(crate) fn build(config: &BotConfig, services: Services) -> Linear {
    let mut root = Linear::new()
        .with(Songs)
        .with(Respond::when_contains(["︵", "彡"], UNFLIPPED_TABLE));

    for (trigger, reactions) in REACTIONS {
        root = root.with(React::when_contains(trigger, reactions.iter().copied()));
    }
    for (trigger, reaction) in RARE_REACTIONS {
        root = root.with(
            WithProbability::new(React::when_contains(trigger, [*reaction]))
                .odds(config.probability)
                .source(Arc::clone(&services.random)),
        );
    }

    root = root
        .with(LinkToGoDoc::github())
        .with(LinkToGoDoc::stdlib())
        .with(SuggestPlayground::new(services.playground, services.files));

    let directed = directed(
        config,
        &services.version,
        services.store,
        services.cl_public,
        services.random,
    );
    root.with(WhenDirected::new(directed))
}

fn directed(
    config: &BotConfig,
    version: &str,
    store: Arc<dyn Store>,
    cl_public: Option<Arc<dyn Notifier>>,
    random: Arc<dyn RandomSource>,
) -> Linear {
    let mut aliases = default_aliases();
    aliases.extend(
        config
            .xkcd_aliases
            .iter()
            .map(|(name, id)| (name.clone(), *id)),
    );

    let mut handlers = Linear::new()
        .with(BotVersion::new(version))
        .with(CoinFlip::new(random))
        .with(BotStack::from_env())
        .with(RecommendedChannels::new(&config.channels))
        .with(NewbieResources::public())
        .with(NewbieResources::private())
        .with(CannedResponses::builtin());

    for (trigger, reactions) in DIRECTED_REACTIONS {
        handlers = handlers.with(React::when_mentions(trigger, reactions.iter().copied()));
    }

    handlers = handlers
        .with(React::when_has_prefix("wave", ["wave", "gopher"]))
        .with(Xkcd::new(aliases))
        .with(SearchForLibrary::default());

    if let Some(public) = cl_public {
        let mut share = ShareChangeset::new(store, public).admins(config.admins.iter().cloned());
        if let Some(private) = &config.cl_private_channel {
            share = share.private_channel(private.as_str());
        }
        handlers.push(Arc::new(share) as Arc<dyn Handler>);
    } else {
        warn!("No cl_channel configured, `share cl` is disabled");
    }

    handlers
}

/// The team join handler.
pub(crate) fn welcome(config: &BotConfig) -> Welcome {
    let count = config.channels.iter().filter(|c| c.welcome).count();
    info!(channels = count, "Welcome message ready");
    Welcome::new(&config.channels)
}

#[cfg(test)]
mod tests {
    use handler_core::{
        Dispatcher, Outcome, SeededRandom,
        testing::{
            Action, RecordingNotifier, RecordingResponder, direct_message, event, identity, message,
        },
    };
    use plugin_gerrit::MemoryStore;
    use plugin_playground::{FileInfo, client::LINK_PREFIX};

    use super::*;

    /// Every draw lands on the same number.
    #[derive(Debug)]
    struct Fixed(u32);

    impl RandomSource for Fixed {
        fn below(&self, _upper: u32) -> u32 {
            self.0
        }
    }

    #[derive(Debug)]
    struct NoFiles;

    #[async_trait::async_trait]
    impl FileFetcher for NoFiles {
        async fn file_info(&self, id: &str) -> anyhow::Result<FileInfo> {
            anyhow::bail!("no file {id}")
        }

        async fn download(&self, _info: &FileInfo) -> anyhow::Result<Vec<u8>> {
            anyhow::bail!("no downloads")
        }
    }

    fn services(random: Arc<dyn RandomSource>, cl_public: Option<Arc<dyn Notifier>>) -> Services {
        Services {
            version: "1.2.3".to_owned(),
            playground: Playground::with_endpoint(
                reqwest::Client::new(),
                "http://127.0.0.1:9/share",
                LINK_PREFIX,
            ),
            files: Arc::new(NoFiles),
            store: Arc::new(MemoryStore::new()),
            cl_public,
            random,
        }
    }

    fn catalog() -> Linear {
        build(&BotConfig::default(), services(Arc::new(SeededRandom::new(1)), None))
    }

    async fn run(root: &Linear, msg: &handler_core::Message) -> Vec<Action> {
        let responder = RecordingResponder::new();
        root.handle(msg, &responder).await.unwrap();
        responder.actions()
    }

    #[tokio::test]
    async fn directed_version() {
        let root = catalog();
        assert_eq!(
            run(&root, &message("gopher version")).await,
            vec![Action::Respond("My version is: 1.2.3".to_owned())]
        );
        assert!(run(&root, &message("version")).await.is_empty());
        assert_eq!(run(&root, &direct_message("version")).await.len(), 1);
    }

    #[tokio::test]
    async fn ungated_reactions_fire_anywhere() {
        let root = catalog();
        assert_eq!(
            run(&root, &message("bbq on saturday?")).await,
            vec![Action::React("bbqgopher".to_owned())]
        );
        assert_eq!(
            run(&root, &message("beer me")).await,
            vec![
                Action::React("beer".to_owned()),
                Action::React("beers".to_owned()),
            ]
        );
        assert_eq!(
            run(&root, &message("(╯°□°）╯︵ ┻━┻")).await,
            vec![Action::Respond(UNFLIPPED_TABLE.to_owned())]
        );
    }

    #[tokio::test]
    async fn directed_reactions_need_the_address() {
        let root = catalog();
        assert_eq!(
            run(&root, &message("gopher thanks!")).await,
            vec![Action::React("gopher".to_owned())]
        );
        assert_eq!(
            run(&root, &message("gopher wave")).await,
            vec![
                Action::React("wave".to_owned()),
                Action::React("gopher".to_owned()),
            ]
        );
        assert!(run(&root, &message("thanks everyone")).await.is_empty());
    }

    #[tokio::test]
    async fn editor_war_reactions_follow_the_odds() {
        let hit = build(&BotConfig::default(), services(Arc::new(Fixed(0x2A)), None));
        let miss = build(&BotConfig::default(), services(Arc::new(Fixed(0)), None));

        assert_eq!(
            run(&hit, &message("emacs is great")).await,
            vec![Action::React("vim".to_owned())]
        );
        assert!(run(&miss, &message("emacs is great")).await.is_empty());
    }

    #[tokio::test]
    async fn links() {
        let root = catalog();
        assert_eq!(
            run(&root, &message("d/net/http")).await,
            vec![Action::Respond("<https://godoc.org/net/http>".to_owned())]
        );
        assert_eq!(
            run(&root, &message("gopher xkcd:standards")).await,
            vec![Action::Unfurled("<https://xkcd.com/927/>".to_owned())]
        );
    }

    #[tokio::test]
    async fn configured_xkcd_aliases_extend_the_builtin_ones() {
        let mut config = BotConfig::default();
        config.xkcd_aliases.insert("sandwich".to_owned(), 149);
        let root = build(&config, services(Arc::new(SeededRandom::new(1)), None));

        assert_eq!(
            run(&root, &message("gopher xkcd:sandwich")).await,
            vec![Action::Unfurled("<https://xkcd.com/149/>".to_owned())]
        );
        assert_eq!(
            run(&root, &message("gopher xkcd:compiling")).await,
            vec![Action::Unfurled("<https://xkcd.com/303/>".to_owned())]
        );
    }

    #[tokio::test]
    async fn share_cl_only_with_a_public_channel() {
        let without = catalog();
        assert!(run(&without, &message("gopher share cl 1")).await.is_empty());

        let public = Arc::new(RecordingNotifier::new(true));
        let with = build(
            &BotConfig::default(),
            services(Arc::new(SeededRandom::new(1)), Some(public as Arc<dyn Notifier>)),
        );
        assert_eq!(
            run(&with, &message("gopher share cl 1")).await,
            vec![Action::Private("You are not authorized to share CLs".to_owned())]
        );
    }

    #[tokio::test]
    async fn dispatcher_drops_bot_messages() {
        let dispatcher = Dispatcher::new(identity(), Arc::new(catalog()));
        let responder = RecordingResponder::new();
        let mut ev = event("bbq", "C0GENERAL");
        ev.bot_id = Some("B01".to_owned());

        assert_eq!(dispatcher.dispatch(ev, &responder).await, Outcome::Dropped);
        assert!(responder.actions().is_empty());
    }

    #[test]
    fn welcome_lists_welcome_channels() {
        let greeting = welcome(&BotConfig::default()).greeting("ada");
        assert!(greeting.starts_with("Hello ada,"));
        assert!(greeting.contains("- #golang-newbies -> for newbie resources"));
        assert!(!greeting.contains("#showandtell"));
    }
}
