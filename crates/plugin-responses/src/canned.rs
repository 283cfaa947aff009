use std::{collections::HashMap, sync::Arc};

use anyhow::Result;
use async_trait::async_trait;
use tracing::warn;

use handler_core::{Handler, Message, Responder};

const REPLIES: &[(&str, &[&str])] = &[
    (
        "recommended blogs",
        &[
            "Here are some popular blog posts and Twitter accounts you should follow:",
            "- Peter Bourgon <https://twitter.com/peterbourgon|@peterbourgon> - <https://peter.bourgon.org/blog>",
            "- Carlisia Campos <https://twitter.com/carlisia|@carlisia>",
            "- Dave Cheney <https://twitter.com/davecheney|@davecheney> - <http://dave.cheney.net>",
            "- Jaana Burcu Dogan <https://twitter.com/rakyll|@rakyll> - <http://golang.rakyll.org>",
            "- Jessie Frazelle <https://twitter.com/jessfraz|@jessfraz> - <https://blog.jessfraz.com>",
            "- William \"Bill\" Kennedy <https://twitter.com|@goinggodotnet> - <https://www.goinggo.net>",
            "- Brian Ketelsen <https://twitter.com/bketelsen|@bketelsen> - <https://www.brianketelsen.com/blog>",
        ],
    ),
    (
        "oss help wanted",
        &[
            "Here's a list of projects which could need some help from contributors like you: <https://github.com/corylanou/oss-helpwanted>",
        ],
    ),
    (
        "working with forks",
        &[
            "Here's how to work with package forks in Go: <http://blog.sgmansfield.com/2016/06/working-with-forks-in-go/>",
        ],
    ),
    (
        "block forever",
        &[
            "Here's how to block forever in Go: <http://blog.sgmansfield.com/2016/06/how-to-block-forever-in-go/>",
        ],
    ),
    (
        "http timeouts",
        &[
            "Here's a blog post which will help with http timeouts in Go: <https://blog.cloudflare.com/the-complete-guide-to-golang-net-http-timeouts/>",
        ],
    ),
    (
        "slices",
        &[
            "The following posts will explain how slices, maps and strings work in Go:",
            "- <https://blog.golang.org/slices>",
            "- <https://blog.golang.org/go-slices-usage-and-internals>",
            "- <https://blog.golang.org/strings>",
        ],
    ),
    (
        "database tutorial",
        &["Here's how to work with database/sql in Go: <http://go-database-sql.org/>"],
    ),
    (
        "package layout",
        &[
            "These articles will explain how to organize your Go packages:",
            "- <https://rakyll.org/style-packages/>",
            "- <https://medium.com/@benbjohnson/standard-package-layout-7cdbc8391fc1#.ds38va3pp>",
            "- <https://peter.bourgon.org/go-best-practices-2016/#repository-structure>",
            "",
            "This article will help you understand the design philosophy for packages: <https://www.goinggo.net/2017/02/design-philosophy-on-packaging.html>",
        ],
    ),
    (
        "idiomatic go",
        &["Tips on how to write idiomatic Go code <https://dmitri.shuralyov.com/idiomatic-go>"],
    ),
    (
        "avoid gotchas",
        &[
            "Read this article if you want to understand and avoid common gotchas in Go <https://divan.github.io/posts/avoid_gotchas>",
        ],
    ),
    (
        "source code",
        &["My source code is here <https://github.com/gobridge/gopher>"],
    ),
    (
        "help",
        &[
            "Here's a list of supported commands",
            "- \"newbie resources\" -> get a list of newbie resources",
            "- \"newbie resources pvt\" -> get a list of newbie resources as a private message",
            "- \"recommended channels\" -> get a list of recommended channels",
            "- \"oss help\" -> help the open-source community",
            "- \"work with forks\" -> how to work with forks of packages",
            "- \"idiomatic go\" -> learn how to write more idiomatic Go code",
            "- \"block forever\" -> how to block forever",
            "- \"http timeouts\" -> tutorial about dealing with timeouts and http",
            "- \"database tutorial\" -> tutorial about using sql databases",
            "- \"package layout\" -> learn how to structure your Go package",
            "- \"avoid gotchas\" -> avoid common gotchas in Go",
            "- \"library for <name>\" -> search a go package that matches <name>",
            "- \"xkcd:<number or alias>\" -> link an xkcd comic",
            "- \"flip a coin\" -> flip a coin",
            "- \"source code\" -> location of my source code",
            "- \"where do you live?\" OR \"stack\" -> get information about the tech stack behind @gopher",
        ],
    ),
];

const ALIASES: &[(&str, &str)] = &[
    ("recommended", "recommended blogs"),
    ("oss help", "oss help wanted"),
    ("work with forks", "working with forks"),
    ("how to block forever", "block forever"),
    ("slice internals", "slices"),
    ("databases", "database tutorial"),
    ("gotchas", "avoid gotchas"),
    ("source", "source code"),
    ("package structure", "package layout"),
    ("project structure", "package layout"),
    ("project layout", "package layout"),
];

/// Table of fixed replies keyed by the exact normalized text, with aliases
/// resolved once at construction.
#[derive(Debug, Clone)]
pub struct CannedResponses {
    replies: HashMap<String, Arc<str>>,
}

impl CannedResponses {
    pub fn new(table: &[(&str, &[&str])], aliases: &[(&str, &str)]) -> Self {
        let mut replies: HashMap<String, Arc<str>> = table
            .iter()
            .map(|(trigger, lines)| ((*trigger).to_owned(), Arc::from(lines.join("\n"))))
            .collect();
        for (alias, target) in aliases {
            let Some(reply) = replies.get(*target).map(Arc::clone) else {
                warn!(alias = %alias, target = %target, "Bad response alias");
                continue;
            };
            replies.insert((*alias).to_owned(), reply);
        }
        Self { replies }
    }

    pub fn builtin() -> Self {
        Self::new(REPLIES, ALIASES)
    }

    pub fn lookup(&self, text: &str) -> Option<&str> {
        self.replies.get(text).map(|reply| &**reply)
    }

    pub fn len(&self) -> usize {
        self.replies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.replies.is_empty()
    }
}

#[async_trait]
impl Handler for CannedResponses {
    fn id(&self) -> &'static str {
        "canned"
    }

    async fn handle(&self, msg: &Message, responder: &dyn Responder) -> Result<()> {
        let Some(reply) = self.lookup(msg.text()) else {
            return Ok(());
        };
        responder.respond(reply).await
    }
}

#[cfg(test)]
mod tests {
    use handler_core::testing::{Action, RecordingResponder, message};

    use super::*;

    #[test]
    fn every_alias_resolves() {
        let canned = CannedResponses::builtin();
        assert_eq!(canned.len(), REPLIES.len() + ALIASES.len());
    }

    #[test]
    fn bad_alias_is_skipped() {
        let canned = CannedResponses::new(&[("a", &["one", "two"])], &[("b", "missing")]);
        assert_eq!(canned.lookup("a"), Some("one\ntwo"));
        assert_eq!(canned.lookup("b"), None);
    }

    #[tokio::test]
    async fn alias_reply_is_identical() {
        let canned = CannedResponses::builtin();
        let responder = RecordingResponder::new();

        canned.handle(&message("gopher oss help"), &responder).await.unwrap();
        canned.handle(&message("gopher oss help wanted"), &responder).await.unwrap();

        let actions = responder.actions();
        assert_eq!(actions.len(), 2);
        assert_eq!(actions[0], actions[1]);
    }

    #[tokio::test]
    async fn multi_line_reply_is_joined() {
        let canned = CannedResponses::builtin();
        let responder = RecordingResponder::new();

        canned.handle(&message("gopher slices"), &responder).await.unwrap();

        let actions = responder.actions();
        let [Action::Respond(text)] = actions.as_slice() else {
            panic!("expected a single reply");
        };
        assert!(text.starts_with("The following posts"));
        assert_eq!(text.lines().count(), 4);
    }

    #[tokio::test]
    async fn unknown_text_is_ignored() {
        let canned = CannedResponses::builtin();
        let responder = RecordingResponder::new();
        canned.handle(&message("gopher slices please"), &responder).await.unwrap();
        assert!(responder.actions().is_empty());
    }
}
