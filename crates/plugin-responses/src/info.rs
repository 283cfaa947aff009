use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use handler_core::{Handler, Message, RandomSource, Responder, ThreadRandom, condition::exact};

use crate::{Channel, render_channel_list};

const SOURCE_LINE: &str = "You can find my source code at: <https://github.com/gobridge/gopher>.";

fn prompts<const N: usize>(items: [&str; N]) -> Vec<String> {
    items.iter().map(|s| (*s).to_owned()).collect()
}

/// Replies with the running version.
#[derive(Debug, Clone)]
pub struct BotVersion {
    prompts: Vec<String>,
    reply: String,
}

impl BotVersion {
    pub fn new(version: &str) -> Self {
        Self {
            prompts: prompts(["version"]),
            reply: format!("My version is: {version}"),
        }
    }
}

#[async_trait]
impl Handler for BotVersion {
    fn id(&self) -> &'static str {
        "version"
    }

    async fn handle(&self, msg: &Message, responder: &dyn Responder) -> Result<()> {
        if !exact(msg, &self.prompts) {
            return Ok(());
        }
        responder.respond(&self.reply).await
    }
}

/// Describes where the bot is hosted.
#[derive(Debug, Clone)]
pub struct BotStack {
    prompts: Vec<String>,
    reply: String,
}

impl BotStack {
    /// Picks the hosting blurb from the `DYNO` environment variable.
    pub fn from_env() -> Self {
        Self::new(std::env::var("DYNO").ok().as_deref())
    }

    pub fn new(dyno: Option<&str>) -> Self {
        let host = if dyno.is_some_and(|d| d.len() >= 3) {
            "I'm currently powered by Heroku <https://heroku.com>."
        } else {
            "I'm currently powered by Google Container Engine (GKE) <https://cloud.google.com/container-engine> and Kubernetes (k8s) <http://kubernetes.io>."
        };
        Self {
            prompts: prompts(["where do you live?", "stack"]),
            reply: format!("{host}\n{SOURCE_LINE}"),
        }
    }
}

#[async_trait]
impl Handler for BotStack {
    fn id(&self) -> &'static str {
        "stack"
    }

    async fn handle(&self, msg: &Message, responder: &dyn Responder) -> Result<()> {
        if !exact(msg, &self.prompts) {
            return Ok(());
        }
        responder.respond(&self.reply).await
    }
}

#[derive(Debug, Clone)]
pub struct CoinFlip {
    prompts: Vec<String>,
    source: Arc<dyn RandomSource>,
}

impl CoinFlip {
    pub fn new(source: Arc<dyn RandomSource>) -> Self {
        Self {
            prompts: prompts(["flip a coin", "flip coin"]),
            source,
        }
    }
}

impl Default for CoinFlip {
    fn default() -> Self {
        Self::new(Arc::new(ThreadRandom))
    }
}

#[async_trait]
impl Handler for CoinFlip {
    fn id(&self) -> &'static str {
        "coin-flip"
    }

    async fn handle(&self, msg: &Message, responder: &dyn Responder) -> Result<()> {
        if !exact(msg, &self.prompts) {
            return Ok(());
        }
        let side = if self.source.below(2) == 0 { "heads" } else { "tails" };
        responder.respond(side).await
    }
}

/// Lists every channel that is not marked special.
#[derive(Debug, Clone)]
pub struct RecommendedChannels {
    prompts: Vec<String>,
    list: String,
}

impl RecommendedChannels {
    pub fn new(channels: &[Channel]) -> Self {
        Self {
            prompts: prompts(["recommended channels"]),
            list: render_channel_list(channels.iter().filter(|c| !c.special)),
        }
    }
}

#[async_trait]
impl Handler for RecommendedChannels {
    fn id(&self) -> &'static str {
        "recommended-channels"
    }

    async fn handle(&self, msg: &Message, responder: &dyn Responder) -> Result<()> {
        if !exact(msg, &self.prompts) {
            return Ok(());
        }
        responder
            .respond_with_attachment("Here is a list of recommended channels:", &self.list)
            .await
    }
}

const NEWBIE_INTRO: &str =
    "Here are some resources you should check out if you are learning / new to Go:";

const NEWBIE_RESOURCES: &str = "First you should take the language tour: <https://tour.golang.org/>

Then, you should visit:
 - <https://golang.org/doc/code.html> to learn how to organize your Go workspace
 - <https://golang.org/doc/effective_go.html> be more effective at writing Go
 - <https://golang.org/ref/spec> learn more about the language itself
 - <https://golang.org/doc/#articles> a lot more reading material

There are some awesome websites as well:
 - <https://blog.gopheracademy.com> great resources for Gophers in general
 - <http://gotime.fm> awesome weekly podcast of Go awesomeness
 - <https://gobyexample.com> examples of how to do things in Go
 - <http://go-database-sql.org> how to use SQL databases in Go
 - <https://dmitri.shuralyov.com/idiomatic-go> tips on how to write more idiomatic Go code
 - <https://divan.github.io/posts/avoid_gotchas> will help you avoid gotchas in Go
 - <https://golangbot.com> tutorials to help you get started in Go

There's also an exhaustive list of videos <http://gophervids.appspot.com> related to Go from various authors.

If you prefer books, you can try these:
 - <http://www.golangbootcamp.com/book>
 - <http://gopl.io/>
 - <https://www.manning.com/books/go-in-action> (if you e-mail @wkennedy at bill@ardanlabs.com you can get a free copy for being part of this Slack)

If you want to learn how to organize your Go project, make sure to read: <https://medium.com/@benbjohnson/standard-package-layout-7cdbc8391fc1#.ds38va3pp>.
Once you are accustomed to the language and syntax, you can read this series of articles for a walkthrough the various standard library packages: <https://medium.com/go-walkthrough>.

Finally, <https://github.com/golang/go/wiki#learning-more-about-go> will give a list of even more resources to learn Go";

/// Posts the newbie reading list, in the channel or to the asker.
#[derive(Debug, Clone)]
pub struct NewbieResources {
    prompts: Vec<String>,
    private: bool,
}

impl NewbieResources {
    pub fn public() -> Self {
        Self {
            prompts: prompts(["newbie resources"]),
            private: false,
        }
    }

    pub fn private() -> Self {
        Self {
            prompts: prompts(["newbie resources pvt"]),
            private: true,
        }
    }
}

#[async_trait]
impl Handler for NewbieResources {
    fn id(&self) -> &'static str {
        if self.private {
            "newbie-resources-pvt"
        } else {
            "newbie-resources"
        }
    }

    async fn handle(&self, msg: &Message, responder: &dyn Responder) -> Result<()> {
        if !exact(msg, &self.prompts) {
            return Ok(());
        }
        if self.private {
            responder
                .respond_private_with_attachment(NEWBIE_INTRO, NEWBIE_RESOURCES)
                .await
        } else {
            responder
                .respond_with_attachment(NEWBIE_INTRO, NEWBIE_RESOURCES)
                .await
        }
    }
}
