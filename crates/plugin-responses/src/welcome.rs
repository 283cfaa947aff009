use anyhow::Result;
use async_trait::async_trait;

use handler_core::{JoinEvent, JoinHandler, JoinResponder};

use crate::{Channel, render_channel_list};

/// Sends new members a private welcome listing the welcome channels.
#[derive(Debug, Clone)]
pub struct Welcome {
    message: String,
}

impl Welcome {
    pub fn new(channels: &[Channel]) -> Self {
        Self {
            message: welcome_message(channels),
        }
    }

    pub fn greeting(&self, user_name: &str) -> String {
        format!("Hello {user_name},\n\n\n{}", self.message)
    }
}

#[async_trait]
impl JoinHandler for Welcome {
    fn id(&self) -> &'static str {
        "welcome"
    }

    async fn handle(&self, event: &JoinEvent, responder: &dyn JoinResponder) -> Result<()> {
        responder.respond_private(&self.greeting(&event.user_name)).await
    }
}

fn welcome_message(channels: &[Channel]) -> String {
    let list = render_channel_list(channels.iter().filter(|c| c.welcome));
    format!(
        "Welcome to the Gophers Slack channel.
This Slack is meant to connect gophers from all over the world in a central place.
There is also a forum: https://forum.golangbridge.org, you might want to check it out as well.
We have a few rules that you can see here: http://coc.golangbridge.org.

Here's a list of a few channels you could join:
{list}

If you want more suggestions, type \"recommended channels\".
There are quite a few other channels, depending on your interests or location (we have city / country wide channels).
Just click on the channel list and search for anything that crosses your mind.

To share code, you should use: https://play.golang.org/ as it makes it easy for others to help you.

If you are new to Go and want a copy of the <https://www.manning.com/books/go-in-action|Go In Action> book, please send an email to @wkennedy at bill@ardanlabs.com

If you are interested in a free copy of the <https://www.manning.com/books/go-web-programming|Go Web Programming> book by Sau Sheong Chang, @sausheong, please send him an email at sausheong@gmail.com

In case you want to customize your profile picture, you can use https://gopherize.me/ to create a custom gopher.

Final thing, #general might be too chatty at times but don't be shy to ask your Go related question.


Now, enjoy the community and have fun.

PS. Want to contribute to my welcome message? You can find my source code at: <https://github.com/gobridge/gopher>."
    )
}
