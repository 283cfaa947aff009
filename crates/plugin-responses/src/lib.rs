//! Canned replies and reactions.

pub mod canned;
pub mod info;
pub mod respond;
pub mod welcome;

use serde::Deserialize;

pub use canned::CannedResponses;
pub use info::{BotStack, BotVersion, CoinFlip, NewbieResources, RecommendedChannels};
pub use respond::{React, Respond};
pub use welcome::Welcome;

/// A workspace channel worth pointing people to.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Channel {
    pub name: String,
    pub description: String,
    /// Listed in the welcome message sent to new members.
    #[serde(default)]
    pub welcome: bool,
    /// Never listed anywhere.
    #[serde(default)]
    pub special: bool,
}

impl Channel {
    fn new(name: &str, description: &str, welcome: bool, special: bool) -> Self {
        Self {
            name: name.to_owned(),
            description: description.to_owned(),
            welcome,
            special,
        }
    }
}

/// Renders channels as `- #name -> description` lines.
pub fn render_channel_list<'a>(channels: impl IntoIterator<Item = &'a Channel>) -> String {
    channels
        .into_iter()
        .map(|c| format!("- #{} -> {}\n", c.name, c.description))
        .collect()
}

pub fn default_channels() -> Vec<Channel> {
    vec![
        Channel::new("golang-newbies", "for newbie resources", true, false),
        Channel::new("reviews", "for code reviews", true, false),
        Channel::new("gotimefm", "for the awesome live podcast", true, false),
        Channel::new("remotemeetup", "for remote meetup", true, false),
        Channel::new("golang-jobs", "for jobs related to Go", true, false),
        Channel::new(
            "showandtell",
            "tell the world about the thing you are working on",
            false,
            false,
        ),
        Channel::new(
            "performance",
            "anything and everything performance related",
            false,
            false,
        ),
        Channel::new("devops", "for devops related discussions", false, false),
        Channel::new("security", "for security related discussions", false, false),
        Channel::new("aws", "if you are interested in AWS", false, false),
        Channel::new("goreviews", "talk to the Go team about a certain CL", false, false),
        Channel::new(
            "golang-cls",
            "get real time updates from the merged CL for Go itself",
            false,
            false,
        ),
        Channel::new("bbq", "Go controlling your bbq grill? Yes, we have that", false, false),
        Channel::new("general", "general channel", false, true),
        Channel::new("golang_cls", "curated list of interesting CLs", false, true),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_lines_in_order() {
        let channels = default_channels();
        let list = render_channel_list(channels.iter().filter(|c| c.welcome));
        assert!(list.starts_with("- #golang-newbies -> for newbie resources\n"));
        assert_eq!(list.lines().count(), 5);
        assert!(list.ends_with("- #golang-jobs -> for jobs related to Go\n"));
    }

    #[test]
    fn channel_flags_default_to_false() {
        let c: Channel =
            serde_yaml::from_str("name: rust\ndescription: for crabs\n").unwrap();
        assert!(!c.welcome);
        assert!(!c.special);
    }
}
