/// A Discord message addressed by its three snowflakes.
///
/// Reports filed from Discord use `guild/channel/message` as their content id,
/// which is what lets the enforcer find the message again later.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageRef {
    pub guild_id: u64,
    pub channel_id: u64,
    pub message_id: u64,
}

const MESSAGE_LINK_HOSTS: [&str; 4] = [
    "discord.com",
    "ptb.discord.com",
    "canary.discord.com",
    "discordapp.com",
];

impl MessageRef {
    /// Parse a "Copy Message Link" URL such as
    /// `https://discord.com/channels/1/2/3`. A bare `1/2/3` is accepted too.
    pub fn from_link(link: &str) -> Option<Self> {
        let link = link.trim().trim_end_matches('/');
        let Some(rest) = link
            .strip_prefix("https://")
            .or_else(|| link.strip_prefix("http://"))
        else {
            return Self::from_content_id(link);
        };

        let (host, path) = rest.split_once('/')?;
        if !MESSAGE_LINK_HOSTS.contains(&host) {
            return None;
        }
        Self::from_content_id(path.strip_prefix("channels/")?)
    }

    pub fn from_content_id(content_id: &str) -> Option<Self> {
        let mut parts = content_id.split('/');
        let guild_id = parse_snowflake(parts.next()?)?;
        let channel_id = parse_snowflake(parts.next()?)?;
        let message_id = parse_snowflake(parts.next()?)?;
        if parts.next().is_some() {
            return None;
        }
        Some(Self {
            guild_id,
            channel_id,
            message_id,
        })
    }

    pub fn content_id(&self) -> String {
        format!("{}/{}/{}", self.guild_id, self.channel_id, self.message_id)
    }

    pub fn link(&self) -> String {
        format!("https://discord.com/channels/{}", self.content_id())
    }
}

/// Content-id prefix shared by every message in a guild.
pub fn guild_prefix(guild_id: u64) -> String {
    format!("{}/", guild_id)
}

/// Whether a content id names a message in `guild_id`.
pub fn in_guild(content_id: &str, guild_id: u64) -> bool {
    MessageRef::from_content_id(content_id).map_or(false, |m| m.guild_id == guild_id)
}

/// Key for a member's engine profile and vote weight. Both are kept per guild,
/// so settings made in one server never follow a member into another.
pub fn member_key(guild_id: u64, user_id: u64) -> String {
    format!("{}:{}", guild_id, user_id)
}

// serenity's id constructors panic on zero
pub fn parse_snowflake(value: &str) -> Option<u64> {
    value.parse::<u64>().ok().filter(|id| *id != 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_message_links() {
        let expected = MessageRef {
            guild_id: 111,
            channel_id: 222,
            message_id: 333,
        };
        assert_eq!(
            MessageRef::from_link("https://discord.com/channels/111/222/333"),
            Some(expected)
        );
        assert_eq!(
            MessageRef::from_link("  https://canary.discord.com/channels/111/222/333/ "),
            Some(expected)
        );
        assert_eq!(MessageRef::from_link("111/222/333"), Some(expected));
    }

    #[test]
    fn test_rejects_other_links() {
        // DMs have no guild to moderate
        assert_eq!(
            MessageRef::from_link("https://discord.com/channels/@me/222/333"),
            None
        );
        assert_eq!(
            MessageRef::from_link("https://evil.example/channels/111/222/333"),
            None
        );
        assert_eq!(MessageRef::from_link("https://discord.com/channels/111/222"), None);
        assert_eq!(MessageRef::from_link("111/222/333/444"), None);
        assert_eq!(MessageRef::from_link("0/222/333"), None);
    }

    #[test]
    fn test_content_id_and_link() {
        let message = MessageRef::from_content_id("1/2/3").unwrap();
        assert_eq!(message.content_id(), "1/2/3");
        assert_eq!(message.link(), "https://discord.com/channels/1/2/3");
    }

    #[test]
    fn test_in_guild() {
        assert!(in_guild("111/222/333", 111));
        assert!(!in_guild("111/222/333", 11));
        assert!(!in_guild("1111/222/333", 111));
        assert!(!in_guild("post-42", 111));
        assert!("111/222/333".starts_with(&guild_prefix(111)));
        assert!(!"1110/222/333".starts_with(&guild_prefix(111)));
    }

    #[test]
    fn test_member_key_differs_per_guild() {
        assert_eq!(member_key(1, 42), "1:42");
        assert_ne!(member_key(1, 42), member_key(2, 42));
    }
}
