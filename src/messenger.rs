use crate::types::Error;
use poise::serenity_prelude as serenity;
use serenity::{CreateAllowedMentions, CreateMessage};
use std::future::Future;
use std::sync::Arc;

/// A subject tagged in an outgoing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mention {
    pub tag: String,
    pub user_id: Option<u64>,
}

impl Mention {
    /// How the subject appears in message text: a real ping when the user is
    /// known, otherwise a plain `@name`.
    pub fn render(&self) -> String {
        match self.user_id {
            Some(id) => format!("<@{id}>"),
            None => format!("@{}", self.tag),
        }
    }
}

/// The only way the birthday core talks back to the chat host.
pub trait Messenger: Send + Sync {
    fn send_message(
        &self,
        text: &str,
        conversation: u64,
        mentions: &[Mention],
    ) -> impl Future<Output = Result<(), Error>> + Send;
}

#[derive(Clone)]
pub struct DiscordMessenger {
    http: Arc<serenity::Http>,
}

impl DiscordMessenger {
    pub fn new(http: Arc<serenity::Http>) -> Self {
        Self { http }
    }
}

/// Users allowed to be pinged. Zero ids can't be Discord snowflakes and are dropped.
fn allowed_users(mentions: &[Mention]) -> Vec<serenity::UserId> {
    mentions
        .iter()
        .filter_map(|mention| mention.user_id)
        .filter(|id| *id != 0)
        .map(serenity::UserId::new)
        .collect()
}

impl Messenger for DiscordMessenger {
    async fn send_message(
        &self,
        text: &str,
        conversation: u64,
        mentions: &[Mention],
    ) -> Result<(), Error> {
        if conversation == 0 {
            return Err("Can't send to channel id 0".into());
        }

        serenity::ChannelId::new(conversation)
            .send_message(
                &self.http,
                CreateMessage::new()
                    .content(text)
                    .allowed_mentions(CreateAllowedMentions::new().users(allowed_users(mentions))),
            )
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mention(tag: &str, user_id: Option<u64>) -> Mention {
        Mention {
            tag: tag.to_string(),
            user_id,
        }
    }

    #[test]
    fn renders_ping_or_plain_tag() {
        assert_eq!(mention("Alice", Some(42)).render(), "<@42>");
        assert_eq!(mention("Alice", None).render(), "@Alice");
    }

    #[test]
    fn zero_user_ids_are_not_pinged() {
        let users = allowed_users(&[
            mention("ghost", Some(0)),
            mention("Alice", None),
            mention("Bob", Some(7)),
        ]);
        assert_eq!(users, vec![serenity::UserId::new(7)]);
    }

    #[tokio::test]
    async fn zero_channel_is_an_error_not_a_panic() {
        let messenger = DiscordMessenger::new(Arc::new(serenity::Http::new("token")));
        let result = messenger
            .send_message("hi", 0, &[mention("ghost", Some(0))])
            .await;
        assert!(result.is_err());
    }
}
