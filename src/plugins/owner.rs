//! Owner-only commands: /broadcast and /stats.

use teloxide::prelude::*;
use teloxide::types::{ChatId, ReplyParameters};
use tracing::{info, warn};

use crate::bot::dispatcher::{AppState, ThrottledBot};
use crate::database::ChannelStats;
use crate::gateway::ChatGateway;
use crate::i18n::get_text;
use crate::utils::html_escape;

/// Channels listed by /stats.
const TOP_CHANNELS: usize = 5;

/// Reply with `common.owner_only` and return false unless the sender owns the
/// bot.
async fn ensure_owner(bot: &ThrottledBot, msg: &Message, state: &AppState) -> anyhow::Result<bool> {
    let is_owner = msg
        .from
        .as_ref()
        .is_some_and(|u| state.permissions.is_bot_owner(u.id));

    if !is_owner {
        bot.send_message(msg.chat.id, get_text(&state.locale, "common.owner_only"))
            .reply_parameters(ReplyParameters::new(msg.id))
            .await?;
    }
    Ok(is_owner)
}

/// Handle /broadcast <text>.
pub async fn broadcast_command(
    bot: ThrottledBot,
    msg: Message,
    state: AppState,
    text: String,
) -> anyhow::Result<()> {
    if !ensure_owner(&bot, &msg, &state).await? {
        return Ok(());
    }

    let locale = &state.locale;
    let text = text.trim();
    if text.is_empty() {
        bot.send_message(msg.chat.id, get_text(locale, "broadcast.usage"))
            .reply_parameters(ReplyParameters::new(msg.id))
            .await?;
        return Ok(());
    }

    let group_ids = state.store.list_group_ids().await?;
    let body = get_text(locale, "broadcast.message").replace("{text}", &html_escape(text));
    let (sent, failed) = broadcast(state.gateway.as_ref(), &group_ids, &body).await;
    info!("Broadcast finished: {} sent, {} failed", sent, failed);

    bot.send_message(
        msg.chat.id,
        get_text(locale, "broadcast.result")
            .replace("{sent}", &sent.to_string())
            .replace("{failed}", &failed.to_string()),
    )
    .reply_parameters(ReplyParameters::new(msg.id))
    .await?;

    Ok(())
}

/// Send `body` to every group, one at a time. Returns (sent, failed).
pub async fn broadcast(gateway: &dyn ChatGateway, group_ids: &[i64], body: &str) -> (usize, usize) {
    let mut sent = 0;
    let mut failed = 0;

    for &group_id in group_ids {
        match gateway.send_message(ChatId(group_id), body).await {
            Ok(_) => sent += 1,
            Err(e) => {
                warn!("Broadcast to {} failed: {}", group_id, e);
                failed += 1;
            }
        }
    }

    (sent, failed)
}

/// Handle /stats.
pub async fn stats_command(bot: ThrottledBot, msg: Message, state: AppState) -> anyhow::Result<()> {
    if !ensure_owner(&bot, &msg, &state).await? {
        return Ok(());
    }

    let stats = state.store.stats(TOP_CHANNELS).await?;
    bot.send_message(msg.chat.id, render_stats(&state.locale, &stats))
        .reply_parameters(ReplyParameters::new(msg.id))
        .await?;

    Ok(())
}

pub fn render_stats(locale: &str, stats: &ChannelStats) -> String {
    let mut text =
        get_text(locale, "stats.header").replace("{groups}", &stats.group_count.to_string());
    for (channel, count) in &stats.top_channels {
        text.push_str(
            &get_text(locale, "stats.line")
                .replace("{channel}", channel)
                .replace("{count}", &count.to_string()),
        );
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::mock::MockGateway;

    #[tokio::test]
    async fn broadcast_counts_successes() {
        let gateway = MockGateway::new();

        let (sent, failed) = broadcast(&gateway, &[-1, -2, -3], "hi").await;

        assert_eq!((sent, failed), (3, 0));
        assert_eq!(gateway.sent_texts(), vec!["hi", "hi", "hi"]);
    }

    #[tokio::test]
    async fn broadcast_counts_failures() {
        let gateway = MockGateway::new().failing_sends();

        let (sent, failed) = broadcast(&gateway, &[-1, -2], "hi").await;

        assert_eq!((sent, failed), (0, 2));
    }

    #[test]
    fn stats_lists_top_channels() {
        let stats = ChannelStats {
            group_count: 3,
            top_channels: vec![("@a".to_string(), 2), ("@b".to_string(), 1)],
        };

        let text = render_stats("en", &stats);

        assert!(text.starts_with("🤖 Bot statistics\n\n🔧 Active groups: 3"));
        assert!(text.ends_with("• @a: 2 groups\n• @b: 1 groups\n"));
    }
}
