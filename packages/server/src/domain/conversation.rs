//! 会話一覧の集計
//!
//! ダイレクトメッセージを相手ごとにまとめ、最新メッセージと未読数を求める。

use std::collections::HashMap;

use super::{
    entity::{ConversationSummary, DirectMessage},
    value_object::UserId,
};

struct Accumulator<'a> {
    last: &'a DirectMessage,
    unread_count: usize,
}

/// Summarize the direct conversations of `user_id`, one entry per peer.
///
/// # Arguments
///
/// * `user_id` - The user the summaries are computed for
/// * `messages` - Direct messages in storage order; messages not involving `user_id` are ignored
/// * `display_name` - Resolves a peer id to a display name
///
/// # Returns
///
/// Summaries sorted by last message time (newest first), ties broken by peer id ascending.
/// Within one peer, the later-stored message wins a timestamp tie.
pub fn summarize_conversations<F>(
    user_id: &UserId,
    messages: &[DirectMessage],
    display_name: F,
) -> Vec<ConversationSummary>
where
    F: Fn(&UserId) -> String,
{
    let mut by_peer: HashMap<&UserId, Accumulator<'_>> = HashMap::new();

    for message in messages {
        let Some(peer_id) = message.other_party(user_id) else {
            continue;
        };
        let unread = usize::from(message.is_unread_by(user_id));

        by_peer
            .entry(peer_id)
            .and_modify(|acc| {
                if message.created_at >= acc.last.created_at {
                    acc.last = message;
                }
                acc.unread_count += unread;
            })
            .or_insert(Accumulator {
                last: message,
                unread_count: unread,
            });
    }

    let mut summaries: Vec<ConversationSummary> = by_peer
        .into_iter()
        .map(|(peer_id, acc)| ConversationSummary {
            peer_id: peer_id.clone(),
            peer_name: display_name(peer_id),
            last_message: acc.last.content.as_str().to_string(),
            last_message_at: acc.last.created_at,
            unread_count: acc.unread_count,
        })
        .collect();

    summaries.sort_by(|a, b| {
        b.last_message_at
            .cmp(&a.last_message_at)
            .then_with(|| a.peer_id.cmp(&b.peer_id))
    });

    summaries
}
