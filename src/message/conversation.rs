//! Groups a user's direct messages into per-counterpart conversation summaries.
//!
//! Everything here is pure: the caller fetches messages and profiles and
//! hands them in. Records that do not involve the viewer, or that have the
//! same sender and receiver, are skipped by both `build_conversations` and
//! `count_unread` so the two always agree.

use crate::{
    message::{message_dto::ConversationSummary, message_models::Message},
    profile::{profile_models::resolve_identity, Profile},
};
use std::collections::{BTreeMap, HashMap, HashSet};
use uuid::Uuid;

fn in_contract(current_user_id: Uuid, message: &Message) -> bool {
    if !message.involves(current_user_id) || message.sender_id == message.receiver_id {
        tracing::debug!(
            message_id = %message.id,
            "Skipping message outside the viewer's conversations"
        );
        return false;
    }
    true
}

fn relevant<'a>(
    current_user_id: Uuid,
    messages: &'a [Message],
) -> impl Iterator<Item = &'a Message> + 'a {
    messages
        .iter()
        .filter(move |m| !current_user_id.is_nil() && in_contract(current_user_id, m))
}

/// Distinct counterpart ids, for the single batch profile lookup.
pub fn counterpart_ids(current_user_id: Uuid, messages: &[Message]) -> HashSet<Uuid> {
    relevant(current_user_id, messages)
        .map(|m| m.counterpart_of(current_user_id))
        .collect()
}

/// Builds one summary per counterpart, most recent conversation first.
///
/// Ties on `last_message_time` are ordered by counterpart id ascending.
/// A nil `current_user_id` yields an empty list.
pub fn build_conversations(
    current_user_id: Uuid,
    messages: &[Message],
    profiles: &HashMap<Uuid, Profile>,
) -> Vec<ConversationSummary> {
    let mut groups: BTreeMap<Uuid, Vec<&Message>> = BTreeMap::new();
    for message in relevant(current_user_id, messages) {
        groups
            .entry(message.counterpart_of(current_user_id))
            .or_default()
            .push(message);
    }

    let mut summaries: Vec<ConversationSummary> = groups
        .into_iter()
        .filter_map(|(counterpart_id, group)| {
            // Input order is not trusted; same-instant messages resolve by id.
            let latest = group
                .iter()
                .max_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)))?;

            let unread_count = group
                .iter()
                .filter(|m| m.is_unread_for(current_user_id))
                .count();

            let (display_name, avatar_url) = resolve_identity(profiles.get(&counterpart_id));

            Some(ConversationSummary {
                counterpart_id,
                display_name,
                avatar_url,
                last_message_content: latest.content.clone(),
                last_message_time: latest.created_at,
                unread_count,
                is_unread: unread_count > 0,
            })
        })
        .collect();

    summaries.sort_by(|a, b| {
        b.last_message_time
            .cmp(&a.last_message_time)
            .then(a.counterpart_id.cmp(&b.counterpart_id))
    });

    summaries
}

/// Total unread messages addressed to the viewer, across all counterparts.
pub fn count_unread(current_user_id: Uuid, messages: &[Message]) -> usize {
    relevant(current_user_id, messages)
        .filter(|m| m.is_unread_for(current_user_id))
        .count()
}
