//! Merge runs of streamed bot text into single display entries.
//!
//! Collation is re-derived from the full raw list on every pass; nothing is
//! carried between calls. A message only ever merges into the entry directly
//! before it.

use {
    convo_channels::resolve_payload,
    convo_common::{CollatedMessage, Message, MessageText, Source},
    convo_config::{ChannelsConfig, ConvoConfig},
    tracing::debug,
};

#[cfg(feature = "metrics")]
use convo_metrics::{collate as collate_metrics, counter};

/// Collate `messages` into display entries.
///
/// With `collation.collate_streamed_outputs` off, every message becomes its
/// own entry, unchanged.
pub fn collate(messages: &[Message], config: &ConvoConfig) -> Vec<CollatedMessage> {
    if !config.collation.collate_streamed_outputs {
        return messages.iter().cloned().map(CollatedMessage::from).collect();
    }

    let mut entries: Vec<CollatedMessage> = Vec::with_capacity(messages.len());
    let mut merged = 0usize;
    // Eligibility of the last original in `entries`.
    let mut tail_collatable = false;

    for message in messages {
        let collatable = is_collatable(message, &config.channels);
        if tail_collatable
            && collatable
            && let Some(entry) = entries.last_mut()
        {
            append(entry, message);
            merged += 1;
        } else {
            entries.push(message.clone().into());
        }
        tail_collatable = collatable;
    }

    debug!(
        input = messages.len(),
        entries = entries.len(),
        merged,
        "collated streamed outputs"
    );
    #[cfg(feature = "metrics")]
    counter!(collate_metrics::MERGED_TOTAL).increment(merged as u64);

    entries
}

/// Whether `candidate` may be merged into an entry ending with `previous`.
pub fn can_collate(previous: &Message, candidate: &Message, config: &ConvoConfig) -> bool {
    is_collatable(previous, &config.channels) && is_collatable(candidate, &config.channels)
}

/// Simple bot text: no rich payload, attachments or plugin data.
fn is_collatable(message: &Message, channels: &ChannelsConfig) -> bool {
    message.source == Source::Bot
        && message.has_text()
        && !message.has_attachments()
        && !message.has_plugin_data()
        && !resolve_payload(message, channels).is_some_and(|p| p.is_rich())
}

fn append(entry: &mut CollatedMessage, message: &Message) {
    entry
        .collated_from
        .get_or_insert_with(|| vec![entry.message.clone()])
        .push(message.clone());

    let mut text = entry
        .message
        .text_str()
        .map(|t| t.into_owned())
        .unwrap_or_default();
    text.push('\n');
    if let Some(next) = message.text_str() {
        text.push_str(&next);
    }
    entry.message.text = Some(MessageText::Single(text));
}
