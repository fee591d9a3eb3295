use std::collections::HashSet;

use crate::error::MentionError;
use crate::models::span::MENTION_SEPARATOR;
use crate::models::{Span, UserId};
use crate::text::utf16;

/// Trigger written in front of every user id in the exchange string,
/// whatever trigger the buffer displays
pub const EXCHANGE_TRIGGER: char = '@';

/// Replace every span's display text by `@<user_id> `.
///
/// Spans may come in any order. Literal `@123 ` text in the buffer is copied
/// as is, so the format cannot tell it apart from a mention.
pub fn serialize<'a>(
    buffer: &str,
    spans: impl IntoIterator<Item = &'a Span>,
) -> Result<String, MentionError> {
    let mut ordered: Vec<&Span> = spans.into_iter().collect();
    ordered.sort_by_key(|span| span.start);

    let mut out = String::with_capacity(buffer.len());
    let mut previous = 0;
    for span in ordered {
        if span.start < previous {
            return Err(MentionError::invalid_range(
                span.range(),
                "overlaps the previous mention",
            ));
        }
        let before = utf16::slice(buffer, previous..span.start).ok_or_else(|| {
            MentionError::invalid_range(span.range(), "outside the buffer or inside a character")
        })?;
        out.push_str(before);
        out.push(EXCHANGE_TRIGGER);
        out.push_str(&span.user_id.to_string());
        out.push(MENTION_SEPARATOR);
        previous = span.end;
    }

    let rest = utf16::byte_index(buffer, previous).ok_or_else(|| {
        MentionError::invalid_range(previous..previous, "mention ends past the buffer")
    })?;
    out.push_str(&buffer[rest..]);
    Ok(out)
}

/// Rebuild display text and spans from an exchange string.
///
/// Each `@<digits> ` token whose user `resolve` can name becomes a mention
/// rendered with `trigger`. Unknown users, and repeats of a user already
/// mentioned, stay literal so serializing the result gives back `exchange`.
pub fn parse_exchange<F>(exchange: &str, trigger: &str, mut resolve: F) -> (String, Vec<Span>)
where
    F: FnMut(UserId) -> Option<String>,
{
    let mut text = String::with_capacity(exchange.len());
    let mut spans: Vec<Span> = Vec::new();
    let mut seen = HashSet::new();
    let mut offset = 0;
    let mut rest = exchange;

    while let Some(found) = rest.find(EXCHANGE_TRIGGER) {
        let (literal, candidate) = rest.split_at(found);
        text.push_str(literal);
        offset += utf16::utf16_len(literal);

        let after = &candidate[EXCHANGE_TRIGGER.len_utf8()..];
        let digits = after.bytes().take_while(u8::is_ascii_digit).count();
        let token = if digits > 0 && after[digits..].starts_with(MENTION_SEPARATOR) {
            after[..digits].parse::<UserId>().ok()
        } else {
            None
        };

        let resolved = token
            .filter(|user_id| !seen.contains(user_id))
            .and_then(|user_id| resolve(user_id).map(|name| (user_id, name)))
            .filter(|(_, name)| !name.is_empty());

        match resolved {
            Some((user_id, name)) => {
                let span = Span::mention(user_id, trigger, &name, offset);
                text.push_str(&span.display_text);
                offset = span.end;
                seen.insert(user_id);
                spans.push(span);
                rest = &after[digits + MENTION_SEPARATOR.len_utf8()..];
            }
            None => {
                text.push(EXCHANGE_TRIGGER);
                offset += EXCHANGE_TRIGGER.len_utf16();
                rest = after;
            }
        }
    }
    text.push_str(rest);

    (text, spans)
}
