//! Message normalization.
//!
//! Turns a split wire line into a [`ChatEvent`]: the one canonical
//! representation the render side works from. Individual bad tag values
//! degrade to defaults with a log record; only unframeable lines are
//! dropped, and that happens before this module runs.

use std::collections::HashSet;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::emotes::{self, RawEmoteRange};
use crate::tags::RawLine;

/// Badge key carried by Prime/premium subscribers.
const PRIME_BADGE_SET: &str = "premium";

/// An RGB chat color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    /// Parse a hex color, tolerating a leading `#` or `0x`.
    pub fn from_hex(value: &str) -> Option<Self> {
        let digits = value
            .trim()
            .trim_start_matches('#')
            .trim_start_matches("0x")
            .trim_start_matches("0X");
        if digits.len() != 6 {
            return None;
        }
        let packed = u32::from_str_radix(digits, 16).ok()?;
        Some(Self {
            r: (packed >> 16) as u8,
            g: (packed >> 8) as u8,
            b: packed as u8,
        })
    }
}

/// Special user classes from the `user-type` tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum UserType {
    #[default]
    None,
    Moderator,
    GlobalMod,
    Admin,
    Staff,
}

impl UserType {
    /// Map the wire tag value; unknown or blank means no special class.
    pub fn from_tag(value: &str) -> Self {
        match value {
            "mod" => Self::Moderator,
            "global_mod" => Self::GlobalMod,
            "admin" => Self::Admin,
            "staff" => Self::Staff,
            _ => Self::None,
        }
    }

    /// Badge set key for this user class, if it carries one.
    pub fn badge_set(&self) -> Option<&'static str> {
        match self {
            Self::None => None,
            Self::Moderator => Some("moderator"),
            Self::GlobalMod => Some("global_mod"),
            Self::Admin => Some("admin"),
            Self::Staff => Some("staff"),
        }
    }
}

/// Wire command classification. Filtering non-Privmsg events off the
/// display path is the consumer's concern, not the normalizer's.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Classification {
    Privmsg,
    Whisper,
    Other,
}

impl Classification {
    pub fn from_command(command: &str) -> Self {
        match command {
            "PRIVMSG" => Self::Privmsg,
            "WHISPER" => Self::Whisper,
            _ => Self::Other,
        }
    }
}

/// How the message body relates to the sender line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageKind {
    Normal,
    Action,
    Join,
    Manual,
}

impl MessageKind {
    /// Separator between display name and body when building the
    /// displayed text. ACTION messages read as one sentence.
    pub fn separator(&self) -> &'static str {
        match self {
            Self::Action => " ",
            Self::Normal | Self::Join | Self::Manual => ": ",
        }
    }
}

/// Normalized representation of one received chat line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatEvent {
    /// Canonical lowercase login of the sender.
    pub sender: String,
    pub display_name: String,
    pub color: Option<Rgb>,
    pub subscriber: bool,
    pub turbo: bool,
    pub prime: bool,
    pub user_type: UserType,
    pub classification: Classification,
    /// `set/version` badge keys from the `badges` tag, deduplicated.
    pub badge_keys: Vec<String>,
    /// Emote placements with exclusive ends, in wire order.
    pub emote_ranges: Vec<RawEmoteRange>,
    pub text: String,
    pub timestamp: DateTime<Utc>,
    pub kind: MessageKind,
}

impl ChatEvent {
    /// Build an event from a split wire line.
    pub fn from_raw(raw: RawLine, received_at: DateTime<Utc>) -> Self {
        let sender = nick_of(&raw.prefix).to_lowercase();
        let display_name = match raw.tags.get("display-name") {
            Some(name) if !name.trim().is_empty() => name.clone(),
            _ => nick_of(&raw.prefix).to_string(),
        };

        let color = raw.tags.get("color").and_then(|value| {
            if value.trim().is_empty() {
                return None;
            }
            let parsed = Rgb::from_hex(value);
            if parsed.is_none() {
                tracing::warn!(value = %value, "unparsable color tag, using default");
            }
            parsed
        });

        let badge_keys = raw
            .tags
            .get("badges")
            .map(|value| parse_badge_keys(value))
            .unwrap_or_default();

        let emote_ranges = raw
            .tags
            .get("emotes")
            .map(|value| match emotes::parse_emote_ranges(value) {
                Ok(ranges) => ranges,
                Err(err) => {
                    tracing::warn!(error = %err, "skipping emotes tag");
                    Vec::new()
                }
            })
            .unwrap_or_default();

        let kind = if raw.is_action {
            MessageKind::Action
        } else if raw.command == "JOIN" {
            MessageKind::Join
        } else {
            MessageKind::Normal
        };

        let timestamp = raw
            .tags
            .get("tmi-sent-ts")
            .and_then(|value| value.parse::<i64>().ok())
            .and_then(|millis| Utc.timestamp_millis_opt(millis).single())
            .unwrap_or(received_at);

        Self {
            prime: badge_keys
                .iter()
                .any(|key| key == PRIME_BADGE_SET || key.starts_with("premium/")),
            subscriber: flag_tag(&raw.tags, "subscriber"),
            turbo: flag_tag(&raw.tags, "turbo"),
            user_type: UserType::from_tag(raw.tags.get("user-type").map_or("", String::as_str)),
            classification: Classification::from_command(&raw.command),
            sender,
            display_name,
            color,
            badge_keys,
            emote_ranges,
            text: raw.trailing,
            timestamp,
            kind,
        }
    }

    /// Synthesize a join notice (the transport reports joins out of band
    /// when the wire line carries no trailing text).
    pub fn join(login: &str, timestamp: DateTime<Utc>) -> Self {
        Self {
            sender: login.to_lowercase(),
            display_name: login.to_string(),
            color: None,
            subscriber: false,
            turbo: false,
            prime: false,
            user_type: UserType::None,
            classification: Classification::Other,
            badge_keys: Vec::new(),
            emote_ranges: Vec::new(),
            text: "joined".to_string(),
            timestamp,
            kind: MessageKind::Join,
        }
    }

    /// Synthesize a manual/system message (connection notices and the
    /// like), displayed without sender metadata.
    pub fn manual(text: &str, timestamp: DateTime<Utc>) -> Self {
        Self {
            sender: String::new(),
            display_name: String::new(),
            color: None,
            subscriber: false,
            turbo: false,
            prime: false,
            user_type: UserType::None,
            classification: Classification::Other,
            badge_keys: Vec::new(),
            emote_ranges: Vec::new(),
            text: text.to_string(),
            timestamp,
            kind: MessageKind::Manual,
        }
    }
}

/// Nick portion of a `nick!user@host` prefix.
fn nick_of(prefix: &str) -> &str {
    prefix.split('!').next().unwrap_or(prefix)
}

/// Integer flag tag: any value above zero is true, unparsable values are
/// logged and left false.
fn flag_tag(tags: &std::collections::HashMap<String, String>, key: &str) -> bool {
    let Some(value) = tags.get(key) else {
        return false;
    };
    match value.parse::<i64>() {
        Ok(n) => n > 0,
        Err(_) => {
            tracing::warn!(tag = key, value = %value, "unparsable flag tag, leaving false");
            false
        }
    }
}

/// Extract `set/version` badge keys from the `badges` tag
/// (`subscriber/12,premium/1`), deduplicated in order.
fn parse_badge_keys(value: &str) -> Vec<String> {
    let mut keys = Vec::new();
    let mut dedupe = HashSet::new();
    for item in value.split(',') {
        let item = item.trim();
        if item.is_empty() {
            continue;
        }
        if dedupe.insert(item.to_string()) {
            keys.push(item.to_string());
        }
    }
    keys
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::tags::parse_line;

    fn event_of(line: &str) -> ChatEvent {
        ChatEvent::from_raw(parse_line(line).unwrap(), Utc::now())
    }

    #[test]
    fn normalizes_full_privmsg() {
        let event = event_of(
            "@color=#FF0000;display-name=Foo;subscriber=1;turbo=0;user-type= \
             :foo!foo@foo.tmi.twitch.tv PRIVMSG #chan :hello world",
        );
        assert_eq!(event.display_name, "Foo");
        assert_eq!(event.sender, "foo");
        assert_eq!(event.color, Some(Rgb { r: 255, g: 0, b: 0 }));
        assert!(event.subscriber);
        assert!(!event.turbo);
        assert_eq!(event.user_type, UserType::None);
        assert_eq!(event.classification, Classification::Privmsg);
        assert_eq!(event.text, "hello world");
        assert_eq!(event.kind, MessageKind::Normal);
    }

    #[test]
    fn display_name_falls_back_to_nick() {
        let event = event_of("@color= :somenick!u@h PRIVMSG #c :hi");
        assert_eq!(event.display_name, "somenick");
        assert!(event.color.is_none());
    }

    #[test]
    fn color_tolerates_prefixes() {
        assert_eq!(Rgb::from_hex("#1E90FF"), Some(Rgb { r: 0x1E, g: 0x90, b: 0xFF }));
        assert_eq!(Rgb::from_hex("0x1E90FF"), Some(Rgb { r: 0x1E, g: 0x90, b: 0xFF }));
        assert_eq!(Rgb::from_hex("1E90FF"), Some(Rgb { r: 0x1E, g: 0x90, b: 0xFF }));
        assert_eq!(Rgb::from_hex("#XYZ123"), None);
        assert_eq!(Rgb::from_hex("#FFF"), None);
    }

    #[test]
    fn bad_flag_defaults_false() {
        let event = event_of("@subscriber=yes;turbo=2 :a!a@a PRIVMSG #c :hi");
        assert!(!event.subscriber);
        assert!(event.turbo);
    }

    #[test]
    fn user_types() {
        let event = event_of("@user-type=mod :a!a@a PRIVMSG #c :hi");
        assert_eq!(event.user_type, UserType::Moderator);
        assert_eq!(event.user_type.badge_set(), Some("moderator"));

        let event = event_of("@user-type=wizard :a!a@a PRIVMSG #c :hi");
        assert_eq!(event.user_type, UserType::None);
    }

    #[test]
    fn whisper_classification_passes_through() {
        let event = event_of("@display-name=Foo :foo!f@h WHISPER bar :psst");
        assert_eq!(event.classification, Classification::Whisper);
        assert_eq!(event.text, "psst");
    }

    #[test]
    fn action_sets_kind_and_separator() {
        let event = event_of("@display-name=Foo :foo!f@h PRIVMSG #c :\u{1}ACTION waves\u{1}");
        assert_eq!(event.kind, MessageKind::Action);
        assert_eq!(event.text, "waves");
        assert_eq!(event.kind.separator(), " ");
        assert_eq!(MessageKind::Normal.separator(), ": ");
    }

    #[test]
    fn badge_keys_and_prime() {
        let event = event_of("@badges=premium/1,subscriber/12,premium/1 :a!a@a PRIVMSG #c :hi");
        assert_eq!(event.badge_keys, vec!["premium/1", "subscriber/12"]);
        assert!(event.prime);

        let event = event_of("@badges=subscriber/12 :a!a@a PRIVMSG #c :hi");
        assert!(!event.prime);
    }

    #[test]
    fn malformed_emotes_tag_is_skipped() {
        let event = event_of("@emotes=25:bad :a!a@a PRIVMSG #c :hi");
        assert!(event.emote_ranges.is_empty());
        assert_eq!(event.text, "hi");
    }

    #[test]
    fn wire_timestamp_is_used_when_present() {
        let event = event_of("@tmi-sent-ts=1500000000000 :a!a@a PRIVMSG #c :hi");
        assert_eq!(event.timestamp.timestamp_millis(), 1_500_000_000_000);
    }

    fn tag_fragments() -> Vec<String> {
        vec![
            "color=#FF0000".into(),
            "display-name=Foo".into(),
            "subscriber=1".into(),
            "turbo=0".into(),
            "user-type=mod".into(),
            "badges=premium/1".into(),
            "emotes=25:0-4".into(),
        ]
    }

    proptest! {
        // Permuting tag fragments must not change the resulting event.
        #[test]
        fn tag_order_is_irrelevant(perm in Just(tag_fragments()).prop_shuffle()) {
            let reference = event_of(
                "@color=#FF0000;display-name=Foo;subscriber=1;turbo=0;user-type=mod;\
                 badges=premium/1;emotes=25:0-4 :foo!f@h PRIVMSG #c :Kappa hello",
            );
            let line = format!("@{} :foo!f@h PRIVMSG #c :Kappa hello", perm.join(";"));
            let event = event_of(&line);

            prop_assert_eq!(event.display_name, reference.display_name);
            prop_assert_eq!(event.color, reference.color);
            prop_assert_eq!(event.subscriber, reference.subscriber);
            prop_assert_eq!(event.turbo, reference.turbo);
            prop_assert_eq!(event.prime, reference.prime);
            prop_assert_eq!(event.user_type, reference.user_type);
            prop_assert_eq!(event.badge_keys, reference.badge_keys);
            prop_assert_eq!(event.emote_ranges, reference.emote_ranges);
            prop_assert_eq!(event.text, reference.text);
        }
    }
}
