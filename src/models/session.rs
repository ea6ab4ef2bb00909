use std::fmt;

use garde::Validate;
use serde::de::{self, Deserializer, Unexpected, Visitor};
use serde::{Deserialize, Serialize};

/// Placeholder shown instead of a media link before a class airs.
pub const LIVE_SOON: &str = "Live Soon";
/// Placeholder shown instead of a media link for a cancelled class.
pub const CLASS_CANCELLED: &str = "Class Cancelled";

/// Returns `true` when `url` is one of the placeholder strings that stand in
/// for an unavailable media link.
pub fn is_sentinel(url: &str) -> bool {
    url == LIVE_SOON || url == CLASS_CANCELLED
}

/// Parses the loose boolean spellings seen in links and query strings.
pub fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

/// One recorded class, as carried inside a link.
///
/// Text fields default to empty so that a payload with missing fields still
/// decodes; [`crate::validation::session::validate_session`] rejects it
/// afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ClassSession {
    #[serde(default)]
    #[garde(length(min = 1))]
    pub class_name: String,

    #[serde(default)]
    #[garde(length(min = 1))]
    pub teacher_name: String,

    #[serde(default)]
    #[garde(length(min = 1))]
    pub thumbnail_url: String,

    /// A media URL or one of the sentinel placeholders.
    #[serde(default)]
    #[garde(length(min = 1))]
    pub class_media_url: String,

    /// A slides URL or one of the sentinel placeholders.
    #[serde(default)]
    #[garde(length(min = 1))]
    pub slides_url: String,

    /// Accepted as a JSON boolean or a `"true"`/`"false"` string.
    #[serde(default, deserialize_with = "lenient_bool")]
    #[garde(skip)]
    pub is_offline: bool,

    #[serde(default)]
    #[garde(length(min = 1))]
    pub live_at_time: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[garde(skip)]
    pub user_first_name: Option<String>,

    #[serde(default, deserialize_with = "lenient_opt_string", skip_serializing_if = "Option::is_none")]
    #[garde(skip)]
    pub user_id: Option<String>,

    /// Token creation time; the only input to expiry. Anything but a string
    /// reads as absent, which the gate treats as expired.
    #[serde(default, deserialize_with = "lenient_timestamp", skip_serializing_if = "Option::is_none")]
    #[garde(skip)]
    pub made_at: Option<String>,
}

fn lenient_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    struct FlagVisitor;

    impl<'de> Visitor<'de> for FlagVisitor {
        type Value = bool;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a boolean or a \"true\"/\"false\" string")
        }

        fn visit_bool<E: de::Error>(self, v: bool) -> Result<bool, E> {
            Ok(v)
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<bool, E> {
            parse_flag(v).ok_or_else(|| E::invalid_value(Unexpected::Str(v), &self))
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<bool, E> {
            match v {
                0 => Ok(false),
                1 => Ok(true),
                _ => Err(E::invalid_value(Unexpected::Unsigned(v), &self)),
            }
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<bool, E> {
            match v {
                0 => Ok(false),
                1 => Ok(true),
                _ => Err(E::invalid_value(Unexpected::Signed(v), &self)),
            }
        }

        fn visit_unit<E: de::Error>(self) -> Result<bool, E> {
            Ok(false)
        }

        fn visit_none<E: de::Error>(self) -> Result<bool, E> {
            Ok(false)
        }
    }

    deserializer.deserialize_any(FlagVisitor)
}

fn lenient_opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    struct IdVisitor;

    impl<'de> Visitor<'de> for IdVisitor {
        type Value = Option<String>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a string, a number or null")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            Ok(Some(v.to_string()))
        }

        fn visit_string<E: de::Error>(self, v: String) -> Result<Self::Value, E> {
            Ok(Some(v))
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
            Ok(Some(v.to_string()))
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
            Ok(Some(v.to_string()))
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }
    }

    deserializer.deserialize_any(IdVisitor)
}

fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    struct TimestampVisitor;

    impl<'de> Visitor<'de> for TimestampVisitor {
        type Value = Option<String>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a timestamp string")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            Ok(Some(v.to_string()))
        }

        fn visit_string<E: de::Error>(self, v: String) -> Result<Self::Value, E> {
            Ok(Some(v))
        }

        fn visit_bool<E: de::Error>(self, _: bool) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_i64<E: de::Error>(self, _: i64) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_u64<E: de::Error>(self, _: u64) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_f64<E: de::Error>(self, _: f64) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_seq<A: de::SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
            while seq.next_element::<de::IgnoredAny>()?.is_some() {}
            Ok(None)
        }

        fn visit_map<A: de::MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
            while map.next_entry::<de::IgnoredAny, de::IgnoredAny>()?.is_some() {}
            Ok(None)
        }
    }

    deserializer.deserialize_any(TimestampVisitor)
}

/// The unencrypted `/op` query form.
#[derive(Deserialize, Debug, Default)]
pub struct PlainParams {
    pub class_name: Option<String>,
    pub teacher_name: Option<String>,
    pub thumbnail: Option<String>,
    pub class_url: Option<String>,
    pub slides_url: Option<String>,
    pub is_offline: Option<String>,
    pub live_at_time: Option<String>,
    pub user_first_name: Option<String>,
    pub user_id: Option<String>,
    pub made_at: Option<String>,
}

impl From<PlainParams> for ClassSession {
    fn from(params: PlainParams) -> Self {
        Self {
            class_name: params.class_name.unwrap_or_default(),
            teacher_name: params.teacher_name.unwrap_or_default(),
            thumbnail_url: params.thumbnail.unwrap_or_default(),
            class_media_url: params.class_url.unwrap_or_default(),
            slides_url: params.slides_url.unwrap_or_default(),
            is_offline: params
                .is_offline
                .as_deref()
                .and_then(parse_flag)
                .unwrap_or(false),
            live_at_time: params.live_at_time.unwrap_or_default(),
            user_first_name: params.user_first_name.filter(|s| !s.is_empty()),
            user_id: params.user_id.filter(|s| !s.is_empty()),
            made_at: params.made_at.filter(|s| !s.is_empty()),
        }
    }
}
