//! Snowflake-style identifiers.
//!
//! Every identifier is a non-zero `u64`. They serialize as JSON strings (the
//! platform's own wire convention, which avoids precision loss in JSON
//! readers that parse numbers as doubles) and deserialize from either a
//! string or a number.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

use crate::error::{Error, Result};

macro_rules! snowflake {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(u64);

        impl $name {
            /// Wrap a raw id. Returns `None` for zero, which the platform never issues.
            #[must_use]
            pub const fn new(raw: u64) -> Option<Self> {
                if raw == 0 { None } else { Some(Self(raw)) }
            }

            #[must_use]
            pub const fn get(self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self> {
                s.trim()
                    .parse::<u64>()
                    .ok()
                    .and_then(Self::new)
                    .ok_or_else(|| Error::invalid_id($kind, s))
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
                serializer.collect_str(self)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
                deserializer.deserialize_any(SnowflakeVisitor($kind)).map(Self)
            }
        }
    };
}

snowflake!(
    /// A community (guild) the bot is a member of.
    GuildId,
    "guild"
);
snowflake!(
    /// Any channel: voice, text or category.
    ChannelId,
    "channel"
);
snowflake!(
    /// A user in the context of a guild.
    MemberId,
    "member"
);

struct SnowflakeVisitor(&'static str);

impl de::Visitor<'_> for SnowflakeVisitor {
    type Value = u64;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "a non-zero {} id as a string or integer", self.0)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<u64, E> {
        if v == 0 {
            return Err(E::custom(Error::invalid_id(self.0, "0")));
        }
        Ok(v)
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<u64, E> {
        u64::try_from(v)
            .map_err(|_| E::custom(Error::invalid_id(self.0, v.to_string())))
            .and_then(|v| self.visit_u64(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<u64, E> {
        v.trim()
            .parse::<u64>()
            .map_err(|_| E::custom(Error::invalid_id(self.0, v)))
            .and_then(|v| self.visit_u64(v))
    }
}
