use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::data::provider::DataError;

/// Which BitMEX archive stream to pull.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Channel {
    /// Trade ticks.
    #[serde(rename = "trades", alias = "trade")]
    Trade,
    /// Top-of-book bid/ask quotes.
    #[serde(rename = "quotes", alias = "quote")]
    Quote,
}

impl Channel {
    pub const ALL: [Channel; 2] = [Channel::Trade, Channel::Quote];

    /// Path segment used by the public archive bucket: `data/{remote_name}/`.
    pub fn remote_name(self) -> &'static str {
        match self {
            Channel::Trade => "trade",
            Channel::Quote => "quote",
        }
    }

    /// Local directory name and report key (`trades`, `quotes`).
    pub fn plural(self) -> &'static str {
        match self {
            Channel::Trade => "trades",
            Channel::Quote => "quotes",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.plural())
    }
}

impl FromStr for Channel {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "trade" | "trades" => Ok(Channel::Trade),
            "quote" | "quotes" => Ok(Channel::Quote),
            other => Err(DataError::UnknownChannel(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_singular_and_plural() {
        assert_eq!("trade".parse::<Channel>().unwrap(), Channel::Trade);
        assert_eq!("Trades".parse::<Channel>().unwrap(), Channel::Trade);
        assert_eq!("quotes".parse::<Channel>().unwrap(), Channel::Quote);
        assert!("bars".parse::<Channel>().is_err());
    }

    #[test]
    fn names() {
        assert_eq!(Channel::Trade.remote_name(), "trade");
        assert_eq!(Channel::Quote.plural(), "quotes");
        assert_eq!(Channel::Quote.to_string(), "quotes");
    }

    #[test]
    fn serde_uses_plural_and_accepts_singular() {
        assert_eq!(serde_json::to_string(&Channel::Trade).unwrap(), "\"trades\"");
        assert_eq!(serde_json::to_string(&Channel::Quote).unwrap(), "\"quotes\"");
        let c: Channel = serde_json::from_str("\"quote\"").unwrap();
        assert_eq!(c, Channel::Quote);
    }

    #[test]
    fn unknown_channel_names_the_input() {
        let err = "funding".parse::<Channel>().unwrap_err();
        assert!(matches!(&err, DataError::UnknownChannel(name) if name == "funding"));
        assert_eq!(err.to_string(), "unknown channel 'funding' (expected trades or quotes)");
    }
}
