//! Decoder configuration.
use std::{borrow::Cow, env::var, fmt};

use crate::decode::{DecodeError, Limit};

const DEFAULT_MAX_DEPTH: usize = 64;

/// Decoder limits.
///
/// Decoding is bounded by input size, these limits let callers put a ceiling
/// on it before any work is done.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    pub(crate) max_depth: usize,
    pub(crate) max_payload: Option<usize>,
}

impl Config {
    /// Retrieve configuration from environment variable.
    ///
    /// It reads:
    /// - `PGCELL_MAX_DEPTH`
    /// - `PGCELL_MAX_PAYLOAD`
    ///
    /// Missing or unparsable variable fallback to default value.
    pub fn from_env() -> Config {
        macro_rules! env {
            ($name:literal,$def:expr) => {
                match var($name).ok().map(|e|e.trim().parse()) {
                    Some(Ok(ok)) => Some(ok),
                    Some(Err(_)) | None => $def,
                }
            };
        }

        Self {
            max_depth: env!("PGCELL_MAX_DEPTH", None).unwrap_or(DEFAULT_MAX_DEPTH).max(1),
            max_payload: env!("PGCELL_MAX_PAYLOAD", None),
        }
    }

    /// Parse config from space separated `key=value` pairs.
    ///
    /// ```
    /// let config = pgcell::Config::parse("max_depth=8 max_payload=1024").unwrap();
    /// assert_eq!(config.get_max_depth(), 8);
    /// assert_eq!(config.get_max_payload(), Some(1024));
    /// ```
    pub fn parse(input: &str) -> Result<Config, ParseError> {
        let mut config = Config::default();

        for pair in input.split_ascii_whitespace() {
            let Some((key, value)) = pair.split_once('=') else {
                return Err(ParseError { reason: format!("expected `key=value`, found {pair:?}").into() })
            };

            macro_rules! number {
                () => {
                    match value.parse::<usize>() {
                        Ok(ok) => ok,
                        Err(_) => return Err(ParseError {
                            reason: format!("invalid number for `{key}`: {value:?}").into()
                        }),
                    }
                };
            }

            match key {
                "max_depth" => config.max_depth = number!(),
                "max_payload" => config.max_payload = Some(number!()),
                _ => return Err(ParseError { reason: format!("unknown key `{key}`").into() }),
            }
        }

        if config.max_depth == 0 {
            return Err(ParseError { reason: "`max_depth` must be at least 1".into() })
        }

        Ok(config)
    }

    /// Set maximum nesting of arrays, composites and documents.
    ///
    /// Zero is treated as one.
    pub fn max_depth(mut self, value: usize) -> Self {
        self.max_depth = value.max(1);
        self
    }

    /// Set maximum cell size in bytes.
    pub fn max_payload(mut self, value: usize) -> Self {
        self.max_payload = Some(value);
        self
    }

    /// Returns maximum nesting.
    pub fn get_max_depth(&self) -> usize {
        self.max_depth
    }

    /// Returns maximum cell size, [`None`] means unlimited.
    pub fn get_max_payload(&self) -> Option<usize> {
        self.max_payload
    }

    pub(crate) fn check_payload(&self, len: usize) -> Result<(), DecodeError> {
        match self.max_payload {
            Some(max) if len > max => Err(DecodeError::Limit { offset: max, limit: Limit::Payload(max) }),
            _ => Ok(()),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self { max_depth: DEFAULT_MAX_DEPTH, max_payload: None }
    }
}

impl std::str::FromStr for Config {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Nesting tracker shared by one decode call.
#[derive(Debug)]
pub(crate) struct Nesting {
    depth: usize,
    max: usize,
}

impl Nesting {
    pub fn new(config: &Config) -> Self {
        Self { depth: 0, max: config.max_depth }
    }

    /// Enter one level, `offset` is where the level opens.
    pub fn enter(&mut self, offset: usize) -> Result<(), DecodeError> {
        if self.depth >= self.max {
            return Err(DecodeError::Limit { offset, limit: Limit::Depth(self.max) });
        }
        self.depth += 1;
        Ok(())
    }

    pub fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }
}

impl Default for Nesting {
    fn default() -> Self {
        Self::new(&Config::default())
    }
}

/// Error when parsing config.
pub struct ParseError {
    pub(crate) reason: Cow<'static,str>,
}

impl std::error::Error for ParseError { }

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            return f.write_str(&self.reason)
        }
        write!(f, "failed to parse config: {}", self.reason)
    }
}

impl fmt::Debug for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{self}\"")
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parse_pairs() {
        let config = Config::parse("max_payload=65536  max_depth=3").unwrap();
        assert_eq!(config.max_depth, 3);
        assert_eq!(config.max_payload, Some(65536));
        assert_eq!(Config::parse("").unwrap(), Config::default());
    }

    #[test]
    fn parse_errors() {
        assert!(Config::parse("max_depth").is_err());
        assert!(Config::parse("max_depth=deep").is_err());
        assert!(Config::parse("max_depth=0").is_err());
        assert!(Config::parse("depth=2").is_err());
    }

    #[test]
    fn nesting_limit() {
        let mut nest = Nesting::new(&Config::default().max_depth(2));
        nest.enter(0).unwrap();
        nest.enter(1).unwrap();
        let err = nest.enter(5).unwrap_err();
        assert!(matches!(err, DecodeError::Limit { offset: 5, limit: Limit::Depth(2) }));
        nest.leave();
        nest.enter(6).unwrap();
    }

    #[test]
    fn payload_limit() {
        let config = Config::default().max_payload(4);
        assert!(config.check_payload(4).is_ok());
        assert!(config.check_payload(5).is_err());
    }
}
