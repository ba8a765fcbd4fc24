use thiserror::Error;
pub type Result<T> = std::result::Result<T, Error>;
use std::io::Error as IOError;

#[derive(Error, Debug, PartialEq)]
pub enum Error {
    // ErrChannelSend the queue worker is gone, nothing can be submitted
    #[error("task queue closed")]
    ErrChannelSend,
    // ErrBadMessage inbound frame that decodes to no known intent
    #[error("malformed signaling message")]
    ErrBadMessage,
}

pub struct ConfigError {
    pub value: ConfigErrorValue,
}

pub enum ConfigErrorValue {
    IOError(IOError),
    ParseError(toml::de::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.value {
            ConfigErrorValue::IOError(err) => write!(f, "config io error: {}", err),
            ConfigErrorValue::ParseError(err) => write!(f, "config parse error: {}", err),
        }
    }
}

impl From<IOError> for ConfigError {
    fn from(error: IOError) -> Self {
        ConfigError {
            value: ConfigErrorValue::IOError(error),
        }
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(error: toml::de::Error) -> Self {
        ConfigError {
            value: ConfigErrorValue::ParseError(error),
        }
    }
}
