use thiserror::Error;

pub type Result<T> = std::result::Result<T, RouterError>;

#[derive(Error, Debug)]
pub enum RouterError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Cannot resolve host '{host}' for cache {cache_id}")]
    UnresolvableHost { cache_id: String, host: String },

    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    #[error("TLS error: {0}")]
    Tls(#[from] rustls::Error),
}

impl From<::config::ConfigError> for RouterError {
    fn from(err: ::config::ConfigError) -> Self {
        RouterError::Config(err.to_string())
    }
}
