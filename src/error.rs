use thiserror::Error;

/// Everything that can end a submission attempt.
///
/// `Display` is the text shown to the user after "An error occurred: ".
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("Please fill in all credentials and select a file.")]
    Validation,

    /// Non-2xx response. `message` is the server's `error` field when it sent one.
    #[error("{}", http_message(.status, .message))]
    Http { status: u16, message: Option<String> },

    #[error("Failed to send request: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Failed to parse server response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Failed to read file '{name}': {source}")]
    ReadFile {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to start the background runtime: {0}")]
    Runtime(#[source] std::io::Error),

    #[error("Processing stopped before the server responded")]
    WorkerLost,
}

fn http_message(status: &u16, message: &Option<String>) -> String {
    match message {
        Some(message) => message.clone(),
        None => format!("HTTP error! status: {}", status),
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("server url must start with http:// or https://, got '{0}'")]
    InvalidServerUrl(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_error_prefers_server_message() {
        let err = ProcessError::Http {
            status: 401,
            message: Some("bad customer key".to_string()),
        };
        assert_eq!(err.to_string(), "bad customer key");
    }

    #[test]
    fn http_error_falls_back_to_status() {
        let err = ProcessError::Http {
            status: 502,
            message: None,
        };
        assert_eq!(err.to_string(), "HTTP error! status: 502");
    }
}
