use crate::error::ProcessError;
use crate::progress::TransferCounter;
use crate::upload::types::{Credentials, ErrorBody, ProcessResponse, SelectedFile};
use bytes::Bytes;
use futures_util::StreamExt;
use reqwest::multipart::{Form, Part};
use reqwest::Body;
use tracing::{debug, info, warn};

pub const PROCESS_PATH: &str = "/api/process";

const UPLOAD_CHUNK_SIZE: usize = 64 * 1024;

/// Talks to the charge processing backend.
#[derive(Clone)]
pub struct ProcessClient {
    server_url: String,
    http: reqwest::Client,
}

impl ProcessClient {
    pub fn new(server_url: impl Into<String>) -> Self {
        Self {
            server_url: server_url.into().trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
        }
    }

    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    pub fn process_url(&self) -> String {
        format!("{}{}", self.server_url, PROCESS_PATH)
    }

    /// Sends one multipart submission and decodes the result.
    ///
    /// When `counter` is given, the file part is streamed in chunks and each
    /// chunk is counted as it is handed to the connection.
    pub async fn process(
        &self,
        file: &SelectedFile,
        credentials: &Credentials,
        counter: Option<TransferCounter>,
    ) -> Result<ProcessResponse, ProcessError> {
        let content = file.load().await?;
        let total = content.len() as u64;
        info!("submitting '{}' ({} bytes) to {}", file.name, total, self.process_url());

        let part = match counter {
            Some(counter) => {
                let stream = futures_util::stream::iter(upload_chunks(Bytes::from(content)))
                    .map(Ok::<_, std::io::Error>)
                    .inspect(move |chunk| {
                        if let Ok(chunk) = chunk {
                            counter.add(chunk.len() as u64);
                        }
                    });
                Part::stream_with_length(Body::wrap_stream(stream), total)
            }
            None => Part::bytes(content),
        }
        .file_name(file.name.clone());

        let form = Form::new()
            .part("file", part)
            .text("customer_key", credentials.customer_key.clone())
            .text("username", credentials.username.clone())
            .text("password", credentials.password.clone());

        let response = self
            .http
            .post(self.process_url())
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?;
        debug!("process response: status {}, {} bytes", status, body.len());

        if !status.is_success() {
            let message = serde_json::from_slice::<ErrorBody>(&body)
                .ok()
                .and_then(|b| b.error)
                .filter(|m| !m.is_empty());
            warn!("processing rejected with status {}", status.as_u16());
            return Err(ProcessError::Http {
                status: status.as_u16(),
                message,
            });
        }

        let data: ProcessResponse = serde_json::from_slice(&body)?;
        info!(
            "processing finished with {} result rows",
            data.results.as_ref().map_or(0, Vec::len)
        );
        Ok(data)
    }
}

/// Splits the body into views of one shared buffer; no chunk is copied.
fn upload_chunks(content: Bytes) -> Vec<Bytes> {
    (0..content.len())
        .step_by(UPLOAD_CHUNK_SIZE)
        .map(|start| content.slice(start..(start + UPLOAD_CHUNK_SIZE).min(content.len())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upload_chunks_share_the_source_buffer() {
        let content = Bytes::from(vec![7u8; UPLOAD_CHUNK_SIZE * 2 + 10]);
        let base = content.as_ptr() as usize;
        let chunks = upload_chunks(content);

        let lens: Vec<usize> = chunks.iter().map(Bytes::len).collect();
        assert_eq!(lens, [UPLOAD_CHUNK_SIZE, UPLOAD_CHUNK_SIZE, 10]);
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.as_ptr() as usize, base + i * UPLOAD_CHUNK_SIZE);
        }
    }

    #[test]
    fn empty_body_has_no_chunks() {
        assert!(upload_chunks(Bytes::new()).is_empty());
    }

    #[test]
    fn process_url_joins_without_double_slash() {
        let client = ProcessClient::new("http://localhost:5000/");
        assert_eq!(client.server_url(), "http://localhost:5000");
        assert_eq!(client.process_url(), "http://localhost:5000/api/process");
    }

    #[tokio::test]
    async fn unreachable_server_is_a_transport_error() {
        // Port 9 (discard) on localhost is closed in test environments.
        let client = ProcessClient::new("http://127.0.0.1:9");
        let file = SelectedFile::from_bytes("charges.csv", b"x".to_vec());
        let credentials = Credentials {
            customer_key: "ck".to_string(),
            username: "u".to_string(),
            password: "p".to_string(),
        };

        let err = client.process(&file, &credentials, None).await.unwrap_err();
        assert!(matches!(err, ProcessError::Transport(_)));
    }
}
