use crate::error::ProcessError;
use derivative::Derivative;
use serde::Deserialize;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;

pub const PLACEHOLDER_ROW: &str = "Processing finished, but no result data was returned.";

#[derive(Debug, Clone)]
pub enum FileSource {
    Path(PathBuf),
    /// Drops delivered without a filesystem path carry their bytes.
    Bytes(Arc<[u8]>),
}

#[derive(Debug, Clone)]
pub struct SelectedFile {
    pub name: String,
    pub source: FileSource,
    size: Option<u64>,
}

impl SelectedFile {
    pub fn from_path(path: PathBuf) -> Self {
        let name = path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();
        let size = std::fs::metadata(&path).ok().map(|m| m.len());
        Self {
            name,
            source: FileSource::Path(path),
            size,
        }
    }

    pub fn from_bytes(name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        let bytes = bytes.into();
        Self {
            name: name.into(),
            size: Some(bytes.len() as u64),
            source: FileSource::Bytes(bytes),
        }
    }

    /// Size at selection time; `None` if the file could not be inspected.
    pub fn size(&self) -> Option<u64> {
        self.size
    }

    pub async fn load(&self) -> Result<Vec<u8>, ProcessError> {
        match &self.source {
            FileSource::Path(path) => {
                tokio::fs::read(path)
                    .await
                    .map_err(|source| ProcessError::ReadFile {
                        name: self.name.clone(),
                        source,
                    })
            }
            FileSource::Bytes(bytes) => Ok(bytes.to_vec()),
        }
    }
}

#[derive(Derivative, Clone, Default)]
#[derivative(Debug)]
pub struct Credentials {
    pub customer_key: String,
    pub username: String,
    #[derivative(Debug = "ignore")]
    pub password: String,
}

impl Credentials {
    /// Same rule as an HTML `required` input: any non-empty value passes.
    pub fn is_complete(&self) -> bool {
        !self.customer_key.is_empty() && !self.username.is_empty() && !self.password.is_empty()
    }
}

/// One processed input record as reported by the backend. Any field may be
/// missing, null, or of an unexpected scalar type.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResultRow {
    #[serde(default)]
    pub row_number: Option<Value>,
    #[serde(default)]
    pub practice_name: Option<Value>,
    #[serde(default)]
    pub patient_id: Option<Value>,
    #[serde(default)]
    pub results: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedRow {
    pub row_number: String,
    pub practice_name: String,
    pub patient_id: String,
    pub outcome: String,
}

impl ResultRow {
    pub fn render(&self) -> RenderedRow {
        RenderedRow {
            row_number: text_or(&self.row_number, "N/A"),
            practice_name: text_or(&self.practice_name, ""),
            patient_id: text_or(&self.patient_id, ""),
            outcome: text_or(&self.results, "Success"),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProcessResponse {
    #[serde(default)]
    pub results: Option<Vec<ResultRow>>,
    #[serde(default)]
    pub total_rows: Option<Value>,
    #[serde(default)]
    pub encounters_created: Option<Value>,
    #[serde(default)]
    pub payments_posted: Option<Value>,
    #[serde(default)]
    pub failed_rows: Option<Value>,
    #[serde(default)]
    pub server_filename: Option<Value>,
    #[serde(default)]
    pub download_filename: Option<Value>,
}

impl ProcessResponse {
    pub fn rendered_rows(&self) -> Vec<RenderedRow> {
        self.results
            .iter()
            .flatten()
            .map(ResultRow::render)
            .collect()
    }

    /// Counters are echoed as sent; nothing is recomputed locally.
    pub fn summary(&self) -> String {
        format!(
            "Processing complete! Total Rows: {}, Encounters Created: {}, Payments Posted: {}, Error Rows: {}.",
            counter_text(&self.total_rows),
            counter_text(&self.encounters_created),
            counter_text(&self.payments_posted),
            counter_text(&self.failed_rows),
        )
    }

    pub fn download_link(&self, server_url: &str) -> Option<DownloadLink> {
        let server_filename = Some(text_or(&self.server_filename, "")).filter(|s| !s.is_empty())?;
        let download_filename =
            Some(text_or(&self.download_filename, "")).filter(|s| !s.is_empty())?;
        Some(DownloadLink::new(server_url, &server_filename, &download_filename))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadLink {
    pub url: String,
    pub file_name: String,
}

impl DownloadLink {
    pub fn new(server_url: &str, server_filename: &str, download_filename: &str) -> Self {
        let url = format!(
            "{}/api/download_processed_file/{}?download_name={}",
            server_url.trim_end_matches('/'),
            server_filename,
            urlencoding::encode(download_filename)
        );
        Self {
            url,
            file_name: download_filename.to_string(),
        }
    }
}

/// Error body of a non-2xx response.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
}

fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::String(s) => s.is_empty(),
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::Array(_) | Value::Object(_) => false,
    }
}

fn text_or(value: &Option<Value>, fallback: &str) -> String {
    match value {
        Some(v) if !is_falsy(v) => scalar_text(v),
        _ => fallback.to_string(),
    }
}

fn counter_text(value: &Option<Value>) -> String {
    match value {
        None | Some(Value::Null) => "N/A".to_string(),
        Some(v) => scalar_text(v),
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn response(value: Value) -> ProcessResponse {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn row_fallbacks_apply_to_missing_and_empty_fields() {
        let row: ResultRow = serde_json::from_value(json!({
            "row_number": 3,
            "practice_name": "Acme",
            "patient_id": ""
        }))
        .unwrap();

        assert_eq!(
            row.render(),
            RenderedRow {
                row_number: "3".to_string(),
                practice_name: "Acme".to_string(),
                patient_id: String::new(),
                outcome: "Success".to_string(),
            }
        );
    }

    #[test]
    fn row_with_nulls_and_zero_uses_fallbacks() {
        let row: ResultRow = serde_json::from_value(json!({
            "row_number": 0,
            "practice_name": null,
            "patient_id": null,
            "results": null
        }))
        .unwrap();
        let rendered = row.render();

        assert_eq!(rendered.row_number, "N/A");
        assert_eq!(rendered.practice_name, "");
        assert_eq!(rendered.outcome, "Success");
    }

    #[test]
    fn row_keeps_string_row_numbers_and_outcomes() {
        let row: ResultRow = serde_json::from_value(json!({
            "row_number": "12",
            "patient_id": 4471,
            "results": "Payment failed: invalid amount"
        }))
        .unwrap();
        let rendered = row.render();

        assert_eq!(rendered.row_number, "12");
        assert_eq!(rendered.patient_id, "4471");
        assert_eq!(rendered.outcome, "Payment failed: invalid amount");
    }

    #[test]
    fn summary_echoes_counters() {
        let data = response(json!({
            "results": [],
            "total_rows": 10,
            "encounters_created": 7,
            "payments_posted": 6,
            "failed_rows": 3
        }));
        assert_eq!(
            data.summary(),
            "Processing complete! Total Rows: 10, Encounters Created: 7, Payments Posted: 6, Error Rows: 3."
        );
    }

    #[test]
    fn summary_marks_missing_counters() {
        let data = response(json!({ "total_rows": 2 }));
        assert_eq!(
            data.summary(),
            "Processing complete! Total Rows: 2, Encounters Created: N/A, Payments Posted: N/A, Error Rows: N/A."
        );
    }

    #[test]
    fn download_link_encodes_name_and_keeps_server_name() {
        let data = response(json!({
            "server_filename": "abc123.csv",
            "download_filename": "report jan.csv"
        }));
        let link = data.download_link("http://localhost:5000/").unwrap();

        assert_eq!(
            link.url,
            "http://localhost:5000/api/download_processed_file/abc123.csv?download_name=report%20jan.csv"
        );
        assert_eq!(link.file_name, "report jan.csv");
    }

    #[test]
    fn download_link_requires_both_names() {
        let only_server = response(json!({ "server_filename": "abc123.csv" }));
        let only_download = response(json!({ "download_filename": "out.csv" }));
        let empty_name = response(json!({ "server_filename": "", "download_filename": "out.csv" }));

        assert!(only_server.download_link("http://h").is_none());
        assert!(only_download.download_link("http://h").is_none());
        assert!(empty_name.download_link("http://h").is_none());
    }

    #[test]
    fn numeric_server_filename_still_arms_download() {
        let data: ProcessResponse = serde_json::from_slice(
            br#"{"results": [], "server_filename": 42, "download_filename": "out file.csv"}"#,
        )
        .unwrap();
        let link = data.download_link("http://h").unwrap();

        assert_eq!(
            link.url,
            "http://h/api/download_processed_file/42?download_name=out%20file.csv"
        );
    }

    #[test]
    fn null_filenames_leave_download_disarmed() {
        let data = response(json!({ "server_filename": null, "download_filename": "x.csv" }));
        assert!(data.download_link("http://h").is_none());
    }

    #[test]
    fn missing_results_render_no_rows() {
        assert!(response(json!({})).rendered_rows().is_empty());
    }

    #[test]
    fn credentials_debug_hides_password() {
        let creds = Credentials {
            customer_key: "ck".to_string(),
            username: "sam".to_string(),
            password: "hunter2".to_string(),
        };
        assert!(!format!("{:?}", creds).contains("hunter2"));
        assert!(creds.is_complete());
    }

    #[test]
    fn whitespace_credentials_count_as_present() {
        let creds = Credentials {
            customer_key: " ".to_string(),
            username: "sam".to_string(),
            password: "x".to_string(),
        };
        assert!(creds.is_complete());
        assert!(!Credentials::default().is_complete());
    }

    #[tokio::test]
    async fn load_reads_in_memory_bytes() {
        let file = SelectedFile::from_bytes("charges.csv", b"a,b\n1,2\n".to_vec());
        assert_eq!(file.load().await.unwrap(), b"a,b\n1,2\n");
        assert_eq!(file.size(), Some(8));
    }

    #[tokio::test]
    async fn load_reports_missing_file() {
        let file = SelectedFile::from_path(PathBuf::from("/definitely/not/here.csv"));
        assert_eq!(file.name, "here.csv");
        assert!(matches!(
            file.load().await,
            Err(ProcessError::ReadFile { .. })
        ));
    }
}
