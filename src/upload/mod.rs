mod client;
mod types;

pub use client::{ProcessClient, PROCESS_PATH};
pub use types::{
    Credentials, DownloadLink, FileSource, ProcessResponse, RenderedRow, ResultRow, SelectedFile,
    PLACEHOLDER_ROW,
};
