use crate::error::{PdfSplitterError, Result};
use crate::services::document::PdfDocument;
use crate::types::{SourceInfo, SourceType};
use std::path::Path;
use tokio::fs;
use tracing::info;
use url::Url;

pub struct ContentFetcher;

impl ContentFetcher {
    pub async fn fetch_source(source: &str) -> Result<(Vec<u8>, SourceInfo)> {
        if Self::is_url(source) {
            Self::fetch_from_url(source).await
        } else {
            Self::fetch_from_file(source).await
        }
    }

    /// Fetches `source` and parses it as a PDF.
    pub async fn load_document(source: &str) -> Result<(PdfDocument, SourceInfo)> {
        let (bytes, info) = Self::fetch_source(source).await?;
        let document = PdfDocument::from_bytes(&bytes, info.location.clone())?;
        Ok((document, info))
    }

    async fn fetch_from_url(url: &str) -> Result<(Vec<u8>, SourceInfo)> {
        info!("Fetching PDF from URL: {}", url);

        let parsed_url = Url::parse(url)?;
        let client = reqwest::Client::new();
        let response = client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(PdfSplitterError::HttpStatus {
                status: response.status().as_u16(),
            });
        }

        let bytes = response.bytes().await?.to_vec();
        let info = SourceInfo {
            filename: Self::extract_filename_from_url(&parsed_url),
            location: url.to_string(),
            source_type: SourceType::Url,
            size_bytes: bytes.len() as u64,
            fetched_at: chrono::Utc::now().to_rfc3339(),
        };

        Ok((bytes, info))
    }

    async fn fetch_from_file(file_path: &str) -> Result<(Vec<u8>, SourceInfo)> {
        info!("Reading file: {}", file_path);

        let path = Path::new(file_path);

        if !path.is_file() {
            return Err(PdfSplitterError::FileNotFound {
                path: file_path.to_string(),
            });
        }

        let bytes = fs::read(path).await?;
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown.pdf")
            .to_string();

        let info = SourceInfo {
            filename,
            location: file_path.to_string(),
            source_type: SourceType::LocalFile,
            size_bytes: bytes.len() as u64,
            fetched_at: chrono::Utc::now().to_rfc3339(),
        };

        Ok((bytes, info))
    }

    pub fn is_url(source: &str) -> bool {
        source.starts_with("http://") || source.starts_with("https://")
    }

    fn extract_filename_from_url(url: &Url) -> String {
        url.path_segments()
            .and_then(|segments| segments.last())
            .and_then(|name| if name.is_empty() { None } else { Some(name) })
            .unwrap_or("downloaded.pdf")
            .to_string()
    }
}
