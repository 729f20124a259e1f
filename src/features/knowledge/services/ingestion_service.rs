use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::modules::knowledge::{KnowledgeError, KnowledgeStore};

const MARKER_FILE: &str = ".ingested";

#[derive(Debug, Error)]
pub enum IngestionError {
    #[error("no knowledge sources configured")]
    NoSources,

    #[error(transparent)]
    Knowledge(#[from] KnowledgeError),

    #[error("ingestion marker at {path}: {source}")]
    Marker {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum IngestOutcome {
    Ingested { sources: usize },
    /// A previous run left its marker; `ingested_at` is `None` if it was unreadable
    Skipped { ingested_at: Option<DateTime<Utc>> },
}

/// Contents of the marker file written after a successful ingestion
#[derive(Debug, Serialize, Deserialize)]
struct IngestionMarker {
    sources: Vec<String>,
    ingested_at: DateTime<Utc>,
}

/// Feeds the configured documents to the knowledge store at most once per deployment
pub struct IngestionService {
    store: Arc<dyn KnowledgeStore>,
    dir: PathBuf,
    sources: Vec<String>,
}

impl IngestionService {
    pub fn new(store: Arc<dyn KnowledgeStore>, dir: impl Into<PathBuf>, sources: Vec<String>) -> Self {
        Self {
            store,
            dir: dir.into(),
            sources,
        }
    }

    pub fn marker_path(&self) -> PathBuf {
        self.dir.join(MARKER_FILE)
    }

    /// Ingest unless a marker from an earlier run exists; `force` ignores the marker
    pub async fn ingest_once(&self, force: bool) -> Result<IngestOutcome, IngestionError> {
        let marker_path = self.marker_path();

        if !force {
            if let Some(ingested_at) = read_marker(&marker_path).await? {
                tracing::info!(
                    "Knowledge base already ingested ({}), skipping",
                    ingested_at.map_or_else(|| "unknown time".to_string(), |at| at.to_rfc3339())
                );
                return Ok(IngestOutcome::Skipped { ingested_at });
            }
        }

        if self.sources.is_empty() {
            return Err(IngestionError::NoSources);
        }

        tracing::info!("Ingesting {} legal documents", self.sources.len());
        self.store.ingest(&self.sources).await?;

        let marker = IngestionMarker {
            sources: self.sources.clone(),
            ingested_at: Utc::now(),
        };
        write_marker(&self.dir, &marker_path, &marker).await?;

        tracing::info!("Knowledge base ingestion complete");
        Ok(IngestOutcome::Ingested {
            sources: self.sources.len(),
        })
    }
}

/// `None` when there is no marker, `Some(None)` when it exists but cannot be parsed
async fn read_marker(path: &Path) -> Result<Option<Option<DateTime<Utc>>>, IngestionError> {
    let contents = match tokio::fs::read(path).await {
        Ok(contents) => contents,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(IngestionError::Marker {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    match serde_json::from_slice::<IngestionMarker>(&contents) {
        Ok(marker) => Ok(Some(Some(marker.ingested_at))),
        Err(e) => {
            tracing::warn!("Unreadable ingestion marker {}: {}", path.display(), e);
            Ok(Some(None))
        }
    }
}

async fn write_marker(
    dir: &Path,
    path: &Path,
    marker: &IngestionMarker,
) -> Result<(), IngestionError> {
    let marker_error = |source| IngestionError::Marker {
        path: path.to_path_buf(),
        source,
    };

    tokio::fs::create_dir_all(dir).await.map_err(marker_error)?;
    let body = serde_json::to_vec_pretty(marker).map_err(|e| marker_error(e.into()))?;
    tokio::fs::write(path, body).await.map_err(marker_error)
}
