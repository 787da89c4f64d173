//! Portfolio persistence layer
//!
//! Holds the current portfolio and a single "previous" snapshot slot.
//! Writing the previous snapshot replaces it atomically; there is no history.

use crate::error::OrchestrationError;
use crate::models::PortfolioSnapshot;
use crate::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

/// Trait for portfolio persistence
#[async_trait::async_trait]
pub trait PortfolioStore: Send + Sync {
    /// Current portfolio configuration, `None` when none exists yet.
    async fn load_current(&self) -> Result<Option<PortfolioSnapshot>>;
    /// Last persisted snapshot, `None` if never written.
    async fn load_previous(&self) -> Result<Option<PortfolioSnapshot>>;
    /// Replace the previous snapshot.
    async fn save_previous(&self, snapshot: &PortfolioSnapshot) -> Result<()>;
}

/// On-disk shape of both files: `{"portfolio": {...}}`.
#[derive(Debug, Serialize, Deserialize)]
struct PortfolioFile {
    portfolio: PortfolioSnapshot,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    saved_at: Option<DateTime<Utc>>,
}

/// JSON-file store: a portfolio config file and a daily log file.
pub struct JsonFilePortfolioStore {
    portfolio_path: PathBuf,
    previous_path: PathBuf,
}

impl JsonFilePortfolioStore {
    pub fn new(portfolio_path: impl Into<PathBuf>, previous_path: impl Into<PathBuf>) -> Self {
        Self {
            portfolio_path: portfolio_path.into(),
            previous_path: previous_path.into(),
        }
    }

    async fn read_snapshot(path: &Path) -> Result<Option<PortfolioSnapshot>> {
        let raw = match tokio::fs::read_to_string(path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "Portfolio file not found");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let file: PortfolioFile = serde_json::from_str(&raw).map_err(|e| {
            OrchestrationError::StateError(format!("invalid portfolio file {}: {}", path.display(), e))
        })?;

        Ok(Some(file.portfolio))
    }
}

#[async_trait::async_trait]
impl PortfolioStore for JsonFilePortfolioStore {
    async fn load_current(&self) -> Result<Option<PortfolioSnapshot>> {
        Self::read_snapshot(&self.portfolio_path).await
    }

    async fn load_previous(&self) -> Result<Option<PortfolioSnapshot>> {
        Self::read_snapshot(&self.previous_path).await
    }

    async fn save_previous(&self, snapshot: &PortfolioSnapshot) -> Result<()> {
        let file = PortfolioFile {
            portfolio: snapshot.clone(),
            saved_at: Some(Utc::now()),
        };
        let body = serde_json::to_vec_pretty(&file)?;

        // Temp file in the same directory so the rename stays on one filesystem.
        let file_name = self
            .previous_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "daily_log.json".to_string());
        let tmp_path = self
            .previous_path
            .with_file_name(format!(".{}.{}.tmp", file_name, Uuid::new_v4()));

        if let Err(e) = tokio::fs::write(&tmp_path, &body).await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(e.into());
        }
        if let Err(e) = tokio::fs::rename(&tmp_path, &self.previous_path).await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(e.into());
        }

        info!(
            path = %self.previous_path.display(),
            tickers = snapshot.len(),
            "Previous portfolio snapshot saved"
        );
        Ok(())
    }
}

/// In-memory store for development and tests
pub struct InMemoryPortfolioStore {
    current: Arc<RwLock<Option<PortfolioSnapshot>>>,
    previous: Arc<RwLock<Option<PortfolioSnapshot>>>,
}

impl InMemoryPortfolioStore {
    pub fn new(current: Option<PortfolioSnapshot>, previous: Option<PortfolioSnapshot>) -> Self {
        Self {
            current: Arc::new(RwLock::new(current)),
            previous: Arc::new(RwLock::new(previous)),
        }
    }

    pub async fn set_current(&self, snapshot: PortfolioSnapshot) {
        *self.current.write().await = Some(snapshot);
    }
}

impl Default for InMemoryPortfolioStore {
    fn default() -> Self {
        Self::new(None, None)
    }
}

#[async_trait::async_trait]
impl PortfolioStore for InMemoryPortfolioStore {
    async fn load_current(&self) -> Result<Option<PortfolioSnapshot>> {
        Ok(self.current.read().await.clone())
    }

    async fn load_previous(&self) -> Result<Option<PortfolioSnapshot>> {
        Ok(self.previous.read().await.clone())
    }

    async fn save_previous(&self, snapshot: &PortfolioSnapshot) -> Result<()> {
        *self.previous.write().await = Some(snapshot.clone());
        Ok(())
    }
}
