//! Fingerprint-gated memoization of an operation
//!
//! `CacheGate` remembers the fingerprint of an operation's inputs together
//! with the output of its last successful run. The operation is skipped while
//! the fingerprint is unchanged and the recorded output is intact. A record is
//! written only after the operation returns `Ok`, so a failed run leaves the
//! previous record (or its absence) exactly as it was and the next run
//! retries.

use crate::cache::fingerprint::{Fingerprint, Fingerprinted};
use crate::error::{JsDepsError, JsDepsResult};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// Version stamped into every record
const TOOL_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Output of a gated operation that can be persisted in a record
pub trait CachedOutput: Serialize + DeserializeOwned + Send {
    /// Whether a recorded output can still be served. Outputs that point at
    /// files should check those files still exist.
    fn is_intact(&self) -> bool {
        true
    }
}

/// Persisted result of the last successful run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheRecord<T> {
    pub fingerprint: Fingerprint,
    pub output: T,
    pub recorded_at: DateTime<Utc>,
    pub tool_version: String,
}

/// How a record relates to the current inputs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheState {
    /// No record (first run, cleared, or unreadable)
    Absent,
    /// Inputs changed since the record was written
    Changed,
    /// Record written by another tool version
    Outdated,
    /// Inputs unchanged but recorded outputs were removed
    OutputsMissing,
    /// Record can be served as-is
    Fresh,
}

impl CacheState {
    pub fn is_fresh(&self) -> bool {
        matches!(self, Self::Fresh)
    }
}

impl fmt::Display for CacheState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Absent => write!(f, "absent"),
            Self::Changed => write!(f, "changed"),
            Self::Outdated => write!(f, "outdated"),
            Self::OutputsMissing => write!(f, "outputs missing"),
            Self::Fresh => write!(f, "fresh"),
        }
    }
}

/// Result of passing through the gate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gated<T> {
    pub output: T,
    /// Whether the operation actually ran
    pub executed: bool,
}

/// Memoization gate backed by a single record file
#[derive(Debug, Clone)]
pub struct CacheGate {
    location: PathBuf,
}

impl CacheGate {
    /// Gate storing its record at `location`
    pub fn new(location: impl Into<PathBuf>) -> Self {
        Self {
            location: location.into(),
        }
    }

    /// Gate storing its record as `<dir>/<name>.json`
    pub fn in_dir(dir: &Path, name: &str) -> Self {
        Self::new(dir.join(format!("{}.json", name)))
    }

    pub fn location(&self) -> &Path {
        &self.location
    }

    /// Run `operation` unless the record for `inputs` is fresh
    pub async fn run<I, T, F, Fut>(&self, inputs: &I, operation: F) -> JsDepsResult<Gated<T>>
    where
        I: Fingerprinted + ?Sized,
        T: CachedOutput,
        F: FnOnce() -> Fut,
        Fut: Future<Output = JsDepsResult<T>>,
    {
        let fingerprint = inputs.fingerprint()?;

        let (state, record) = self.inspect::<T>(&fingerprint).await?;
        if let (CacheState::Fresh, Some(record)) = (state, record) {
            debug!("Cache hit for {} ({})", self.location.display(), fingerprint.short());
            return Ok(Gated {
                output: record.output,
                executed: false,
            });
        }

        debug!(
            "Cache {} for {} ({}), running operation",
            state,
            self.location.display(),
            fingerprint.short()
        );

        // Errors propagate before anything is written
        let output = operation().await?;
        self.store(&fingerprint, &output).await?;

        Ok(Gated {
            output,
            executed: true,
        })
    }

    /// Current state of the record with respect to `inputs`
    pub async fn state<I, T>(&self, inputs: &I) -> JsDepsResult<CacheState>
    where
        I: Fingerprinted + ?Sized,
        T: CachedOutput,
    {
        let fingerprint = inputs.fingerprint()?;
        Ok(self.inspect::<T>(&fingerprint).await?.0)
    }

    async fn inspect<T: CachedOutput>(
        &self,
        fingerprint: &Fingerprint,
    ) -> JsDepsResult<(CacheState, Option<CacheRecord<T>>)> {
        let Some(record) = self.load::<T>().await? else {
            return Ok((CacheState::Absent, None));
        };

        let state = if record.tool_version != TOOL_VERSION {
            CacheState::Outdated
        } else if &record.fingerprint != fingerprint {
            CacheState::Changed
        } else if !record.output.is_intact() {
            CacheState::OutputsMissing
        } else {
            CacheState::Fresh
        };

        Ok((state, Some(record)))
    }

    /// Load the record, treating an unreadable one as absent
    pub async fn load<T: CachedOutput>(&self) -> JsDepsResult<Option<CacheRecord<T>>> {
        let content = match fs::read_to_string(&self.location).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(JsDepsError::io(
                    format!("reading cache record {}", self.location.display()),
                    e,
                ))
            }
        };

        match serde_json::from_str(&content) {
            Ok(record) => Ok(Some(record)),
            Err(e) => {
                debug!(
                    "Ignoring unreadable cache record {}: {}",
                    self.location.display(),
                    e
                );
                Ok(None)
            }
        }
    }

    /// Write the record through a temp file so readers never see half of it
    async fn store<T: CachedOutput>(&self, fingerprint: &Fingerprint, output: &T) -> JsDepsResult<()> {
        if let Some(parent) = self.location.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                JsDepsError::io(format!("creating cache directory {}", parent.display()), e)
            })?;
        }

        let record = CacheRecord {
            fingerprint: fingerprint.clone(),
            output,
            recorded_at: Utc::now(),
            tool_version: TOOL_VERSION.to_string(),
        };
        let content = serde_json::to_string_pretty(&record)?;

        let tmp = self.location.with_extension("json.tmp");
        fs::write(&tmp, content)
            .await
            .map_err(|e| JsDepsError::io(format!("writing cache record {}", tmp.display()), e))?;
        fs::rename(&tmp, &self.location).await.map_err(|e| {
            JsDepsError::io(
                format!("replacing cache record {}", self.location.display()),
                e,
            )
        })?;

        info!("Recorded cache entry {}", fingerprint.short());
        Ok(())
    }

    /// Remove the record. Returns whether one existed.
    pub async fn clear(&self) -> JsDepsResult<bool> {
        match fs::remove_file(&self.location).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(JsDepsError::io(
                format!("removing cache record {}", self.location.display()),
                e,
            )),
        }
    }
}
