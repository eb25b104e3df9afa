//! Skip-or-refresh decision based on the mirror's age.

use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

pub const DEFAULT_MAX_AGE: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// The mirror is younger than the threshold; no sync needed.
    Fresh { age: Duration },
    /// The mirror is missing (`age == None`) or too old.
    Stale { age: Option<Duration> },
}

impl Freshness {
    #[must_use]
    pub const fn is_fresh(&self) -> bool {
        matches!(self, Self::Fresh { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreshnessGate {
    max_age: Duration,
}

impl Default for FreshnessGate {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_AGE)
    }
}

impl FreshnessGate {
    #[must_use]
    pub const fn new(max_age: Duration) -> Self {
        Self { max_age }
    }

    #[must_use]
    pub const fn from_secs(secs: u64) -> Self {
        Self::new(Duration::from_secs(secs))
    }

    #[must_use]
    pub const fn max_age(&self) -> Duration {
        self.max_age
    }

    /// Pure decision over a last-modified stamp and the current time.
    ///
    /// A stamp in the future counts as age zero.
    #[must_use]
    pub fn evaluate(&self, last_modified: Option<SystemTime>, now: SystemTime) -> Freshness {
        let Some(modified) = last_modified else {
            return Freshness::Stale { age: None };
        };

        let age = now.duration_since(modified).unwrap_or(Duration::ZERO);
        if age < self.max_age {
            Freshness::Fresh { age }
        } else {
            Freshness::Stale { age: Some(age) }
        }
    }
}

/// Last modification time of the mirror file.
///
/// In WAL mode committed pages can sit in the `-wal` sidecar until the next
/// checkpoint, so the newer of the two stamps wins. `None` when the mirror
/// does not exist.
pub fn mirror_last_modified(path: &Path) -> io::Result<Option<SystemTime>> {
    let Some(main) = modified_at(path)? else {
        return Ok(None);
    };
    let wal = modified_at(&wal_path(path))?;
    Ok(Some(wal.map_or(main, |w| w.max(main))))
}

fn modified_at(path: &Path) -> io::Result<Option<SystemTime>> {
    match std::fs::metadata(path) {
        Ok(meta) => Ok(Some(meta.modified()?)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

fn wal_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push("-wal");
    PathBuf::from(name)
}
