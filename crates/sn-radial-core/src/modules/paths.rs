//! Timestamped run directories below an output root.
//!
//! A fresh run lives in `<root>/<YYYYMMDD-HHMM>` (UTC). When that name is
//! taken the manager tries `-1` up to `-9` before giving up. Snapshots go to
//! the nested `data` directory.

use crate::domain::{SnError, SnResult};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::debug;

pub const DATA_DIR: &str = "data";
pub const MAX_COLLISION_SUFFIX: u32 = 9;

#[derive(Debug, Clone)]
pub struct PathManager {
    base: PathBuf,
    stamp: Option<String>,
    created: Option<PathBuf>,
}

impl PathManager {
    /// Directories will be named after the UTC minute of the first `create`.
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self {
            base: base.into(),
            stamp: None,
            created: None,
        }
    }

    /// Use a fixed stamp instead of the clock.
    pub fn with_stamp(base: impl Into<PathBuf>, stamp: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            stamp: Some(stamp.into()),
            created: None,
        }
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    pub fn run_dir(&self) -> Option<&Path> {
        self.created.as_deref()
    }

    /// Create the run directory and its `data` subdirectory.
    ///
    /// Repeated calls return the directory created by the first one.
    pub fn create(&mut self) -> SnResult<PathBuf> {
        if let Some(existing) = &self.created {
            return Ok(existing.clone());
        }

        let stamp = match &self.stamp {
            Some(stamp) => stamp.clone(),
            None => utc_stamp(SystemTime::now())?,
        };

        fs::create_dir_all(&self.base).map_err(|source| {
            SnError::io_system(
                "IO.OUTPUT_ROOT",
                format!(
                    "failed to create output root '{}': {}",
                    self.base.display(),
                    source
                ),
            )
        })?;

        let mut suffix = 0;
        let run_dir = loop {
            let name = if suffix == 0 {
                stamp.clone()
            } else {
                format!("{stamp}-{suffix}")
            };
            let candidate = self.base.join(name);
            match fs::create_dir(&candidate) {
                Ok(()) => break candidate,
                Err(source) if source.kind() == ErrorKind::AlreadyExists => {
                    suffix += 1;
                    if suffix > MAX_COLLISION_SUFFIX {
                        return Err(SnError::io_system(
                            "IO.RUN_DIRECTORY_COLLISION",
                            format!(
                                "too many identical run directory names for '{}' below '{}'",
                                stamp,
                                self.base.display()
                            ),
                        ));
                    }
                }
                Err(source) => {
                    return Err(SnError::io_system(
                        "IO.RUN_DIRECTORY",
                        format!(
                            "failed to create run directory '{}': {}",
                            candidate.display(),
                            source
                        ),
                    ));
                }
            }
        };

        let data_dir = run_dir.join(DATA_DIR);
        fs::create_dir_all(&data_dir).map_err(|source| {
            SnError::io_system(
                "IO.RUN_DIRECTORY",
                format!(
                    "failed to create data directory '{}': {}",
                    data_dir.display(),
                    source
                ),
            )
        })?;

        debug!(run_dir = %run_dir.display(), "created run directory");
        self.created = Some(run_dir.clone());
        Ok(run_dir)
    }
}

/// Locate the directory of an earlier run; it must already exist.
pub fn existing_run_dir(base: &Path, subpath: &str) -> SnResult<PathBuf> {
    let run_dir = base.join(subpath);
    if !run_dir.is_dir() {
        return Err(SnError::io_system(
            "IO.RUN_DIRECTORY",
            format!("run directory '{}' does not exist", run_dir.display()),
        ));
    }
    Ok(run_dir)
}

/// `YYYYMMDD-HHMM` in UTC.
pub fn utc_stamp(time: SystemTime) -> SnResult<String> {
    let seconds = time
        .duration_since(UNIX_EPOCH)
        .map_err(|source| {
            SnError::internal(
                "SYS.CLOCK",
                format!("failed to read system time for run directory naming: {source}"),
            )
        })?
        .as_secs();
    Ok(format_utc_stamp(seconds))
}

pub fn format_utc_stamp(unix_seconds: u64) -> String {
    let days = (unix_seconds / 86_400) as i64;
    let minute_of_day = (unix_seconds % 86_400) / 60;
    let (year, month, day) = civil_from_days(days);
    format!(
        "{year:04}{month:02}{day:02}-{:02}{:02}",
        minute_of_day / 60,
        minute_of_day % 60
    )
}

/// Proleptic Gregorian date of a day count since 1970-01-01.
fn civil_from_days(days: i64) -> (i64, u32, u32) {
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let day_of_era = z.rem_euclid(146_097);
    let year_of_era =
        (day_of_era - day_of_era / 1460 + day_of_era / 36_524 - day_of_era / 146_096) / 365;
    let day_of_year = day_of_era - (365 * year_of_era + year_of_era / 4 - year_of_era / 100);
    let shifted_month = (5 * day_of_year + 2) / 153;
    let day = (day_of_year - (153 * shifted_month + 2) / 5 + 1) as u32;
    let month = (if shifted_month < 10 {
        shifted_month + 3
    } else {
        shifted_month - 9
    }) as u32;
    let year = year_of_era + era * 400 + i64::from(month <= 2);
    (year, month, day)
}

#[cfg(test)]
mod tests {
    use super::{DATA_DIR, PathManager, existing_run_dir, format_utc_stamp};
    use crate::domain::SnErrorCategory;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn utc_stamp_formats_calendar_minutes() {
        assert_eq!(format_utc_stamp(0), "19700101-0000");
        assert_eq!(format_utc_stamp(1_262_304_000), "20100101-0000");
        assert_eq!(format_utc_stamp(951_782_400 + 23 * 3600 + 59 * 60 + 59), "20000229-2359");
        assert_eq!(format_utc_stamp(1_709_251_200 - 60), "20240229-2359");
    }

    #[test]
    fn create_builds_nested_data_directory_below_missing_parents() {
        let temp = TempDir::new().expect("tempdir should be created");
        let base = temp.path().join("deep").join("root");
        let mut manager = PathManager::with_stamp(&base, "20100101-0000");

        let run_dir = manager.create().expect("run directory should be created");

        assert_eq!(run_dir, base.join("20100101-0000"));
        assert!(run_dir.join(DATA_DIR).is_dir());
        assert_eq!(manager.run_dir(), Some(run_dir.as_path()));
    }

    #[test]
    fn repeated_create_returns_the_same_directory() {
        let temp = TempDir::new().expect("tempdir should be created");
        let mut manager = PathManager::with_stamp(temp.path(), "20100101-0000");

        let first = manager.create().expect("first create should succeed");
        let second = manager.create().expect("second create should succeed");

        assert_eq!(first, second);
        let entries = fs::read_dir(temp.path())
            .expect("base should be readable")
            .count();
        assert_eq!(entries, 1);
    }

    #[test]
    fn distinct_runs_in_the_same_minute_get_suffixes() {
        let temp = TempDir::new().expect("tempdir should be created");

        let first = PathManager::with_stamp(temp.path(), "20100101-0000")
            .create()
            .expect("first run should be created");
        let second = PathManager::with_stamp(temp.path(), "20100101-0000")
            .create()
            .expect("second run should be created");
        let third = PathManager::with_stamp(temp.path(), "20100101-0000")
            .create()
            .expect("third run should be created");

        assert_eq!(first, temp.path().join("20100101-0000"));
        assert_eq!(second, temp.path().join("20100101-0000-1"));
        assert_eq!(third, temp.path().join("20100101-0000-2"));
    }

    #[test]
    fn tenth_collision_is_fatal() {
        let temp = TempDir::new().expect("tempdir should be created");
        fs::create_dir(temp.path().join("20100101-0000")).expect("seed dir should be created");
        for suffix in 1..=9 {
            fs::create_dir(temp.path().join(format!("20100101-0000-{suffix}")))
                .expect("seed dir should be created");
        }

        let error = PathManager::with_stamp(temp.path(), "20100101-0000")
            .create()
            .expect_err("collision limit should be enforced");

        assert_eq!(error.category(), SnErrorCategory::IoSystemError);
        assert_eq!(error.placeholder(), "IO.RUN_DIRECTORY_COLLISION");
    }

    #[test]
    fn existing_run_dir_requires_directory() {
        let temp = TempDir::new().expect("tempdir should be created");
        fs::create_dir(temp.path().join("20100101-0000")).expect("run dir should be created");

        assert_eq!(
            existing_run_dir(temp.path(), "20100101-0000").expect("run dir should resolve"),
            temp.path().join("20100101-0000")
        );
        let error = existing_run_dir(temp.path(), "20991231-2359")
            .expect_err("missing run dir should fail");
        assert_eq!(error.exit_code(), 3);
    }
}
