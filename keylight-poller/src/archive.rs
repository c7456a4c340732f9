//! Optional on-disk copy of every fetched body.

use std::fmt::Display;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, TimeZone, Utc};
use tracing::debug;

/// File name for a body fetched by a poll that started at `started`:
/// `YYYYMMDDhhmmss.microseconds`.
pub fn archive_file_name<Tz>(started: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    started.format("%Y%m%d%H%M%S%.6f").to_string()
}

/// Write `body` into `dir`, named after the poll's local start time.
///
/// Best effort: a failed write is logged and otherwise ignored.
pub(crate) async fn store(dir: &Path, started: DateTime<Utc>, body: &[u8]) -> Option<PathBuf> {
    let path = dir.join(archive_file_name(&started.with_timezone(&Local)));

    match tokio::fs::write(&path, body).await {
        Ok(()) => Some(path),
        Err(e) => {
            debug!("failed to archive body to {}: {}", path.display(), e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_name_has_microseconds() {
        let started = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap()
            + chrono::Duration::microseconds(123_456);

        assert_eq!(archive_file_name(&started), "20240102030405.123456");
    }

    #[test]
    fn file_name_pads_microseconds() {
        let started = Utc.with_ymd_and_hms(2023, 12, 31, 23, 59, 59).unwrap()
            + chrono::Duration::microseconds(42);

        assert_eq!(archive_file_name(&started), "20231231235959.000042");
    }

    #[tokio::test]
    async fn store_writes_body() {
        let dir = tempfile::tempdir().unwrap();
        let path = store(dir.path(), Utc::now(), b"{\"lights\":[]}")
            .await
            .unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"{\"lights\":[]}");
    }

    #[tokio::test]
    async fn store_into_missing_directory_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("does-not-exist");

        assert!(store(&missing, Utc::now(), b"body").await.is_none());
    }
}
