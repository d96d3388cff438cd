use chrono::{NaiveDateTime, SubsecRound, Utc};
use flate2::write::GzEncoder;
use flate2::Compression;
use std::collections::HashSet;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, SyncSender};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::Duration;

const MEGABYTE: u64 = 1024 * 1024;
const DEFAULT_MAX_SIZE: u64 = 100 * MEGABYTE;
const DAY: u64 = 24 * 60 * 60;

/// Timestamp embedded in backup names, always UTC.
const BACKUP_TIME_FORMAT: &str = "%Y-%m-%dT%H-%M-%S%.3f";
const COMPRESS_SUFFIX: &str = ".gz";

/// Bounds applied to a [`RotatingFile`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotationPolicy {
    /// Size in bytes at which the file is rotated. `0` means 100 MB.
    pub max_size: u64,
    /// Backups older than this are deleted. `None` keeps them forever.
    pub max_age: Option<Duration>,
    /// Number of backups to retain. `0` retains all of them.
    pub max_backups: usize,
    /// Gzip backups after rotation.
    pub compress: bool,
}

impl RotationPolicy {
    /// Build a policy from configuration units (megabytes, days, count).
    pub fn new(max_size_mb: u64, max_age_days: u64, max_backups: usize, compress: bool) -> Self {
        RotationPolicy {
            max_size: max_size_mb.saturating_mul(MEGABYTE),
            max_age: (max_age_days > 0).then(|| Duration::from_secs(max_age_days.saturating_mul(DAY))),
            max_backups,
            compress,
        }
    }

    /// Whether rotation leaves anything to prune or compress.
    fn has_maintenance(&self) -> bool {
        self.max_backups > 0 || self.max_age.is_some() || self.compress
    }

    fn effective_max_size(&self) -> u64 {
        if self.max_size == 0 {
            DEFAULT_MAX_SIZE
        } else {
            self.max_size
        }
    }
}

impl Default for RotationPolicy {
    fn default() -> Self {
        RotationPolicy::new(100, 15, 30, true)
    }
}

#[derive(thiserror::Error, Debug)]
pub enum RotateError {
    #[error("write of {len} bytes exceeds maximum file size of {max} bytes")]
    TooLarge { len: u64, max: u64 },

    #[error(transparent)]
    Io(#[from] io::Error),
}

#[derive(Default)]
struct FileState {
    file: Option<File>,
    size: u64,
}

#[derive(Debug)]
struct Backup {
    path: PathBuf,
    timestamp: NaiveDateTime,
    compressed: bool,
}

/// Append-only log file that rolls over once it reaches its size limit.
///
/// The file is opened lazily on the first write. Rotation renames the
/// current file to `<stem>-<timestamp><ext>` next to it and starts a fresh
/// one. Pruning old backups by count and age, and compressing them if
/// enabled, happens afterwards on a background thread owned by this file,
/// so the write that triggers rotation only pays for the rename.
///
/// Each call to [`RotatingFile::write`] is a single `write_all` performed
/// under an internal lock, so concurrent writers never interleave within a
/// line.
pub struct RotatingFile {
    backups: Arc<Backups>,
    state: Mutex<FileState>,
    mill_tx: Mutex<Option<SyncSender<()>>>,
}

impl RotatingFile {
    pub fn new(path: impl Into<PathBuf>, policy: RotationPolicy) -> Self {
        RotatingFile {
            backups: Arc::new(Backups {
                path: path.into(),
                policy,
                pass: Mutex::new(()),
            }),
            state: Mutex::new(FileState::default()),
            mill_tx: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.backups.path
    }

    pub fn policy(&self) -> &RotationPolicy {
        &self.backups.policy
    }

    pub fn write(&self, buf: &[u8]) -> Result<(), RotateError> {
        let len = buf.len() as u64;
        let max = self.policy().effective_max_size();
        if len > max {
            return Err(RotateError::TooLarge { len, max });
        }

        let mut guard = self.lock();
        let state = &mut *guard;

        if state.file.is_none() {
            self.open_existing_or_new(state, len)?;
        }
        if state.size + len > max {
            self.rotate_locked(state)?;
        }

        if let Some(file) = state.file.as_mut() {
            file.write_all(buf)?;
            state.size += len;
        }
        Ok(())
    }

    /// Force a rotation regardless of the current size.
    pub fn rotate(&self) -> Result<(), RotateError> {
        let mut guard = self.lock();
        self.rotate_locked(&mut guard)
    }

    /// Flush file contents to disk.
    pub fn sync(&self) -> io::Result<()> {
        let guard = self.lock();
        match guard.file.as_ref() {
            Some(file) => file.sync_all(),
            None => Ok(()),
        }
    }

    /// Close the current file. The next write reopens it.
    pub fn close(&self) {
        let mut guard = self.lock();
        guard.file = None;
        guard.size = 0;
    }

    fn lock(&self) -> MutexGuard<'_, FileState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn open_existing_or_new(&self, state: &mut FileState, write_len: u64) -> Result<(), RotateError> {
        let path = self.path();
        let meta = match fs::metadata(path) {
            Ok(meta) => meta,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return self.open_new(state),
            Err(e) => return Err(e.into()),
        };

        if meta.len() + write_len >= self.policy().effective_max_size() {
            return self.rotate_locked(state);
        }

        match OpenOptions::new().append(true).open(path) {
            Ok(file) => {
                state.file = Some(file);
                state.size = meta.len();
                Ok(())
            }
            // Unreadable existing file: start over with a fresh one.
            Err(_) => self.open_new(state),
        }
    }

    fn open_new(&self, state: &mut FileState) -> Result<(), RotateError> {
        let path = self.path();
        create_log_dir(&self.backups.dir())?;

        let mut permissions = None;
        if let Ok(meta) = fs::metadata(path) {
            permissions = Some(meta.permissions());
            let backup = self.backups.backup_path();
            fs::rename(path, &backup)?;
        }

        let file = new_log_file(path)?;
        if let Some(perm) = permissions {
            file.set_permissions(perm)?;
        }

        state.file = Some(file);
        state.size = 0;
        Ok(())
    }

    fn rotate_locked(&self, state: &mut FileState) -> Result<(), RotateError> {
        state.file = None;
        self.open_new(state)?;
        self.schedule_mill();
        Ok(())
    }

    /// Wake the maintenance thread, starting it on first use. Requests made
    /// while a pass is already queued collapse into that pass.
    fn schedule_mill(&self) {
        if !self.backups.policy.has_maintenance() {
            return;
        }

        let mut tx = self.mill_tx.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if tx.is_none() {
            let (sender, receiver) = mpsc::sync_channel::<()>(1);
            let backups = Arc::clone(&self.backups);
            let spawned = thread::Builder::new()
                .name("log-mill".to_string())
                .spawn(move || {
                    // Exits once the owning RotatingFile is dropped.
                    while receiver.recv().is_ok() {
                        let _ = backups.mill();
                    }
                });
            match spawned {
                Ok(_) => *tx = Some(sender),
                Err(_) => {
                    let _ = self.backups.mill();
                    return;
                }
            }
        }

        if let Some(sender) = tx.as_ref() {
            let _ = sender.try_send(());
        }
    }
}

/// Location and retention rules of a log file's backups. Shared between
/// the writer and its maintenance thread.
struct Backups {
    path: PathBuf,
    policy: RotationPolicy,
    /// Held for the duration of a maintenance pass.
    pass: Mutex<()>,
}

impl Backups {
    fn dir(&self) -> PathBuf {
        match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }

    /// `(stem, ext)` of the log file name, `ext` including its dot.
    fn name_parts(&self) -> (String, String) {
        let stem = self
            .path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let ext = self
            .path
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();
        (stem, ext)
    }

    fn backup_path(&self) -> PathBuf {
        let (stem, ext) = self.name_parts();
        let dir = self.dir();

        let mut ts = Utc::now().naive_utc().trunc_subsecs(3);
        let newest = self
            .old_log_files()
            .ok()
            .and_then(|files| files.first().map(|b| b.timestamp));
        if let Some(newest) = newest {
            if ts <= newest {
                ts = newest + chrono::Duration::milliseconds(1);
            }
        }

        dir.join(format!("{}-{}{}", stem, ts.format(BACKUP_TIME_FORMAT), ext))
    }

    /// Backups of this file, newest first.
    fn old_log_files(&self) -> io::Result<Vec<Backup>> {
        let (stem, ext) = self.name_parts();
        let prefix = format!("{}-", stem);

        let mut backups = Vec::new();
        for entry in fs::read_dir(self.dir())? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();

            if let Some(timestamp) = parse_backup_time(&name, &prefix, &ext) {
                backups.push(Backup { path: entry.path(), timestamp, compressed: false });
            } else if let Some(timestamp) = name
                .strip_suffix(COMPRESS_SUFFIX)
                .and_then(|n| parse_backup_time(n, &prefix, &ext))
            {
                backups.push(Backup { path: entry.path(), timestamp, compressed: true });
            }
        }

        backups.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(backups)
    }

    /// Apply the retention rules and compress surviving backups.
    fn mill(&self) -> io::Result<()> {
        let _pass = self.pass.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let policy = &self.policy;

        let mut files = self.old_log_files()?;
        let mut remove = Vec::new();

        if policy.max_backups > 0 && policy.max_backups < files.len() {
            // A backup and its compressed twin count once.
            let mut preserved = HashSet::new();
            let mut remaining = Vec::new();
            for f in files {
                let name = f.path.to_string_lossy();
                let key = name.strip_suffix(COMPRESS_SUFFIX).unwrap_or(&name).to_string();
                preserved.insert(key);
                if preserved.len() > policy.max_backups {
                    remove.push(f);
                } else {
                    remaining.push(f);
                }
            }
            files = remaining;
        }

        if let Some(max_age) = policy.max_age {
            if let Ok(age) = chrono::Duration::from_std(max_age) {
                let cutoff = Utc::now().naive_utc() - age;
                let (expired, kept): (Vec<_>, Vec<_>) =
                    files.into_iter().partition(|f| f.timestamp < cutoff);
                remove.extend(expired);
                files = kept;
            }
        }

        let mut last_err = None;
        for f in &remove {
            if let Err(e) = fs::remove_file(&f.path) {
                if e.kind() != io::ErrorKind::NotFound {
                    last_err = Some(e);
                }
            }
        }

        if policy.compress {
            for f in files.iter().filter(|f| !f.compressed) {
                if let Err(e) = compress_file(&f.path) {
                    last_err = Some(e);
                }
            }
        }

        match last_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

fn parse_backup_time(name: &str, prefix: &str, ext: &str) -> Option<NaiveDateTime> {
    let middle = name.strip_prefix(prefix)?.strip_suffix(ext)?;
    NaiveDateTime::parse_from_str(middle, BACKUP_TIME_FORMAT).ok()
}

fn compress_file(src: &Path) -> io::Result<()> {
    let mut dst = src.as_os_str().to_owned();
    dst.push(COMPRESS_SUFFIX);
    let dst = PathBuf::from(dst);

    let result = (|| -> io::Result<()> {
        let mut input = File::open(src)?;
        let output = File::create(&dst)?;
        let mut encoder = GzEncoder::new(output, Compression::default());
        io::copy(&mut input, &mut encoder)?;
        encoder.finish()?;
        fs::remove_file(src)
    })();

    if result.is_err() {
        let _ = fs::remove_file(&dst);
    }
    result
}

#[cfg(unix)]
fn create_log_dir(dir: &Path) -> io::Result<()> {
    use std::os::unix::fs::DirBuilderExt;
    fs::DirBuilder::new().recursive(true).mode(0o755).create(dir)
}

#[cfg(not(unix))]
fn create_log_dir(dir: &Path) -> io::Result<()> {
    fs::create_dir_all(dir)
}

#[cfg(unix)]
fn new_log_file(path: &Path) -> io::Result<File> {
    use std::os::unix::fs::OpenOptionsExt;
    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o644)
        .open(path)
}

#[cfg(not(unix))]
fn new_log_file(path: &Path) -> io::Result<File> {
    OpenOptions::new().write(true).create(true).truncate(true).open(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::GzDecoder;
    use std::io::Read;

    fn policy(max_size: u64, max_backups: usize, compress: bool) -> RotationPolicy {
        RotationPolicy {
            max_size,
            max_age: None,
            max_backups,
            compress,
        }
    }

    fn backups_in(dir: &Path, stem: &str) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .filter(|n| n.starts_with(&format!("{}-", stem)))
            .collect();
        names.sort();
        names
    }

    /// Maintenance runs on its own thread; wait for it to reach `done`.
    fn eventually(mut done: impl FnMut() -> bool) {
        for _ in 0..200 {
            if done() {
                return;
            }
            thread::sleep(Duration::from_millis(25));
        }
        panic!("backup maintenance did not settle");
    }

    #[test]
    fn opens_lazily_and_creates_parents() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("prod/foo/bar/info.log");
        let file = RotatingFile::new(&path, RotationPolicy::default());
        assert!(!path.exists());

        file.write(b"first\n").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "first\n");
    }

    #[test]
    fn appends_to_existing_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("info.log");
        fs::write(&path, "old\n").unwrap();

        let file = RotatingFile::new(&path, RotationPolicy::default());
        file.write(b"new\n").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "old\nnew\n");
    }

    #[test]
    fn rotates_when_write_would_overflow() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("info.log");
        let file = RotatingFile::new(&path, policy(16, 0, false));

        file.write(b"0123456789\n").unwrap();
        file.write(b"abcdefghij\n").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "abcdefghij\n");
        let backups = backups_in(tmp.path(), "info");
        assert_eq!(backups.len(), 1);
        assert!(backups[0].ends_with(".log"));
        let rotated = fs::read_to_string(tmp.path().join(&backups[0])).unwrap();
        assert_eq!(rotated, "0123456789\n");
    }

    #[test]
    fn oversized_write_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let file = RotatingFile::new(tmp.path().join("info.log"), policy(8, 0, false));
        let err = file.write(b"way too long\n").unwrap_err();
        assert!(matches!(err, RotateError::TooLarge { len: 13, max: 8 }));
    }

    #[test]
    fn keeps_only_newest_backups() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("warn.log");
        let file = RotatingFile::new(&path, policy(8, 2, false));

        for line in ["one\n", "two\n", "three\n", "four\n", "five\n"] {
            file.write(line.as_bytes()).unwrap();
        }

        eventually(|| backups_in(tmp.path(), "warn").len() == 2);
        let backups = backups_in(tmp.path(), "warn");
        assert_eq!(backups.len(), 2);
        let contents: Vec<String> = backups
            .iter()
            .map(|b| fs::read_to_string(tmp.path().join(b)).unwrap())
            .collect();
        assert_eq!(contents, vec!["three\n", "four\n"]);
        assert_eq!(fs::read_to_string(&path).unwrap(), "five\n");
    }

    #[test]
    fn compresses_rotated_backups() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("error.log");
        let file = RotatingFile::new(&path, policy(8, 0, true));

        file.write(b"alpha\n").unwrap();
        file.write(b"bravo\n").unwrap();

        eventually(|| backups_in(tmp.path(), "error").iter().all(|b| b.ends_with(".gz")));
        let backups = backups_in(tmp.path(), "error");
        assert_eq!(backups.len(), 1);
        assert!(backups[0].ends_with(".log.gz"));

        let mut decoded = String::new();
        GzDecoder::new(File::open(tmp.path().join(&backups[0])).unwrap())
            .read_to_string(&mut decoded)
            .unwrap();
        assert_eq!(decoded, "alpha\n");
    }

    #[test]
    fn rotation_does_not_wait_for_compression() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("error.log");
        let file = RotatingFile::new(&path, policy(8, 0, true));
        file.write(b"alpha\n").unwrap();

        // Keep the maintenance pass from running until the write is back.
        let pass = file.backups.pass.lock().unwrap();
        file.write(b"bravo\n").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "bravo\n");
        let backups = backups_in(tmp.path(), "error");
        assert_eq!(backups.len(), 1);
        assert!(backups[0].ends_with(".log"));

        drop(pass);
        eventually(|| {
            let backups = backups_in(tmp.path(), "error");
            backups.len() == 1 && backups[0].ends_with(".log.gz")
        });
    }

    #[test]
    fn expired_backups_are_removed() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("debug.log");
        let stale = Utc::now().naive_utc() - chrono::Duration::days(30);
        let stale_name = format!("debug-{}.log", stale.format(BACKUP_TIME_FORMAT));
        fs::write(tmp.path().join(&stale_name), "ancient\n").unwrap();

        let file = RotatingFile::new(
            &path,
            RotationPolicy {
                max_size: 8,
                max_age: Some(Duration::from_secs(DAY)),
                max_backups: 0,
                compress: false,
            },
        );
        file.write(b"recent\n").unwrap();
        file.rotate().unwrap();

        eventually(|| !tmp.path().join(&stale_name).exists());
        let backups = backups_in(tmp.path(), "debug");
        assert_eq!(backups.len(), 1);
        assert_ne!(backups[0], stale_name);
    }

    #[test]
    fn policy_from_config_units() {
        let p = RotationPolicy::new(100, 15, 30, true);
        assert_eq!(p.max_size, 100 * MEGABYTE);
        assert_eq!(p.max_age, Some(Duration::from_secs(15 * DAY)));
        assert_eq!(p.max_backups, 30);

        let unbounded = RotationPolicy::new(0, 0, 0, false);
        assert_eq!(unbounded.effective_max_size(), DEFAULT_MAX_SIZE);
        assert_eq!(unbounded.max_age, None);
    }
}
