use std::{
    fs::{self, File},
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
    time::Duration,
};

use chrono::{DateTime, NaiveDateTime, TimeDelta, Utc};
use regex::Regex;

use crate::log_writer::LogWriter;

#[cfg(not(test))]
mod limits {
    pub const MIN_FILE_SIZE: u64 = 4_096;
}

#[cfg(test)]
mod limits {
    pub const MIN_FILE_SIZE: u64 = 64;
}

const BACKUP_TIME_FORMAT: &str = "%Y-%m-%dT%H-%M-%S%.3f";

/// Bounds applied to a rotating log file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotationPolicy {
    /// Size in bytes the active file may reach before it is rotated.
    pub max_file_size: u64,
    /// Number of rotated files to keep. Zero keeps all of them.
    pub max_backups: usize,
    /// Rotated files older than this are deleted. Zero disables the age limit.
    pub max_age: Duration,
}

impl Default for RotationPolicy {
    /// 500 MB per file, 3 backups, 28 days.
    fn default() -> Self {
        Self {
            max_file_size: 500 * 1024 * 1024,
            max_backups: 3,
            max_age: Duration::from_secs(28 * 24 * 60 * 60),
        }
    }
}

/// A log file writer that keeps the active file at a fixed path and moves it
/// aside to `<stem>-<timestamp><.ext>` when it grows past the size limit.
pub struct RotatingFile {
    path: PathBuf,
    policy: RotationPolicy,
    stem: String,
    extension: String,
    backup_pattern: Regex,
    current_file: Option<BufWriter<File>>,
    current_size: u64,
}

impl RotatingFile {
    pub fn new<P: AsRef<Path>>(path: P, policy: RotationPolicy) -> Result<Self, io::Error> {
        if policy.max_file_size < limits::MIN_FILE_SIZE {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!(
                    "max_file_size must be at least {} bytes",
                    limits::MIN_FILE_SIZE
                ),
            ));
        }
        let path = path.as_ref().to_path_buf();
        let Some(stem) = path.file_stem().map(|s| s.to_string_lossy().to_string()) else {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("log path {} does not name a file", path.display()),
            ));
        };
        let extension = path
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();
        let backup_pattern = Regex::new(&format!(
            r"^{}-(\d{{4}}-\d{{2}}-\d{{2}}T\d{{2}}-\d{{2}}-\d{{2}}\.\d{{3}}){}$",
            regex::escape(&stem),
            regex::escape(&extension)
        ))
        .map_err(|err| io::Error::new(io::ErrorKind::InvalidInput, err))?;

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        let (file, size) = open_append(&path)?;
        let writer = Self {
            path,
            policy,
            stem,
            extension,
            backup_pattern,
            current_file: Some(file),
            current_size: size,
        };
        writer.cleanup();
        Ok(writer)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Rotated files currently on disk, newest first.
    pub fn backups(&self) -> Vec<(DateTime<Utc>, PathBuf)> {
        let Ok(entries) = fs::read_dir(self.folder()) else {
            return Vec::new();
        };
        let mut backups: Vec<_> = entries
            .flatten()
            .filter_map(|entry| {
                let name = entry.file_name().to_string_lossy().to_string();
                let timestamp = self.backup_pattern.captures(&name)?.get(1)?.as_str().to_owned();
                let time = NaiveDateTime::parse_from_str(&timestamp, BACKUP_TIME_FORMAT).ok()?;
                Some((time.and_utc(), entry.path()))
            })
            .collect();
        backups.sort_by(|a, b| b.0.cmp(&a.0));
        backups
    }

    fn folder(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }

    fn current_file(&mut self) -> io::Result<&mut BufWriter<File>> {
        let file = match self.current_file.take() {
            Some(file) => file,
            None => {
                let (file, size) = open_append(&self.path)?;
                self.current_size = size;
                file
            }
        };
        Ok(self.current_file.insert(file))
    }

    /// Backup names must sort after every existing backup, even when several
    /// rotations happen within the same millisecond.
    fn backup_path(&self, now: DateTime<Utc>) -> PathBuf {
        let mut time = match self.backups().first() {
            Some((newest, _)) if *newest >= now => *newest + TimeDelta::milliseconds(1),
            _ => now,
        };
        loop {
            let timestamp = time.format(BACKUP_TIME_FORMAT);
            let candidate = self
                .folder()
                .join(format!("{}-{timestamp}{}", self.stem, self.extension));
            if !candidate.exists() {
                return candidate;
            }
            time += TimeDelta::milliseconds(1);
        }
    }

    fn rotate(&mut self) -> io::Result<()> {
        if let Some(mut file) = self.current_file.take() {
            file.flush()?;
        }
        let backup = self.backup_path(Utc::now());
        fs::rename(&self.path, backup)?;
        let (file, size) = open_append(&self.path)?;
        self.current_file = Some(file);
        self.current_size = size;
        self.cleanup();
        Ok(())
    }

    fn cleanup(&self) {
        let now = Utc::now();
        for (index, (time, path)) in self.backups().into_iter().enumerate() {
            let over_count = self.policy.max_backups > 0 && index >= self.policy.max_backups;
            let too_old = !self.policy.max_age.is_zero()
                && (now - time)
                    .to_std()
                    .is_ok_and(|age| age > self.policy.max_age);
            if over_count || too_old {
                let _ = fs::remove_file(path);
            }
        }
    }
}

impl LogWriter for RotatingFile {
    fn write_line(&mut self, line: &str) -> io::Result<()> {
        let len = line.len() as u64 + 1;
        if len > self.policy.max_file_size {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!(
                    "write length {len} exceeds maximum file size {}",
                    self.policy.max_file_size
                ),
            ));
        }
        // Reopening after a failed rotation refreshes the size before the check.
        self.current_file()?;
        if self.current_size + len > self.policy.max_file_size {
            self.rotate()?;
        }
        writeln!(self.current_file()?, "{line}")?;
        self.current_size += len;
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        match &mut self.current_file {
            Some(file) => file.flush(),
            None => Ok(()),
        }
    }

    fn sync(&mut self) -> io::Result<()> {
        match &mut self.current_file {
            Some(file) => {
                file.flush()?;
                file.get_ref().sync_data()
            }
            None => Ok(()),
        }
    }
}

fn open_append(path: &Path) -> Result<(BufWriter<File>, u64), io::Error> {
    let file = File::options().create(true).append(true).open(path)?;
    let size = file.metadata()?.len();
    Ok((BufWriter::new(file), size))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_dir(name: &str) -> PathBuf {
        let dir = PathBuf::from(format!("/tmp/tierlog_test_{name}"));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    fn policy(max_file_size: u64, max_backups: usize) -> RotationPolicy {
        RotationPolicy {
            max_file_size,
            max_backups,
            max_age: Duration::from_secs(3600),
        }
    }

    fn read_all_log_content(writer: &RotatingFile) -> String {
        let mut files: Vec<PathBuf> = writer.backups().into_iter().map(|(_, p)| p).collect();
        files.reverse();
        files.push(writer.path().to_path_buf());
        let mut content = String::new();
        for f in files {
            content.push_str(&fs::read_to_string(f).unwrap());
        }
        content
    }

    #[test]
    fn test_creates_parent_folders() {
        let dir = test_dir("parent_folders");
        let mut writer = RotatingFile::new(dir.join("nested/app.log"), policy(4096, 3)).unwrap();
        writer.write_line("hello").unwrap();
        writer.sync().unwrap();
        assert_eq!(
            fs::read_to_string(dir.join("nested/app.log")).unwrap(),
            "hello\n"
        );
    }

    #[test]
    fn test_rotation_by_size() {
        let dir = test_dir("rotation_by_size");
        let mut writer = RotatingFile::new(dir.join("app.log"), policy(256, 0)).unwrap();

        // 50 bytes per line, 5 lines per file
        for i in 0..20 {
            writer.write_line(&format!("line{i:02} {}", "x".repeat(42))).unwrap();
        }
        writer.flush().unwrap();

        assert_eq!(writer.backups().len(), 3);
        for (_, backup) in writer.backups() {
            let name = backup.file_name().unwrap().to_string_lossy().to_string();
            assert!(name.starts_with("app-") && name.ends_with(".log"), "{name}");
            assert_eq!(fs::metadata(&backup).unwrap().len(), 250);
        }
        let content = read_all_log_content(&writer);
        for i in 0..20 {
            assert!(content.contains(&format!("line{i:02} ")));
        }
    }

    #[test]
    fn test_max_backups_keeps_newest() {
        let dir = test_dir("max_backups");
        let mut writer = RotatingFile::new(dir.join("app.log"), policy(64, 2)).unwrap();

        // 40 bytes per line, so every write after the first rotates
        for i in 0..8 {
            writer.write_line(&format!("line{i} {}", "y".repeat(33))).unwrap();
        }
        writer.flush().unwrap();

        let backups = writer.backups();
        assert_eq!(backups.len(), 2);
        assert!(fs::read_to_string(&backups[0].1).unwrap().starts_with("line6 "));
        assert!(fs::read_to_string(&backups[1].1).unwrap().starts_with("line5 "));
        assert!(
            fs::read_to_string(dir.join("app.log"))
                .unwrap()
                .starts_with("line7 ")
        );
    }

    #[test]
    fn test_max_age_cleanup_on_open() {
        let dir = test_dir("max_age");
        fs::create_dir_all(&dir).unwrap();
        let old_backup = dir.join("app-2020-01-01T00-00-00.000.log");
        let unrelated = dir.join("other-2020-01-01T00-00-00.000.log");
        File::create(&old_backup).unwrap();
        File::create(&unrelated).unwrap();

        let writer = RotatingFile::new(dir.join("app.log"), policy(4096, 0)).unwrap();

        assert!(!old_backup.exists());
        assert!(unrelated.exists());
        assert!(writer.backups().is_empty());
    }

    #[test]
    fn test_appends_to_existing_file() {
        let dir = test_dir("existing_file");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("app.log"), format!("{}\n", "z".repeat(99))).unwrap();

        let mut writer = RotatingFile::new(dir.join("app.log"), policy(128, 3)).unwrap();
        writer.write_line(&"w".repeat(39)).unwrap();
        writer.flush().unwrap();

        let backups = writer.backups();
        assert_eq!(backups.len(), 1);
        assert_eq!(fs::metadata(&backups[0].1).unwrap().len(), 100);
        assert_eq!(
            fs::read_to_string(dir.join("app.log")).unwrap(),
            format!("{}\n", "w".repeat(39))
        );
    }

    #[test]
    fn test_size_checked_after_failed_rotation() {
        let dir = test_dir("failed_rotation");
        let mut writer = RotatingFile::new(dir.join("app.log"), policy(64, 3)).unwrap();
        writer.write_line(&"a".repeat(40)).unwrap();
        writer.flush().unwrap();

        fs::remove_dir_all(&dir).unwrap();
        assert!(writer.write_line(&"b".repeat(40)).is_err());

        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("app.log"), format!("{}\n", "c".repeat(59))).unwrap();
        writer.write_line(&"d".repeat(40)).unwrap();
        writer.flush().unwrap();

        let backups = writer.backups();
        assert_eq!(backups.len(), 1);
        assert_eq!(fs::metadata(&backups[0].1).unwrap().len(), 60);
        assert_eq!(
            fs::read_to_string(dir.join("app.log")).unwrap(),
            format!("{}\n", "d".repeat(40))
        );
    }

    #[test]
    fn test_oversized_line_rejected() {
        let dir = test_dir("oversized_line");
        let mut writer = RotatingFile::new(dir.join("app.log"), policy(64, 3)).unwrap();
        let err = writer.write_line(&"a".repeat(64)).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
        writer.write_line("still usable").unwrap();
        writer.flush().unwrap();
        assert_eq!(
            fs::read_to_string(dir.join("app.log")).unwrap(),
            "still usable\n"
        );
    }

    #[test]
    fn test_validation_file_size() {
        let dir = test_dir("validation_size");
        let result = RotatingFile::new(dir.join("app.log"), policy(10, 3));
        assert!(result.is_err());
        let err = result.err().unwrap();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }

    #[test]
    fn test_default_policy() {
        let policy = RotationPolicy::default();
        assert_eq!(policy.max_file_size, 500 * 1024 * 1024);
        assert_eq!(policy.max_backups, 3);
        assert_eq!(policy.max_age, Duration::from_secs(2_419_200));
    }
}
