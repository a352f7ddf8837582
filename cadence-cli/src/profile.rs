//! Profile files
//!
//! Writes each captured [`Profile`] to `<directory>/<case>.profile.json`.
//! Case names that sanitize to the same stem get a `-2`, `-3`, ... suffix
//! in the order they are first seen.

use cadence_core::{BenchCase, BenchError, Profile, ProfileSink};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

/// Contents of one profile file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileRecord {
    /// Full case name
    pub case: String,
    /// Captured data
    #[serde(flatten)]
    pub profile: Profile,
}

/// [`ProfileSink`] writing one JSON file per case
#[derive(Debug)]
pub struct ProfileWriter {
    directory: PathBuf,
    stems: Mutex<Stems>,
}

#[derive(Debug, Default)]
struct Stems {
    by_case: HashMap<String, String>,
    taken: HashSet<String>,
}

impl Stems {
    fn claim(&mut self, case_name: &str) -> String {
        if let Some(stem) = self.by_case.get(case_name) {
            return stem.clone();
        }
        let base = sanitize_file_name(case_name);
        let mut stem = base.clone();
        let mut index = 2;
        while self.taken.contains(&stem) {
            stem = format!("{base}-{index}");
            index += 1;
        }
        self.taken.insert(stem.clone());
        self.by_case.insert(case_name.to_string(), stem.clone());
        stem
    }
}

impl ProfileWriter {
    /// Write into `directory`, created on first use
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            stems: Mutex::new(Stems::default()),
        }
    }

    /// Target directory
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// File a case's profile is written to
    ///
    /// The first call for a name fixes its file, so asking again for the
    /// same case always yields the same path.
    pub fn path_for(&self, case_name: &str) -> PathBuf {
        let stem = self.stems.lock().claim(case_name);
        self.directory.join(format!("{stem}.profile.json"))
    }

    fn write(&self, record: &ProfileRecord) -> std::io::Result<PathBuf> {
        std::fs::create_dir_all(&self.directory)?;
        let path = self.path_for(&record.case);
        let json = serde_json::to_vec_pretty(record)?;
        std::fs::write(&path, json)?;
        Ok(path)
    }
}

impl ProfileSink for ProfileWriter {
    fn record(&self, case: &BenchCase, profile: Profile) -> Result<(), BenchError> {
        let record = ProfileRecord {
            case: case.name().to_string(),
            profile,
        };
        let path = self.write(&record).map_err(|err| {
            BenchError::Failed(format!("cannot write profile for `{}`: {err}", record.case))
        })?;
        tracing::info!(case = %record.case, path = %path.display(), "Wrote profile");
        Ok(())
    }
}

/// Replace everything but ASCII alphanumerics, `-`, `_` and `.` with `_`
pub fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadence_core::{BenchFn, Options};
    use std::sync::Arc;
    use tempfile::TempDir;

    #[test]
    fn test_sanitize() {
        assert_eq!(sanitize_file_name("parse#json small"), "parse_json_small");
        assert_eq!(sanitize_file_name("v1.2-fast_path"), "v1.2-fast_path");
        assert_eq!(sanitize_file_name("a/b\\c"), "a_b_c");
    }

    #[test]
    fn test_writes_profile_file() {
        let dir = TempDir::new().unwrap();
        let writer = ProfileWriter::new(dir.path().join("profiles"));
        let case = BenchCase::new(
            "suite#case".to_string(),
            BenchFn::noop(),
            Arc::from(Vec::new()),
            Options::new(),
        );
        let profile = Profile {
            wall_ns: 1_500,
            cycles: 42,
        };

        writer.record(&case, profile).unwrap();

        let path = dir.path().join("profiles/suite_case.profile.json");
        assert_eq!(writer.path_for("suite#case"), path);
        let record: ProfileRecord =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(record.case, "suite#case");
        assert_eq!(record.profile, profile);
    }

    fn case(name: &str) -> BenchCase {
        BenchCase::new(
            name.to_string(),
            BenchFn::noop(),
            Arc::from(Vec::new()),
            Options::new(),
        )
    }

    #[test]
    fn test_colliding_names_get_distinct_files() {
        let dir = TempDir::new().unwrap();
        let writer = ProfileWriter::new(dir.path());
        let profile = Profile {
            wall_ns: 10,
            cycles: 1,
        };

        writer.record(&case("a#b"), profile).unwrap();
        writer.record(&case("a_b"), profile).unwrap();
        writer.record(&case("a b"), profile).unwrap();
        writer.record(&case("a#b"), profile).unwrap();

        let read = |file: &str| -> ProfileRecord {
            serde_json::from_slice(&std::fs::read(dir.path().join(file)).unwrap()).unwrap()
        };
        assert_eq!(read("a_b.profile.json").case, "a#b");
        assert_eq!(read("a_b-2.profile.json").case, "a_b");
        assert_eq!(read("a_b-3.profile.json").case, "a b");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 3);
        assert_eq!(writer.path_for("a_b"), dir.path().join("a_b-2.profile.json"));
    }
}
