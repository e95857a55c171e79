//! YAML test file loader
//!
//! Every `*.yaml` / `*.yml` file under the tests location holds a list of
//! test cases. Files are read in sorted path order and test cases keep their
//! order within a file.

use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

use gauntlet_application::ports::{LoaderError, TestLoader};
use gauntlet_domain::TestCase;
use tracing::debug;
use walkdir::WalkDir;

/// Loads test cases from a YAML file or a directory tree of YAML files.
#[derive(Debug, Clone)]
pub struct YamlFileLoader {
    location: PathBuf,
    file_filter: Option<String>,
}

impl YamlFileLoader {
    /// Creates a loader for a file or directory.
    #[must_use]
    pub fn new(location: impl Into<PathBuf>) -> Self {
        Self {
            location: location.into(),
            file_filter: None,
        }
    }

    /// Only load files whose path contains `filter`.
    pub fn set_file_filter(&mut self, filter: Option<String>) {
        self.file_filter = filter.filter(|f| !f.is_empty());
    }

    /// Lists the test files that will be loaded, in load order.
    ///
    /// # Errors
    ///
    /// Returns an error if the location is missing or cannot be walked.
    pub fn files(&self) -> Result<Vec<PathBuf>, LoaderError> {
        if !self.location.exists() {
            return Err(LoaderError::NotFound(self.location.clone()));
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(&self.location)
            .follow_links(true)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|e| LoaderError::Io {
                path: e
                    .path()
                    .map_or_else(|| self.location.clone(), Path::to_path_buf),
                source: e.into(),
            })?;
            let path = entry.path();
            if entry.file_type().is_file() && is_yaml(path) && self.accepts(path) {
                files.push(path.to_path_buf());
            }
        }
        Ok(files)
    }

    fn accepts(&self, path: &Path) -> bool {
        self.file_filter
            .as_deref()
            .is_none_or(|filter| path.to_string_lossy().contains(filter))
    }

    fn load_file(path: &Path) -> Result<Vec<TestCase>, LoaderError> {
        let source = fs::read_to_string(path).map_err(|source| LoaderError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        if source.trim().is_empty() {
            return Ok(Vec::new());
        }

        let mut tests: Vec<TestCase> =
            serde_yaml::from_str(&source).map_err(|e| LoaderError::Parse {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

        for test in &mut tests {
            test.validate().map_err(|source| LoaderError::Invalid {
                path: path.to_path_buf(),
                source,
            })?;
            test.file = Some(path.to_path_buf());
        }
        debug!(file = %path.display(), tests = tests.len(), "loaded test file");
        Ok(tests)
    }
}

impl TestLoader for YamlFileLoader {
    fn load(&self) -> Result<Vec<TestCase>, LoaderError> {
        let mut tests = Vec::new();
        for file in self.files()? {
            tests.extend(Self::load_file(&file)?);
        }
        Ok(tests)
    }
}

fn is_yaml(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext == OsStr::new("yaml") || ext == OsStr::new("yml"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use gauntlet_domain::{HttpMethod, TestStatus};
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    const USERS: &str = r#"
- name: create_user
  request:
    method: post
    path: /users
    body: '{"name": "ada"}'
  expect:
    status: 201
  capture:
    user_id: $.id
- name: get_user
  status: focus
  request:
    path: /users/{{ user_id }}
"#;

    const HEALTH: &str = "
- name: health
  request:
    path: /health
";

    fn names(tests: &[TestCase]) -> Vec<&str> {
        tests.iter().map(|t| t.name.as_str()).collect()
    }

    #[test]
    fn test_loads_files_in_sorted_order() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("b")).unwrap();
        fs::write(dir.path().join("b/users.yaml"), USERS).unwrap();
        fs::write(dir.path().join("a_health.yml"), HEALTH).unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let tests = YamlFileLoader::new(dir.path()).load().unwrap();

        assert_eq!(names(&tests), vec!["health", "create_user", "get_user"]);
        assert_eq!(tests[1].request.method, HttpMethod::Post);
        assert_eq!(tests[1].capture["user_id"], "$.id");
        assert_eq!(tests[2].status, TestStatus::Focus);
        assert_eq!(
            tests[2].file.as_deref(),
            Some(dir.path().join("b/users.yaml").as_path())
        );
    }

    #[test]
    fn test_file_filter() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("users.yaml"), USERS).unwrap();
        fs::write(dir.path().join("health.yaml"), HEALTH).unwrap();

        let mut loader = YamlFileLoader::new(dir.path());
        loader.set_file_filter(Some("health".to_string()));

        assert_eq!(names(&loader.load().unwrap()), vec!["health"]);
    }

    #[test]
    fn test_single_file_location() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("health.yaml");
        fs::write(&file, HEALTH).unwrap();

        assert_eq!(names(&YamlFileLoader::new(&file).load().unwrap()), vec!["health"]);
    }

    #[test]
    fn test_missing_location() {
        let err = YamlFileLoader::new("/definitely/not/here").load().unwrap_err();
        assert!(matches!(err, LoaderError::NotFound(_)));
    }

    #[test]
    fn test_parse_and_validation_errors_name_the_file() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("bad.yaml"), "- name: [unclosed").unwrap();
        let err = YamlFileLoader::new(dir.path()).load().unwrap_err();
        assert!(matches!(err, LoaderError::Parse { ref path, .. } if path.ends_with("bad.yaml")));

        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("blank.yaml"),
            "- name: '  '\n  request:\n    path: /\n",
        )
        .unwrap();
        let err = YamlFileLoader::new(dir.path()).load().unwrap_err();
        assert!(matches!(err, LoaderError::Invalid { .. }));
    }
}
