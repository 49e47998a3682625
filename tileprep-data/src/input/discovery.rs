//! Locate the export files a run should convert.

use camino::{Utf8Path, Utf8PathBuf};
use glob::Pattern;
use log::debug;
use tileprep_fs::{EntryKind, is_dir, list_names};

use crate::DiscoveryError;

/// One input export selected for conversion.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct InputFile {
    path: Utf8PathBuf,
}

impl InputFile {
    #[must_use]
    pub fn new(path: impl Into<Utf8PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Final path component.
    #[must_use]
    pub fn file_name(&self) -> &str {
        self.path.file_name().unwrap_or(self.path.as_str())
    }

    /// State name embedded in names like `clu54_WestVirginia_STR.txt`.
    ///
    /// # Examples
    /// ```
    /// use tileprep_data::InputFile;
    ///
    /// let file = InputFile::new("exports/clu54_WestVirginia_STR.txt");
    /// assert_eq!(file.state_name(), Some("WestVirginia"));
    /// assert_eq!(InputFile::new("points.txt").state_name(), None);
    /// ```
    #[must_use]
    pub fn state_name(&self) -> Option<&str> {
        self.file_name()
            .split('_')
            .nth(1)
            .filter(|segment| !segment.is_empty())
    }
}

/// List regular files in `dir` whose names match the glob `pattern`, sorted
/// by name.
pub fn discover_inputs(dir: &Utf8Path, pattern: &str) -> Result<Vec<InputFile>, DiscoveryError> {
    let matcher = Pattern::new(pattern).map_err(|source| DiscoveryError::InvalidPattern {
        pattern: pattern.to_owned(),
        source,
    })?;
    let exists = is_dir(dir).map_err(|source| DiscoveryError::List {
        path: dir.to_path_buf(),
        source,
    })?;
    if !exists {
        return Err(DiscoveryError::MissingDirectory {
            path: dir.to_path_buf(),
        });
    }

    let names = list_names(dir, EntryKind::File).map_err(|source| DiscoveryError::List {
        path: dir.to_path_buf(),
        source,
    })?;
    let files: Vec<InputFile> = names
        .into_iter()
        .filter(|name| matcher.matches(name))
        .map(|name| InputFile::new(dir.join(name)))
        .collect();
    if files.is_empty() {
        return Err(DiscoveryError::NoMatches {
            path: dir.to_path_buf(),
            pattern: pattern.to_owned(),
        });
    }
    debug!("discovered {} input files in {dir}", files.len());
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};
    use std::fs;
    use tempfile::TempDir;

    #[fixture]
    fn input_dir() -> (TempDir, Utf8PathBuf) {
        let dir = TempDir::new().expect("create temp dir");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 path");
        for name in [
            "clu54_WestVirginia_STR.txt",
            "clu01_Alabama_STR.txt",
            "notes.txt",
        ] {
            fs::write(root.join(name), "").expect("write input");
        }
        fs::create_dir(root.join("clu99_Dir_STR.txt")).expect("create decoy dir");
        (dir, root)
    }

    #[rstest]
    fn lists_matching_files_in_name_order(input_dir: (TempDir, Utf8PathBuf)) {
        let (_guard, root) = input_dir;
        let files = discover_inputs(&root, "clu*_*_STR.txt").expect("discover");
        let names: Vec<&str> = files.iter().map(InputFile::file_name).collect();
        assert_eq!(
            names,
            vec!["clu01_Alabama_STR.txt", "clu54_WestVirginia_STR.txt"]
        );
    }

    #[rstest]
    fn reports_missing_directory(input_dir: (TempDir, Utf8PathBuf)) {
        let (_guard, root) = input_dir;
        let missing = root.join("absent");
        let err = discover_inputs(&missing, "*").expect_err("directory is missing");
        assert!(matches!(err, DiscoveryError::MissingDirectory { path } if path == missing));
    }

    #[rstest]
    fn reports_empty_matches(input_dir: (TempDir, Utf8PathBuf)) {
        let (_guard, root) = input_dir;
        let err = discover_inputs(&root, "*.csv").expect_err("nothing matches");
        assert!(matches!(err, DiscoveryError::NoMatches { .. }));
    }

    #[rstest]
    fn rejects_invalid_patterns(input_dir: (TempDir, Utf8PathBuf)) {
        let (_guard, root) = input_dir;
        let err = discover_inputs(&root, "[").expect_err("pattern is invalid");
        assert!(matches!(err, DiscoveryError::InvalidPattern { .. }));
    }

    #[rstest]
    #[case("clu54_WestVirginia_STR.txt", Some("WestVirginia"))]
    #[case("clu01_x_STR.txt", Some("x"))]
    #[case("clu__STR.txt", None)]
    #[case("plain.txt", None)]
    fn extracts_state_segment(#[case] name: &str, #[case] expected: Option<&str>) {
        assert_eq!(InputFile::new(name).state_name(), expected);
    }
}
