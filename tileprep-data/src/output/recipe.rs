use std::io::{self, BufWriter, Write};

use camino::Utf8Path;
use log::{debug, warn};
use tileprep_core::Recipe;
use tileprep_fs::{create_new, remove_file};

use crate::WriteError;

/// File name of the recipe inside each region folder.
pub const RECIPE_FILE_NAME: &str = "recipe.json";

/// Write `recipe` to `<dir>/recipe.json` unless a recipe already exists.
///
/// Returns `true` when a new file was written. An existing recipe is left
/// untouched, and a failed write leaves no file behind.
pub fn write_recipe_once(dir: &Utf8Path, recipe: &Recipe) -> Result<bool, WriteError> {
    let mut encoded =
        serde_json::to_vec_pretty(recipe).map_err(|source| WriteError::Serialise {
            region: dir.file_name().unwrap_or_default().to_owned(),
            source,
        })?;
    encoded.push(b'\n');
    create_once(&dir.join(RECIPE_FILE_NAME), |writer| writer.write_all(&encoded))
}

/// Create `path` and fill it with `fill`, removing the file again if
/// filling or flushing fails.
fn create_once(
    path: &Utf8Path,
    fill: impl FnOnce(&mut dyn Write) -> io::Result<()>,
) -> Result<bool, WriteError> {
    let Some(file) = create_new(path).map_err(|source| WriteError::Create {
        path: path.to_owned(),
        source,
    })?
    else {
        debug!("keeping existing recipe at {path}");
        return Ok(false);
    };

    let mut writer = BufWriter::new(file);
    let written = fill(&mut writer).and_then(|()| writer.flush());
    drop(writer);
    if let Err(source) = written {
        if let Err(err) = remove_file(path) {
            warn!("failed to remove partial recipe {path}: {err}");
        }
        return Err(WriteError::Write {
            path: path.to_owned(),
            source,
        });
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use rstest::rstest;
    use std::fs;
    use tempfile::TempDir;
    use tileprep_core::{RecipeTemplate, RegionKey};

    #[rstest]
    fn writes_once_and_keeps_existing_bytes() {
        let dir = TempDir::new().expect("temp dir");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 path");
        let region = RegionKey::parse("54", 2).expect("key");
        let first = RecipeTemplate::new("acme", 1, 13, vec!["area".into()]).expect("template");
        let second = RecipeTemplate::new("other", 2, 10, Vec::new()).expect("template");

        assert!(write_recipe_once(&root, &first.render(&region)).expect("first write"));
        let before = fs::read(root.join(RECIPE_FILE_NAME)).expect("read recipe");
        assert!(!write_recipe_once(&root, &second.render(&region)).expect("second write"));
        let after = fs::read(root.join(RECIPE_FILE_NAME)).expect("read recipe");

        assert_eq!(before, after);
        let parsed: Recipe = serde_json::from_slice(&after).expect("parse recipe");
        assert_eq!(parsed, first.render(&region));
    }

    #[rstest]
    fn failed_writes_leave_no_recipe_behind() {
        let dir = TempDir::new().expect("temp dir");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 path");
        let path = root.join(RECIPE_FILE_NAME);

        let err = create_once(&path, |writer| {
            writer.write_all(b"{\"version\"")?;
            Err(io::Error::other("disk full"))
        })
        .expect_err("fill fails");

        assert!(matches!(err, WriteError::Write { .. }));
        assert!(!path.exists());
        let region = RegionKey::parse("54", 2).expect("key");
        let template = RecipeTemplate::new("acme", 1, 13, Vec::new()).expect("template");
        assert!(write_recipe_once(&root, &template.render(&region)).expect("retry writes"));
        let parsed: Recipe =
            serde_json::from_slice(&fs::read(&path).expect("read recipe")).expect("parse recipe");
        assert_eq!(parsed, template.render(&region));
    }
}
