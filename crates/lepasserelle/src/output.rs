// Output Writer
//
// Every output is rendered in full, staged next to its destination, and only
// renamed into place once all of them are staged.

use anyhow::{bail, Context, Result};
use legraphe::export::{render_markdown, to_gml};
use legraphe::{Model, Reconciliation};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::config::ReconcileConfig;

/// Rendered outputs of one run, not yet written
#[derive(Debug, Clone)]
pub struct Outputs {
    files: Vec<(PathBuf, String)>,
}

impl Outputs {
    /// Render the mapping table, GML graph and markdown table
    pub fn render(result: &Reconciliation, config: &ReconcileConfig) -> Result<Self> {
        let mut mapping = result
            .table()
            .to_json_pretty()
            .context("Failed to serialize mapping table")?;
        mapping.push('\n');

        let graph = to_gml(&result.snapshot());
        let docs = render_markdown(
            &result.doc_rows(),
            [config.model_name(Model::A), config.model_name(Model::B)],
        );

        Ok(Self {
            files: vec![
                (config.output.mapping_path(), mapping),
                (config.output.graph_path(), graph),
                (config.output.docs_path(), docs),
            ],
        })
    }

    /// Destination paths, in write order
    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.files.iter().map(|(path, _)| path.as_path())
    }

    /// Write every file, or none of them
    ///
    /// All contents are staged as sibling `.tmp` files first. Only when every
    /// file is staged are they renamed into place; a failure at any point
    /// removes the staged files and restores any destination already
    /// replaced.
    pub fn write(&self) -> Result<()> {
        let mut staged = Vec::with_capacity(self.files.len());
        for (path, content) in &self.files {
            match stage(path, content) {
                Ok(tmp) => staged.push(Staged {
                    path: path.clone(),
                    tmp,
                }),
                Err(err) => {
                    discard(&staged);
                    return Err(err);
                }
            }
        }

        commit(&staged)?;
        for (path, content) in &self.files {
            info!(path = %path.display(), bytes = content.len(), "wrote output");
        }
        Ok(())
    }
}

/// A file written next to its destination, not yet renamed
#[derive(Debug)]
struct Staged {
    path: PathBuf,
    tmp: PathBuf,
}

fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

fn stage(path: &Path, content: &str) -> Result<PathBuf> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create output directory: {:?}", parent))?;
    }
    if path.is_dir() {
        bail!("Output path is a directory: {:?}", path);
    }

    let tmp = sibling(path, ".tmp");
    fs::write(&tmp, content)
        .with_context(|| format!("Failed to write temporary file: {:?}", tmp))?;
    Ok(tmp)
}

fn discard(staged: &[Staged]) {
    for file in staged {
        if let Err(err) = fs::remove_file(&file.tmp) {
            warn!(path = %file.tmp.display(), %err, "failed to remove staged file");
        }
    }
}

/// Rename staged files into place, rolling back on the first failure
fn commit(staged: &[Staged]) -> Result<()> {
    let mut placed: Vec<(&Staged, Option<PathBuf>)> = Vec::with_capacity(staged.len());

    for (i, file) in staged.iter().enumerate() {
        let backup = sibling(&file.path, ".bak");
        let backup = if file.path.exists() {
            if let Err(err) = fs::rename(&file.path, &backup) {
                rollback(&placed);
                discard(&staged[i..]);
                return Err(err).with_context(|| format!("Failed to back up {:?}", file.path));
            }
            Some(backup)
        } else {
            None
        };

        if let Err(err) = fs::rename(&file.tmp, &file.path) {
            placed.push((file, backup));
            rollback(&placed);
            discard(&staged[i..]);
            return Err(err)
                .with_context(|| format!("Failed to move {:?} to {:?}", file.tmp, file.path));
        }
        placed.push((file, backup));
    }

    for (_, backup) in &placed {
        if let Some(backup) = backup {
            let _ = fs::remove_file(backup);
        }
    }
    Ok(())
}

/// Restore replaced destinations and drop newly created ones
fn rollback(placed: &[(&Staged, Option<PathBuf>)]) {
    for (file, backup) in placed.iter().rev() {
        let restored = match backup {
            Some(backup) => fs::rename(backup, &file.path),
            None if file.path.is_file() => fs::remove_file(&file.path),
            None => Ok(()),
        };
        if let Err(err) = restored {
            warn!(path = %file.path.display(), %err, "failed to roll back output");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn outputs(dir: &Path, names: [&str; 3], contents: [&str; 3]) -> Outputs {
        Outputs {
            files: names
                .iter()
                .zip(contents)
                .map(|(name, content)| (dir.join(name), content.to_string()))
                .collect(),
        }
    }

    #[test]
    fn test_write_creates_parents_and_replaces() {
        let dir = TempDir::new().unwrap();
        let names = ["nested/a.json", "nested/b.gml", "nested/c.md"];

        outputs(dir.path(), names, ["{}", "graph", "old"]).write().unwrap();
        outputs(dir.path(), names, ["{\"a\": 1}", "graph", "new"]).write().unwrap();

        assert_eq!(fs::read_to_string(dir.path().join("nested/a.json")).unwrap(), "{\"a\": 1}");
        assert_eq!(fs::read_to_string(dir.path().join("nested/c.md")).unwrap(), "new");
        for name in names {
            assert!(!sibling(&dir.path().join(name), ".tmp").exists());
            assert!(!sibling(&dir.path().join(name), ".bak").exists());
        }
    }

    #[test]
    fn test_blocked_destination_leaves_previous_outputs() {
        let dir = TempDir::new().unwrap();
        let names = ["a.json", "b.gml", "c.md"];
        fs::write(dir.path().join("a.json"), "previous").unwrap();
        fs::create_dir(dir.path().join("c.md")).unwrap();

        let err = outputs(dir.path(), names, ["{}", "graph", "docs"]).write().unwrap_err();
        assert!(err.to_string().contains("c.md"));

        assert_eq!(fs::read_to_string(dir.path().join("a.json")).unwrap(), "previous");
        assert!(!dir.path().join("b.gml").exists());
        for name in names {
            assert!(!sibling(&dir.path().join(name), ".tmp").exists());
        }
    }

    #[test]
    fn test_failed_rename_rolls_back_earlier_files() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.json"), "previous").unwrap();
        let staged = vec![
            Staged {
                path: dir.path().join("a.json"),
                tmp: dir.path().join("a.json.tmp"),
            },
            Staged {
                path: dir.path().join("b.gml"),
                tmp: dir.path().join("b.gml.tmp"),
            },
        ];
        fs::write(&staged[0].tmp, "next").unwrap();
        // second staged file is missing, so its rename fails

        assert!(commit(&staged).is_err());
        assert_eq!(fs::read_to_string(dir.path().join("a.json")).unwrap(), "previous");
        assert!(!dir.path().join("a.json.bak").exists());
        assert!(!dir.path().join("a.json.tmp").exists());
        assert!(!dir.path().join("b.gml").exists());
    }
}
