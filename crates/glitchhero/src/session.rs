use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use renderer::{SeedBackend, SeedKey};

const INTRO_KEY: &str = "intro_shown";

/// Session values stored as a flat TOML string table.
///
/// Seeds are kept as decimal text so hand-edited files round-trip without
/// type surprises. Every write goes straight to disk.
#[derive(Debug, Clone)]
pub struct SessionFile {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl SessionFile {
    /// Reads `path`, treating a missing file as an empty session.
    pub fn load(path: &Path) -> Result<Self> {
        let values = match fs::read_to_string(path) {
            Ok(raw) => {
                let table: toml::Table = toml::from_str(&raw)
                    .with_context(|| format!("failed to parse session file {}", path.display()))?;
                normalise(table, path)
            }
            Err(err) if err.kind() == ErrorKind::NotFound => BTreeMap::new(),
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("failed to read session file {}", path.display()))
            }
        };
        Ok(Self {
            path: path.to_path_buf(),
            values,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn seed(&self, key: SeedKey) -> Option<&str> {
        self.values.get(key.storage_key()).map(String::as_str)
    }

    pub fn intro_shown(&self) -> bool {
        self.values.get(INTRO_KEY).is_some_and(|value| value == "1")
    }

    pub fn mark_intro_shown(&mut self) -> Result<()> {
        self.values.insert(INTRO_KEY.to_string(), "1".to_string());
        self.persist()
    }

    pub fn persist(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let encoded = toml::to_string(&self.values).context("failed to encode session")?;
        fs::write(&self.path, encoded)
            .with_context(|| format!("failed to write session file {}", self.path.display()))
    }

    /// Removes the session file; a missing file is not an error.
    pub fn reset(path: &Path) -> Result<bool> {
        match fs::remove_file(path) {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
            Err(err) => {
                Err(err).with_context(|| format!("failed to remove session file {}", path.display()))
            }
        }
    }
}

/// Accepts hand-edited integers and booleans alongside the string values this
/// module writes; anything else is dropped with a warning naming the key.
fn normalise(table: toml::Table, path: &Path) -> BTreeMap<String, String> {
    table
        .into_iter()
        .filter_map(|(key, value)| {
            let text = match value {
                toml::Value::String(text) => text,
                toml::Value::Integer(number) => number.to_string(),
                toml::Value::Boolean(flag) => if flag { "1" } else { "0" }.to_string(),
                other => {
                    tracing::warn!(
                        path = %path.display(),
                        key = %key,
                        kind = other.type_str(),
                        "ignoring session value of unsupported type"
                    );
                    return None;
                }
            };
            Some((key, text))
        })
        .collect()
}

impl SeedBackend for SessionFile {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.values.insert(key.to_string(), value.to_string());
        self.persist()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use renderer::SeedStore;
    use tempfile::TempDir;

    #[test]
    fn missing_file_is_an_empty_session() {
        let dir = TempDir::new().unwrap();
        let session = SessionFile::load(&dir.path().join("session.toml")).unwrap();
        assert!(!session.intro_shown());
        assert_eq!(session.seed(SeedKey::Background), None);
    }

    #[test]
    fn seeds_survive_a_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("session.toml");

        let mut store = SeedStore::new(Box::new(SessionFile::load(&path).unwrap()));
        let first = store.pair();

        let reloaded = SessionFile::load(&path).unwrap();
        assert_eq!(
            reloaded.seed(SeedKey::Background),
            Some(first.background.to_string().as_str())
        );
        let mut store = SeedStore::new(Box::new(reloaded));
        assert_eq!(store.pair(), first);
    }

    #[test]
    fn intro_flag_persists_and_reset_clears_it() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.toml");

        let mut session = SessionFile::load(&path).unwrap();
        session.mark_intro_shown().unwrap();
        assert!(SessionFile::load(&path).unwrap().intro_shown());

        assert!(SessionFile::reset(&path).unwrap());
        assert!(!SessionFile::reset(&path).unwrap());
        assert!(!SessionFile::load(&path).unwrap().intro_shown());
    }

    #[test]
    fn hand_edited_numbers_are_accepted() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.toml");
        fs::write(
            &path,
            "background_seed = 123\nlogo_seed = \"456\"\nintro_shown = true\nnotes = [1, 2]\n",
        )
        .unwrap();

        let session = SessionFile::load(&path).unwrap();
        assert_eq!(session.seed(SeedKey::Background), Some("123"));
        assert_eq!(session.seed(SeedKey::Logo), Some("456"));
        assert!(session.intro_shown());
        assert_eq!(session.get("notes"), None);

        let mut store = SeedStore::new(Box::new(session));
        assert_eq!(store.pair().background, 123);
    }

    #[test]
    fn corrupt_file_reports_its_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.toml");
        fs::write(&path, "this is = = not toml").unwrap();
        let err = SessionFile::load(&path).unwrap_err();
        assert!(format!("{err:#}").contains("session.toml"));
    }
}
