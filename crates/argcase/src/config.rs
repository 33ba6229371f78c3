//! Configuration sources and the persisted configuration document.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::Result;

pub const CONFIG_SCHEMA_VERSION: u32 = 1;

/// A key/value source consulted by configuration parsing.
pub trait ConfigurationReader {
    /// Name used in log output.
    fn name(&self) -> &str;

    fn get(&self, key: &str) -> Option<String>;

    /// Every value stored under `key`, in document order. Sources that keep
    /// one value per key return at most one.
    fn get_all(&self, key: &str) -> Vec<String> {
        self.get(key).into_iter().collect()
    }
}

/// Flat, ordered list of key/value pairs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ConfigDocument {
    pub schema_version: u32,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub entries: Vec<ConfigEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ConfigEntry {
    pub key: String,
    pub value: String,
    /// Field labels and usage of the case, written when requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl Default for ConfigDocument {
    fn default() -> Self {
        Self {
            schema_version: CONFIG_SCHEMA_VERSION,
            entries: Vec::new(),
        }
    }
}

impl ConfigDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.push(ConfigEntry {
            key: key.into(),
            value: value.into(),
            comment: None,
        });
    }

    pub fn push_entry(&mut self, entry: ConfigEntry) {
        self.entries.push(entry);
    }

    /// Value of the last entry with `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .rev()
            .find(|e| e.key == key)
            .map(|e| e.value.as_str())
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        let mut out = serde_json::to_string_pretty(self)?;
        out.push('\n');
        Ok(out)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    /// Write through a temporary file next to `path`.
    pub fn write_file(&self, path: &Path) -> Result<()> {
        let out = self.to_json_pretty()?;
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, out.as_bytes())?;
        if path.exists() {
            fs::remove_file(path)?;
        }
        fs::rename(&tmp, path)?;
        Ok(())
    }
}

impl ConfigurationReader for ConfigDocument {
    fn name(&self) -> &str {
        "configuration document"
    }

    fn get(&self, key: &str) -> Option<String> {
        ConfigDocument::get(self, key).map(str::to_string)
    }

    fn get_all(&self, key: &str) -> Vec<String> {
        self.entries
            .iter()
            .filter(|e| e.key == key)
            .map(|e| e.value.clone())
            .collect()
    }
}

impl ConfigurationReader for HashMap<String, String> {
    fn name(&self) -> &str {
        "map"
    }

    fn get(&self, key: &str) -> Option<String> {
        HashMap::get(self, key).cloned()
    }
}

impl ConfigurationReader for IndexMap<String, String> {
    fn name(&self) -> &str {
        "map"
    }

    fn get(&self, key: &str) -> Option<String> {
        IndexMap::get(self, key).cloned()
    }
}

/// Adapts a lookup closure, e.g. over environment variables.
pub struct FnReader<F> {
    name: String,
    lookup: F,
}

impl<F> FnReader<F>
where
    F: Fn(&str) -> Option<String>,
{
    pub fn new(name: impl Into<String>, lookup: F) -> Self {
        Self {
            name: name.into(),
            lookup,
        }
    }
}

impl<F> ConfigurationReader for FnReader<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn get(&self, key: &str) -> Option<String> {
        (self.lookup)(key)
    }
}

/// Source with no values.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyReader;

impl ConfigurationReader for EmptyReader {
    fn name(&self) -> &str {
        "empty"
    }

    fn get(&self, _key: &str) -> Option<String> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn make_temp_dir(prefix: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        let dir = std::env::temp_dir().join(format!("{prefix}-{}-{nanos}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn last_entry_wins() {
        let mut document = ConfigDocument::new();
        document.push("port", "1");
        document.push("port", "2");
        assert_eq!(document.get("port"), Some("2"));
        assert_eq!(ConfigurationReader::get(&document, "host"), None);
        assert_eq!(document.get_all("port"), vec!["1", "2"]);
        assert!(document.get_all("host").is_empty());
    }

    #[test]
    fn json_layout() {
        let mut document = ConfigDocument::new();
        document.push("log level", "3");
        document.push_entry(ConfigEntry {
            key: "verbose".to_string(),
            value: "true".to_string(),
            comment: Some("be verbose".to_string()),
        });

        let json = document.to_json_pretty().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["schema-version"], 1);
        assert_eq!(value["entries"][0]["key"], "log level");
        assert!(value["entries"][0].get("comment").is_none());
        assert_eq!(value["entries"][1]["comment"], "be verbose");
        assert_eq!(ConfigDocument::from_json(&json).unwrap(), document);
    }

    #[test]
    fn write_and_reload() {
        let dir = make_temp_dir("argcase-config");
        let path = dir.join("settings.json");

        let mut document = ConfigDocument::new();
        document.push("jobs", "4");
        document.write_file(&path).unwrap();
        document.push("jobs", "8");
        document.write_file(&path).unwrap();

        let loaded = ConfigDocument::from_file(&path).unwrap();
        assert_eq!(loaded.get("jobs"), Some("8"));
        assert!(!path.with_extension("tmp").exists());
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn readers() {
        let mut map = HashMap::new();
        map.insert("port".to_string(), "80".to_string());
        assert_eq!(ConfigurationReader::get(&map, "port").as_deref(), Some("80"));
        assert_eq!(map.get_all("port"), vec!["80"]);

        let mut ordered = IndexMap::new();
        ordered.insert("host".to_string(), "local".to_string());
        assert_eq!(ConfigurationReader::get(&ordered, "host").as_deref(), Some("local"));

        let reader = FnReader::new("env", |key: &str| (key == "jobs").then(|| "2".to_string()));
        assert_eq!(reader.name(), "env");
        assert_eq!(reader.get("jobs").as_deref(), Some("2"));
        assert_eq!(reader.get("port"), None);
        assert_eq!(EmptyReader.get("port"), None);
    }
}
