//! Settings document parsing, serialization and file access

use std::io::Write;

use camino::{Utf8Path, Utf8PathBuf};
use serde_json::{Map, Value};
use settle_core::error::SettleError;
use tempfile::NamedTempFile;

use crate::{flatten::kind, ConfigResult};

/// Parse JSON text into a settings document (an object)
pub fn parse_document(content: &str) -> ConfigResult<Value> {
    parse_named("<input>", content)
}

/// Parse JSON text, naming `source_name` in errors
pub fn parse_named(source_name: &str, content: &str) -> ConfigResult<Value> {
    // Editors on Windows like to save appsettings files with a BOM
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);

    let document: Value = serde_json::from_str(content)
        .map_err(|e| SettleError::malformed(source_name, format!("JSON parsing error: {}", e)))?;

    if !document.is_object() {
        return Err(SettleError::malformed(
            source_name,
            format!("expected an object at the top level, found {}", kind(&document)),
        ));
    }
    Ok(document)
}

/// Serialize a document as indented JSON with keys sorted at every level
pub fn serialize_document(document: &Value) -> ConfigResult<String> {
    let mut canonical = document.clone();
    sort_keys(&mut canonical);

    let mut text = serde_json::to_string_pretty(&canonical)
        .map_err(|e| SettleError::malformed("<output>", format!("JSON serialization error: {}", e)))?;
    text.push('\n');
    Ok(text)
}

fn sort_keys(value: &mut Value) {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = std::mem::take(map).into_iter().collect();
            entries.sort_by(|(a, _), (b, _)| a.cmp(b));
            *map = entries
                .into_iter()
                .map(|(key, mut child)| {
                    sort_keys(&mut child);
                    (key, child)
                })
                .collect::<Map<String, Value>>();
        }
        Value::Array(items) => items.iter_mut().for_each(sort_keys),
        _ => {}
    }
}

/// Load and parse a settings document from file path
pub fn load_from_file(path: &Utf8Path) -> ConfigResult<Value> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| SettleError::io(format!("Failed to read {}", path), e))?;

    parse_named(path.as_str(), &content)
}

/// New content for a file, written next to it but not yet in place.
///
/// Committing renames the content over the target, so readers never see a
/// partially written document. Dropping a staged file without committing it
/// removes the temporary file and leaves the target untouched.
#[derive(Debug)]
pub struct StagedFile {
    target: Utf8PathBuf,
    file: NamedTempFile,
}

impl StagedFile {
    /// Write `content` to a temporary file in the directory of `path`
    pub fn stage(path: &Utf8Path, content: &str) -> ConfigResult<Self> {
        let dir = match path.parent() {
            Some(parent) if !parent.as_str().is_empty() => parent,
            _ => Utf8Path::new("."),
        };

        let mut file = NamedTempFile::new_in(dir)
            .map_err(|e| SettleError::io(format!("Failed to create temporary file in {}", dir), e))?;
        file.write_all(content.as_bytes())
            .map_err(|e| SettleError::io(format!("Failed to write {}", path), e))?;
        file.flush()
            .map_err(|e| SettleError::io(format!("Failed to write {}", path), e))?;

        Ok(Self {
            target: path.to_path_buf(),
            file,
        })
    }

    pub fn target(&self) -> &Utf8Path {
        &self.target
    }

    /// Rename the staged content over the target
    pub fn commit(self) -> ConfigResult<()> {
        let Self { target, file } = self;
        file.persist(&target)
            .map_err(|e| SettleError::io(format!("Failed to replace {}", target), e.error))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn temp_path(dir: &TempDir, name: &str) -> Utf8PathBuf {
        Utf8PathBuf::try_from(dir.path().join(name)).unwrap()
    }

    #[test]
    fn test_parse_document() {
        let json = r#"
{
  "Logging": {
    "LogLevel": {
      "Default": "Information"
    }
  },
  "AllowedHosts": "*"
}
"#;

        let document = parse_document(json).unwrap();
        assert_eq!(document["Logging"]["LogLevel"]["Default"], "Information");
        assert_eq!(document["AllowedHosts"], "*");
    }

    #[test]
    fn test_parse_strips_byte_order_mark() {
        let document = parse_document("\u{feff}{\"A\": 1}").unwrap();
        assert_eq!(document, json!({ "A": 1 }));
    }

    #[test]
    fn test_parse_errors_name_the_source() {
        let err = parse_named("appsettings.json", "{ \"A\": }").unwrap_err();
        match err {
            SettleError::MalformedDocument { source_name, message } => {
                assert_eq!(source_name, "appsettings.json");
                assert!(message.contains("line 1"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_parse_rejects_non_object_root() {
        let err = parse_document("[1, 2, 3]").unwrap_err();
        assert!(matches!(err, SettleError::MalformedDocument { .. }));
    }

    #[test]
    fn test_serialize_is_sorted_and_indented() {
        let document = json!({ "b": { "z": 1, "a": 2 }, "a": [ { "y": 1, "x": 2 } ] });

        let text = serialize_document(&document).unwrap();
        let expected = r#"{
  "a": [
    {
      "x": 2,
      "y": 1
    }
  ],
  "b": {
    "a": 2,
    "z": 1
  }
}
"#;
        assert_eq!(text, expected);
    }

    #[test]
    fn test_serialize_empty_document() {
        assert_eq!(serialize_document(&json!({})).unwrap(), "{}\n");
    }

    #[test]
    fn test_file_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = temp_path(&dir, "appsettings.json");

        StagedFile::stage(&path, "{ \"A\": { \"B\": true } }").unwrap().commit().unwrap();
        let document = load_from_file(&path).unwrap();
        assert_eq!(document, json!({ "A": { "B": true } }));

        StagedFile::stage(&path, "{}").unwrap().commit().unwrap();
        assert_eq!(load_from_file(&path).unwrap(), json!({}));
    }

    #[test]
    fn test_staged_file_waits_for_commit() {
        let dir = TempDir::new().unwrap();
        let path = temp_path(&dir, "appsettings.json");
        std::fs::write(&path, "{\"A\": 1}").unwrap();

        let staged = StagedFile::stage(&path, "{\"A\": 2}").unwrap();
        assert_eq!(staged.target(), path.as_path());
        assert_eq!(load_from_file(&path).unwrap(), json!({ "A": 1 }));

        staged.commit().unwrap();
        assert_eq!(load_from_file(&path).unwrap(), json!({ "A": 2 }));
    }

    #[test]
    fn test_dropped_staged_file_leaves_target() {
        let dir = TempDir::new().unwrap();
        let path = temp_path(&dir, "appsettings.json");
        std::fs::write(&path, "{\"A\": 1}").unwrap();

        drop(StagedFile::stage(&path, "{\"A\": 2}").unwrap());

        assert_eq!(load_from_file(&path).unwrap(), json!({ "A": 1 }));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = TempDir::new().unwrap();
        let path = temp_path(&dir, "missing.json");

        let err = load_from_file(&path).unwrap_err();
        assert!(matches!(err, SettleError::Io { .. }));
        assert!(err.to_string().contains("missing.json"));
    }
}
