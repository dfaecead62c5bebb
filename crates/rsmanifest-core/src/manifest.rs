//! Installed-code manifests stored in `rsmanifest.json`.
//!
//! A manifest records, per virtualenv, which codes were installed, from
//! where, and at which version. Codes not installed in a virtualenv live
//! under the empty key.

use crate::json::{self, JsonError};
use crate::ordered::OrderedMapping;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

/// File name of a manifest in any directory.
pub const BASENAME: &str = "rsmanifest.json";

/// Written once when the container image is built.
pub const CONTAINER_FILE: &str = "/rsmanifest.json";

/// Read and rewritten by the run user.
pub const USER_FILE: &str = "~/rsmanifest.json";

/// Format version stamped on new manifests.
pub const FORMAT_VERSION: &str = "20170217.180000";

/// Key for codes not installed in a virtualenv.
pub const NO_VENV: &str = "";

const INSTALLED_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// A parsed manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    /// Manifest format version.
    pub version: String,
    /// Installed codes, keyed by virtualenv then by lower-cased code name.
    pub codes: OrderedMapping<OrderedMapping<CodeEntry>>,
    /// Any other top-level fields, kept as found.
    #[serde(flatten)]
    pub extra: OrderedMapping<Value>,
}

/// One installed code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeEntry {
    /// UTC install time, e.g. `2017-02-17T18:00:00Z`.
    pub installed: String,
    /// Name as given, before lower-casing.
    pub name: String,
    /// Directory the code was installed from.
    pub source_d: String,
    /// Repository or source link.
    pub uri: String,
    /// Commit or version.
    pub version: String,
    /// Any other fields recorded for this code, kept as found.
    #[serde(flatten)]
    pub extra: OrderedMapping<Value>,
}

/// A code to record with [`Manifest::add_code`].
#[derive(Debug, Clone)]
pub struct NewCode {
    pub name: String,
    pub version: String,
    pub uri: String,
    pub source_d: String,
}

/// Errors that can occur when loading or saving a manifest.
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("manifest {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: JsonError,
    },
}

impl ManifestError {
    fn json(path: &Path, source: JsonError) -> Self {
        Self::Json {
            path: path.display().to_string(),
            source,
        }
    }
}

impl Default for Manifest {
    fn default() -> Self {
        let mut codes = OrderedMapping::new();
        codes.set(NO_VENV, OrderedMapping::new());
        Self {
            version: FORMAT_VERSION.to_string(),
            codes,
            extra: OrderedMapping::new(),
        }
    }
}

impl Manifest {
    /// Load a manifest, failing if it is missing or malformed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ManifestError> {
        let path = path.as_ref();
        json::load(path).map_err(|e| ManifestError::json(path, e))
    }

    /// Load a manifest, starting fresh if it is missing or not valid JSON.
    ///
    /// Valid JSON that does not fit the manifest layout is an error, as are
    /// other read failures such as permission errors.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ManifestError> {
        let path = path.as_ref();
        match json::load(path) {
            Ok(manifest) => Ok(manifest),
            Err(JsonError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no manifest yet, starting a new one");
                Ok(Self::default())
            }
            Err(JsonError::Parse(e)) if e.is_syntax() || e.is_eof() => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring malformed manifest");
                Ok(Self::default())
            }
            Err(e) => Err(ManifestError::json(path, e)),
        }
    }

    /// Write the manifest as pretty JSON.
    pub fn write(&self, path: impl AsRef<Path>) -> Result<(), ManifestError> {
        let path = path.as_ref();
        json::dump_pretty(self, path).map_err(|e| ManifestError::json(path, e))
    }

    /// Record a code, replacing any earlier entry of the same name.
    ///
    /// An empty or absent `virtual_env` files the code under [`NO_VENV`].
    pub fn add_code(
        &mut self,
        code: NewCode,
        virtual_env: Option<&str>,
        installed: DateTime<Utc>,
    ) -> &CodeEntry {
        let venv = virtual_env.filter(|v| !v.is_empty()).unwrap_or(NO_VENV);
        let key = code.name.to_lowercase();
        let entry = CodeEntry {
            installed: installed.format(INSTALLED_FORMAT).to_string(),
            name: code.name,
            source_d: code.source_d,
            uri: code.uri,
            version: code.version,
            extra: OrderedMapping::new(),
        };

        let venv_codes = self.codes.get_or_insert_with(venv, OrderedMapping::new);
        venv_codes.set(key.clone(), entry);
        &venv_codes[key.as_str()]
    }

    /// Look up a recorded code by virtualenv and case-insensitive name.
    pub fn code(&self, virtual_env: Option<&str>, name: &str) -> Option<&CodeEntry> {
        let venv = virtual_env.filter(|v| !v.is_empty()).unwrap_or(NO_VENV);
        self.codes.get(venv).ok()?.get(&name.to_lowercase()).ok()
    }
}

/// Record a code in the manifest at `path`, creating the file if needed.
pub fn add_code(
    path: impl AsRef<Path>,
    code: NewCode,
    virtual_env: Option<&str>,
) -> Result<Manifest, ManifestError> {
    let path = path.as_ref();
    let mut manifest = Manifest::load_or_default(path)?;
    let entry = manifest.add_code(code, virtual_env, Utc::now());
    tracing::info!(
        path = %path.display(),
        name = %entry.name,
        version = %entry.version,
        "recorded code"
    );
    manifest.write(path)?;
    Ok(manifest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn code(name: &str, version: &str) -> NewCode {
        NewCode {
            name: name.to_string(),
            version: version.to_string(),
            uri: format!("https://github.com/radiasoft/{}", name.to_lowercase()),
            source_d: format!("/home/vagrant/src/{name}"),
        }
    }

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2017, 2, 17, hour, 0, 0).unwrap()
    }

    #[test]
    fn default_manifest() {
        let manifest = Manifest::default();
        assert_eq!(manifest.version, FORMAT_VERSION);
        assert_eq!(manifest.codes.keys().collect::<Vec<_>>(), [NO_VENV]);
        assert!(manifest.codes[NO_VENV].is_empty());
    }

    #[test]
    fn add_code_without_venv() {
        let mut manifest = Manifest::default();
        let entry = manifest.add_code(code("PyKern", "abc123"), None, at(18));
        assert_eq!(entry.installed, "2017-02-17T18:00:00Z");
        assert_eq!(entry.name, "PyKern");

        let entry = manifest.code(Some(""), "pykern").unwrap();
        assert_eq!(entry.version, "abc123");
        assert_eq!(entry.uri, "https://github.com/radiasoft/pykern");
    }

    #[test]
    fn add_code_creates_venv_after_existing() {
        let mut manifest = Manifest::default();
        manifest.add_code(code("srw", "1"), Some("py2"), at(1));
        manifest.add_code(code("elegant", "2"), Some("py3"), at(2));
        assert_eq!(manifest.codes.keys().collect::<Vec<_>>(), ["", "py2", "py3"]);
        assert!(manifest.code(None, "srw").is_none());
        assert_eq!(manifest.code(Some("py2"), "SRW").unwrap().version, "1");
    }

    #[test]
    fn re_adding_code_overwrites_in_place() {
        let mut manifest = Manifest::default();
        manifest.add_code(code("a", "1"), None, at(1));
        manifest.add_code(code("b", "1"), None, at(1));
        manifest.add_code(code("A", "2"), None, at(3));

        let codes = &manifest.codes[NO_VENV];
        assert_eq!(codes.keys().collect::<Vec<_>>(), ["a", "b"]);
        assert_eq!(codes["a"].version, "2");
        assert_eq!(codes["a"].name, "A");
        assert_eq!(codes["a"].installed, "2017-02-17T03:00:00Z");
    }

    #[test]
    fn serializes_in_field_order() {
        let mut manifest = Manifest::default();
        manifest.add_code(code("rsbeams", "v1"), None, at(0));
        let s = serde_json::to_string(&manifest).unwrap();
        assert_eq!(
            s,
            concat!(
                r#"{"version":"20170217.180000","codes":{"":{"rsbeams":{"#,
                r#""installed":"2017-02-17T00:00:00Z","name":"rsbeams","#,
                r#""source_d":"/home/vagrant/src/rsbeams","#,
                r#""uri":"https://github.com/radiasoft/rsbeams","version":"v1"}}}}"#
            )
        );
    }

    #[test]
    fn unknown_fields_survive_a_rewrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(BASENAME);
        std::fs::write(
            &path,
            r#"{"version": "20170217.180000", "codes": {"": {}}, "image": "radiasoft/beamsim"}"#,
        )
        .unwrap();

        add_code(&path, code("pykern", "x"), None).unwrap();
        let loaded = Manifest::load(&path).unwrap();
        assert_eq!(loaded.extra["image"], "radiasoft/beamsim");
        assert_eq!(loaded.code(None, "pykern").unwrap().version, "x");
    }

    #[test]
    fn unknown_entry_fields_survive_a_rewrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(BASENAME);
        std::fs::write(
            &path,
            r#"{"version": "20170217.180000", "codes": {"": {"elegant": {
                "installed": "2017-02-17T18:00:00Z", "name": "elegant",
                "source_d": "/src/elegant", "uri": "https://example.org/elegant",
                "version": "2", "sha": "abc"}}}}"#,
        )
        .unwrap();

        add_code(&path, code("pykern", "x"), None).unwrap();
        let loaded = Manifest::load(&path).unwrap();
        let elegant = loaded.code(None, "elegant").unwrap();
        assert_eq!(elegant.version, "2");
        assert_eq!(elegant.extra["sha"], "abc");
        assert_eq!(
            loaded.codes[NO_VENV].keys().collect::<Vec<_>>(),
            ["elegant", "pykern"]
        );
    }

    #[test]
    fn mismatched_layout_is_an_error_and_file_is_kept() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(BASENAME);
        // srw predates source_d.
        let contents = r#"{"version": "20170217.180000", "codes": {"": {
            "srw": {"installed": "2017-02-17T18:00:00Z", "name": "srw",
                    "uri": "https://example.org/srw", "version": "1"}}}}"#;
        std::fs::write(&path, contents).unwrap();

        let err = add_code(&path, code("pykern", "x"), None).unwrap_err();
        match err {
            ManifestError::Json {
                source: JsonError::Parse(e),
                ..
            } => assert!(e.is_data()),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(std::fs::read_to_string(&path).unwrap(), contents);

        std::fs::write(&path, r#"{"version": "1", "codes": {"py3": null}}"#).unwrap();
        assert!(Manifest::load_or_default(&path).is_err());
    }

    #[test]
    fn empty_file_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(BASENAME);
        std::fs::write(&path, "").unwrap();
        assert_eq!(Manifest::load_or_default(&path).unwrap(), Manifest::default());
    }

    #[test]
    fn add_code_creates_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(BASENAME);

        let manifest = add_code(&path, code("pykern", "1"), Some("py3")).unwrap();
        assert_eq!(Manifest::load(&path).unwrap(), manifest);
        assert_eq!(manifest.codes.keys().collect::<Vec<_>>(), ["", "py3"]);
    }

    #[test]
    fn malformed_file_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(BASENAME);
        std::fs::write(&path, "not json").unwrap();

        assert!(matches!(Manifest::load(&path), Err(ManifestError::Json { .. })));
        assert_eq!(Manifest::load_or_default(&path).unwrap(), Manifest::default());
    }

    #[test]
    fn unreadable_path_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        // A directory cannot be read as a file.
        let err = Manifest::load_or_default(dir.path()).unwrap_err();
        assert!(matches!(
            err,
            ManifestError::Json {
                source: JsonError::Io(_),
                ..
            }
        ));
    }
}
