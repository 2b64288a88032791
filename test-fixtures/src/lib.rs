//! Fixture loader for the golden JSON datasets shared by integration tests.
//!
//! Fixtures live next to this crate under `golden/`, one subdirectory per
//! consumer. Loading is panic-on-failure: a missing or malformed fixture is
//! a broken test setup, not a runtime condition to recover from.

use std::path::PathBuf;

use serde::de::DeserializeOwned;

/// Locate the fixtures directory from any crate in the workspace.
fn fixtures_root() -> PathBuf {
    let manifest_dir = std::env::var("CARGO_MANIFEST_DIR").unwrap_or_else(|_| ".".to_string());
    let start = PathBuf::from(&manifest_dir);
    for dir in start.ancestors() {
        let candidate = dir.join("test-fixtures");
        if candidate.is_dir() {
            return candidate;
        }
    }
    panic!("no test-fixtures directory found above {manifest_dir}");
}

/// Load and deserialize a JSON fixture.
///
/// # Panics
/// Panics if the file is missing or does not deserialize into `T`.
pub fn load_fixture<T: DeserializeOwned>(relative_path: &str) -> T {
    let path = fixtures_root().join(relative_path);
    let content = std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("failed to read fixture {}: {e}", path.display()));
    serde_json::from_str(&content)
        .unwrap_or_else(|e| panic!("failed to parse fixture {}: {e}", path.display()))
}

/// Load a fixture as an untyped JSON value.
pub fn load_fixture_value(relative_path: &str) -> serde_json::Value {
    load_fixture(relative_path)
}

/// Whether a fixture file exists.
pub fn fixture_exists(relative_path: &str) -> bool {
    fixtures_root().join(relative_path).exists()
}

/// Absolute path of a fixture file.
pub fn fixture_path(relative_path: &str) -> PathBuf {
    fixtures_root().join(relative_path)
}

/// All JSON files in a fixture subdirectory, sorted for determinism.
pub fn list_fixtures(subdir: &str) -> Vec<PathBuf> {
    let dir = fixtures_root().join(subdir);
    if !dir.exists() {
        return Vec::new();
    }
    let mut files: Vec<PathBuf> = std::fs::read_dir(&dir)
        .unwrap_or_else(|e| panic!("failed to read directory {}: {e}", dir.display()))
        .filter_map(|entry| {
            let path = entry.ok()?.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                Some(path)
            } else {
                None
            }
        })
        .collect();
    files.sort();
    files
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixtures_root_exists() {
        assert!(fixtures_root().is_dir(), "test-fixtures directory not found");
    }

    #[test]
    fn all_purify_golden_files_exist() {
        let files = [
            "golden/purify/html_samples.json",
            "golden/purify/redaction_samples.json",
        ];
        for f in &files {
            assert!(fixture_exists(f), "missing fixture: {f}");
        }
    }

    #[test]
    fn all_fusion_golden_files_exist() {
        assert!(fixture_exists("golden/fusion/weighted_rrf.json"));
    }

    #[test]
    fn all_golden_files_parse_as_json() {
        let mut total = 0;
        for dir in ["golden/purify", "golden/fusion"] {
            for file in list_fixtures(dir) {
                let content = std::fs::read_to_string(&file)
                    .unwrap_or_else(|e| panic!("failed to read {}: {e}", file.display()));
                let _: serde_json::Value = serde_json::from_str(&content)
                    .unwrap_or_else(|e| panic!("failed to parse {}: {e}", file.display()));
                total += 1;
            }
        }
        assert_eq!(total, 3, "expected 3 golden dataset files, found {total}");
    }
}
