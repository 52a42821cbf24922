use crate::domain::{EventDetail, EventRow, MetaTypes, Organization, ProjectRecord};
use dirs::data_dir;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// One event in the dataset: the grid row plus optional stack-trace
/// detail for the thread selector.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct DatasetEvent {
    pub data: EventRow,
    #[serde(default)]
    pub detail: EventDetail,
}

/// The on-disk dataset: everything the grid and the thread selector
/// consume, as exported by the monitoring backend.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Dataset {
    pub organization: Organization,
    /// Column order for the grid.
    pub fields: Vec<String>,
    #[serde(default)]
    pub meta: MetaTypes,
    #[serde(default)]
    pub projects: Vec<ProjectRecord>,
    #[serde(default)]
    pub events: Vec<DatasetEvent>,
}

#[derive(Debug, Error)]
pub enum LoadDatasetError {
    #[error("failed to read dataset file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse dataset file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

pub fn load_dataset(path: &Path) -> Result<Dataset, LoadDatasetError> {
    let contents = fs::read_to_string(path).map_err(|source| LoadDatasetError::Read {
        path: path.display().to_string(),
        source,
    })?;
    serde_json::from_str(&contents).map_err(|source| LoadDatasetError::Parse {
        path: path.display().to_string(),
        source,
    })
}

#[derive(Debug, Error)]
pub enum ResolveDatasetPathError {
    #[error("data directory not found")]
    DataDirNotFound,
}

/// `EVGRID_DATASET` overrides; otherwise the platform data dir.
pub fn resolve_dataset_path() -> Result<PathBuf, ResolveDatasetPathError> {
    if let Some(override_path) = std::env::var_os("EVGRID_DATASET") {
        return Ok(PathBuf::from(override_path));
    }

    let Some(data) = data_dir() else {
        return Err(ResolveDatasetPathError::DataDirNotFound);
    };

    Ok(data.join("evgrid").join("events.json"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FieldType;
    use std::io::Write;

    fn write_temp(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn loads_a_full_dataset() {
        let file = write_temp(
            r#"{
                "organization": {"slug": "acme"},
                "fields": ["id", "project", "transaction.duration"],
                "meta": {"transaction.duration": "duration"},
                "projects": [{"id": 1, "slug": "backend", "platform": "python"}],
                "events": [
                    {
                        "data": {"id": "abc", "project": "backend", "transaction.duration": 320},
                        "detail": {
                            "threads": [{"id": 0, "name": "main", "crashed": true}],
                            "exceptions": [{"thread_id": 0, "kind": "ValueError"}]
                        }
                    },
                    {"data": {"id": "def", "project": "backend"}}
                ]
            }"#,
        );

        let dataset = load_dataset(file.path()).unwrap();
        assert_eq!(dataset.organization.slug, "acme");
        assert_eq!(dataset.fields.len(), 3);
        assert_eq!(
            dataset.meta.get("transaction.duration"),
            Some(&FieldType::Duration)
        );
        assert_eq!(dataset.projects[0].slug, "backend");
        assert_eq!(dataset.events.len(), 2);
        assert_eq!(dataset.events[0].detail.threads.len(), 1);
        assert!(dataset.events[1].detail.threads.is_empty());
        assert_eq!(dataset.events[1].data.text("id"), Some("def"));
    }

    #[test]
    fn missing_file_reports_the_path() {
        let error = load_dataset(Path::new("/nonexistent/events.json")).unwrap_err();
        assert!(error.to_string().contains("/nonexistent/events.json"));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let file = write_temp("{not json");
        let error = load_dataset(file.path()).unwrap_err();
        assert!(matches!(error, LoadDatasetError::Parse { .. }));
    }

    #[test]
    fn env_override_wins_for_dataset_path() {
        unsafe { std::env::set_var("EVGRID_DATASET", "/tmp/custom.json") };
        let path = resolve_dataset_path().unwrap();
        unsafe { std::env::remove_var("EVGRID_DATASET") };
        assert_eq!(path, PathBuf::from("/tmp/custom.json"));
    }
}
