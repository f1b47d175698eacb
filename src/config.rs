use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use directories::ProjectDirs;
use serde::Deserialize;

pub const DEFAULT_ROOT_ALIAS: &str = "entity";
pub const DEFAULT_IDENTIFIER_FIELD: &str = "id";
pub const DEFAULT_DATE_FORMAT: &str = "%d.%m.%Y";
pub const DEFAULT_TEMPLATE_SUFFIX: &str = ".html";
pub const ERROR_NO_ELEMENT_RENDER_INFO: &str = "data_table.error.no_element_render_info";

/// Knobs shared by every request a service handles.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DataTableConfig {
    /// Alias the root entity is addressed by in the query.
    pub root_alias: String,
    pub identifier_field: String,
    /// `chrono` format applied to date values at the end of a path.
    pub date_format: String,
    /// Appended to `templates_path + column` to form a template id.
    pub template_suffix: String,
    /// Translation key of the "no render info" message.
    pub error_message_key: String,
}

impl Default for DataTableConfig {
    fn default() -> Self {
        Self {
            root_alias: DEFAULT_ROOT_ALIAS.to_string(),
            identifier_field: DEFAULT_IDENTIFIER_FIELD.to_string(),
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            template_suffix: DEFAULT_TEMPLATE_SUFFIX.to_string(),
            error_message_key: ERROR_NO_ELEMENT_RENDER_INFO.to_string(),
        }
    }
}

impl DataTableConfig {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config: {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse config: {}", path.display()))
    }
}

/// Database used when none is given on the command line.
pub fn default_db_path() -> Result<PathBuf> {
    let project_dirs = ProjectDirs::from("com", "hellhbbd", "datatable-list")
        .ok_or_else(|| anyhow!("unable to resolve data directory"))?;
    Ok(project_dirs.data_local_dir().join("datatable.sqlite"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_keeps_defaults_for_missing_keys() {
        let config: DataTableConfig =
            serde_json::from_str(r#"{"date_format": "%Y/%m/%d"}"#).expect("config should parse");

        assert_eq!(config.date_format, "%Y/%m/%d");
        assert_eq!(config.root_alias, "entity");
        assert_eq!(config.identifier_field, "id");
        assert_eq!(config.template_suffix, ".html");
    }

    #[test]
    fn default_db_path_uses_app_directory() {
        let db_path = default_db_path().expect("default db path should resolve");
        let app_dir = db_path
            .parent()
            .and_then(|path| path.file_name())
            .and_then(|name| name.to_str())
            .expect("db path should include app directory");

        assert_eq!(
            db_path.file_name().and_then(|name| name.to_str()),
            Some("datatable.sqlite")
        );
        assert!(app_dir.contains("datatable-list"), "unexpected app dir: {app_dir}");
    }
}
