//! Report configuration
//!
//! Every field has a default, so an empty TOML document is a valid
//! configuration and yields [`ReportConfig::default`].
//!
//! ```toml
//! source_path = "survey.xlsx"
//! layout = "sidebar"
//! decorations = "halves"
//! max_localities = 5
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::rank::DecorationScheme;
use crate::KeyColumns;

/// Shown instead of a report when no metric is selected
pub const PROMPT_MESSAGE: &str = "בחר מדד אחד לפחות להצגה.";

/// Shown below the metric sections of a successful report
pub const SUCCESS_MESSAGE: &str = "הנתונים מוצגים לפי בחירתך. ניתן לשנות את המדדים בכל שלב.";

/// Page arrangement
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    /// All sections stacked on one page
    Single,
    /// "Overview" and "comparison" tabs
    #[default]
    Tabs,
    /// Filter panel beside the main column
    Sidebar,
}

impl Layout {
    pub fn as_str(self) -> &'static str {
        match self {
            Layout::Single => "single",
            Layout::Tabs => "tabs",
            Layout::Sidebar => "sidebar",
        }
    }
}

impl std::str::FromStr for Layout {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "single" => Ok(Layout::Single),
            "tabs" => Ok(Layout::Tabs),
            "sidebar" => Ok(Layout::Sidebar),
            other => Err(ConfigError::InvalidValue {
                field: "layout".into(),
                value: other.to_string(),
            }),
        }
    }
}

/// Dashboard settings
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Input spreadsheet
    pub source_path: PathBuf,
    /// Required year column (exact key)
    pub year_column: String,
    /// Required locality column (exact key)
    pub locality_column: String,
    pub title: String,
    pub max_metrics: usize,
    pub max_localities: usize,
    /// Display rounding for means
    pub decimals: u32,
    pub layout: Layout,
    pub decorations: DecorationScheme,
    /// Categorical column for the share pie; picked automatically when unset
    pub share_column: Option<String>,
    /// Sum this metric in the share pie instead of counting rows
    pub share_metric: Option<String>,
    /// Rows of the filtered table shown on the page
    pub preview_rows: usize,
    pub right_to_left: bool,
    pub export_file_name: String,
    pub export_sheet_name: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            source_path: PathBuf::from("סקר חברתי.xlsx"),
            year_column: "שנה".to_string(),
            locality_column: "שם  הרשות".to_string(),
            title: "דשבורד סקר חברתי".to_string(),
            max_metrics: 3,
            max_localities: 10,
            decimals: 1,
            layout: Layout::Tabs,
            decorations: DecorationScheme::Medals,
            share_column: None,
            share_metric: None,
            preview_rows: 200,
            right_to_left: true,
            export_file_name: "סקר חברתי - נתונים מסוננים.xlsx".to_string(),
            export_sheet_name: "סקר חברתי".to_string(),
        }
    }
}

impl ReportConfig {
    /// Parse a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from an explicit path; a missing file is an error
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "loaded report config");
        Self::from_toml_str(&content)
    }

    /// Load from `path` when given, otherwise use the defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// The year and locality columns as a pair
    pub fn key_columns(&self) -> KeyColumns {
        KeyColumns::new(self.year_column.clone(), self.locality_column.clone())
    }

    pub fn prompt_message(&self) -> &'static str {
        PROMPT_MESSAGE
    }

    pub fn success_message(&self) -> &'static str {
        SUCCESS_MESSAGE
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.year_column.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "year_column".into(),
                value: String::new(),
            });
        }
        if self.locality_column.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "locality_column".into(),
                value: String::new(),
            });
        }
        if self.max_metrics == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_metrics".into(),
                value: "0".into(),
            });
        }
        if self.export_sheet_name.is_empty() || self.export_sheet_name.chars().count() > 31 {
            return Err(ConfigError::InvalidValue {
                field: "export_sheet_name".into(),
                value: self.export_sheet_name.clone(),
            });
        }
        Ok(())
    }
}

/// Configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config: {0}")]
    Parse(String),

    #[error("Invalid value for '{field}': '{value}'")]
    InvalidValue { field: String, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn empty_document_is_the_default() {
        assert_eq!(ReportConfig::from_toml_str("").unwrap(), ReportConfig::default());
    }

    #[test]
    fn default_keys_are_verbatim() {
        let config = ReportConfig::default();
        assert_eq!(config.locality_column, "שם  הרשות");
        assert_eq!(config.key_columns(), KeyColumns::new("שנה", "שם  הרשות"));
        assert_eq!(config.max_metrics, 3);
        assert_eq!(config.layout, Layout::Tabs);
    }

    #[test]
    fn partial_document_overrides_fields() {
        let config = ReportConfig::from_toml_str(
            r#"
            layout = "sidebar"
            decorations = "halves"
            max_localities = 5
            share_column = "district"
            "#,
        )
        .unwrap();
        assert_eq!(config.layout, Layout::Sidebar);
        assert_eq!(config.decorations, DecorationScheme::Halves);
        assert_eq!(config.max_localities, 5);
        assert_eq!(config.share_column.as_deref(), Some("district"));
        assert_eq!(config.decimals, 1);
    }

    #[test]
    fn unknown_layout_is_rejected() {
        let err = ReportConfig::from_toml_str("layout = \"grid\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
        assert!("grid".parse::<Layout>().is_err());
        assert_eq!(" Tabs ".parse::<Layout>().unwrap(), Layout::Tabs);
    }

    #[test]
    fn invalid_values_are_rejected() {
        let err = ReportConfig::from_toml_str("max_metrics = 0").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));

        let long = format!("export_sheet_name = \"{}\"", "x".repeat(32));
        assert!(ReportConfig::from_toml_str(&long).is_err());
    }

    #[test]
    fn load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "title = \"Survey\"").unwrap();
        let config = ReportConfig::load(file.path()).unwrap();
        assert_eq!(config.title, "Survey");
    }

    #[test]
    fn missing_file_is_an_error_only_when_explicit() {
        let err = ReportConfig::load(Path::new("/nonexistent/surveydash.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
        assert_eq!(
            ReportConfig::load_or_default(None).unwrap(),
            ReportConfig::default()
        );
    }

    #[test]
    fn toml_round_trip() {
        let config = ReportConfig {
            share_metric: Some("score".into()),
            ..ReportConfig::default()
        };
        let text = config.to_toml_string().unwrap();
        assert_eq!(ReportConfig::from_toml_str(&text).unwrap(), config);
    }
}
