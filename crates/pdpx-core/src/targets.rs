use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// A product page to process, with tags appended to whatever the page's
/// breadcrumbs yield.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapeTarget {
    pub url: String,
    #[serde(default)]
    pub extra_tags: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct TargetsFile {
    pub targets: Vec<ScrapeTarget>,
}

/// Load and validate an ordered URL list from a YAML file.
///
/// Order is preserved; the batch runner processes targets as listed.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or contains a
/// URL that is not absolute `http(s)`.
pub fn load_targets(path: &Path) -> Result<TargetsFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let targets_file: TargetsFile =
        serde_yaml::from_str(&content).map_err(|e| ConfigError::FileParse {
            path: path.display().to_string(),
            source: e,
        })?;

    validate_targets(&targets_file)?;

    Ok(targets_file)
}

fn validate_targets(targets_file: &TargetsFile) -> Result<(), ConfigError> {
    for (idx, target) in targets_file.targets.iter().enumerate() {
        let url = target.url.trim();
        if !(url.starts_with("https://") || url.starts_with("http://")) {
            return Err(ConfigError::Validation(format!(
                "target #{} has a non-http URL: '{}'",
                idx + 1,
                target.url
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_targets_with_and_without_tags() {
        let yaml = r#"
targets:
  - url: "https://shop.example.com/p/trail-runner"
    extra_tags: [summer, sale]
  - url: "https://shop.example.com/p/road-racer"
"#;
        let file: TargetsFile = serde_yaml::from_str(yaml).expect("valid YAML");
        assert!(validate_targets(&file).is_ok());
        assert_eq!(file.targets.len(), 2);
        assert_eq!(file.targets[0].extra_tags, vec!["summer", "sale"]);
        assert!(file.targets[1].extra_tags.is_empty());
    }

    #[test]
    fn rejects_relative_url() {
        let file = TargetsFile {
            targets: vec![ScrapeTarget {
                url: "/p/trail-runner".to_string(),
                extra_tags: vec![],
            }],
        };
        let err = validate_targets(&file).unwrap_err();
        assert!(err.to_string().contains("target #1"));
    }

    #[test]
    fn empty_list_is_valid() {
        let file = TargetsFile { targets: vec![] };
        assert!(validate_targets(&file).is_ok());
    }
}
