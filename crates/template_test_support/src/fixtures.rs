//! Fixture files shared by the integration tests.

use std::fs;
use std::path::Path;

use serde::Deserialize;

/// One golden render case: an outline and its expected output in both modes.
#[derive(Clone, Debug, Deserialize)]
pub struct RenderCase {
    pub name: String,
    pub outline: String,
    pub minified: String,
    /// Omitted when the case only pins minified output.
    #[serde(default)]
    pub pretty: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RenderFile {
    #[serde(rename = "case")]
    cases: Vec<RenderCase>,
}

/// One event case: an outline and the visitor event lines it must produce.
#[derive(Clone, Debug, Deserialize)]
pub struct EventCase {
    pub name: String,
    pub outline: String,
    pub events: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct EventFile {
    format: String,
    cases: Vec<EventCase>,
}

pub const EVENT_FORMAT_V1: &str = "template-events-v1";

pub fn load_render_cases(path: &Path) -> Vec<RenderCase> {
    let content = fs::read_to_string(path)
        .unwrap_or_else(|err| panic!("failed to read render fixtures {path:?}: {err}"));
    parse_render_cases(&content)
        .unwrap_or_else(|err| panic!("failed to parse render fixtures {path:?}: {err}"))
}

pub fn parse_render_cases(content: &str) -> Result<Vec<RenderCase>, toml::de::Error> {
    let file: RenderFile = toml::from_str(content)?;
    Ok(file.cases)
}

pub fn load_event_cases(path: &Path) -> Vec<EventCase> {
    let content = fs::read_to_string(path)
        .unwrap_or_else(|err| panic!("failed to read event fixtures {path:?}: {err}"));
    let file: EventFile = serde_json::from_str(&content)
        .unwrap_or_else(|err| panic!("failed to parse event fixtures {path:?}: {err}"));
    assert_eq!(
        file.format, EVENT_FORMAT_V1,
        "unsupported format in {path:?}"
    );
    let mut seen = std::collections::BTreeSet::new();
    for case in &file.cases {
        assert!(
            seen.insert(case.name.as_str()),
            "duplicate case '{}' in {path:?}",
            case.name
        );
    }
    file.cases
}
