use serde::{Deserialize, Serialize};

/// Leading text of an inline source-map annotation line.
pub const ANNOTATION_PREFIX: &str = "/*# sourceMappingURL=";

/// The JSON structure for source maps following the Source Map v3
/// specification, https://sourcemaps.info/spec.html
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceMap {
    pub version: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_root: Option<String>,
    pub sources: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources_content: Vec<Option<String>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub names: Vec<String>,
    pub mappings: String,
}

impl SourceMap {
    /// Serialize to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Generate the inline source map data URI
    pub fn to_data_uri(&self) -> Result<String, serde_json::Error> {
        let json = serde_json::to_string(self)?;
        let encoded =
            base64::Engine::encode(&base64::engine::general_purpose::STANDARD, json.as_bytes());
        Ok(format!(
            "data:application/json;charset=utf-8;base64,{}",
            encoded
        ))
    }

    /// Generate the source mapping URL comment for CSS
    pub fn to_comment(&self) -> Result<String, serde_json::Error> {
        let data_uri = self.to_data_uri()?;
        Ok(format!("/*# sourceMappingURL={} */", data_uri))
    }
}

/// Append the inline annotation to `css` as a single trailing line.
pub fn append_annotation(css: &mut String, map: &SourceMap) -> Result<(), serde_json::Error> {
    let comment = map.to_comment()?;
    if !css.is_empty() && !css.ends_with('\n') {
        css.push('\n');
    }
    css.push_str(&comment);
    css.push('\n');
    Ok(())
}

/// Split a trailing inline annotation off compiler output.
///
/// Returns the CSS without the annotation line plus the decoded map when
/// one was present and readable. Both the `charset=utf-8` form and the
/// bare `data:application/json;base64,` form are accepted.
pub fn split_annotation(css: &str) -> (String, Option<SourceMap>) {
    let Some(start) = css.rfind(ANNOTATION_PREFIX) else {
        return (css.to_string(), None);
    };

    let annotation = &css[start..];
    let map = decode_annotation(annotation);

    let mut stripped = css[..start].trim_end().to_string();
    if !stripped.is_empty() {
        stripped.push('\n');
    }
    (stripped, map)
}

fn decode_annotation(annotation: &str) -> Option<SourceMap> {
    let payload_at = annotation.find("base64,")? + "base64,".len();
    let rest = &annotation[payload_at..];
    let end = rest.find("*/").unwrap_or(rest.len());
    let encoded = rest[..end].trim();

    let bytes =
        base64::Engine::decode(&base64::engine::general_purpose::STANDARD, encoded).ok()?;
    serde_json::from_slice(&bytes).ok()
}
