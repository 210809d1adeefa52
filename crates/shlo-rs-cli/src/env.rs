use std::env;
use std::sync::OnceLock;

static SHLO_RS_DUMP_JSON: OnceLock<bool> = OnceLock::new();

fn parse_bool(value: &str) -> bool {
    let normalized = value.trim().to_ascii_lowercase();
    matches!(normalized.as_str(), "1" | "true" | "yes" | "on")
}

/// `SHLO_RS_DUMP_JSON=1` switches the demo output to one JSON object per
/// printed array.
pub(crate) fn dump_json_enabled() -> bool {
    *SHLO_RS_DUMP_JSON.get_or_init(|| match env::var("SHLO_RS_DUMP_JSON") {
        Ok(value) if !value.trim().is_empty() => parse_bool(&value),
        _ => false,
    })
}
