//! Scanning of rendered article HTML for mentions and asset references.

use std::collections::HashSet;
use std::sync::LazyLock;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use regex::Regex;
use uuid::Uuid;

use quire_core::types::UserId;

/// Compile a hardcoded pattern, degrading to a never-matching regex.
fn compile_regex(pattern: &str) -> Regex {
    match Regex::new(pattern) {
        Ok(regex) => regex,
        Err(_compile_err) => match Regex::new(r"$^") {
            Ok(fallback) => fallback,
            Err(fallback_err) => panic!("hardcoded fallback regex must compile: {fallback_err}"),
        },
    }
}

static ANCHOR: LazyLock<Regex> = LazyLock::new(|| compile_regex(r"(?is)<a\b([^>]*)>"));
static CLASS_ATTR: LazyLock<Regex> =
    LazyLock::new(|| compile_regex(r#"(?i)\bclass\s*=\s*["']([^"']*)["']"#));
static DATA_ID_ATTR: LazyLock<Regex> =
    LazyLock::new(|| compile_regex(r#"(?i)\bdata-id\s*=\s*["']([^"']*)["']"#));
static SRC_ATTR: LazyLock<Regex> =
    LazyLock::new(|| compile_regex(r#"(?i)\bsrc\s*=\s*["']([^"']*)["']"#));
static UUID: LazyLock<Regex> = LazyLock::new(|| {
    compile_regex(r"[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}")
});

const USER_NODE: &str = "User";

/// Collect the `data-id` of every `<a class="mention">` in document order.
pub fn mention_ids(html: &str) -> Vec<String> {
    ANCHOR
        .captures_iter(html)
        .filter_map(|anchor| {
            let attrs = anchor.get(1)?.as_str();
            let class = CLASS_ATTR.captures(attrs)?.get(1)?.as_str();
            if !class.split_whitespace().any(|c| c == "mention") {
                return None;
            }
            let id = DATA_ID_ATTR.captures(attrs)?.get(1)?.as_str().trim();
            (!id.is_empty()).then(|| id.to_string())
        })
        .collect()
}

/// Encode a user id as a global id (`base64("User:<uuid>")`).
pub fn encode_user_global_id(id: UserId) -> String {
    STANDARD.encode(format!("{USER_NODE}:{id}"))
}

/// Decode a global id that refers to a user. Anything else yields `None`.
pub fn decode_user_global_id(global_id: &str) -> Option<UserId> {
    let bytes = STANDARD.decode(global_id.trim()).ok()?;
    let decoded = String::from_utf8(bytes).ok()?;
    let (node, id) = decoded.split_once(':')?;
    if node != USER_NODE {
        return None;
    }
    id.parse().ok()
}

/// UUIDs referenced from `src` attributes (images, audio, embeds).
pub fn referenced_asset_uuids(html: &str) -> HashSet<Uuid> {
    SRC_ATTR
        .captures_iter(html)
        .filter_map(|src| src.get(1))
        .flat_map(|src| UUID.find_iter(src.as_str()))
        .filter_map(|m| Uuid::parse_str(m.as_str()).ok())
        .collect()
}
