//! Heuristics shared by all connectors: entity type inference and
//! connection-string scanning.

use std::sync::OnceLock;

use regex::Regex;

use infragraph_core::NodeType;

/// Image or name fragments that identify a database.
pub const DATABASE_KEYWORDS: [&str; 5] = ["postgres", "mysql", "mariadb", "mongodb", "cassandra"];

/// Image or name fragments that identify a cache.
pub const CACHE_KEYWORDS: [&str; 2] = ["redis", "memcached"];

/// Infer an entity's node type.
///
/// Priority: explicit type label, then image keywords, then name keywords,
/// then `service`. Teams are never inferred for infrastructure entities.
pub fn infer_node_type(explicit: Option<&str>, image: Option<&str>, name: &str) -> NodeType {
    if let Some(node_type) = explicit
        .and_then(|t| t.parse::<NodeType>().ok())
        .filter(|t| *t != NodeType::Team)
    {
        return node_type;
    }

    image
        .and_then(keyword_type)
        .or_else(|| keyword_type(name))
        .unwrap_or(NodeType::Service)
}

fn keyword_type(text: &str) -> Option<NodeType> {
    let lower = text.to_lowercase();
    if DATABASE_KEYWORDS.iter().any(|k| lower.contains(k)) {
        return Some(NodeType::Database);
    }
    if CACHE_KEYWORDS.iter().any(|k| lower.contains(k)) {
        return Some(NodeType::Cache);
    }
    None
}

/// Whether a configuration key names a connection endpoint.
pub fn is_endpoint_key(key: &str) -> bool {
    key.contains("_URL")
}

/// Connection-string patterns, tried in order. Each captures the host.
fn host_patterns() -> &'static [Regex; 4] {
    static PATTERNS: OnceLock<[Regex; 4]> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            // user@host, with or without a scheme in front
            Regex::new(r"@([A-Za-z0-9_.\-]+)").expect("valid user@host pattern"),
            // scheme://host
            Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*://([A-Za-z0-9_.\-]+)")
                .expect("valid scheme pattern"),
            // host:port
            Regex::new(r"^([A-Za-z0-9_.\-]+):\d+").expect("valid host:port pattern"),
            // bare host
            Regex::new(r"^([A-Za-z0-9_.\-]+)$").expect("valid bare host pattern"),
        ]
    })
}

/// Extract the hostname-like token from a connection string.
pub fn extract_host(value: &str) -> Option<&str> {
    let value = value.trim();
    host_patterns()
        .iter()
        .find_map(|re| re.captures(value).and_then(|c| c.get(1)))
        .map(|m| m.as_str())
        .filter(|host| !host.is_empty())
}

/// Resolve a connection string to the name of a known entity.
///
/// The full host is tried first, then its first DNS label so that
/// cluster-DNS names like `orders.prod.svc.cluster.local` match `orders`.
pub fn match_endpoint<F>(value: &str, is_known: F) -> Option<String>
where
    F: Fn(&str) -> bool,
{
    let host = extract_host(value)?;
    if is_known(host) {
        return Some(host.to_string());
    }
    let label = host.split('.').next()?;
    if label != host && is_known(label) {
        return Some(label.to_string());
    }
    None
}
