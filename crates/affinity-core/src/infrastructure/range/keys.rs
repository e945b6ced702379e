//! Key layout for the range-store family
//!
//! One sorted set per adjacency scope:
//!
//! ```text
//! e:{namespace}:{from_node}:{entity}:{direction}   member = to_node, score = distance
//! ```

use crate::domain::edge::{Direction, EdgeFilter, EdgeScope};
use crate::infrastructure::keys::{escape, join, unescape};

const EDGE_TAG: &str = "e";
const WILDCARD: &str = "*";

pub fn scope_key(scope: &EdgeScope) -> String {
    join([
        EDGE_TAG,
        escape(&scope.namespace).as_str(),
        escape(&scope.from_node).as_str(),
        escape(&scope.entity).as_str(),
        scope.direction.as_str(),
    ])
}

/// Scan pattern covering every key under a filter
pub fn filter_pattern(filter: &EdgeFilter) -> String {
    let component = |value: Option<&String>| value.map(|v| escape(v)).unwrap_or_else(|| WILDCARD.to_string());
    join([
        EDGE_TAG,
        escape(&filter.namespace).as_str(),
        component(filter.from_node.as_ref()).as_str(),
        component(filter.entity.as_ref()).as_str(),
        filter.direction.map(Direction::as_str).unwrap_or(WILDCARD),
    ])
}

/// Recover the scope a key was built from
pub fn parse_scope_key(key: &str) -> Option<EdgeScope> {
    let mut parts = key.split(':');
    if parts.next()? != EDGE_TAG {
        return None;
    }
    let namespace = unescape(parts.next()?);
    let from_node = unescape(parts.next()?);
    let entity = unescape(parts.next()?);
    let direction = Direction::parse(parts.next()?)?;
    if parts.next().is_some() {
        return None;
    }
    Some(EdgeScope::new(namespace, from_node, entity, direction))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_key_round_trip() {
        let scope = EdgeScope::new("ns", "user:1", "viewed", Direction::Out);
        let key = scope_key(&scope);
        assert_eq!(key, "e:ns:user%3A1:viewed:out");
        assert_eq!(parse_scope_key(&key), Some(scope));
    }

    #[test]
    fn test_filter_pattern() {
        assert_eq!(filter_pattern(&EdgeFilter::namespace("ns")), "e:ns:*:*:*");
        assert_eq!(
            filter_pattern(&EdgeFilter::namespace("ns").from_node("a").direction(Direction::None)),
            "e:ns:a:*:none"
        );
    }

    #[test]
    fn test_parse_rejects_foreign_keys() {
        assert_eq!(parse_scope_key("n:ns:a"), None);
        assert_eq!(parse_scope_key("e:ns:a:friend:sideways"), None);
        assert_eq!(parse_scope_key("e:ns:a:friend:none:extra"), None);
    }
}
