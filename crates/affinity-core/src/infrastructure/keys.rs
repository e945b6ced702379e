//! Composite key components
//!
//! Both backend families build colon-joined keys out of caller-supplied ids.
//! Components are percent-escaped so an id containing `:` or `*` can neither
//! split a key nor act as a scan wildcard.

pub const SEPARATOR: char = ':';

pub fn escape(component: &str) -> String {
    let mut out = String::with_capacity(component.len());
    for c in component.chars() {
        match c {
            '%' => out.push_str("%25"),
            ':' => out.push_str("%3A"),
            '*' => out.push_str("%2A"),
            _ => out.push(c),
        }
    }
    out
}

pub fn unescape(component: &str) -> String {
    let mut out = String::with_capacity(component.len());
    let mut rest = component;
    while let Some(pos) = rest.find('%') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        let (decoded, consumed) = match tail.get(..3) {
            Some("%25") => ('%', 3),
            Some("%3A") => (':', 3),
            Some("%2A") => ('*', 3),
            _ => ('%', 1),
        };
        out.push(decoded);
        rest = &tail[consumed..];
    }
    out.push_str(rest);
    out
}

/// Join already-escaped components
pub fn join<'a>(components: impl IntoIterator<Item = &'a str>) -> String {
    components.into_iter().collect::<Vec<_>>().join(":")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_round_trip() {
        for raw in ["plain", "a:b", "50%", "wild*card", "%3A"] {
            assert_eq!(unescape(&escape(raw)), raw);
        }
        assert!(!escape("a:b*c").contains([':', '*']));
    }

    #[test]
    fn test_join() {
        assert_eq!(join(["e", "ns", "a"]), "e:ns:a");
    }
}
