//! Inline style declarations (`style` attribute)

/// Parse `a: b; c: d` into ordered (property, value) pairs
pub(crate) fn parse_declarations(style: &str) -> Vec<(String, String)> {
    style
        .split(';')
        .filter_map(|decl| {
            let (prop, value) = decl.split_once(':')?;
            let prop = prop.trim().to_ascii_lowercase();
            if prop.is_empty() {
                return None;
            }
            Some((prop, value.trim().to_string()))
        })
        .collect()
}

pub(crate) fn serialize_declarations(decls: &[(String, String)]) -> String {
    decls
        .iter()
        .map(|(prop, value)| format!("{prop}: {value}"))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Set one property, keeping the position of an existing declaration
pub(crate) fn with_property(style: &str, prop: &str, value: &str) -> String {
    let prop = prop.to_ascii_lowercase();
    let mut decls = parse_declarations(style);
    match decls.iter_mut().find(|(p, _)| *p == prop) {
        Some(decl) => decl.1 = value.to_string(),
        None => decls.push((prop, value.to_string())),
    }
    serialize_declarations(&decls)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_property() {
        assert_eq!(with_property("", "display", "none"), "display: none");
        assert_eq!(
            with_property("display: none; opacity: 0.5", "display", "block"),
            "display: block; opacity: 0.5"
        );
        assert_eq!(
            with_property("object-fit:cover;", "Opacity", "1"),
            "object-fit: cover; opacity: 1"
        );
    }
}
