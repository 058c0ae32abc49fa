//! Route path handling.
//!
//! # Design Decisions
//! - Declared paths use `{name}` tokens; the registry stores `:name`
//! - Stored paths have one leading `/`, no repeated and no trailing `/`
//! - The root path is `/`

/// Rewrite whole-segment `{name}` tokens to `:name` and normalize separators.
/// Braces anywhere else are rejected with the reason.
pub fn rewrite_params(path: &str) -> Result<String, String> {
    let segments = path
        .split('/')
        .map(|segment| match segment.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
            Some(name) if is_param_name(name) => Ok(format!(":{name}")),
            Some(name) => Err(format!("invalid parameter name {name:?}")),
            None if segment.contains(&['{', '}'][..]) => {
                Err(format!("segment {segment:?} mixes a parameter with text"))
            }
            None => Ok(segment.to_string()),
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(normalize(&segments.join("/")))
}

fn is_param_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// Check that a stored path can be handed to the router: parameters are
/// `:name`, literals never start with `*` or `:` and never carry braces.
pub fn check(path: &str) -> Result<(), String> {
    for segment in path.split('/').filter(|s| !s.is_empty()) {
        if let Some(name) = segment.strip_prefix(':') {
            if !is_param_name(name) {
                return Err(format!("invalid parameter segment {segment:?}"));
            }
        } else if segment.starts_with('*') {
            return Err(format!("segment {segment:?} must not start with '*'"));
        } else if segment.contains(&['{', '}'][..]) {
            return Err(format!("segment {segment:?} contains a brace"));
        }
    }
    Ok(())
}

/// Collapse repeated separators, force a leading `/` and drop a trailing one.
pub fn normalize(path: &str) -> String {
    let segments: Vec<&str> = path
        .trim()
        .split('/')
        .filter(|s| !s.is_empty())
        .collect();
    format!("/{}", segments.join("/"))
}

/// Full route path for a controller prefix and endpoint suffix.
pub fn join(prefix: &str, suffix: &str) -> String {
    normalize(&format!("{prefix}/{suffix}"))
}

/// Convert `:name` placeholders back to axum's `{name}` syntax.
pub fn to_axum(path: &str) -> String {
    let segments: Vec<String> = path
        .split('/')
        .map(|segment| match segment.strip_prefix(':') {
            Some(name) if !name.is_empty() => format!("{{{name}}}"),
            _ => segment.to_string(),
        })
        .collect();
    segments.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rewrite_params() {
        assert_eq!(rewrite_params("/{code}").unwrap(), "/:code");
        assert_eq!(rewrite_params("{code}").unwrap(), "/:code");
        assert_eq!(rewrite_params("/").unwrap(), "/");
        assert_eq!(rewrite_params("dailies/").unwrap(), "/dailies");
        assert_eq!(rewrite_params("/a/{b}/c/{d}").unwrap(), "/a/:b/c/:d");
    }

    #[test]
    fn test_partial_braces_rejected() {
        assert!(rewrite_params("/a/{b}c").is_err());
        assert!(rewrite_params("/a/x{b}").is_err());
        assert!(rewrite_params("/a/{}").is_err());
        assert!(rewrite_params("/a/{b/c}").is_err());
    }

    #[test]
    fn test_check() {
        assert!(check("/stations/:code").is_ok());
        assert!(check("/").is_ok());
        assert!(check("/files/*").is_err());
        assert!(check("/files/*rest").is_err());
        assert!(check("/a/:").is_err());
    }

    #[test]
    fn test_join_collapses_separators() {
        assert_eq!(join("/stations", "/:code"), "/stations/:code");
        assert_eq!(join("/stations/", "/:code/"), "/stations/:code");
        assert_eq!(join("stations", ":code"), "/stations/:code");
        assert_eq!(join("//stations//", "//"), "/stations");
        assert_eq!(join("", "/healthCheck"), "/healthCheck");
        assert_eq!(join("", ""), "/");
    }

    #[test]
    fn test_to_axum() {
        assert_eq!(to_axum("/stations/:code"), "/stations/{code}");
        assert_eq!(to_axum("/stations"), "/stations");
        assert_eq!(to_axum("/"), "/");
    }
}
