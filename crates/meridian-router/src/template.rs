//! Path templates.
//!
//! Templates name their parameters in braces, optionally followed by a
//! converter: `/users/{id}`, `/items/{n:int}`, `/files/{rest:path}`.
//!
//! | Converter | Matches | Handler receives |
//! |---|---|---|
//! | `str` (default) | one non-empty segment | `String` |
//! | `int` | one segment of ASCII digits | `i64` |
//! | `path` | the remainder of the path; must come last | `String` |

use std::sync::OnceLock;

use meridian_core::SetupError;
use regex::Regex;

fn param_regex() -> &'static Regex {
    static PARAM: OnceLock<Regex> = OnceLock::new();
    PARAM.get_or_init(|| Regex::new(r"\{([^}]*)\}").expect("valid regex"))
}

/// How a captured path parameter is matched and converted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Converter {
    /// Any single segment.
    #[default]
    Str,
    /// A non-negative integer that fits in `i64`.
    Int,
    /// The rest of the path.
    Path,
}

impl Converter {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "str" => Some(Self::Str),
            "int" => Some(Self::Int),
            "path" => Some(Self::Path),
            _ => None,
        }
    }

    /// Returns `true` if `value` can be captured by this converter.
    pub fn accepts(self, value: &str) -> bool {
        match self {
            Self::Int => {
                !value.is_empty()
                    && value.bytes().all(|b| b.is_ascii_digit())
                    && value.parse::<i64>().is_ok()
            }
            Self::Str | Self::Path => true,
        }
    }
}

/// A parsed path template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTemplate {
    raw: String,
    params: Vec<String>,
    converters: Vec<Converter>,
    pattern: String,
    shape: String,
}

impl PathTemplate {
    /// Parses `raw`; `route` names the route in error messages.
    pub fn parse(route: &str, raw: &str) -> Result<Self, SetupError> {
        let invalid = |reason: String| SetupError::InvalidTemplate {
            route: route.to_string(),
            reason,
        };

        if !raw.starts_with('/') {
            return Err(invalid(format!("`{raw}` must start with `/`")));
        }

        let mut params: Vec<String> = Vec::new();
        let mut converters = Vec::new();
        let mut pattern = String::with_capacity(raw.len());
        let mut shape = String::with_capacity(raw.len());
        let mut last = 0;
        for capture in param_regex().captures_iter(raw) {
            let (Some(whole), Some(inner)) = (capture.get(0), capture.get(1)) else {
                continue;
            };
            let (name, converter) = match inner.as_str().split_once(':') {
                Some((name, converter)) => {
                    let converter = converter.trim();
                    let Some(parsed) = Converter::from_name(converter) else {
                        return Err(invalid(format!("unknown converter `{converter}` for `{name}`")));
                    };
                    (name.trim(), parsed)
                }
                None => (inner.as_str().trim(), Converter::Str),
            };

            if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                return Err(invalid(format!("bad parameter name `{name}`")));
            }
            if params.iter().any(|p| p == name) {
                return Err(invalid(format!("parameter `{name}` appears twice")));
            }

            pattern.push_str(&raw[last..whole.start()]);
            shape.push_str(&raw[last..whole.start()]);
            if converter == Converter::Path {
                if whole.end() != raw.len() {
                    return Err(invalid(format!("path parameter `{name}` must come last")));
                }
                pattern.push_str(&format!("{{*{name}}}"));
                shape.push_str("{*}");
            } else {
                pattern.push_str(&format!("{{{name}}}"));
                shape.push_str("{}");
            }
            last = whole.end();
            params.push(name.to_string());
            converters.push(converter);
        }
        pattern.push_str(&raw[last..]);
        shape.push_str(&raw[last..]);

        let literal = param_regex().replace_all(raw, "");
        if literal.contains('{') || literal.contains('}') {
            return Err(invalid(format!("unbalanced braces in `{raw}`")));
        }

        Ok(Self {
            raw: raw.to_string(),
            params,
            converters,
            pattern,
            shape,
        })
    }

    /// Returns the template as written.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Returns the parameter names in order of appearance.
    pub fn params(&self) -> &[String] {
        &self.params
    }

    /// Returns the converter of parameter `name`.
    pub fn converter(&self, name: &str) -> Option<Converter> {
        self.params
            .iter()
            .zip(&self.converters)
            .find_map(|(param, converter)| (param == name).then_some(*converter))
    }

    /// Returns `true` if every captured value satisfies its converter.
    pub fn accepts<'a>(&self, captured: impl IntoIterator<Item = (&'a str, &'a str)>) -> bool {
        captured
            .into_iter()
            .all(|(name, value)| self.converter(name).map_or(true, |c| c.accepts(value)))
    }

    /// Returns the template in path-matcher syntax, converters removed and
    /// catch-all parameters written as `{*name}`.
    pub fn matcher_pattern(&self) -> &str {
        &self.pattern
    }

    /// Returns the template with parameter names erased; two templates with
    /// the same shape match the same paths.
    pub fn shape(&self) -> &str {
        &self.shape
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_in_order() {
        let t = PathTemplate::parse("r", "/users/{user}/posts/{post_id}").unwrap();
        assert_eq!(t.params(), ["user".to_string(), "post_id".to_string()]);
        assert_eq!(t.matcher_pattern(), "/users/{user}/posts/{post_id}");
    }

    #[test]
    fn test_converters_are_stripped() {
        let t = PathTemplate::parse("r", "/items/{n:int}/files/{rest:path}").unwrap();
        assert_eq!(t.params(), ["n".to_string(), "rest".to_string()]);
        assert_eq!(t.matcher_pattern(), "/items/{n}/files/{*rest}");
        assert_eq!(t.shape(), "/items/{}/files/{*}");
        assert_eq!(t.converter("n"), Some(Converter::Int));
        assert_eq!(t.converter("rest"), Some(Converter::Path));
    }

    #[test]
    fn test_int_converter_accepts_digits_only() {
        let t = PathTemplate::parse("r", "/items/{n:int}/{slug}").unwrap();
        assert!(t.accepts([("n", "42"), ("slug", "abc")]));
        assert!(!t.accepts([("n", "abc")]));
        assert!(!t.accepts([("n", "-1")]));
        assert!(!t.accepts([("n", "")]));
        assert!(!t.accepts([("n", "99999999999999999999")]));
    }

    #[test]
    fn test_static_template() {
        let t = PathTemplate::parse("r", "/health").unwrap();
        assert!(t.params().is_empty());
        assert_eq!(t.as_str(), "/health");
    }

    #[test]
    fn test_rejects_bad_templates() {
        for raw in [
            "users/{id}",
            "/users/{}",
            "/users/{a-b}",
            "/users/{id}/{id}",
            "/files/{rest:path}/tail",
            "/items/{n:foo}",
            "/items/{n:}",
            "/users/{id",
            "/users/id}",
        ] {
            assert!(
                matches!(
                    PathTemplate::parse("r", raw),
                    Err(SetupError::InvalidTemplate { .. })
                ),
                "{raw}"
            );
        }
    }
}
