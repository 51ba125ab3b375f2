//! Route pattern compilation and matching.
//!
//! A pattern such as `/projects/:slug/edit` is tokenized into literal runs,
//! named parameters and an optional trailing `*`. Matching is anchored at
//! both ends: the whole path must be consumed.
//!
//! Parameter names are runs of word characters (`[A-Za-z0-9_]`) after a
//! `:`. A `:` not followed by a word character is literal text. A parameter
//! matches one or more characters other than `/`, backtracking when literal
//! text follows it in the same segment (`/files/:name.json`).

use std::collections::BTreeMap;
use std::fmt;

use super::error::{RouteError, RouteResult};

/// Parameters extracted from a matched path, keyed by name.
pub type RouteParams = BTreeMap<String, String>;

/// One token of a compiled pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Text that must appear verbatim
    Literal(String),
    /// Named parameter
    Param(String),
    /// Remainder of the path
    Wildcard,
}

/// A compiled route pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePattern {
    source: String,
    tokens: Vec<Token>,
}

impl RoutePattern {
    /// Compile a pattern.
    pub fn parse(pattern: &str) -> RouteResult<Self> {
        let tokens = tokenize(pattern)?;

        let mut seen: Vec<&str> = Vec::new();
        for token in &tokens {
            if let Token::Param(name) = token {
                if seen.contains(&name.as_str()) {
                    return Err(RouteError::DuplicateParam {
                        pattern: pattern.to_string(),
                        name: name.clone(),
                    });
                }
                seen.push(name);
            }
        }

        Ok(Self { source: pattern.to_string(), tokens })
    }

    /// The original pattern text.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Compiled tokens.
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Whether the pattern ends in a wildcard.
    pub fn is_wildcard(&self) -> bool {
        matches!(self.tokens.last(), Some(Token::Wildcard))
    }

    /// Parameter names in order of appearance.
    pub fn param_names(&self) -> Vec<&str> {
        self.tokens
            .iter()
            .filter_map(|t| match t {
                Token::Param(name) => Some(name.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Match a full path, returning its parameters.
    pub fn matches(&self, path: &str) -> Option<RouteParams> {
        let mut captures = Vec::new();
        if match_tokens(&self.tokens, path, &mut captures) {
            Some(captures.into_iter().map(|(k, v)| (k.to_string(), v.to_string())).collect())
        } else {
            None
        }
    }

    /// Build a path by substituting parameter values.
    ///
    /// Values are inserted as given. Unused entries in `params` are ignored.
    pub fn reverse_generate(&self, params: &RouteParams) -> RouteResult<String> {
        let mut path = String::with_capacity(self.source.len());
        for token in &self.tokens {
            match token {
                Token::Literal(text) => path.push_str(text),
                Token::Param(name) => {
                    let value =
                        params.get(name).ok_or_else(|| RouteError::MissingParam(name.clone()))?;
                    path.push_str(value);
                }
                Token::Wildcard => return Err(RouteError::NotReversible(self.source.clone())),
            }
        }
        Ok(path)
    }
}

impl fmt::Display for RoutePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn tokenize(pattern: &str) -> RouteResult<Vec<Token>> {
    let invalid = |reason: &str| RouteError::InvalidPattern {
        pattern: pattern.to_string(),
        reason: reason.to_string(),
    };

    let mut tokens = Vec::new();
    let mut literal = String::new();
    let mut chars = pattern.char_indices().peekable();

    while let Some((idx, c)) = chars.next() {
        match c {
            ':' if chars.peek().is_some_and(|&(_, next)| is_word_char(next)) => {
                if let Some(Token::Param(_)) = tokens.last() {
                    if literal.is_empty() {
                        return Err(invalid("adjacent parameters need a separator"));
                    }
                }
                if !literal.is_empty() {
                    tokens.push(Token::Literal(std::mem::take(&mut literal)));
                }
                let mut name = String::new();
                while let Some(&(_, next)) = chars.peek() {
                    if !is_word_char(next) {
                        break;
                    }
                    name.push(next);
                    chars.next();
                }
                tokens.push(Token::Param(name));
            }
            '*' => {
                if idx + 1 != pattern.len() {
                    return Err(invalid("'*' is only allowed at the end"));
                }
                if !literal.is_empty() {
                    tokens.push(Token::Literal(std::mem::take(&mut literal)));
                }
                tokens.push(Token::Wildcard);
            }
            other => literal.push(other),
        }
    }

    if !literal.is_empty() {
        tokens.push(Token::Literal(literal));
    }
    if tokens.is_empty() {
        return Err(invalid("pattern is empty"));
    }
    Ok(tokens)
}

/// Backtracking matcher over the token list.
fn match_tokens<'p, 's>(
    tokens: &'p [Token],
    input: &'s str,
    captures: &mut Vec<(&'p str, &'s str)>,
) -> bool {
    let Some((token, rest)) = tokens.split_first() else {
        return input.is_empty();
    };

    match token {
        Token::Literal(text) => {
            input.strip_prefix(text.as_str()).is_some_and(|tail| match_tokens(rest, tail, captures))
        }
        Token::Wildcard => true,
        Token::Param(name) => {
            let segment_end = input.find('/').unwrap_or(input.len());
            // Longest candidate first, shrinking one character at a time.
            let mut ends: Vec<usize> = input[..segment_end]
                .char_indices()
                .map(|(i, c)| i + c.len_utf8())
                .collect();
            ends.reverse();

            for end in ends {
                captures.push((name.as_str(), &input[..end]));
                if match_tokens(rest, &input[end..], captures) {
                    return true;
                }
                captures.pop();
            }
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> RouteParams {
        pairs.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())).collect()
    }

    #[test]
    fn test_tokenize_project_edit() {
        let pattern = RoutePattern::parse("/projects/:slug/edit").unwrap();
        assert_eq!(
            pattern.tokens(),
            &[
                Token::Literal("/projects/".into()),
                Token::Param("slug".into()),
                Token::Literal("/edit".into()),
            ]
        );
        assert_eq!(pattern.param_names(), vec!["slug"]);
        assert!(!pattern.is_wildcard());
    }

    #[test]
    fn test_root_matches_only_root() {
        let pattern = RoutePattern::parse("/").unwrap();
        assert_eq!(pattern.matches("/"), Some(RouteParams::new()));
        assert_eq!(pattern.matches(""), None);
        assert_eq!(pattern.matches("/projects"), None);
    }

    #[test]
    fn test_param_extraction() {
        let pattern = RoutePattern::parse("/projects/:slug").unwrap();
        assert_eq!(pattern.matches("/projects/acme"), Some(params(&[("slug", "acme")])));
    }

    #[test]
    fn test_match_is_anchored() {
        let pattern = RoutePattern::parse("/projects/:slug").unwrap();
        assert_eq!(pattern.matches("/projects/acme/edit"), None);
        assert_eq!(pattern.matches("/projects/"), None);
        assert_eq!(pattern.matches("/v2/projects/acme"), None);
        assert_eq!(pattern.matches("/projects/acme/"), None);
    }

    #[test]
    fn test_values_are_raw() {
        let pattern = RoutePattern::parse("/projects/:slug").unwrap();
        let matched = pattern.matches("/projects/a%20b?tab=1").unwrap();
        assert_eq!(matched["slug"], "a%20b?tab=1");
    }

    #[test]
    fn test_special_characters_are_literal() {
        let pattern = RoutePattern::parse("/files/(v1)+.json").unwrap();
        assert!(pattern.matches("/files/(v1)+.json").is_some());
        assert!(pattern.matches("/files/v1.json").is_none());
        assert!(pattern.matches("/files/(v1)+xjson").is_none());
    }

    #[test]
    fn test_param_backtracks_before_literal() {
        let pattern = RoutePattern::parse("/files/:name.json").unwrap();
        assert_eq!(pattern.matches("/files/report.v2.json"), Some(params(&[("name", "report.v2")])));
        assert_eq!(pattern.matches("/files/.json"), None);
    }

    #[test]
    fn test_multiple_params() {
        let pattern = RoutePattern::parse("/teams/:team/projects/:slug").unwrap();
        assert_eq!(
            pattern.matches("/teams/core/projects/acme"),
            Some(params(&[("team", "core"), ("slug", "acme")]))
        );
    }

    #[test]
    fn test_colon_without_name_is_literal() {
        let pattern = RoutePattern::parse("/time/:/now").unwrap();
        assert!(pattern.param_names().is_empty());
        assert!(pattern.matches("/time/:/now").is_some());
    }

    #[test]
    fn test_wildcard_matches_everything() {
        let pattern = RoutePattern::parse("*").unwrap();
        assert!(pattern.is_wildcard());
        assert_eq!(pattern.matches("/unknown/path"), Some(RouteParams::new()));
        assert_eq!(pattern.matches(""), Some(RouteParams::new()));
    }

    #[test]
    fn test_trailing_wildcard_after_prefix() {
        let pattern = RoutePattern::parse("/static/*").unwrap();
        assert!(pattern.matches("/static/css/site.css").is_some());
        assert!(pattern.matches("/static/").is_some());
        assert!(pattern.matches("/other").is_none());
    }

    #[test]
    fn test_wildcard_must_be_last() {
        assert!(matches!(RoutePattern::parse("/a/*/b"), Err(RouteError::InvalidPattern { .. })));
    }

    #[test]
    fn test_duplicate_params_rejected() {
        let err = RoutePattern::parse("/:id/x/:id").unwrap_err();
        assert!(matches!(err, RouteError::DuplicateParam { name, .. } if name == "id"));
    }

    #[test]
    fn test_adjacent_params_rejected() {
        assert!(RoutePattern::parse("/:a:b").is_err());
    }

    #[test]
    fn test_empty_pattern_rejected() {
        assert!(RoutePattern::parse("").is_err());
    }

    #[test]
    fn test_reverse_generate() {
        let pattern = RoutePattern::parse("/projects/:slug/edit").unwrap();
        let url = pattern.reverse_generate(&params(&[("slug", "acme"), ("unused", "x")])).unwrap();
        assert_eq!(url, "/projects/acme/edit");
    }

    #[test]
    fn test_reverse_generate_missing_param() {
        let pattern = RoutePattern::parse("/projects/:slug").unwrap();
        assert_eq!(
            pattern.reverse_generate(&RouteParams::new()),
            Err(RouteError::MissingParam("slug".into()))
        );
    }

    #[test]
    fn test_reverse_wildcard_rejected() {
        let pattern = RoutePattern::parse("*").unwrap();
        assert!(matches!(
            pattern.reverse_generate(&RouteParams::new()),
            Err(RouteError::NotReversible(_))
        ));
    }

    #[test]
    fn test_match_then_reverse_round_trip() {
        let cases = [
            ("/projects/:slug", "/projects/acme-widgets"),
            ("/projects/:slug/edit", "/projects/q3_launch/edit"),
            ("/teams/:team/projects/:slug", "/teams/r-and-d/projects/x1"),
            ("/files/:name.json", "/files/a.b.json"),
        ];
        for (pattern, path) in cases {
            let pattern = RoutePattern::parse(pattern).unwrap();
            let extracted = pattern.matches(path).unwrap();
            assert_eq!(pattern.reverse_generate(&extracted).unwrap(), path);
        }
    }
}
