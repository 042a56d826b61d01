//! Post-processing for model-extracted keywords.

use nd_core::{ArticleRecord, Error, Result};
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

pub const MAX_KEYWORDS: usize = 3;

fn term_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"[가-힣]{2,}|[a-zA-Z0-9]{2,}").expect("valid term pattern"))
}

fn normalize(s: &str) -> String {
    s.chars().filter(|c| !c.is_whitespace()).collect::<String>().to_lowercase()
}

/// Read the `keywords` array out of a model reply.
///
/// Tolerates code fences and single-quoted JSON. A missing `keywords` field
/// is an empty list; anything that is not JSON, or a `keywords` value that is
/// not an array of strings, is [`Error::MalformedResponse`].
pub fn parse_keywords(raw: &str) -> Result<Vec<String>> {
    let cleaned = raw.replace('\'', "\"");
    let cleaned = cleaned.trim_matches(|c: char| c == '`' || c.is_whitespace());
    let cleaned = cleaned.strip_prefix("json").unwrap_or(cleaned).trim();

    let value: Value = serde_json::from_str(cleaned)
        .map_err(|e| Error::MalformedResponse(format!("not JSON: {}", e)))?;

    match value.get("keywords") {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| {
                item.as_str()
                    .map(|s| s.trim().to_string())
                    .ok_or_else(|| Error::MalformedResponse(format!("non-string keyword: {}", item)))
            })
            .collect(),
        Some(other) => Err(Error::MalformedResponse(format!("keywords is not an array: {}", other))),
    }
}

/// Terms of the input articles, normalized, in reading order.
fn input_terms(articles: &[ArticleRecord]) -> Vec<String> {
    let pattern = term_pattern();
    articles
        .iter()
        .flat_map(|a| [a.title.as_str(), a.description.as_str()])
        .flat_map(|text| pattern.find_iter(text).map(|m| normalize(m.as_str())))
        .collect()
}

/// True when `keyword` equals one input term or a run of consecutive input
/// terms, written with or without spaces.
fn echoes_input(keyword: &str, terms: &[String]) -> bool {
    let target = normalize(keyword);
    if target.is_empty() {
        return true;
    }
    for start in 0..terms.len() {
        let mut joined = String::new();
        for term in &terms[start..] {
            joined.push_str(term);
            if joined == target {
                return true;
            }
            if !target.starts_with(&joined) {
                break;
            }
        }
    }
    false
}

/// Drop keywords that merely quote the articles back, keeping at most
/// [`MAX_KEYWORDS`]. If every keyword was an echo the first one is kept.
pub fn filter_echoed_keywords(keywords: Vec<String>, articles: &[ArticleRecord]) -> Vec<String> {
    let terms = input_terms(articles);
    if terms.is_empty() {
        return keywords.into_iter().take(MAX_KEYWORDS).collect();
    }

    let filtered: Vec<String> = keywords
        .iter()
        .filter(|kw| !echoes_input(kw, &terms))
        .take(MAX_KEYWORDS)
        .cloned()
        .collect();

    if filtered.is_empty() {
        return keywords.into_iter().take(1).collect();
    }
    filtered
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article(title: &str, description: &str) -> ArticleRecord {
        ArticleRecord {
            title: title.to_string(),
            description: description.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_parse_plain_json() {
        let keywords = parse_keywords(r#"{"keywords": ["전기차", "자율주행"]}"#).unwrap();
        assert_eq!(keywords, vec!["전기차", "자율주행"]);
    }

    #[test]
    fn test_parse_fenced_single_quoted_json() {
        let keywords = parse_keywords("```json\n{'keywords': ['배터리', '리콜']}\n```").unwrap();
        assert_eq!(keywords, vec!["배터리", "리콜"]);
    }

    #[test]
    fn test_parse_missing_field_is_empty() {
        assert!(parse_keywords(r#"{"topics": ["x"]}"#).unwrap().is_empty());
    }

    #[test]
    fn test_parse_malformed() {
        assert!(matches!(parse_keywords("키워드: 전기차"), Err(Error::MalformedResponse(_))));
        assert!(matches!(parse_keywords(r#"{"keywords": "전기차"}"#), Err(Error::MalformedResponse(_))));
        assert!(matches!(parse_keywords(r#"{"keywords": [1, 2]}"#), Err(Error::MalformedResponse(_))));
    }

    #[test]
    fn test_filter_drops_single_term_echo() {
        let articles = vec![article("테슬라 로보택시 공개", "Tesla robotaxi event")];
        let result = filter_echoed_keywords(
            vec!["테슬라".to_string(), "자율주행".to_string(), "Robotaxi".to_string()],
            &articles,
        );
        assert_eq!(result, vec!["자율주행"]);
    }

    #[test]
    fn test_filter_drops_joined_runs_with_or_without_spaces() {
        let articles = vec![article("테슬라 로보택시 공개", "")];
        let result = filter_echoed_keywords(
            vec![
                "테슬라로보택시".to_string(),
                "테슬라 로보택시".to_string(),
                "로보택시 공개".to_string(),
                "규제".to_string(),
            ],
            &articles,
        );
        assert_eq!(result, vec!["규제"]);
    }

    #[test]
    fn test_filter_keeps_first_when_everything_echoes() {
        let articles = vec![article("테슬라 로보택시", "")];
        let result = filter_echoed_keywords(vec!["로보택시".to_string(), "테슬라".to_string()], &articles);
        assert_eq!(result, vec!["로보택시"]);
    }

    #[test]
    fn test_filter_caps_at_three() {
        let articles = vec![article("무관한 제목", "")];
        let keywords: Vec<String> = ["가격", "배터리", "충전", "보조금"].iter().map(|s| s.to_string()).collect();
        assert_eq!(filter_echoed_keywords(keywords, &articles).len(), MAX_KEYWORDS);
    }

    #[test]
    fn test_filter_without_terms_passes_through() {
        let articles = vec![article("!", "?")];
        let result = filter_echoed_keywords(vec!["a".to_string(), "b".to_string()], &articles);
        assert_eq!(result, vec!["a", "b"]);
    }
}
