//! JSON-LD metadata parsing.
//!
//! Reads Schema.org objects from `<script type="application/ld+json">`
//! blocks, including `@graph` arrays and nested objects, and takes the
//! title and publication date of the most important article-like object.

use dom_query::{Document, Selection};
use serde_json::{Map, Value};

use super::meta_tags::parse_meta_date;
use crate::dom;
use crate::result::PageMetadata;

/// An article-like schema object with its ranking.
#[derive(Debug, Clone)]
struct ArticleSchema {
    data: Map<String, Value>,
    importance: i32,
}

/// Extract title and publication date from JSON-LD.
#[must_use]
pub fn extract_json_ld(doc: &Document) -> PageMetadata {
    let mut result = PageMetadata::default();

    for article in decode_articles(doc) {
        if result.title.is_none() {
            result.title = single_string(&article.data, "headline")
                .or_else(|| single_string(&article.data, "name"));
        }
        if result.published.is_none() {
            result.published = single_string(&article.data, "datePublished")
                .as_deref()
                .and_then(parse_meta_date);
        }
        if result.title.is_some() && result.published.is_some() {
            break;
        }
    }

    result
}

/// Every article-like object on the page, most important first.
fn decode_articles(doc: &Document) -> Vec<ArticleSchema> {
    let mut articles = Vec::new();

    for script in doc.select(r#"script[type="application/ld+json"]"#).nodes() {
        let text = dom::text_content(&Selection::from(*script));
        let text = text.trim();
        if text.is_empty() {
            continue;
        }
        let Ok(data) = serde_json::from_str::<Value>(text) else {
            continue;
        };
        collect_articles(&data, 0, &mut articles);
    }

    // Stable sort: equal importance keeps document order.
    articles.sort_by(|a, b| b.importance.cmp(&a.importance));
    articles
}

fn collect_articles(value: &Value, depth: i32, out: &mut Vec<ArticleSchema>) {
    match value {
        Value::Object(map) => {
            let types = schema_types(map);
            if is_article_type(&types) {
                out.push(ArticleSchema {
                    data: map.clone(),
                    importance: importance(&types, depth),
                });
            }
            let next = if types.is_empty() { depth } else { depth + 1 };
            for child in map.values() {
                collect_articles(child, next, out);
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_articles(item, depth, out);
            }
        }
        _ => {}
    }
}

/// Lowercase `@type` values of an object.
fn schema_types(map: &Map<String, Value>) -> Vec<String> {
    match map.get("@type") {
        Some(Value::String(s)) => vec![s.to_lowercase()],
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_lowercase)
            .collect(),
        _ => Vec::new(),
    }
}

fn is_article_type(types: &[String]) -> bool {
    types.iter().any(|t| {
        matches!(
            t.as_str(),
            "article"
                | "newsarticle"
                | "blogposting"
                | "techarticle"
                | "scholarlyarticle"
                | "report"
                | "socialmediaposting"
                | "webpage"
        )
    })
}

/// Specific article types outrank `WebPage`; shallower objects outrank
/// nested ones.
fn importance(types: &[String], depth: i32) -> i32 {
    let base = if types.iter().any(|t| t == "webpage") { 50 } else { 100 };
    base - depth * 10
}

/// A trimmed, non-empty string property, or the first string of an array.
fn single_string(data: &Map<String, Value>, key: &str) -> Option<String> {
    let value = match data.get(key)? {
        Value::String(s) => s.as_str(),
        Value::Array(items) => items.first()?.as_str()?,
        _ => return None,
    };
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_article_schema() {
        let doc = dom::parse(
            r#"<html><head><script type="application/ld+json">
            {"@type": "NewsArticle", "headline": "Test Article Title",
             "datePublished": "2024-01-15T10:30:00Z"}
            </script></head><body></body></html>"#,
        );
        let meta = extract_json_ld(&doc);
        assert_eq!(meta.title.as_deref(), Some("Test Article Title"));
        assert_eq!(meta.published.unwrap().to_rfc3339(), "2024-01-15T10:30:00+00:00");
    }

    #[test]
    fn test_graph_prefers_article_over_webpage() {
        let doc = dom::parse(
            r#"<script type="application/ld+json">
            {"@graph": [
                {"@type": "WebPage", "name": "Site Page"},
                {"@type": "BlogPosting", "headline": "Real Post"}
            ]}
            </script>"#,
        );
        assert_eq!(extract_json_ld(&doc).title.as_deref(), Some("Real Post"));
    }

    #[test]
    fn test_invalid_json_is_ignored() {
        let doc = dom::parse(r#"<script type="application/ld+json">{not json</script>"#);
        assert!(extract_json_ld(&doc).is_empty());
    }

    #[test]
    fn test_non_article_types_are_ignored() {
        let doc = dom::parse(
            r#"<script type="application/ld+json">{"@type": "Organization", "name": "Acme"}</script>"#,
        );
        assert!(extract_json_ld(&doc).title.is_none());
    }
}
