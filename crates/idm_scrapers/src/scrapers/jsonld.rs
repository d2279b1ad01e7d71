use scraper::{Html, Selector};
use serde_json::Value;

/// Parsed JSON-LD objects of a document. Top-level arrays and `@graph`
/// containers are flattened.
fn json_ld_objects(document: &Html) -> Vec<Value> {
    let mut objects = Vec::new();

    if let Ok(script_selector) = Selector::parse("script[type='application/ld+json']") {
        for script in document.select(&script_selector) {
            let raw = script.text().collect::<String>();
            if let Ok(json) = serde_json::from_str::<Value>(raw.trim()) {
                flatten_into(json, &mut objects);
            }
        }
    }

    objects
}

fn flatten_into(value: Value, out: &mut Vec<Value>) {
    match value {
        Value::Array(items) => {
            for item in items {
                flatten_into(item, out);
            }
        }
        Value::Object(mut obj) => {
            if let Some(graph) = obj.remove("@graph") {
                flatten_into(graph, out);
            }
            out.push(Value::Object(obj));
        }
        _ => {}
    }
}

fn author_names(author: &Value, authors: &mut Vec<String>) {
    match author {
        Value::Array(arr) => {
            for author_obj in arr {
                author_names(author_obj, authors);
            }
        }
        Value::Object(obj) => {
            if let Some(name) = obj.get("name").and_then(|n| n.as_str()) {
                authors.push(name.trim().to_string());
            }
        }
        Value::String(s) => {
            authors.push(s.trim().to_string());
        }
        _ => {}
    }
}

/// Extracts authors from JSON-LD metadata in the HTML document.
/// Returns a vector of author names.
pub fn extract_authors(document: &Html) -> Vec<String> {
    let mut authors = Vec::new();
    for json in json_ld_objects(document) {
        if let Some(author) = json.get("author") {
            author_names(author, &mut authors);
        }
    }
    authors.retain(|name| !name.is_empty());
    authors
}

/// First `datePublished` value found in the JSON-LD metadata.
pub fn extract_date_published(document: &Html) -> Option<String> {
    json_ld_objects(document)
        .iter()
        .filter_map(|json| json.get("datePublished").and_then(|d| d.as_str()))
        .map(|date| date.trim().to_string())
        .find(|date| !date.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authors_from_object_and_array() {
        let html = r#"
            <script type="application/ld+json">
                {"@type": "NewsArticle", "author": {"@type": "Person", "name": " Jane Doe "}}
            </script>
            <script type="application/ld+json">
                {"@type": "NewsArticle", "author": [{"name": "John Roe"}, "Ann Poe"]}
            </script>
        "#;
        let document = Html::parse_document(html);
        assert_eq!(extract_authors(&document), vec!["Jane Doe", "John Roe", "Ann Poe"]);
    }

    #[test]
    fn test_authors_inside_graph() {
        let html = r#"
            <script type="application/ld+json">
                {"@context": "https://schema.org", "@graph": [
                    {"@type": "WebPage"},
                    {"@type": "Article", "author": {"name": "Reporter"}, "datePublished": "2024-02-01T08:00:00Z"}
                ]}
            </script>
        "#;
        let document = Html::parse_document(html);
        assert_eq!(extract_authors(&document), vec!["Reporter"]);
        assert_eq!(
            extract_date_published(&document).as_deref(),
            Some("2024-02-01T08:00:00Z")
        );
    }

    #[test]
    fn test_invalid_json_is_ignored() {
        let html = r#"
            <script type="application/ld+json">{ not json</script>
            <p>Body</p>
        "#;
        let document = Html::parse_document(html);
        assert!(extract_authors(&document).is_empty());
        assert!(extract_date_published(&document).is_none());
    }
}
