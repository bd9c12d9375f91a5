//! Icon hints in page markup.

use std::collections::HashMap;

use scraper::{ElementRef, Html};
use url::Url;

use dashboard_core::constants::ICON_REL_PRIORITY;

/// Picks the best icon `href` among the `<link>` elements directly under
/// `<html><head>`.
///
/// `rel` values are matched exactly, by [`ICON_REL_PRIORITY`]. When a `rel`
/// repeats, the last `href` wins.
pub fn find_icon(markup: &str) -> Option<String> {
    let document = Html::parse_document(markup);
    let root = document.root_element();
    if root.value().name() != "html" {
        return None;
    }

    let head = child_elements(root).find(|el| el.value().name() == "head")?;

    let mut links: HashMap<&str, &str> = HashMap::new();
    for link in child_elements(head).filter(|el| el.value().name() == "link") {
        let rel = link.value().attr("rel").unwrap_or_default();
        let href = link.value().attr("href").unwrap_or_default();
        if !rel.is_empty() && !href.is_empty() {
            links.insert(rel, href);
        }
    }

    ICON_REL_PRIORITY
        .iter()
        .find_map(|rel| links.get(rel))
        .map(|href| (*href).to_string())
}

/// Makes a relative `href` domain-relative.
///
/// Absolute URLs and paths already starting with `/` are returned unchanged.
pub fn normalize_href(href: &str) -> String {
    if Url::parse(href).is_err() && !href.starts_with('/') {
        format!("/{}", href)
    } else {
        href.to_string()
    }
}

fn child_elements<'a>(parent: ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> {
    parent.children().filter_map(ElementRef::wrap)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apple_touch_icon_wins_regardless_of_order() {
        let before = r#"<html><head>
            <link rel="apple-touch-icon" href="/touch.png">
            <link rel="icon" href="/icon.png">
        </head></html>"#;
        let after = r#"<html><head>
            <link rel="icon" href="/icon.png">
            <link rel="apple-touch-icon" href="/touch.png">
        </head></html>"#;

        assert_eq!(find_icon(before).as_deref(), Some("/touch.png"));
        assert_eq!(find_icon(after).as_deref(), Some("/touch.png"));
    }

    #[test]
    fn test_priority_order() {
        let html = r#"<html><head>
            <link rel="alternate icon" href="/alt.ico">
            <link rel="icon" href="/icon.png">
            <link rel="shortcut icon" href="/shortcut.ico">
        </head></html>"#;
        assert_eq!(find_icon(html).as_deref(), Some("/shortcut.ico"));

        let html = r#"<html><head><link rel="alternate icon" href="/alt.ico"></head></html>"#;
        assert_eq!(find_icon(html).as_deref(), Some("/alt.ico"));
    }

    #[test]
    fn test_ignores_non_icon_links_and_other_elements() {
        let html = r#"<html><head>
            <link rel="stylesheet" href="/style.css">
            <meta name="icon" content="/meta.png">
            <link rel="icon">
            <link href="/no-rel.png">
        </head></html>"#;
        assert_eq!(find_icon(html), None);
    }

    #[test]
    fn test_last_duplicate_wins() {
        let html = r#"<html><head>
            <link rel="icon" href="/first.png">
            <link rel="icon" href="/second.png">
        </head></html>"#;
        assert_eq!(find_icon(html).as_deref(), Some("/second.png"));
    }

    #[test]
    fn test_body_links_are_ignored() {
        let html = r#"<html><head><title>x</title></head>
            <body><link rel="icon" href="/body.png"></body></html>"#;
        assert_eq!(find_icon(html), None);
    }

    #[test]
    fn test_nested_head_links_are_ignored() {
        let html = r#"<html><head><noscript><link rel="icon" href="/nested.png"></noscript></head></html>"#;
        assert_eq!(find_icon(html), None);
    }

    #[test]
    fn test_empty_document() {
        assert_eq!(find_icon(""), None);
    }

    #[test]
    fn test_normalize_href() {
        assert_eq!(normalize_href("static/logo.png"), "/static/logo.png");
        assert_eq!(normalize_href("/static/logo.png"), "/static/logo.png");
        assert_eq!(normalize_href("https://cdn.example.com/logo.png"), "https://cdn.example.com/logo.png");
        assert_eq!(normalize_href("//cdn.example.com/logo.png"), "//cdn.example.com/logo.png");
    }
}
