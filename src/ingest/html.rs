//! Typed HTML tree
//!
//! Documents are parsed with `scraper` (html5ever) and converted into a
//! small owned tree of elements and text. Lookups walk the tree depth-first
//! with a predicate over elements.

use scraper::{ElementRef, Html};

/// A node of the tree
#[derive(Debug, Clone, PartialEq)]
pub enum HtmlNode {
    Element(Element),
    Text(String),
}

/// An element with its attributes and children in document order
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    tag: String,
    attrs: Vec<(String, String)>,
    children: Vec<HtmlNode>,
}

impl Element {
    /// Parses a full document and returns its root (`html`) element
    pub fn parse_document(source: &str) -> Element {
        let document = Html::parse_document(source);
        Element::from_ref(document.root_element())
    }

    fn from_ref(element: ElementRef<'_>) -> Element {
        let value = element.value();
        let children = element
            .children()
            .filter_map(|child| match ElementRef::wrap(child) {
                Some(el) => Some(HtmlNode::Element(Element::from_ref(el))),
                None => child
                    .value()
                    .as_text()
                    .map(|text| HtmlNode::Text(String::from(&**text))),
            })
            .collect();

        Element {
            tag: value.name().to_string(),
            attrs: value
                .attrs()
                .map(|(name, val)| (name.to_string(), val.to_string()))
                .collect(),
            children,
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Returns true if the `class` attribute contains this token
    pub fn has_class(&self, token: &str) -> bool {
        self.attr("class")
            .map_or(false, |classes| classes.split_whitespace().any(|c| c == token))
    }

    pub fn children(&self) -> &[HtmlNode] {
        &self.children
    }

    /// Direct child elements with the given tag
    pub fn child_elements<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter_map(move |node| match node {
            HtmlNode::Element(el) if el.tag == tag => Some(el),
            _ => None,
        })
    }

    /// Concatenated text of all descendants
    pub fn text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        for child in &self.children {
            match child {
                HtmlNode::Text(text) => out.push_str(text),
                HtmlNode::Element(el) => el.collect_text(out),
            }
        }
    }

    /// Every descendant element (self included) matching the predicate,
    /// in document order
    pub fn find_all<P>(&self, predicate: P) -> Vec<&Element>
    where
        P: Fn(&Element) -> bool,
    {
        let mut found = Vec::new();
        let mut stack = vec![self];
        while let Some(el) = stack.pop() {
            if predicate(el) {
                found.push(el);
            }
            for child in el.children.iter().rev() {
                if let HtmlNode::Element(child) = child {
                    stack.push(child);
                }
            }
        }
        found
    }

    /// First matching element in document order
    pub fn find_first<P>(&self, predicate: P) -> Option<&Element>
    where
        P: Fn(&Element) -> bool,
    {
        let mut stack = vec![self];
        while let Some(el) = stack.pop() {
            if predicate(el) {
                return Some(el);
            }
            for child in el.children.iter().rev() {
                if let HtmlNode::Element(child) = child {
                    stack.push(child);
                }
            }
        }
        None
    }

    /// All descendant elements with the given tag
    pub fn descendants_by_tag(&self, tag: &str) -> Vec<&Element> {
        self.find_all(|el| el.tag == tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<!DOCTYPE html>
<html><body>
  <table class="views-table">
    <tbody>
      <tr>
        <td class="views-field views-field-title"><a href="/a">Acme <b>Hall</b></a></td>
        <td class="views-field views-field-field-building-code"> ACM </td>
      </tr>
      <tr><td class="other">x</td></tr>
    </tbody>
  </table>
</body></html>"#;

    #[test]
    fn test_find_rows_in_document_order() {
        let root = Element::parse_document(PAGE);
        let rows = root.descendants_by_tag("tr");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].child_elements("td").count(), 2);
        assert_eq!(rows[1].child_elements("td").count(), 1);
    }

    #[test]
    fn test_text_and_attributes() {
        let root = Element::parse_document(PAGE);
        let link = root.find_first(|el| el.tag() == "a").unwrap();
        assert_eq!(link.attr("href"), Some("/a"));
        assert_eq!(link.text(), "Acme Hall");

        let code = root
            .find_first(|el| el.has_class("views-field-field-building-code"))
            .unwrap();
        assert_eq!(code.text().trim(), "ACM");
        assert!(code.has_class("views-field"));
        assert!(!code.has_class("views"));
    }

    #[test]
    fn test_malformed_markup_still_parses() {
        let root = Element::parse_document("<table><tr><td>open");
        let cell = root.find_first(|el| el.tag() == "td").unwrap();
        assert_eq!(cell.text(), "open");
    }
}
