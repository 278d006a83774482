//! Owned, mutable HTML tree
//!
//! Documents are parsed with `scraper` and copied into plain owned nodes so
//! extensions can rewrite them freely. The tree serializes back to markup
//! for sinks that consume HTML.

use ego_tree::iter::Edge;
use scraper::{Html, Node};

/// Elements that never have a closing tag
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "basefont", "bgsound", "br", "col", "embed", "frame", "hr", "img", "input",
    "keygen", "link", "meta", "param", "source", "track", "wbr",
];

/// Elements whose text content is written without escaping
///
/// This is the set html5ever parses as raw text. `noscript` is included
/// because scraper parses with scripting enabled.
const RAW_TEXT_ELEMENTS: &[&str] = &[
    "script", "style", "xmp", "iframe", "noembed", "noframes", "plaintext", "noscript",
];

/// An HTML element with its attributes and children
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<HtmlNode>,
}

impl Element {
    /// Creates an element with no attributes or children
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Gets an attribute value
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Sets an attribute, replacing an existing value
    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attrs.iter_mut().find(|(key, _)| key == name) {
            Some(entry) => entry.1 = value,
            None => self.attrs.push((name.to_string(), value)),
        }
    }
}

/// A node of the document tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HtmlNode {
    Element(Element),
    Text(String),
    Comment(String),
}

impl HtmlNode {
    /// Returns the element if this node is one
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Self::Element(el) => Some(el),
            _ => None,
        }
    }

    /// Returns the element mutably if this node is one
    pub fn as_element_mut(&mut self) -> Option<&mut Element> {
        match self {
            Self::Element(el) => Some(el),
            _ => None,
        }
    }

    /// Returns true if this is an element with the given tag name
    pub fn is_element(&self, name: &str) -> bool {
        self.as_element().is_some_and(|el| el.name == name)
    }

    /// Child nodes; empty for text and comments
    pub fn children(&self) -> &[HtmlNode] {
        match self {
            Self::Element(el) => &el.children,
            _ => &[],
        }
    }

    /// Concatenated text of this node and its descendants
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            match node {
                Self::Text(text) => out.push_str(text),
                Self::Element(el) => stack.extend(el.children.iter().rev()),
                Self::Comment(_) => {}
            }
        }
        out
    }
}

/// A parsed HTML fragment
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HtmlTree {
    pub nodes: Vec<HtmlNode>,
}

impl HtmlTree {
    /// Parses an HTML fragment
    ///
    /// Parsing never fails: malformed markup is repaired the way browsers
    /// repair it.
    pub fn parse(markup: &str) -> Self {
        let fragment = Html::parse_fragment(markup);

        // Open elements; the bottom entry collects top-level nodes
        let mut stack: Vec<Element> = vec![Element::new("")];

        for edge in fragment.tree.root().traverse() {
            match edge {
                Edge::Open(node) => match node.value() {
                    Node::Element(el) => stack.push(Element {
                        name: el.name().to_string(),
                        attrs: el
                            .attrs()
                            .map(|(key, value)| (key.to_string(), value.to_string()))
                            .collect(),
                        children: Vec::new(),
                    }),
                    Node::Text(text) => {
                        if let Some(parent) = stack.last_mut() {
                            parent.children.push(HtmlNode::Text(text.to_string()));
                        }
                    }
                    Node::Comment(comment) => {
                        if let Some(parent) = stack.last_mut() {
                            parent.children.push(HtmlNode::Comment(comment.to_string()));
                        }
                    }
                    _ => {}
                },
                Edge::Close(node) => {
                    if node.value().is_element() && stack.len() > 1 {
                        if let Some(done) = stack.pop() {
                            if let Some(parent) = stack.last_mut() {
                                parent.children.push(HtmlNode::Element(done));
                            }
                        }
                    }
                }
            }
        }

        let mut nodes = stack
            .into_iter()
            .next()
            .map(|root| root.children)
            .unwrap_or_default();

        // parse_fragment wraps the content in a synthetic <html> element
        if nodes.len() == 1 && nodes[0].is_element("html") {
            if let Some(HtmlNode::Element(wrapper)) = nodes.pop() {
                nodes = wrapper.children;
            }
        }

        Self { nodes }
    }

    /// Serializes the tree back to markup
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        for node in &self.nodes {
            write_node(&mut out, node, false);
        }
        out
    }

    /// Gets a node by its index path from the top level
    pub fn node_at_mut(&mut self, path: &[usize]) -> Option<&mut HtmlNode> {
        let (first, rest) = path.split_first()?;
        let mut node = self.nodes.get_mut(*first)?;
        for index in rest {
            node = match node {
                HtmlNode::Element(el) => el.children.get_mut(*index)?,
                _ => return None,
            };
        }
        Some(node)
    }

    /// Total number of nodes in the tree
    pub fn node_count(&self) -> usize {
        let mut count = 0;
        let mut stack: Vec<&HtmlNode> = self.nodes.iter().collect();
        while let Some(node) = stack.pop() {
            count += 1;
            stack.extend(node.children());
        }
        count
    }
}

fn write_node(out: &mut String, node: &HtmlNode, raw_text: bool) {
    match node {
        HtmlNode::Text(text) if raw_text => out.push_str(text),
        HtmlNode::Text(text) => escape_into(out, text, false),
        HtmlNode::Comment(comment) => {
            out.push_str("<!--");
            out.push_str(comment);
            out.push_str("-->");
        }
        HtmlNode::Element(el) => {
            out.push('<');
            out.push_str(&el.name);
            for (key, value) in &el.attrs {
                out.push(' ');
                out.push_str(key);
                out.push_str("=\"");
                escape_into(out, value, true);
                out.push('"');
            }
            out.push('>');

            if VOID_ELEMENTS.contains(&el.name.as_str()) {
                return;
            }

            let raw = RAW_TEXT_ELEMENTS.contains(&el.name.as_str());
            for child in &el.children {
                write_node(out, child, raw);
            }

            out.push_str("</");
            out.push_str(&el.name);
            out.push('>');
        }
    }
}

fn escape_into(out: &mut String, text: &str, attribute: bool) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' if !attribute => out.push_str("&lt;"),
            '>' if !attribute => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(c),
        }
    }
}
