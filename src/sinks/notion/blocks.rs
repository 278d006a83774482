//! Conversion of a document tree into workspace content blocks
//!
//! The mapping is deliberately coarse: block-level elements become the
//! nearest block type, containers are flattened, inline formatting is
//! reduced to plain text and struck-through content is dropped.

use crate::pipeline::{Element, HtmlNode, HtmlTree};
use serde_json::{json, Value};

/// Maximum characters in one rich text segment
const MAX_TEXT_LENGTH: usize = 2000;

/// Maximum rich text segments in one block
const MAX_SEGMENTS: usize = 100;

/// Elements whose content is dropped entirely
const DROPPED_ELEMENTS: &[&str] = &["del", "s", "strike", "script", "style", "head", "title"];

/// Converts a document tree into an ordered list of blocks
pub fn blocks_from_tree(tree: &HtmlTree) -> Vec<Value> {
    let mut blocks = Vec::new();
    let mut stack: Vec<&HtmlNode> = tree.nodes.iter().rev().collect();

    while let Some(node) = stack.pop() {
        match node {
            HtmlNode::Comment(_) => {}
            HtmlNode::Text(text) => {
                let text = collapse_whitespace(text);
                if !text.is_empty() {
                    blocks.extend(text_blocks("paragraph", &text));
                }
            }
            HtmlNode::Element(el) => match el.name.as_str() {
                name if DROPPED_ELEMENTS.contains(&name) => {}
                "h1" => push_text_block(&mut blocks, "heading_1", el),
                "h2" => push_text_block(&mut blocks, "heading_2", el),
                "h3" | "h4" | "h5" | "h6" => push_text_block(&mut blocks, "heading_3", el),
                "p" => {
                    push_text_block(&mut blocks, "paragraph", el);
                    blocks.extend(images_within(el));
                }
                "blockquote" => push_text_block(&mut blocks, "quote", el),
                "ul" | "ol" => {
                    let kind = if el.name == "ul" {
                        "bulleted_list_item"
                    } else {
                        "numbered_list_item"
                    };
                    for item in el.children.iter().filter(|c| c.is_element("li")) {
                        if let Some(li) = item.as_element() {
                            push_text_block(&mut blocks, kind, li);
                        }
                    }
                }
                "pre" => blocks.extend(code_blocks(&visible_text(el))),
                "hr" => blocks.push(json!({ "object": "block", "type": "divider", "divider": {} })),
                "img" => blocks.extend(image_block(el)),
                "tr" => {
                    let cells: Vec<String> = el
                        .children
                        .iter()
                        .filter_map(HtmlNode::as_element)
                        .map(|cell| collapse_whitespace(&visible_text(cell)))
                        .collect();
                    let row = cells.join(" | ");
                    if !row.trim_matches(|c: char| c == ' ' || c == '|').is_empty() {
                        blocks.extend(text_blocks("paragraph", &row));
                    }
                }
                "br" => {}
                _ => stack.extend(el.children.iter().rev()),
            },
        }
    }

    blocks
}

fn push_text_block(blocks: &mut Vec<Value>, kind: &str, el: &Element) {
    let text = collapse_whitespace(&visible_text(el));
    if !text.is_empty() {
        blocks.extend(text_blocks(kind, &text));
    }
}

/// Text of an element, skipping dropped elements
fn visible_text(el: &Element) -> String {
    let mut out = String::new();
    let mut stack: Vec<&HtmlNode> = el.children.iter().rev().collect();
    while let Some(node) = stack.pop() {
        match node {
            HtmlNode::Text(text) => out.push_str(text),
            HtmlNode::Element(child) if DROPPED_ELEMENTS.contains(&child.name.as_str()) => {}
            HtmlNode::Element(child) if child.name == "br" => out.push('\n'),
            HtmlNode::Element(child) => stack.extend(child.children.iter().rev()),
            HtmlNode::Comment(_) => {}
        }
    }
    out
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn images_within(el: &Element) -> Vec<Value> {
    let mut images = Vec::new();
    let mut stack: Vec<&HtmlNode> = el.children.iter().rev().collect();
    while let Some(node) = stack.pop() {
        if let Some(child) = node.as_element() {
            if child.name == "img" {
                images.extend(image_block(child));
            } else {
                stack.extend(child.children.iter().rev());
            }
        }
    }
    images
}

/// Images can only be embedded by absolute URL
fn image_block(el: &Element) -> Option<Value> {
    let src = el.attr("src")?;
    if !(src.starts_with("https://") || src.starts_with("http://")) {
        return None;
    }
    Some(json!({
        "object": "block",
        "type": "image",
        "image": { "type": "external", "external": { "url": src } }
    }))
}

/// One block per piece of text that fits the segment limit; overflow
/// continues in further blocks of the same kind
fn text_blocks(kind: &str, text: &str) -> Vec<Value> {
    block_pieces(text)
        .iter()
        .map(|piece| {
            json!({
                "object": "block",
                "type": kind,
                kind: { "rich_text": rich_text(piece) }
            })
        })
        .collect()
}

fn code_blocks(text: &str) -> Vec<Value> {
    block_pieces(text)
        .iter()
        .map(|piece| {
            json!({
                "object": "block",
                "type": "code",
                "code": { "rich_text": rich_text(piece), "language": "plain text" }
            })
        })
        .collect()
}

fn block_pieces(text: &str) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(MAX_TEXT_LENGTH * MAX_SEGMENTS)
        .map(|chunk| chunk.iter().collect())
        .collect()
}

/// Splits text into rich text segments within the length limit
///
/// Callers keep `text` within one block's worth of segments.
pub fn rich_text(text: &str) -> Vec<Value> {
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(MAX_TEXT_LENGTH)
        .map(|chunk| {
            let content: String = chunk.iter().collect();
            json!({ "type": "text", "text": { "content": content } })
        })
        .collect()
}
