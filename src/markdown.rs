// ABOUTME: Markdown front-end turning comrak's AST into the renderer's document tree
// ABOUTME: Also hosts the fixup pass that attaches authored attributes to images

use crate::ast::{AutoLinkKind, ImageNode, Node, NodeData};
use comrak::nodes::{AstNode, ListType, NodeValue};
use comrak::{parse_document, Arena, ComrakOptions};
use log::debug;

fn comrak_options() -> ComrakOptions {
    let mut options = ComrakOptions::default();
    options.extension.autolink = true;
    options.extension.strikethrough = true;
    options
}

/// Parse Markdown into a document tree.
pub fn parse_markdown(markdown: &str) -> Node {
    let arena = Arena::new();
    let root = parse_document(&arena, markdown, &comrak_options());
    let doc = convert(root, false);
    debug!("Parsed markdown into {} top-level nodes", doc.children.len());
    doc
}

/// comrak resolves escapes and references itself; re-escape the characters
/// that start them so the scanner leaves the text as comrak decoded it.
fn protect(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if c == '\\' || c == '&' {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn split_lines(literal: &str) -> Vec<String> {
    literal.split_inclusive('\n').map(str::to_string).collect()
}

/// The text of a node whose only child is a text node.
fn sole_text<'a>(node: &'a AstNode<'a>) -> Option<String> {
    let mut children = node.children();
    let first = children.next()?;
    if children.next().is_some() {
        return None;
    }
    let data = first.data.borrow();
    match &data.value {
        NodeValue::Text(text) => Some(text.clone()),
        _ => None,
    }
}

fn autolink(url: &str, label: &str) -> Option<NodeData> {
    if url == label || url.strip_prefix("http://") == Some(label) {
        return Some(NodeData::AutoLink {
            url: url.to_string(),
            label: label.to_string(),
            kind: AutoLinkKind::Url,
        });
    }
    if url.strip_prefix("mailto:") == Some(label) {
        return Some(NodeData::AutoLink {
            url: label.to_string(),
            label: label.to_string(),
            kind: AutoLinkKind::Email,
        });
    }
    None
}

/// `tight` is set for the items of a tight list and forwarded to their
/// children, whose paragraphs become text blocks.
fn convert<'a>(node: &'a AstNode<'a>, tight: bool) -> Node {
    let value = node.data.borrow().value.clone();
    let mut child_tight = false;

    let data = match value {
        NodeValue::Document => NodeData::Document,
        NodeValue::Heading(heading) => NodeData::Heading {
            level: heading.level,
        },
        NodeValue::BlockQuote => NodeData::BlockQuote,
        NodeValue::CodeBlock(block) => {
            let lines = split_lines(&block.literal);
            if block.fenced {
                NodeData::FencedCodeBlock {
                    language: block.info.split_whitespace().next().map(str::to_string),
                    lines,
                }
            } else {
                NodeData::CodeBlock { lines }
            }
        }
        NodeValue::HtmlBlock(block) => NodeData::HtmlBlock {
            lines: split_lines(&block.literal),
            closure: None,
        },
        NodeValue::List(list) => {
            child_tight = list.tight;
            NodeData::List {
                ordered: matches!(list.list_type, ListType::Ordered),
            }
        }
        NodeValue::Item(_) => {
            child_tight = tight;
            NodeData::ListItem
        }
        NodeValue::Paragraph if tight => NodeData::TextBlock,
        NodeValue::Paragraph => NodeData::Paragraph,
        NodeValue::ThematicBreak => NodeData::ThematicBreak,
        NodeValue::Text(text) => NodeData::Text {
            value: protect(&text),
            raw: false,
            soft_line_break: false,
        },
        NodeValue::LineBreak => NodeData::String {
            value: "\\\\\n".to_string(),
            raw: false,
            code: true,
        },
        NodeValue::SoftBreak => NodeData::String {
            value: "\n".to_string(),
            raw: true,
            code: false,
        },
        NodeValue::Code(code) => {
            return Node::new(NodeData::CodeSpan).with_children(vec![Node::raw_text(code.literal)]);
        }
        NodeValue::HtmlInline(html) => NodeData::RawHtml {
            segments: vec![html],
        },
        NodeValue::Emph => NodeData::Emphasis { level: 1 },
        NodeValue::Strong => NodeData::Emphasis { level: 2 },
        NodeValue::Strikethrough => NodeData::Strikethrough,
        NodeValue::Link(link) => {
            if let Some(data) = sole_text(node).and_then(|label| autolink(&link.url, &label)) {
                return Node::new(data);
            }
            NodeData::Link {
                destination: link.url,
                title: link.title,
            }
        }
        NodeValue::Image(link) => NodeData::Image(ImageNode {
            destination: link.url,
            title: protect(&link.title),
            attributes: Vec::new(),
        }),
        _ => NodeData::Other,
    };

    Node::new(data).with_children(convert_children(node, child_tight))
}

fn convert_children<'a>(node: &'a AstNode<'a>, tight: bool) -> Vec<Node> {
    let mut out: Vec<Node> = Vec::new();
    for child in node.children() {
        let soft_break = matches!(child.data.borrow().value, NodeValue::SoftBreak);
        if soft_break {
            if let Some(Node {
                data:
                    NodeData::Text {
                        raw: false,
                        soft_line_break,
                        ..
                    },
                ..
            }) = out.last_mut()
            {
                if !*soft_line_break {
                    *soft_line_break = true;
                    continue;
                }
            }
        }
        out.push(convert(child, tight));
    }
    out
}

/// Parse a `{name=value ...}` block at the start of `text`.
///
/// Returns the attributes and the byte length of the block.
fn parse_attribute_block(text: &str) -> Option<(Vec<(String, String)>, usize)> {
    let inner = text.strip_prefix('{')?;
    let end = inner.find('}')?;
    let mut attributes = Vec::new();
    for token in inner[..end].split_whitespace() {
        let (name, value) = token.split_once('=')?;
        if name.is_empty() {
            return None;
        }
        let value = value.trim_matches(|c| c == '"' || c == '\'');
        attributes.push((name.to_string(), value.to_string()));
    }
    if attributes.is_empty() {
        return None;
    }
    Some((attributes, end + 2))
}

/// Rewrite the tree before rendering.
///
/// An attribute block written right after an image, as in
/// `![plot](plot.png){width=360}`, becomes the image's attributes.
pub fn fixup(node: &mut Node) {
    let mut i = 0;
    while i + 1 < node.children.len() {
        let parsed = match (&node.children[i].data, &node.children[i + 1].data) {
            (NodeData::Image(_), NodeData::Text { value, .. }) => parse_attribute_block(value),
            _ => None,
        };
        if let Some((attributes, consumed)) = parsed {
            if let NodeData::Image(image) = &mut node.children[i].data {
                image.attributes.extend(attributes);
            }
            let remove = match &mut node.children[i + 1].data {
                NodeData::Text {
                    value,
                    soft_line_break,
                    ..
                } => {
                    value.replace_range(..consumed, "");
                    value.is_empty() && !*soft_line_break
                }
                _ => false,
            };
            if remove {
                node.children.remove(i + 1);
            }
        }
        i += 1;
    }

    for child in &mut node.children {
        fixup(child);
    }
}
