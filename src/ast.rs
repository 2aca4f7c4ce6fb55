// ABOUTME: Document tree consumed by the LaTeX renderer
// ABOUTME: Typed node categories in document order, produced by the markdown front-end

/// Kind of autolink, which decides whether a `mailto:` scheme is injected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutoLinkKind {
    Url,
    Email,
}

/// An image element and its authored attributes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageNode {
    pub destination: String,
    pub title: String,
    /// Attributes in authored order, e.g. `width=360` or `data-x=1`.
    pub attributes: Vec<(String, String)>,
}

impl ImageNode {
    pub fn new(destination: impl Into<String>) -> Self {
        Self {
            destination: destination.into(),
            ..Self::default()
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Category-specific payload of a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeData {
    Document,
    Heading {
        level: u8,
    },
    BlockQuote,
    /// Indented code block; lines keep their trailing newline.
    CodeBlock {
        lines: Vec<String>,
    },
    FencedCodeBlock {
        language: Option<String>,
        lines: Vec<String>,
    },
    HtmlBlock {
        lines: Vec<String>,
        closure: Option<String>,
    },
    List {
        ordered: bool,
    },
    ListItem,
    Paragraph,
    /// Paragraph-like block of a tight list item.
    TextBlock,
    ThematicBreak,
    AutoLink {
        url: String,
        label: String,
        kind: AutoLinkKind,
    },
    CodeSpan,
    Emphasis {
        level: u8,
    },
    Link {
        destination: String,
        title: String,
    },
    Image(ImageNode),
    RawHtml {
        segments: Vec<String>,
    },
    Text {
        value: String,
        raw: bool,
        soft_line_break: bool,
    },
    String {
        value: String,
        raw: bool,
        code: bool,
    },
    Strikethrough,
    /// Anything the front-end does not model; its children are still walked.
    Other,
}

/// Key of the render function table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Document,
    Heading,
    BlockQuote,
    CodeBlock,
    FencedCodeBlock,
    HtmlBlock,
    List,
    ListItem,
    Paragraph,
    TextBlock,
    ThematicBreak,
    AutoLink,
    CodeSpan,
    Emphasis,
    Link,
    Image,
    RawHtml,
    Text,
    String,
    Strikethrough,
    Other,
}

impl NodeData {
    pub fn kind(&self) -> NodeKind {
        match self {
            NodeData::Document => NodeKind::Document,
            NodeData::Heading { .. } => NodeKind::Heading,
            NodeData::BlockQuote => NodeKind::BlockQuote,
            NodeData::CodeBlock { .. } => NodeKind::CodeBlock,
            NodeData::FencedCodeBlock { .. } => NodeKind::FencedCodeBlock,
            NodeData::HtmlBlock { .. } => NodeKind::HtmlBlock,
            NodeData::List { .. } => NodeKind::List,
            NodeData::ListItem => NodeKind::ListItem,
            NodeData::Paragraph => NodeKind::Paragraph,
            NodeData::TextBlock => NodeKind::TextBlock,
            NodeData::ThematicBreak => NodeKind::ThematicBreak,
            NodeData::AutoLink { .. } => NodeKind::AutoLink,
            NodeData::CodeSpan => NodeKind::CodeSpan,
            NodeData::Emphasis { .. } => NodeKind::Emphasis,
            NodeData::Link { .. } => NodeKind::Link,
            NodeData::Image(_) => NodeKind::Image,
            NodeData::RawHtml { .. } => NodeKind::RawHtml,
            NodeData::Text { .. } => NodeKind::Text,
            NodeData::String { .. } => NodeKind::String,
            NodeData::Strikethrough => NodeKind::Strikethrough,
            NodeData::Other => NodeKind::Other,
        }
    }
}

/// A node of the document tree with its ordered children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub data: NodeData,
    pub children: Vec<Node>,
}

impl Node {
    pub fn new(data: NodeData) -> Self {
        Self {
            data,
            children: Vec::new(),
        }
    }

    pub fn with_children(mut self, children: Vec<Node>) -> Self {
        self.children = children;
        self
    }

    pub fn kind(&self) -> NodeKind {
        self.data.kind()
    }

    pub fn document(children: Vec<Node>) -> Self {
        Node::new(NodeData::Document).with_children(children)
    }

    pub fn heading(level: u8, children: Vec<Node>) -> Self {
        Node::new(NodeData::Heading { level }).with_children(children)
    }

    pub fn paragraph(children: Vec<Node>) -> Self {
        Node::new(NodeData::Paragraph).with_children(children)
    }

    /// Rich text leaf, subject to reference decoding and escaping.
    pub fn text(value: impl Into<String>) -> Self {
        Node::new(NodeData::Text {
            value: value.into(),
            raw: false,
            soft_line_break: false,
        })
    }

    /// Raw text leaf, copied verbatim.
    pub fn raw_text(value: impl Into<String>) -> Self {
        Node::new(NodeData::Text {
            value: value.into(),
            raw: true,
            soft_line_break: false,
        })
    }

    pub fn image(image: ImageNode) -> Self {
        Node::new(NodeData::Image(image))
    }

    /// Depth-first, document-order iterator over this node and its descendants.
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants { stack: vec![self] }
    }
}

pub struct Descendants<'a> {
    stack: Vec<&'a Node>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<&'a Node> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}
