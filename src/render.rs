// ABOUTME: LaTeX rendering module for the present-tex application
// ABOUTME: Walks the document tree and dispatches each node category to a registered render function

use crate::ast::{AutoLinkKind, Node, NodeData, NodeKind};
use crate::config::RenderConfig;
use crate::errors::{Result, TexError};
use crate::escape::{escape_latex, escape_path, escape_url};
use crate::geometry::ImageRecord;
use crate::link::{is_dangerous_url, LinkPolicy};
use crate::scanner::{write_raw, write_rich};
use crate::utils::resolve_relative;
use log::{debug, info, warn};
use std::collections::HashMap;

/// Append-only destination for rendered LaTeX.
pub trait Sink {
    fn append(&mut self, text: &str);

    fn append_char(&mut self, c: char) {
        let mut buf = [0u8; 4];
        self.append(c.encode_utf8(&mut buf));
    }
}

impl Sink for String {
    fn append(&mut self, text: &str) {
        self.push_str(text);
    }

    fn append_char(&mut self, c: char) {
        self.push(c);
    }
}

impl Sink for Vec<u8> {
    fn append(&mut self, text: &str) {
        self.extend_from_slice(text.as_bytes());
    }
}

/// Signal returned by every render function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkStatus {
    Continue,
    /// Do not descend; the node's exit call still happens.
    SkipChildren,
    /// End the walk without error.
    Stop,
}

/// Per-render mutable state handed to render functions.
pub struct RenderContext<'s> {
    sink: &'s mut dyn Sink,
    has_code: bool,
}

impl<'s> RenderContext<'s> {
    pub fn new(sink: &'s mut dyn Sink) -> Self {
        Self {
            sink,
            has_code: false,
        }
    }

    pub fn sink(&mut self) -> &mut dyn Sink {
        &mut *self.sink
    }

    pub fn write(&mut self, text: &str) {
        self.sink.append(text);
    }

    /// Record that the document needs a code listing package.
    pub fn mark_code(&mut self) {
        self.has_code = true;
    }

    pub fn has_code(&self) -> bool {
        self.has_code
    }
}

/// Render procedure for one node category, called on entry and on exit.
pub type RenderFn = fn(&Renderer, &mut RenderContext<'_>, &Node, bool) -> Result<WalkStatus>;

/// Result of rendering one Markdown span.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderOutput {
    pub latex: String,
    /// True when the document contains a code block.
    pub has_code: bool,
}

/// Renders a document tree as LaTeX-Beamer.
pub struct Renderer {
    config: RenderConfig,
    funcs: HashMap<NodeKind, RenderFn>,
}

impl Renderer {
    /// Create a renderer with the default render function table.
    pub fn new(config: RenderConfig) -> Result<Self> {
        config.validate()?;

        let mut r = Self {
            config,
            funcs: HashMap::new(),
        };

        // blocks
        r.register(NodeKind::Document, render_document);
        r.register(NodeKind::Heading, render_heading);
        r.register(NodeKind::BlockQuote, render_blockquote);
        r.register(NodeKind::CodeBlock, render_code_block);
        r.register(NodeKind::FencedCodeBlock, render_fenced_code_block);
        r.register(NodeKind::HtmlBlock, render_html_block);
        r.register(NodeKind::List, render_list);
        r.register(NodeKind::ListItem, render_list_item);
        r.register(NodeKind::Paragraph, render_paragraph);
        r.register(NodeKind::TextBlock, render_text_block);
        r.register(NodeKind::ThematicBreak, render_thematic_break);
        // inlines
        r.register(NodeKind::AutoLink, render_auto_link);
        r.register(NodeKind::CodeSpan, render_code_span);
        r.register(NodeKind::Emphasis, render_emphasis);
        r.register(NodeKind::Image, render_image);
        r.register(NodeKind::Link, render_link);
        r.register(NodeKind::RawHtml, render_raw_html);
        r.register(NodeKind::Text, render_text);
        r.register(NodeKind::String, render_string);

        Ok(r)
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Register (or replace) the render function of a node category.
    pub fn register(&mut self, kind: NodeKind, f: RenderFn) {
        self.funcs.insert(kind, f);
    }

    /// Remove a category from the table; its nodes then emit nothing.
    pub fn unregister(&mut self, kind: NodeKind) -> Option<RenderFn> {
        self.funcs.remove(&kind)
    }

    /// Render a document into a fresh buffer.
    pub fn render(&self, root: &Node) -> Result<RenderOutput> {
        let mut latex = String::new();
        let has_code = self.render_to(&mut latex, root)?;
        Ok(RenderOutput { latex, has_code })
    }

    /// Render a document, appending to `sink` only if the whole walk succeeds.
    ///
    /// Returns whether the document contains code.
    pub fn render_to(&self, sink: &mut dyn Sink, root: &Node) -> Result<bool> {
        info!("Rendering document with {} top-level nodes", root.children.len());

        let mut buf = String::new();
        let mut cx = RenderContext::new(&mut buf);
        self.walk(&mut cx, root)
            .map_err(|e| TexError::MarkdownWalkFailed(Box::new(e)))?;
        let has_code = cx.has_code();

        sink.append(&buf);
        Ok(has_code)
    }

    fn visit(&self, cx: &mut RenderContext<'_>, node: &Node, entering: bool) -> Result<WalkStatus> {
        match self.funcs.get(&node.kind()) {
            Some(f) => f(self, cx, node, entering),
            None => Ok(WalkStatus::Continue),
        }
    }

    fn walk(&self, cx: &mut RenderContext<'_>, node: &Node) -> Result<WalkStatus> {
        let status = self.visit(cx, node, true)?;
        if status == WalkStatus::Stop {
            return Ok(WalkStatus::Stop);
        }
        if status != WalkStatus::SkipChildren {
            for child in &node.children {
                if self.walk(cx, child)? == WalkStatus::Stop {
                    return Ok(WalkStatus::Stop);
                }
            }
        }
        if self.visit(cx, node, false)? == WalkStatus::Stop {
            return Ok(WalkStatus::Stop);
        }
        Ok(WalkStatus::Continue)
    }

    /// Whether a link to `url` should lose its hyperlink command.
    fn strip_link(&self, url: &str, entering: bool) -> bool {
        if !is_dangerous_url(url) {
            return false;
        }
        match self.config.link_policy {
            LinkPolicy::Allow => false,
            LinkPolicy::Warn => {
                if entering {
                    warn!("Dangerous link target: {}", url);
                }
                false
            }
            LinkPolicy::Strip => {
                if entering {
                    warn!("Stripping dangerous link target: {}", url);
                }
                true
            }
        }
    }
}

/// Render Markdown text to a LaTeX fragment.
pub fn markdown_to_latex(markdown: &str, config: &RenderConfig) -> Result<RenderOutput> {
    let mut doc = crate::markdown::parse_markdown(markdown);
    crate::markdown::fixup(&mut doc);
    Renderer::new(config.clone())?.render(&doc)
}

fn write_lines(cx: &mut RenderContext<'_>, lines: &[String]) {
    for line in lines {
        write_raw(cx.sink(), line);
    }
}

fn render_document(
    _r: &Renderer,
    _cx: &mut RenderContext<'_>,
    _node: &Node,
    _entering: bool,
) -> Result<WalkStatus> {
    Ok(WalkStatus::Continue)
}

const HEADINGS: [&str; 6] = [
    "\n\\section{",
    "\n\\subsection{",
    "\n\\subsubsection{",
    "\n\\paragraph{",
    "\n\\subparagraph{",
    "\n\\textbf{",
];

fn render_heading(
    _r: &Renderer,
    cx: &mut RenderContext<'_>,
    node: &Node,
    entering: bool,
) -> Result<WalkStatus> {
    let NodeData::Heading { level } = node.data else {
        return Ok(WalkStatus::Continue);
    };
    if entering {
        let index = usize::from(level.clamp(1, 6)) - 1;
        cx.write(HEADINGS[index]);
    } else {
        cx.write("}\n");
    }
    Ok(WalkStatus::Continue)
}

fn render_blockquote(
    _r: &Renderer,
    cx: &mut RenderContext<'_>,
    _node: &Node,
    entering: bool,
) -> Result<WalkStatus> {
    if entering {
        cx.write("\n\\begin{quotation}\n");
    } else {
        cx.write("\n\\end{quotation}\n");
    }
    Ok(WalkStatus::Continue)
}

fn render_code_block(
    _r: &Renderer,
    cx: &mut RenderContext<'_>,
    node: &Node,
    entering: bool,
) -> Result<WalkStatus> {
    let NodeData::CodeBlock { lines } = &node.data else {
        return Ok(WalkStatus::Continue);
    };
    if entering {
        cx.mark_code();
        cx.write("\n\\begin{verbatim}\n");
        write_lines(cx, lines);
    } else {
        cx.write("\n\\end{verbatim}\n");
    }
    Ok(WalkStatus::Continue)
}

/// Map language tags to the lexer names minted knows.
fn listing_language(language: &str) -> &str {
    match language {
        "cxx" | "c++" | "cc" => "cpp",
        other => other,
    }
}

fn render_fenced_code_block(
    r: &Renderer,
    cx: &mut RenderContext<'_>,
    node: &Node,
    entering: bool,
) -> Result<WalkStatus> {
    let NodeData::FencedCodeBlock { language, lines } = &node.data else {
        return Ok(WalkStatus::Continue);
    };
    if entering {
        cx.mark_code();
        let language = language
            .as_deref()
            .filter(|l| !l.is_empty())
            .unwrap_or(&r.config.default_code_language);
        cx.write("\n\\begin{minted}{");
        cx.write(listing_language(language));
        cx.write("}\n");
        write_lines(cx, lines);
    } else {
        cx.write("\\end{minted}\n");
    }
    Ok(WalkStatus::Continue)
}

fn render_html_block(
    _r: &Renderer,
    cx: &mut RenderContext<'_>,
    node: &Node,
    entering: bool,
) -> Result<WalkStatus> {
    let NodeData::HtmlBlock { lines, closure } = &node.data else {
        return Ok(WalkStatus::Continue);
    };
    if entering {
        cx.write("\n\\begin{verbatim}\n");
        write_lines(cx, lines);
    } else {
        if let Some(closure) = closure {
            write_raw(cx.sink(), closure);
        }
        cx.write("\n\\end{verbatim}\n");
    }
    Ok(WalkStatus::Continue)
}

fn render_list(
    _r: &Renderer,
    cx: &mut RenderContext<'_>,
    node: &Node,
    entering: bool,
) -> Result<WalkStatus> {
    let NodeData::List { ordered } = node.data else {
        return Ok(WalkStatus::Continue);
    };
    let tag = if ordered { "enumerate" } else { "itemize" };
    if entering {
        cx.write("\n\\begin{");
        cx.write(tag);
        cx.write("}\n");
    } else {
        cx.write("\\end{");
        cx.write(tag);
        cx.write("}\n");
    }
    Ok(WalkStatus::Continue)
}

fn render_list_item(
    _r: &Renderer,
    cx: &mut RenderContext<'_>,
    _node: &Node,
    entering: bool,
) -> Result<WalkStatus> {
    if entering {
        cx.write("\\item ");
    }
    Ok(WalkStatus::Continue)
}

fn render_paragraph(
    _r: &Renderer,
    cx: &mut RenderContext<'_>,
    _node: &Node,
    entering: bool,
) -> Result<WalkStatus> {
    if !entering {
        cx.write("\n\n");
    }
    Ok(WalkStatus::Continue)
}

fn render_text_block(
    _r: &Renderer,
    cx: &mut RenderContext<'_>,
    node: &Node,
    entering: bool,
) -> Result<WalkStatus> {
    if !entering && !node.children.is_empty() {
        cx.write("\n");
    }
    Ok(WalkStatus::Continue)
}

fn render_thematic_break(
    _r: &Renderer,
    cx: &mut RenderContext<'_>,
    _node: &Node,
    entering: bool,
) -> Result<WalkStatus> {
    if entering {
        cx.write("\n\\vspace{1em}\n\\hrule\n\\vspace{1em}\n");
    }
    Ok(WalkStatus::SkipChildren)
}

fn render_auto_link(
    r: &Renderer,
    cx: &mut RenderContext<'_>,
    node: &Node,
    entering: bool,
) -> Result<WalkStatus> {
    let NodeData::AutoLink { url, label, kind } = &node.data else {
        return Ok(WalkStatus::Continue);
    };
    let stripped = r.strip_link(url, entering);
    if !entering {
        if !stripped {
            cx.write("}");
        }
        return Ok(WalkStatus::Continue);
    }

    let label = if label.is_empty() { url } else { label };
    if !stripped {
        cx.write("\\colhref{");
        if *kind == AutoLinkKind::Email && !url.to_lowercase().starts_with("mailto:") {
            cx.write("mailto:");
        }
        cx.write(&escape_url(url));
        cx.write("}{");
    }
    cx.write(&escape_latex(label));
    Ok(WalkStatus::SkipChildren)
}

fn render_code_span(
    _r: &Renderer,
    cx: &mut RenderContext<'_>,
    node: &Node,
    entering: bool,
) -> Result<WalkStatus> {
    if !entering {
        cx.write("}");
        return Ok(WalkStatus::Continue);
    }

    cx.write("\\texttt{");
    let last = node.children.len().saturating_sub(1);
    for (i, child) in node.children.iter().enumerate() {
        let value = match &child.data {
            NodeData::Text { value, .. } | NodeData::String { value, .. } => value.as_str(),
            _ => continue,
        };
        match value.strip_suffix('\n') {
            Some(trimmed) => {
                write_raw(cx.sink(), trimmed);
                if i != last {
                    write_raw(cx.sink(), " ");
                }
            }
            None => write_raw(cx.sink(), value),
        }
    }
    Ok(WalkStatus::SkipChildren)
}

fn render_emphasis(
    _r: &Renderer,
    cx: &mut RenderContext<'_>,
    node: &Node,
    entering: bool,
) -> Result<WalkStatus> {
    let NodeData::Emphasis { level } = node.data else {
        return Ok(WalkStatus::Continue);
    };
    if entering {
        cx.write(if level >= 2 { "\\textbf{" } else { "\\emph{" });
    } else {
        cx.write("}");
    }
    Ok(WalkStatus::Continue)
}

fn render_link(
    r: &Renderer,
    cx: &mut RenderContext<'_>,
    node: &Node,
    entering: bool,
) -> Result<WalkStatus> {
    let NodeData::Link { destination, .. } = &node.data else {
        return Ok(WalkStatus::Continue);
    };
    if r.strip_link(destination, entering) {
        return Ok(WalkStatus::Continue);
    }
    if entering {
        cx.write("\\colhref{");
        cx.write(&escape_url(destination));
        cx.write("}{\\texttt{");
    } else {
        cx.write("}}");
    }
    Ok(WalkStatus::Continue)
}

fn render_image(
    r: &Renderer,
    cx: &mut RenderContext<'_>,
    node: &Node,
    entering: bool,
) -> Result<WalkStatus> {
    if !entering {
        return Ok(WalkStatus::Continue);
    }
    let NodeData::Image(image) = &node.data else {
        return Ok(WalkStatus::SkipChildren);
    };

    let path = resolve_relative(r.config.base_dir.as_deref(), &image.destination);
    let options = ImageRecord::from_attributes(image).to_options(&path, r.config.dpi)?;
    debug!("Image {} rendered with [{}]", image.destination, options);

    cx.write("\\begin{figure}[h]\n");
    cx.write("\\begin{center}\n");
    cx.write("\\includegraphics[");
    cx.write(&options);
    cx.write("]{");
    cx.write(&escape_path(&image.destination));
    cx.write("}\n");
    cx.write("\\end{center}\n");
    if !image.title.is_empty() {
        cx.write("\\caption{");
        write_rich(cx.sink(), &image.title);
        cx.write("}\n");
    }
    cx.write("\\end{figure}\n");
    Ok(WalkStatus::SkipChildren)
}

fn render_raw_html(
    _r: &Renderer,
    cx: &mut RenderContext<'_>,
    node: &Node,
    entering: bool,
) -> Result<WalkStatus> {
    if entering {
        if let NodeData::RawHtml { segments } = &node.data {
            for segment in segments {
                write_raw(cx.sink(), segment);
            }
        }
    }
    Ok(WalkStatus::SkipChildren)
}

fn render_text(
    _r: &Renderer,
    cx: &mut RenderContext<'_>,
    node: &Node,
    entering: bool,
) -> Result<WalkStatus> {
    if !entering {
        return Ok(WalkStatus::Continue);
    }
    let NodeData::Text {
        value,
        raw,
        soft_line_break,
    } = &node.data
    else {
        return Ok(WalkStatus::Continue);
    };
    if *raw {
        write_raw(cx.sink(), value);
    } else {
        write_rich(cx.sink(), value);
        if *soft_line_break {
            cx.write("\n");
        }
    }
    Ok(WalkStatus::Continue)
}

fn render_string(
    _r: &Renderer,
    cx: &mut RenderContext<'_>,
    node: &Node,
    entering: bool,
) -> Result<WalkStatus> {
    if !entering {
        return Ok(WalkStatus::Continue);
    }
    let NodeData::String { value, raw, code } = &node.data else {
        return Ok(WalkStatus::Continue);
    };
    if *code || *raw {
        write_raw(cx.sink(), value);
    } else {
        write_rich(cx.sink(), value);
    }
    Ok(WalkStatus::Continue)
}
