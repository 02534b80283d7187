//! Canonical HTML: a tolerant parse followed by re-serialization.
//!
//! The html5ever tree builder closes unclosed tags, moves misnested content and
//! quotes every attribute, so the serialized form is well-formed whatever the
//! source looked like. Serializing an already canonical document is a no-op.
//!
//! The serializer runs with scripting enabled to match the parser: `<noscript>`
//! content is raw text on the way in and must stay unescaped on the way out.

use std::io;

use ego_tree::iter::Edge;
use engine_logging::engine_error;
use html5ever::serialize::{serialize, Serialize, SerializeOpts, Serializer, TraversalScope};
use html5ever::ns;
use scraper::node::Node;
use scraper::{Html, Selector};

use crate::Document;

/// Elements whose first newline the parser swallows.
const LEADING_NEWLINE_ELEMENTS: [&str; 3] = ["pre", "textarea", "listing"];

/// One element in document order, compared by tag, attributes and depth.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementShape {
    pub depth: usize,
    pub name: String,
    /// Sorted by name so attribute order does not matter.
    pub attributes: Vec<(String, String)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PageSummary {
    pub(crate) title: Option<String>,
    pub(crate) element_count: usize,
}

/// Canonical markup for a fetched document.
pub fn canonicalize(document: &Document) -> String {
    canonicalize_html(&document.html)
}

pub fn canonicalize_html(html: &str) -> String {
    let document = Html::parse_document(html);
    let opts = SerializeOpts {
        scripting_enabled: true,
        traversal_scope: TraversalScope::IncludeNode,
        create_missing_parent: false,
    };
    let mut buf = Vec::new();
    if let Err(err) = serialize(&mut buf, &CanonicalTree(&document), opts) {
        engine_error!("Canonical serialization failed: {}", err);
        return document.html();
    }
    String::from_utf8_lossy(&buf).into_owned()
}

struct CanonicalTree<'a>(&'a Html);

impl Serialize for CanonicalTree<'_> {
    fn serialize<S: Serializer>(
        &self,
        serializer: &mut S,
        _traversal_scope: TraversalScope,
    ) -> io::Result<()> {
        for edge in self.0.tree.root().traverse() {
            match edge {
                Edge::Open(node) => match node.value() {
                    Node::Doctype(doctype) => serializer.write_doctype(doctype.name())?,
                    Node::Comment(comment) => serializer.write_comment(comment)?,
                    Node::Text(text) => serializer.write_text(text)?,
                    Node::ProcessingInstruction(pi) => {
                        serializer.write_processing_instruction(&pi.target, &pi.data)?
                    }
                    Node::Element(element) => {
                        let attrs = element.attrs.iter().map(|(name, value)| (name, &value[..]));
                        serializer.start_elem(element.name.clone(), attrs)?;
                        // Re-emit the newline the parser will drop again.
                        let restores_newline = element.name.ns == ns!(html)
                            && LEADING_NEWLINE_ELEMENTS.contains(&element.name())
                            && node
                                .first_child()
                                .and_then(|child| child.value().as_text())
                                .is_some_and(|text| text.starts_with('\n'));
                        if restores_newline {
                            serializer.write_text("\n")?;
                        }
                    }
                    Node::Document | Node::Fragment => {}
                },
                Edge::Close(node) => {
                    if let Node::Element(element) = node.value() {
                        serializer.end_elem(element.name.clone())?;
                    }
                }
            }
        }
        Ok(())
    }
}

/// Flattens the element tree so two documents can be compared structurally.
pub fn structural_outline(html: &str) -> Vec<ElementShape> {
    let document = Html::parse_document(html);
    let mut depth = 0usize;
    let mut shapes = Vec::new();

    for edge in document.tree.root().traverse() {
        match edge {
            Edge::Open(node) => {
                if let Node::Element(element) = node.value() {
                    let mut attributes: Vec<(String, String)> = element
                        .attrs()
                        .map(|(name, value)| (name.to_string(), value.to_string()))
                        .collect();
                    attributes.sort();
                    shapes.push(ElementShape {
                        depth,
                        name: element.name().to_string(),
                        attributes,
                    });
                }
                depth += 1;
            }
            Edge::Close(_) => depth = depth.saturating_sub(1),
        }
    }
    shapes
}

pub(crate) fn inspect(html: &str) -> PageSummary {
    let document = Html::parse_document(html);
    let title = Selector::parse("title")
        .ok()
        .and_then(|sel| {
            document
                .select(&sel)
                .next()
                .map(|t| t.text().collect::<String>())
        })
        .map(|t| t.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|t| !t.is_empty());
    let element_count = document
        .tree
        .nodes()
        .filter(|node| node.value().is_element())
        .count();

    PageSummary {
        title,
        element_count,
    }
}
