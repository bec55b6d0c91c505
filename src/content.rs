//! The content tree the grammar guide is authored in.
//!
//! Everything the annotator traverses is one of these explicit
//! variants, so dispatch in the walker is exhaustive instead of
//! shape-sniffed at runtime.

/// One node of renderable content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// Plain text, subject to word annotation.
    Text(String),
    /// An ordered run of nodes with no element of its own.
    Seq(Vec<Node>),
    /// An element wrapping nested content.
    Composite(Composite),
    /// An interactive word produced by annotation. Opaque: never
    /// traversed again, so a tree can be annotated at most once.
    Word { key: usize, word: String },
    /// Pre-rendered markup passed through untouched.
    Raw(String),
}

/// An element carrying nested children plus display properties.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Composite {
    pub tag: &'static str,
    pub class: Option<&'static str>,
    /// Suppresses word annotation for this subtree.
    pub noclick: bool,
    pub children: Vec<Node>,
}

impl Composite {
    pub fn new(tag: &'static str) -> Self {
        Self {
            tag,
            class: None,
            noclick: false,
            children: Vec::new(),
        }
    }

    pub fn class(mut self, class: &'static str) -> Self {
        self.class = Some(class);
        self
    }

    pub fn noclick(mut self) -> Self {
        self.noclick = true;
        self
    }

    pub fn child(mut self, node: Node) -> Self {
        self.children.push(node);
        self
    }

    pub fn children(mut self, nodes: impl IntoIterator<Item = Node>) -> Self {
        self.children.extend(nodes);
        self
    }
}

impl From<Composite> for Node {
    fn from(value: Composite) -> Self {
        Node::Composite(value)
    }
}

impl Node {
    pub fn text(value: impl Into<String>) -> Self {
        Node::Text(value.into())
    }

    pub fn seq(nodes: impl IntoIterator<Item = Node>) -> Self {
        Node::Seq(nodes.into_iter().collect())
    }

    /// Renders the node to HTML, escaping text content.
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        self.write_html(&mut out);
        out
    }

    fn write_html(&self, out: &mut String) {
        match self {
            Node::Text(text) => out.push_str(&escape_html(text)),
            Node::Seq(items) => {
                for item in items {
                    item.write_html(out);
                }
            }
            Node::Composite(composite) => {
                out.push('<');
                out.push_str(composite.tag);
                if let Some(class) = composite.class {
                    out.push_str(" class=\"");
                    out.push_str(class);
                    out.push('"');
                }
                out.push('>');
                for child in &composite.children {
                    child.write_html(out);
                }
                out.push_str("</");
                out.push_str(composite.tag);
                out.push('>');
            }
            Node::Word { key, word } => {
                out.push_str("<span class=\"tm-word\" id=\"tm-w");
                out.push_str(&key.to_string());
                out.push_str("\" data-word=\"");
                out.push_str(&escape_html(word));
                out.push_str("\">");
                out.push_str(&escape_html(word));
                out.push_str("</span>");
            }
            Node::Raw(markup) => out.push_str(markup),
        }
    }
}

pub fn escape_html(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_nested_composites() {
        let node: Node = Composite::new("p")
            .class("example")
            .child(Node::text("toki <ma>"))
            .into();
        assert_eq!(node.to_html(), "<p class=\"example\">toki &lt;ma&gt;</p>");
    }

    #[test]
    fn renders_word_span_with_stable_id() {
        let node = Node::Word {
            key: 7,
            word: "kili".to_string(),
        };
        assert_eq!(
            node.to_html(),
            "<span class=\"tm-word\" id=\"tm-w7\" data-word=\"kili\">kili</span>"
        );
    }

    #[test]
    fn raw_markup_is_not_escaped() {
        let node = Node::Raw("<hr>".to_string());
        assert_eq!(node.to_html(), "<hr>");
    }
}
