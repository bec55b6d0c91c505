//! Recursive word annotation over a content tree.
//!
//! Word tokens become interactive [`Node::Word`] elements with keys
//! assigned sequentially across the entire annotated region, so the
//! same word appearing twice still gets two distinct anchors.
//! Suppression is an ordinary argument threaded through the recursion:
//! once an ancestor turns it on it stays on for the whole subtree.

use crate::content::Node;
use crate::tokenize::tokenize;

/// Carries the running key counter for one annotated region.
#[derive(Debug, Default)]
pub struct Annotator {
    next_key: usize,
}

impl Annotator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `node` with every reachable word token wrapped as an
    /// interactive element, unless `suppressed` (or an ancestor's
    /// `noclick`) is in effect. Opaque leaves pass through unchanged.
    pub fn annotate(&mut self, node: Node, suppressed: bool) -> Node {
        match node {
            Node::Text(text) => self.annotate_text(text, suppressed),
            Node::Seq(items) => Node::Seq(
                items
                    .into_iter()
                    .map(|item| self.annotate(item, suppressed))
                    .collect(),
            ),
            Node::Composite(mut composite) => {
                let effective = suppressed || composite.noclick;
                composite.children = composite
                    .children
                    .into_iter()
                    .map(|child| self.annotate(child, effective))
                    .collect();
                Node::Composite(composite)
            }
            opaque @ (Node::Word { .. } | Node::Raw(_)) => opaque,
        }
    }

    fn annotate_text(&mut self, text: String, suppressed: bool) -> Node {
        if suppressed || !tokenize(&text).any(|token| token.is_word) {
            return Node::Text(text);
        }
        let parts = tokenize(&text)
            .map(|token| {
                if token.is_word {
                    let key = self.next_key;
                    self.next_key += 1;
                    Node::Word {
                        key,
                        word: token.text.to_string(),
                    }
                } else {
                    Node::Text(token.text.to_string())
                }
            })
            .collect();
        Node::Seq(parts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::Composite;

    fn collect_words(node: &Node, out: &mut Vec<(usize, String)>) {
        match node {
            Node::Word { key, word } => out.push((*key, word.clone())),
            Node::Seq(items) => {
                for item in items {
                    collect_words(item, out);
                }
            }
            Node::Composite(composite) => {
                for child in &composite.children {
                    collect_words(child, out);
                }
            }
            Node::Text(_) | Node::Raw(_) => {}
        }
    }

    fn words_of(node: &Node) -> Vec<(usize, String)> {
        let mut out = Vec::new();
        collect_words(node, &mut out);
        out
    }

    #[test]
    fn wraps_words_and_keeps_punctuation() {
        let mut annotator = Annotator::new();
        let annotated = annotator.annotate(Node::text("mi li moku!"), false);
        assert_eq!(
            words_of(&annotated),
            vec![
                (0, "mi".to_string()),
                (1, "li".to_string()),
                (2, "moku".to_string()),
            ]
        );
        assert_eq!(
            annotated.to_html(),
            "<span class=\"tm-word\" id=\"tm-w0\" data-word=\"mi\">mi</span> \
             <span class=\"tm-word\" id=\"tm-w1\" data-word=\"li\">li</span> \
             <span class=\"tm-word\" id=\"tm-w2\" data-word=\"moku\">moku</span>!"
        );
    }

    #[test]
    fn repeated_words_get_distinct_keys() {
        let mut annotator = Annotator::new();
        let annotated = annotator.annotate(
            Node::seq([
                Node::text("kili"),
                Node::text(" "),
                Node::text("kili"),
            ]),
            false,
        );
        let words = words_of(&annotated);
        assert_eq!(words.len(), 2);
        assert_ne!(words[0].0, words[1].0);
        assert_eq!(words[0].1, words[1].1);
    }

    #[test]
    fn counter_runs_across_the_whole_region() {
        let mut annotator = Annotator::new();
        let first = annotator.annotate(Node::text("toki"), false);
        let second = annotator.annotate(Node::text("pona"), false);
        assert_eq!(words_of(&first), vec![(0, "toki".to_string())]);
        assert_eq!(words_of(&second), vec![(1, "pona".to_string())]);
    }

    #[test]
    fn suppression_is_monotonic() {
        // The inner composite does not set noclick, but its ancestor
        // does; no descendant word may be wrapped.
        let tree: Node = Composite::new("div")
            .noclick()
            .child(
                Composite::new("p")
                    .child(Node::text("mi li moku"))
                    .into(),
            )
            .into();
        let mut annotator = Annotator::new();
        let annotated = annotator.annotate(tree, false);
        assert!(words_of(&annotated).is_empty());
    }

    #[test]
    fn suppressed_text_is_untouched() {
        let mut annotator = Annotator::new();
        let annotated = annotator.annotate(Node::text("mi li moku"), true);
        assert_eq!(annotated, Node::text("mi li moku"));
    }

    #[test]
    fn composite_properties_survive() {
        let tree: Node = Composite::new("p")
            .class("example")
            .child(Node::text("kili"))
            .into();
        let mut annotator = Annotator::new();
        match annotator.annotate(tree, false) {
            Node::Composite(composite) => {
                assert_eq!(composite.tag, "p");
                assert_eq!(composite.class, Some("example"));
                assert!(!composite.noclick);
            }
            other => panic!("expected composite, got {other:?}"),
        }
    }

    #[test]
    fn opaque_leaves_are_not_retraversed() {
        let word = Node::Word {
            key: 42,
            word: "kili".to_string(),
        };
        let raw = Node::Raw("<b>mi</b>".to_string());
        let mut annotator = Annotator::new();
        assert_eq!(annotator.annotate(word.clone(), false), word);
        assert_eq!(annotator.annotate(raw.clone(), false), raw);
        // Neither consumed a key.
        let next = annotator.annotate(Node::text("mi"), false);
        assert_eq!(words_of(&next), vec![(0, "mi".to_string())]);
    }
}
