//! Static site content and the grammar-guide rendering pass.
//!
//! The grammar guide is authored as a tree of sections. One rendering
//! pass walks it top to bottom, registering every title into the
//! outline at its structural depth and annotating body text so each
//! toki ma word becomes a clickable definition anchor. Translations
//! and other English-only regions are marked `noclick`.

use crate::annotate::Annotator;
use crate::content::{Composite, Node, escape_html};
use crate::outline::{MissingParent, Outline, OutlineEntry};

/// One section of the grammar guide. Children nest to arbitrary
/// depth; the nesting alone decides outline depth and heading level.
pub struct Section {
    pub id: &'static str,
    pub title: &'static str,
    pub unofficial: bool,
    pub body: Vec<Node>,
    pub children: Vec<Section>,
}

impl Section {
    fn new(id: &'static str, title: &'static str) -> Self {
        Self {
            id,
            title,
            unofficial: false,
            body: Vec::new(),
            children: Vec::new(),
        }
    }

    fn unofficial(mut self) -> Self {
        self.unofficial = true;
        self
    }

    fn body(mut self, nodes: impl IntoIterator<Item = Node>) -> Self {
        self.body.extend(nodes);
        self
    }

    fn child(mut self, section: Section) -> Self {
        self.children.push(section);
        self
    }
}

/// A fully rendered grammar guide: annotated body HTML plus the
/// outline accumulated during the same pass.
pub struct GrammarPage {
    pub html: String,
    pub outline: Outline,
}

/// Renders the guide in one top-to-bottom pass. The outline is reset
/// implicitly by being freshly built each call, mirroring how a
/// re-render re-registers everything in order.
pub fn render_grammar(sections: &[Section]) -> Result<GrammarPage, MissingParent> {
    let mut outline = Outline::new();
    let mut annotator = Annotator::new();
    let mut html = String::new();
    render_sections(sections, 0, &mut outline, &mut annotator, &mut html)?;
    Ok(GrammarPage { html, outline })
}

fn render_sections(
    sections: &[Section],
    depth: usize,
    outline: &mut Outline,
    annotator: &mut Annotator,
    html: &mut String,
) -> Result<(), MissingParent> {
    for section in sections {
        let mut entry = OutlineEntry::new(section.id, section.title);
        if section.unofficial {
            entry = entry.unofficial();
        }
        outline.register(entry, depth)?;

        // h2 for top-level sections, deeper headings below, capped at h5.
        let level = (depth + 2).min(5);
        html.push_str(&format!(
            "<section id=\"{id}\"{class}><h{level}>{title}{badge}</h{level}>",
            id = section.id,
            class = if section.unofficial {
                " class=\"unofficial\""
            } else {
                ""
            },
            title = escape_html(section.title),
            badge = if section.unofficial {
                " <span class=\"badge\">unofficial</span>"
            } else {
                ""
            },
        ));
        for node in &section.body {
            let annotated = annotator.annotate(node.clone(), false);
            html.push_str(&annotated.to_html());
        }
        render_sections(&section.children, depth + 1, outline, annotator, html)?;
        html.push_str("</section>");
    }
    Ok(())
}

fn paragraph(text: &str) -> Node {
    Composite::new("p").child(Node::text(text)).into()
}

/// A toki ma sentence with its English translation. The translation
/// is noclick so its words never become dictionary anchors.
fn example(tokima: &str, english: &str) -> Node {
    Composite::new("div")
        .class("example")
        .child(
            Composite::new("span")
                .class("tm")
                .child(Node::text(tokima))
                .into(),
        )
        .child(
            Composite::new("span")
                .class("translation")
                .noclick()
                .child(Node::text(english))
                .into(),
        )
        .into()
}

/// The grammar guide content, top to bottom.
pub fn grammar_sections() -> Vec<Section> {
    vec![
        Section::new("sentences", "Basic sentences")
            .body([
                paragraph(
                    "Every toki ma sentence places the particle li between \
                     the subject and its predicate, no matter what the \
                     subject is.",
                ),
                example("mi li moku.", "I eat."),
                example("jan li lukin e kili.", "The person looks at the fruit."),
            ])
            .child(Section::new("negation", "Negation").body([
                paragraph("The modifier ala after a word negates it."),
                example("mi li moku ala.", "I do not eat."),
            ]))
            .child(Section::new("questions", "Questions").body([
                paragraph(
                    "Yes-no questions repeat the verb around ala; open \
                     questions use seme in place of the unknown part.",
                ),
                example("sina li moku ala moku?", "Are you eating?"),
                example("sina li lukin e seme?", "What are you looking at?"),
            ])),
        Section::new("objects", "Direct objects").body([
            paragraph("The particle e introduces each direct object."),
            example("mi li moku e kili.", "I eat the fruit."),
            example(
                "on li lukin e tomo e ma.",
                "They look at the house and the land.",
            ),
        ]),
        Section::new("modifiers", "Modifiers").body([
            paragraph(
                "Modifiers follow their head word. A chain of modifiers \
                 applies left to right.",
            ),
            example("tomo suli", "a big house"),
            example("jan pona mute", "many good people"),
        ]),
        Section::new("prepositions", "Prepositions").body([
            paragraph(
                "Prepositional phrases follow the predicate: lon for \
                 location, tawa for direction, tan for origin.",
            ),
            example("mi li moku lon tomo.", "I eat in the house."),
            example("on li tawa tan ma suli.", "They leave the big country."),
        ]),
        Section::new("numbers", "Numbers")
            .unofficial()
            .body([
                paragraph(
                    "The extended numeral system is a community proposal \
                     and not part of the official grammar.",
                ),
                example("jan tu", "two people"),
            ]),
    ]
}

/// Introduction page body, rendered as markdown by the web layer.
pub fn introduction_markdown() -> &'static str {
    r#"# toki ma

**toki ma** is a constructed international auxiliary language that
grows out of the philosophy of minimal languages: a small, regular
vocabulary, a grammar with no inflection, and meanings built by
composition.

## What is on this site

- The **grammar guide** walks through the whole language. Click any
  toki ma word to see its definition without leaving the page.
- The **dictionary** searches in both directions: type a toki ma word
  to find its meaning, or a word in your language to find how to say
  it.

## Where the words come from

The word list is fetched from the community-maintained dataset and
covers every interface language at once. A handful of widely used
community words that have not been adopted officially are merged in
and marked as unofficial.
"#
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outline_mirrors_section_nesting() {
        let page = render_grammar(&grammar_sections()).unwrap();
        let roots = page.outline.roots();
        assert_eq!(roots[0].id, "sentences");
        assert_eq!(roots[0].children.len(), 2);
        assert_eq!(roots[0].children[0].id, "negation");
        assert_eq!(roots[0].children[1].id, "questions");
        assert!(roots.iter().any(|entry| entry.id == "numbers" && entry.unofficial));
    }

    #[test]
    fn body_words_become_anchors() {
        let page = render_grammar(&grammar_sections()).unwrap();
        assert!(page.html.contains("class=\"tm-word\""));
        assert!(page.html.contains("data-word=\"moku\""));
    }

    #[test]
    fn translations_are_never_annotated() {
        let page = render_grammar(&grammar_sections()).unwrap();
        // "fruit" only occurs inside noclick translations.
        assert!(!page.html.contains("data-word=\"fruit\""));
        assert!(page.html.contains("fruit"));
    }

    #[test]
    fn word_keys_are_unique_across_the_guide() {
        let page = render_grammar(&grammar_sections()).unwrap();
        let mut ids: Vec<&str> = page
            .html
            .match_indices("id=\"tm-w")
            .map(|(start, _)| {
                let rest = &page.html[start + 4..];
                &rest[..rest.find('"').unwrap()]
            })
            .collect();
        let total = ids.len();
        assert!(total > 10);
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), total);
    }

    #[test]
    fn re_rendering_starts_from_scratch() {
        let first = render_grammar(&grammar_sections()).unwrap();
        let second = render_grammar(&grammar_sections()).unwrap();
        assert_eq!(first.html, second.html);
        assert_eq!(first.outline.roots(), second.outline.roots());
    }
}
