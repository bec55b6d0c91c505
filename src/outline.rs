//! Table-of-contents accumulation.
//!
//! Section titles register themselves in document order while the
//! grammar guide renders; depth is decided structurally by how many
//! sections enclose the title, never by an explicit heading number.

use serde::Serialize;
use std::fmt;

/// One heading in the outline tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutlineEntry {
    pub id: String,
    pub title: String,
    pub unofficial: bool,
    pub children: Vec<OutlineEntry>,
}

impl OutlineEntry {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            unofficial: false,
            children: Vec::new(),
        }
    }

    pub fn unofficial(mut self) -> Self {
        self.unofficial = true;
        self
    }
}

/// Registering at a depth whose parent level has no entry yet is a
/// content-structure bug; it is reported, never papered over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MissingParent {
    pub depth: usize,
}

impl fmt::Display for MissingParent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "no open outline entry at depth {} to attach a child to",
            self.depth
        )
    }
}

impl std::error::Error for MissingParent {}

/// Incrementally built heading tree.
#[derive(Debug, Default)]
pub struct Outline {
    roots: Vec<OutlineEntry>,
}

impl Outline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `entry` at `depth`: descend `depth` times into the last
    /// entry's children, then push. Depth 0 appends a new top-level
    /// heading; depth N attaches to the most recently registered entry
    /// at depth N-1.
    pub fn register(&mut self, entry: OutlineEntry, depth: usize) -> Result<(), MissingParent> {
        let mut level = &mut self.roots;
        for step in 0..depth {
            let parent = level.last_mut().ok_or(MissingParent { depth: step })?;
            level = &mut parent.children;
        }
        level.push(entry);
        Ok(())
    }

    /// Clears the outline so a fresh rendering pass can re-register
    /// everything in order.
    pub fn reset(&mut self) {
        self.roots.clear();
    }

    pub fn roots(&self) -> &[OutlineEntry] {
        &self.roots
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registration_order_defines_position() {
        let mut outline = Outline::new();
        outline.register(OutlineEntry::new("a", "A"), 0).unwrap();
        outline.register(OutlineEntry::new("b", "B"), 1).unwrap();
        outline.register(OutlineEntry::new("c", "C"), 0).unwrap();

        let roots = outline.roots();
        assert_eq!(roots.len(), 2);
        assert_eq!(roots[0].title, "A");
        assert_eq!(roots[0].children.len(), 1);
        assert_eq!(roots[0].children[0].title, "B");
        assert_eq!(roots[1].title, "C");
        assert!(roots[1].children.is_empty());
    }

    #[test]
    fn children_attach_to_latest_parent() {
        let mut outline = Outline::new();
        outline.register(OutlineEntry::new("a", "A"), 0).unwrap();
        outline.register(OutlineEntry::new("b", "B"), 0).unwrap();
        outline.register(OutlineEntry::new("b1", "B1"), 1).unwrap();
        outline.register(OutlineEntry::new("b1x", "B1x"), 2).unwrap();

        let roots = outline.roots();
        assert!(roots[0].children.is_empty());
        assert_eq!(roots[1].children[0].title, "B1");
        assert_eq!(roots[1].children[0].children[0].title, "B1x");
    }

    #[test]
    fn missing_parent_is_an_error() {
        let mut outline = Outline::new();
        let err = outline
            .register(OutlineEntry::new("orphan", "Orphan"), 1)
            .unwrap_err();
        assert_eq!(err, MissingParent { depth: 0 });

        outline.register(OutlineEntry::new("a", "A"), 0).unwrap();
        let err = outline
            .register(OutlineEntry::new("deep", "Deep"), 3)
            .unwrap_err();
        assert_eq!(err, MissingParent { depth: 1 });
    }

    #[test]
    fn reset_supports_re_rendering() {
        let mut outline = Outline::new();
        outline.register(OutlineEntry::new("a", "A"), 0).unwrap();
        outline.reset();
        assert!(outline.is_empty());
        outline.register(OutlineEntry::new("a", "A"), 0).unwrap();
        assert_eq!(outline.roots().len(), 1);
    }

    #[test]
    fn unofficial_flag_is_carried() {
        let mut outline = Outline::new();
        outline
            .register(OutlineEntry::new("x", "X").unofficial(), 0)
            .unwrap();
        assert!(outline.roots()[0].unofficial);
    }
}
