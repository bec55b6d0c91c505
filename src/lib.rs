pub mod annotate;
pub mod content;
pub mod dict;
pub mod dispatch;
pub mod outline;
pub mod pages;
pub mod popover;
pub mod tokenize;
#[cfg(feature = "web")]
pub mod web;

pub use annotate::Annotator;
pub use content::{Composite, Node};
pub use dict::{DictStore, HttpSource, ResolvedWordList, WordDef, WordList};
pub use dispatch::{DispatchOutcome, Dispatcher};
pub use outline::{Outline, OutlineEntry};
pub use popover::{PopoverLayout, Rect, Viewport};
pub use tokenize::{Token, tokenize};
