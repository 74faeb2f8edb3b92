//! Rules that steer the [`Unparser`](crate::Unparser).
use std::collections::BTreeSet;

/// One printing rule. Rules compose: an [`Rule::Indent`] layout overrides the
/// compact whitespace of [`Rule::Minify`] while semicolon dropping and
/// renaming still apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rule {
    /// Compact layout; optionally omit the semicolon closing a statement list.
    Minify { drop_semi: bool },
    /// Rename function and catch scoped bindings to short names, never
    /// producing a name from `reserved`.
    Obfuscate { reserved: BTreeSet<String> },
    /// One statement per line, nested blocks indented by `indent`.
    Indent { indent: String },
}

impl Rule {
    pub fn minify(drop_semi: bool) -> Self {
        Rule::Minify { drop_semi }
    }

    pub fn obfuscate<I, S>(reserved: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Rule::Obfuscate {
            reserved: reserved.into_iter().map(Into::into).collect(),
        }
    }

    pub fn indent(indent: impl Into<String>) -> Self {
        Rule::Indent {
            indent: indent.into(),
        }
    }
}

/// Effective settings after folding a rule list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Layout {
    /// `None` prints compactly.
    pub indent: Option<String>,
    pub drop_semi: bool,
    pub reserved: Option<BTreeSet<String>>,
}

impl Layout {
    pub fn from_rules(rules: &[Rule]) -> Self {
        let mut layout = Layout::default();
        for rule in rules {
            match rule {
                Rule::Minify { drop_semi } => layout.drop_semi |= *drop_semi,
                Rule::Obfuscate { reserved } => {
                    layout.reserved.get_or_insert_with(BTreeSet::new).extend(reserved.iter().cloned())
                }
                Rule::Indent { indent } => layout.indent = Some(indent.clone()),
            }
        }
        layout
    }

    pub fn pretty(&self) -> bool {
        self.indent.is_some()
    }
}
