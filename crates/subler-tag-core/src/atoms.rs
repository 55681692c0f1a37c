//! Ordered metadata atoms and their rendering into the `-metadata` argument.

use std::slice;

use crate::escape::escape_value;
use crate::tag::Tag;

pub const METADATA_FLAG: &str = "-metadata";

/// A single tag/value pair. Immutable once created.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Atom {
    tag: String,
    value: String,
}

impl Atom {
    pub fn new(tag: impl AsRef<str>, value: impl Into<String>) -> Self {
        Atom {
            tag: tag.as_ref().to_owned(),
            value: value.into(),
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// Whether the tag is one of the labels in the [`Tag`] table.
    pub fn is_recognized(&self) -> bool {
        Tag::from_label(&self.tag).is_some()
    }

    /// Renders `{'<tag>':<value>}`. Artwork values are file paths and stay
    /// unquoted; everything else is single-quoted.
    pub fn render(&self) -> String {
        let value = escape_value(&self.value);
        if self.tag == Tag::Artwork.label() {
            format!("{{'{}':{}}}", self.tag, value)
        } else {
            format!("{{'{}':'{}'}}", self.tag, value)
        }
    }
}

/// Append-only, insertion-ordered collection of atoms. Repeated tags are kept.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Atoms {
    atoms: Vec<Atom>,
}

impl Atoms {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a tag/value atom. Any tag string is accepted.
    pub fn add(mut self, tag: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.atoms.push(Atom::new(tag, value));
        self
    }

    pub fn add_atom(mut self, atom: Atom) -> Self {
        self.atoms.push(atom);
        self
    }

    pub fn add_atoms(mut self, other: Atoms) -> Self {
        self.atoms.extend(other.atoms);
        self
    }

    pub fn push(&mut self, atom: Atom) {
        self.atoms.push(atom);
    }

    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    pub fn iter(&self) -> slice::Iter<'_, Atom> {
        self.atoms.iter()
    }

    /// Labels of every recognised tag. Informational only: `add` does not
    /// consult it.
    pub fn tags() -> Vec<&'static str> {
        Tag::labels()
    }

    /// Atoms whose tag is missing from the [`Tag`] table.
    pub fn unrecognized(&self) -> impl Iterator<Item = &Atom> {
        self.atoms.iter().filter(|atom| !atom.is_recognized())
    }

    /// Returns `[]` when empty, otherwise `["-metadata", "<atom><atom>..."]`.
    pub fn render(&self) -> Vec<String> {
        if self.atoms.is_empty() {
            return Vec::new();
        }

        let joined: String = self.atoms.iter().map(Atom::render).collect();
        vec![METADATA_FLAG.to_string(), joined]
    }
}

impl Extend<Atom> for Atoms {
    fn extend<I: IntoIterator<Item = Atom>>(&mut self, iter: I) {
        self.atoms.extend(iter);
    }
}

impl FromIterator<Atom> for Atoms {
    fn from_iter<I: IntoIterator<Item = Atom>>(iter: I) -> Self {
        Atoms {
            atoms: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for Atoms {
    type Item = Atom;
    type IntoIter = std::vec::IntoIter<Atom>;

    fn into_iter(self) -> Self::IntoIter {
        self.atoms.into_iter()
    }
}

impl<'a> IntoIterator for &'a Atoms {
    type Item = &'a Atom;
    type IntoIter = slice::Iter<'a, Atom>;

    fn into_iter(self) -> Self::IntoIter {
        self.atoms.iter()
    }
}
