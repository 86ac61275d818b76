// Copyright 2014-2017 The dom5ever Project Developers. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The ordered attribute storage behind every element.

use std::slice;

use dom_atoms::{LocalName, Namespace};
use tendril::StrTendril;

use crate::interface::QualName;

/// A single attribute: a qualified name and a value.
#[derive(PartialEq, Eq, PartialOrd, Ord, Clone, Debug)]
pub struct Attribute {
    pub name: QualName,
    pub value: StrTendril,
}

/// An ordered sequence of attributes keyed by `(local, ns)`.
///
/// Iteration order is insertion order, it is observable through
/// `NamedNodeMap` and `attribute_names`, and it is stable across
/// overwrites: setting an existing attribute updates it in place.
/// Typical elements carry a handful of attributes, so lookups are linear
/// scans; each comparison is a pointer comparison thanks to interning.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AttributeMap {
    attrs: Vec<Attribute>,
}

impl AttributeMap {
    pub fn new() -> AttributeMap {
        AttributeMap { attrs: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.attrs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attrs.is_empty()
    }

    /// Index of the attribute with this `(local, ns)` pair, if present.
    pub fn position(&self, local: &LocalName, ns: &Namespace) -> Option<usize> {
        self.attrs
            .iter()
            .position(|attr| attr.name.local == *local && attr.name.ns == *ns)
    }

    pub fn contains(&self, local: &LocalName, ns: &Namespace) -> bool {
        self.position(local, ns).is_some()
    }

    pub fn get(&self, local: &LocalName, ns: &Namespace) -> Option<&StrTendril> {
        self.position(local, ns).map(|i| &self.attrs[i].value)
    }

    /// The attribute at `index` in insertion order.
    pub fn nth(&self, index: usize) -> Option<&Attribute> {
        self.attrs.get(index)
    }

    /// Sets an attribute, overwriting in place (order preserved) when the
    /// `(local, ns)` pair is already present, appending otherwise.
    /// Returns the previous value if there was one.
    pub fn set(&mut self, name: QualName, value: StrTendril) -> Option<StrTendril> {
        match self.position(&name.local, &name.ns) {
            Some(i) => {
                let attr = &mut self.attrs[i];
                let old = std::mem::replace(&mut attr.value, value);
                // A rewrite may carry a different prefix for the same
                // expanded name; the last write wins.
                attr.name = name;
                Some(old)
            },
            None => {
                self.attrs.push(Attribute { name, value });
                None
            },
        }
    }

    /// Removes an attribute, preserving the order of the remaining
    /// entries.
    pub fn remove(&mut self, local: &LocalName, ns: &Namespace) -> Option<Attribute> {
        self.position(local, ns).map(|i| self.attrs.remove(i))
    }

    pub fn iter(&self) -> slice::Iter<'_, Attribute> {
        self.attrs.iter()
    }
}

impl<'a> IntoIterator for &'a AttributeMap {
    type Item = &'a Attribute;
    type IntoIter = slice::Iter<'a, Attribute>;

    fn into_iter(self) -> slice::Iter<'a, Attribute> {
        self.attrs.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dom_atoms::ns;

    fn name(local: &str) -> QualName {
        QualName::new(None, ns!(), LocalName::from(local))
    }

    fn tendril(s: &str) -> StrTendril {
        StrTendril::from_slice(s)
    }

    #[test]
    fn set_appends_then_overwrites_in_place() {
        let mut map = AttributeMap::new();
        assert_eq!(map.set(name("a"), tendril("1")), None);
        assert_eq!(map.set(name("b"), tendril("2")), None);
        assert_eq!(map.set(name("a"), tendril("3")), Some(tendril("1")));

        let order: Vec<_> = map.iter().map(|a| a.name.local.to_string()).collect();
        assert_eq!(order, ["a", "b"]);
        assert_eq!(map.get(&LocalName::from("a"), &ns!()), Some(&tendril("3")));
    }

    #[test]
    fn namespace_distinguishes_entries() {
        let mut map = AttributeMap::new();
        map.set(name("href"), tendril("plain"));
        map.set(
            QualName::new(None, ns!(xlink), LocalName::from("href")),
            tendril("linked"),
        );
        assert_eq!(map.len(), 2);
        assert_eq!(
            map.get(&LocalName::from("href"), &ns!(xlink)),
            Some(&tendril("linked"))
        );
    }

    #[test]
    fn remove_keeps_order() {
        let mut map = AttributeMap::new();
        map.set(name("a"), tendril("1"));
        map.set(name("b"), tendril("2"));
        map.set(name("c"), tendril("3"));
        let removed = map.remove(&LocalName::from("b"), &ns!()).unwrap();
        assert_eq!(removed.value, tendril("2"));
        let order: Vec<_> = map.iter().map(|a| a.name.local.to_string()).collect();
        assert_eq!(order, ["a", "c"]);
        assert!(map.remove(&LocalName::from("b"), &ns!()).is_none());
    }
}
