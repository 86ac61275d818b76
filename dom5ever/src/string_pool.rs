// Copyright 2014-2017 The dom5ever Project Developers. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The string interning capability a [`Document`](crate::Document) is
//! constructed with.
//!
//! Handles are [`dom_atoms`] atoms, so equality is a pointer comparison
//! and interning the same bytes twice returns equal handles. The pool
//! additionally *pins* every atom it hands out: dynamic atoms are
//! reference counted, and the retention tables below keep them alive at
//! least as long as the document, so a `QualName` held by any node stays
//! valid no matter how the node travels. Nothing is ever removed; the
//! pool grows monotonically for the document's lifetime.

use std::cell::RefCell;
use std::collections::HashSet;
use std::fmt;

use dom_atoms::{LocalName, Namespace, Prefix};

pub struct StringPool {
    locals: RefCell<HashSet<LocalName>>,
    namespaces: RefCell<HashSet<Namespace>>,
    prefixes: RefCell<HashSet<Prefix>>,
}

impl StringPool {
    pub fn new() -> StringPool {
        StringPool {
            locals: RefCell::new(HashSet::new()),
            namespaces: RefCell::new(HashSet::new()),
            prefixes: RefCell::new(HashSet::new()),
        }
    }

    /// Interns a tag or attribute local name.
    pub fn intern_local(&self, s: &str) -> LocalName {
        let atom = LocalName::from(s);
        self.locals.borrow_mut().insert(atom.clone());
        atom
    }

    /// Interns a namespace url. The empty string is the null namespace.
    pub fn intern_namespace(&self, s: &str) -> Namespace {
        let atom = Namespace::from(s);
        self.namespaces.borrow_mut().insert(atom.clone());
        atom
    }

    /// Interns a namespace prefix.
    pub fn intern_prefix(&self, s: &str) -> Prefix {
        let atom = Prefix::from(s);
        self.prefixes.borrow_mut().insert(atom.clone());
        atom
    }

    /// Number of distinct strings pinned by this pool.
    pub fn len(&self) -> usize {
        self.locals.borrow().len() + self.namespaces.borrow().len() + self.prefixes.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for StringPool {
    fn default() -> StringPool {
        StringPool::new()
    }
}

impl fmt::Debug for StringPool {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("StringPool")
            .field("strings", &self.len())
            .finish()
    }
}
