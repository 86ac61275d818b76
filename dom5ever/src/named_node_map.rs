// Copyright 2014-2017 The dom5ever Project Developers. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The `NamedNodeMap` view: attributes reified as `Attr` nodes.
//!
//! `Attr` nodes are created on demand and cached per element (in rare
//! data), so repeated accesses return the same node identity - which is
//! also what gives an `Attr` a stable `owner_element` back-link. When an
//! attribute is removed, its cached node is detached (owner cleared) but
//! keeps its last value; external holders may keep it alive.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use dom_atoms::Namespace;
use tendril::StrTendril;

use crate::element::{remove_attribute_qualified, set_attribute_qualified};
use crate::error::DomError;
use crate::interface::QualName;
use crate::node::{node_document, AttrData, Handle, Node, NodeData};

/// A live view over an element's attributes, producing `Attr` nodes.
#[derive(Clone)]
pub struct NamedNodeMap {
    element: Handle,
}

impl NamedNodeMap {
    pub(crate) fn new(element: Handle) -> NamedNodeMap {
        NamedNodeMap { element }
    }

    pub fn element(&self) -> &Handle {
        &self.element
    }

    pub fn length(&self) -> usize {
        self.element
            .element_data()
            .map(|data| data.attrs.borrow().len())
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.length() == 0
    }

    /// The `Attr` node for the attribute at `index`, in insertion order.
    pub fn item(&self, index: usize) -> Option<Handle> {
        let name = {
            let data = self.element.element_data()?;
            let attrs = data.attrs.borrow();
            attrs.nth(index)?.name.clone()
        };
        Some(cached_attr_node(&self.element, &name))
    }

    /// <https://dom.spec.whatwg.org/#dom-namednodemap-getnameditem>
    ///
    /// Matches against each attribute's qualified (`prefix:local`) name.
    pub fn get_named_item(&self, qualified: &str) -> Option<Handle> {
        let name = {
            let data = self.element.element_data()?;
            let attrs = data.attrs.borrow();
            attrs
                .iter()
                .find(|attr| attr.name.qualified() == qualified)?
                .name
                .clone()
        };
        Some(cached_attr_node(&self.element, &name))
    }

    pub fn get_named_item_ns(&self, namespace: Option<&str>, local: &str) -> Option<Handle> {
        let ns = Namespace::from(namespace.unwrap_or(""));
        let name = {
            let data = self.element.element_data()?;
            let attrs = data.attrs.borrow();
            attrs
                .iter()
                .find(|attr| *attr.name.local == *local && attr.name.ns == ns)?
                .name
                .clone()
        };
        Some(cached_attr_node(&self.element, &name))
    }

    /// <https://dom.spec.whatwg.org/#dom-namednodemap-setnameditem>
    ///
    /// Writes through the element's attribute pipeline (records and
    /// reactions included) and adopts `attr` as the cached node for its
    /// name. Returns the replaced `Attr` node, detached, if the
    /// attribute was already present.
    pub fn set_named_item(&self, attr: &Handle) -> Result<Option<Handle>, DomError> {
        let attr_data = attr
            .attr_data()
            .ok_or_else(|| DomError::NotSupported("node is not an attribute".into()))?;
        if let Some(owner) = attr_data.owner_element() {
            if !Rc::ptr_eq(&owner, &self.element) {
                return Err(DomError::InUseAttribute);
            }
        }
        let name = attr_data.name.clone();

        let present = self
            .element
            .element_data()
            .map(|data| data.attrs.borrow().contains(&name.local, &name.ns))
            .unwrap_or(false);
        let old_node = if present {
            Some(cached_attr_node(&self.element, &name))
        } else {
            None
        };
        if let Some(ref old) = old_node {
            if Rc::ptr_eq(old, attr) {
                // Re-setting an attribute's own node is a no-op.
                return Ok(Some(attr.clone()));
            }
        }

        // Swap the cache entry over to `attr` before the write so the
        // pipeline's sync step targets the new node.
        if old_node.is_some() {
            detach_cached_attr(&self.element, &name);
        }
        attr_data.set_owner(Some(Rc::downgrade(&self.element)));
        self.element
            .with_rare_data(|rare| rare.attr_cache.push((name.clone(), attr.clone())));

        let value = attr_data.value.borrow().clone();
        set_attribute_qualified(&self.element, name, value);
        Ok(old_node)
    }

    pub fn set_named_item_ns(&self, attr: &Handle) -> Result<Option<Handle>, DomError> {
        self.set_named_item(attr)
    }

    /// <https://dom.spec.whatwg.org/#dom-namednodemap-removenameditem>
    ///
    /// Returns the detached `Attr` node, or `NotFound` if no attribute
    /// has this qualified name.
    pub fn remove_named_item(&self, qualified: &str) -> Result<Handle, DomError> {
        let name = self
            .find_name(|name| name.qualified() == qualified)
            .ok_or_else(|| DomError::NotFound("no attribute with this name".into()))?;
        let node = cached_attr_node(&self.element, &name);
        remove_attribute_qualified(&self.element, &name.local, &name.ns);
        Ok(node)
    }

    pub fn remove_named_item_ns(
        &self,
        namespace: Option<&str>,
        local: &str,
    ) -> Result<Handle, DomError> {
        let ns = Namespace::from(namespace.unwrap_or(""));
        let name = self
            .find_name(|name| *name.local == *local && name.ns == ns)
            .ok_or_else(|| DomError::NotFound("no attribute with this name".into()))?;
        let node = cached_attr_node(&self.element, &name);
        remove_attribute_qualified(&self.element, &name.local, &name.ns);
        Ok(node)
    }

    fn find_name(&self, matches: impl Fn(&QualName) -> bool) -> Option<QualName> {
        let data = self.element.element_data()?;
        let attrs = data.attrs.borrow();
        attrs
            .iter()
            .find(|attr| matches(&attr.name))
            .map(|attr| attr.name.clone())
    }
}

// ------------------------------------------------------------------------
// The per-element Attr cache

/// The cached `Attr` node for `name`, created on first access with the
/// attribute's current value.
pub(crate) fn cached_attr_node(element: &Handle, name: &QualName) -> Handle {
    let existing = element
        .try_rare_data(|rare| {
            rare.attr_cache
                .iter()
                .find(|(cached, _)| cached.expanded() == name.expanded())
                .map(|(_, node)| node.clone())
        })
        .flatten();
    if let Some(node) = existing {
        return node;
    }

    let value = element
        .element_data()
        .and_then(|data| data.attrs.borrow().get(&name.local, &name.ns).cloned())
        .unwrap_or_else(StrTendril::new);
    let owner_doc = node_document(element).map(|d| Rc::downgrade(&d));
    let node = Node::new(
        NodeData::Attr(AttrData {
            name: name.clone(),
            value: RefCell::new(value),
            owner: Cell::new(Some(Rc::downgrade(element))),
        }),
        owner_doc,
    );
    element.with_rare_data(|rare| rare.attr_cache.push((name.clone(), node.clone())));
    node
}

/// Mirrors an attribute write into the cached `Attr` node, if any.
pub(crate) fn sync_cached_attr(element: &Handle, name: &QualName, value: StrTendril) {
    let node = element
        .try_rare_data(|rare| {
            rare.attr_cache
                .iter()
                .find(|(cached, _)| cached.expanded() == name.expanded())
                .map(|(_, node)| node.clone())
        })
        .flatten();
    if let Some(node) = node {
        if let Some(data) = node.attr_data() {
            *data.value.borrow_mut() = value;
        }
    }
}

/// Evicts the cache entry for a removed attribute and clears the node's
/// owner. The node keeps its last value for whoever still holds it.
pub(crate) fn detach_cached_attr(element: &Handle, name: &QualName) {
    if !element.has_rare_data() {
        return;
    }
    let removed = element.with_rare_data(|rare| {
        rare.attr_cache
            .iter()
            .position(|(cached, _)| cached.expanded() == name.expanded())
            .map(|i| rare.attr_cache.remove(i).1)
    });
    if let Some(node) = removed {
        if let Some(data) = node.attr_data() {
            data.set_owner(None);
        }
    }
}
