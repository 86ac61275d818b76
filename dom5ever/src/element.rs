// Copyright 2014-2017 The dom5ever Project Developers. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Element operations: the attribute API, shadow root attachment, and
//! the live views.
//!
//! All attribute writes funnel through [`set_attribute_qualified`] /
//! [`remove_attribute_qualified`], which open a `[CEReactions]` scope,
//! queue an `attributes` mutation record (old value captured before the
//! write), enqueue an `attribute_changed` reaction when the attribute is
//! observed by the element's definition, and keep any reified `Attr`
//! node in sync.

use std::cell::Cell;
use std::rc::Rc;

use dom_atoms::{local_name, ns, LocalName, Namespace};
use tendril::StrTendril;

use crate::custom_elements::reactions::{enqueue_attribute_changed, CeReactionsScope};
use crate::custom_elements::CustomElementState;
use crate::error::DomError;
use crate::interface::{parse_qualified_name, validate_name_part, QualName};
use crate::mutation_observer::queue_attribute_record;
use crate::named_node_map::{detach_cached_attr, sync_cached_attr, NamedNodeMap};
use crate::node::{
    node_document, propagate_tree_state, Handle, Node, NodeData, ShadowRootData, ShadowRootMode,
    SlotAssignment,
};
use crate::string_pool::StringPool;
use crate::token_list::DomTokenList;

/// Arguments to [`attach_shadow`].
#[derive(Clone, Debug)]
pub struct ShadowRootInit {
    pub mode: ShadowRootMode,
    pub delegates_focus: bool,
    pub slot_assignment: SlotAssignment,
    pub clonable: bool,
    pub serializable: bool,
}

impl ShadowRootInit {
    pub fn new(mode: ShadowRootMode) -> ShadowRootInit {
        ShadowRootInit {
            mode,
            delegates_focus: false,
            slot_assignment: SlotAssignment::Named,
            clonable: false,
            serializable: false,
        }
    }
}

impl Default for ShadowRootInit {
    fn default() -> ShadowRootInit {
        ShadowRootInit::new(ShadowRootMode::Open)
    }
}

fn intern_local(element: &Handle, name: &str) -> LocalName {
    match node_document(element) {
        Some(doc) => match doc.document_data() {
            Some(data) => data.string_pool.intern_local(name),
            None => LocalName::from(name),
        },
        None => LocalName::from(name),
    }
}

fn parse_name(element: &Handle, qualified: &str) -> Result<QualName, DomError> {
    let parsed = match node_document(element) {
        Some(doc) => match doc.document_data() {
            Some(data) => parse_qualified_name(&data.string_pool, qualified)?,
            None => parse_qualified_name(&StringPool::new(), qualified)?,
        },
        None => parse_qualified_name(&StringPool::new(), qualified)?,
    };
    Ok(QualName::new(parsed.0, ns!(), parsed.1))
}

// ------------------------------------------------------------------------
// Reads

pub fn get_attribute(element: &Handle, name: &str) -> Option<StrTendril> {
    let data = element.element_data()?;
    let local = LocalName::from(name);
    data.attrs.borrow().get(&local, &ns!()).cloned()
}

pub fn get_attribute_ns(
    element: &Handle,
    namespace: Option<&str>,
    local: &str,
) -> Option<StrTendril> {
    let data = element.element_data()?;
    let local = LocalName::from(local);
    let ns = Namespace::from(namespace.unwrap_or(""));
    data.attrs.borrow().get(&local, &ns).cloned()
}

pub fn has_attribute(element: &Handle, name: &str) -> bool {
    get_attribute(element, name).is_some()
}

pub fn has_attribute_ns(element: &Handle, namespace: Option<&str>, local: &str) -> bool {
    get_attribute_ns(element, namespace, local).is_some()
}

pub fn has_attributes(element: &Handle) -> bool {
    element
        .element_data()
        .map(|data| !data.attrs.borrow().is_empty())
        .unwrap_or(false)
}

/// The `Attr` node for a non-namespaced attribute, with the stable
/// identity the `NamedNodeMap` cache guarantees.
pub fn get_attribute_node(element: &Handle, name: &str) -> Option<Handle> {
    let data = element.element_data()?;
    let local = LocalName::from(name);
    let name = {
        let attrs = data.attrs.borrow();
        let index = attrs.position(&local, &ns!())?;
        attrs.nth(index)?.name.clone()
    };
    Some(crate::named_node_map::cached_attr_node(element, &name))
}

/// The qualified names of all attributes, in order.
pub fn attribute_names(element: &Handle) -> Vec<QualName> {
    match element.element_data() {
        Some(data) => data.attrs.borrow().iter().map(|a| a.name.clone()).collect(),
        None => Vec::new(),
    }
}

// ------------------------------------------------------------------------
// Writes

/// <https://dom.spec.whatwg.org/#dom-element-setattribute>
pub fn set_attribute(element: &Handle, name: &str, value: &str) -> Result<(), DomError> {
    validate_name_part(name)?;
    let local = intern_local(element, name);
    set_attribute_qualified(
        element,
        QualName::new(None, ns!(), local),
        StrTendril::from_slice(value),
    );
    Ok(())
}

/// <https://dom.spec.whatwg.org/#dom-element-setattributens>
pub fn set_attribute_ns(
    element: &Handle,
    namespace: &str,
    qualified: &str,
    value: &str,
) -> Result<(), DomError> {
    let mut name = parse_name(element, qualified)?;
    name.ns = match node_document(element).as_ref().and_then(|d| d.document_data()) {
        Some(data) => data.string_pool.intern_namespace(namespace),
        None => Namespace::from(namespace),
    };
    set_attribute_qualified(element, name, StrTendril::from_slice(value));
    Ok(())
}

/// <https://dom.spec.whatwg.org/#dom-element-removeattribute>
///
/// Returns the removed value, if the attribute was present.
pub fn remove_attribute(element: &Handle, name: &str) -> Option<StrTendril> {
    let local = LocalName::from(name);
    remove_attribute_qualified(element, &local, &ns!())
}

pub fn remove_attribute_ns(
    element: &Handle,
    namespace: Option<&str>,
    local: &str,
) -> Option<StrTendril> {
    let local = LocalName::from(local);
    let ns = Namespace::from(namespace.unwrap_or(""));
    remove_attribute_qualified(element, &local, &ns)
}

/// <https://dom.spec.whatwg.org/#dom-element-toggleattribute>
///
/// Returns whether the attribute is present after the call.
pub fn toggle_attribute(
    element: &Handle,
    name: &str,
    force: Option<bool>,
) -> Result<bool, DomError> {
    validate_name_part(name)?;
    let local = intern_local(element, name);
    let present = has_attribute(element, name);
    if present {
        match force {
            Some(true) => Ok(true),
            _ => {
                remove_attribute_qualified(element, &local, &ns!());
                Ok(false)
            },
        }
    } else {
        match force {
            Some(false) => Ok(false),
            _ => {
                set_attribute_qualified(
                    element,
                    QualName::new(None, ns!(), local),
                    StrTendril::new(),
                );
                Ok(true)
            },
        }
    }
}

/// The single attribute-set path. Queues the mutation record and the
/// `attribute_changed` reaction before writing through, then updates the
/// reified `Attr` node if one exists. Returns the previous value.
pub(crate) fn set_attribute_qualified(
    element: &Handle,
    name: QualName,
    value: StrTendril,
) -> Option<StrTendril> {
    let data = match element.element_data() {
        Some(data) => data,
        None => return None,
    };
    let _scope = CeReactionsScope::enter(element);
    let old = data.attrs.borrow().get(&name.local, &name.ns).cloned();
    queue_attribute_record(element, &name, old.clone());
    enqueue_attribute_changed(element, &name, old.clone(), Some(value.clone()));
    data.attrs.borrow_mut().set(name.clone(), value.clone());
    sync_cached_attr(element, &name, value);
    old
}

/// The single attribute-remove path; symmetric to
/// [`set_attribute_qualified`]. Absent attributes produce no record and
/// no reaction.
pub(crate) fn remove_attribute_qualified(
    element: &Handle,
    local: &LocalName,
    ns: &Namespace,
) -> Option<StrTendril> {
    let data = element.element_data()?;
    let name = {
        let attrs = data.attrs.borrow();
        let index = attrs.position(local, ns)?;
        attrs.nth(index).expect("position is in bounds").name.clone()
    };
    let _scope = CeReactionsScope::enter(element);
    let old = data.attrs.borrow().get(local, ns).cloned();
    queue_attribute_record(element, &name, old.clone());
    enqueue_attribute_changed(element, &name, old.clone(), None);
    let removed = data.attrs.borrow_mut().remove(local, ns);
    detach_cached_attr(element, &name);
    removed.map(|attr| attr.value)
}

// ------------------------------------------------------------------------
// Shadow roots

/// <https://dom.spec.whatwg.org/#dom-element-attachshadow>
///
/// Fails with `NotSupported` when the element already hosts a shadow
/// root or its custom element definition disables shadow trees. The
/// returned handle is the only way to reach a `Closed` shadow root from
/// outside; [`shadow_root`] hides it.
pub fn attach_shadow(element: &Handle, init: ShadowRootInit) -> Result<Handle, DomError> {
    let data = element
        .element_data()
        .ok_or_else(|| DomError::NotSupported("shadow host must be an element".into()))?;
    if element.shadow_root_internal().is_some() {
        return Err(DomError::NotSupported(
            "element already hosts a shadow root".into(),
        ));
    }
    if let Some(definition) = data.definition() {
        if definition.disable_shadow {
            return Err(DomError::NotSupported(
                "custom element definition disables shadow roots".into(),
            ));
        }
    }

    let _scope = CeReactionsScope::enter(element);
    let owner = node_document(element).map(|d| Rc::downgrade(&d));
    let shadow = Node::new(
        NodeData::ShadowRoot(ShadowRootData {
            mode: init.mode,
            delegates_focus: init.delegates_focus,
            slot_assignment: init.slot_assignment,
            clonable: init.clonable,
            serializable: init.serializable,
            host: Cell::new(Some(Rc::downgrade(element))),
        }),
        owner,
    );
    propagate_tree_state(&shadow, element.is_connected(), true);
    element.with_rare_data(|rare| rare.shadow_root = Some(shadow.clone()));
    Ok(shadow)
}

/// The element's shadow root, iff its mode is `Open`. A `Closed` shadow
/// root exists internally but this returns `None` for it.
pub fn shadow_root(element: &Handle) -> Option<Handle> {
    let shadow = element.shadow_root_internal()?;
    match shadow.shadow_root_data()?.mode {
        ShadowRootMode::Open => Some(shadow),
        ShadowRootMode::Closed => None,
    }
}

/// The host of a shadow root node.
pub fn host(shadow: &Handle) -> Option<Handle> {
    shadow.shadow_root_data()?.host()
}

// ------------------------------------------------------------------------
// Views and custom element state

/// A live token-list view over the `class` attribute.
pub fn class_list(element: &Handle) -> DomTokenList {
    DomTokenList::new(element.clone(), local_name!("class"))
}

/// A live `NamedNodeMap` view over the element's attributes.
pub fn attributes(element: &Handle) -> NamedNodeMap {
    NamedNodeMap::new(element.clone())
}

pub fn custom_element_state(element: &Handle) -> Option<CustomElementState> {
    element.element_data().map(|data| data.custom_state())
}

/// Opts an `Uncustomized` element into the upgrade machinery. Elements
/// in any other state are left alone.
pub fn set_is_undefined(element: &Handle) {
    if let Some(data) = element.element_data() {
        if data.custom_state.get() == CustomElementState::Uncustomized {
            data.custom_state.set(CustomElementState::Undefined);
        }
    }
}
