// Copyright 2014-2017 The dom5ever Project Developers. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Tree mutation: insertion, removal, replacement, adoption, moves and
//! cloning.
//!
//! Every operation validates before it touches anything, so a returned
//! error leaves the tree unchanged. Each mutating entry opens a
//! `[CEReactions]` scope; the structural change enqueues lifecycle
//! reactions on affected custom elements and `childList` records on
//! registered observers, and the reactions run when the scope closes.

use std::rc::Rc;

use crate::custom_elements::reactions::{enqueue_reaction, CeReactionsScope, Reaction};
use crate::custom_elements::{registry, CustomElementState};
use crate::error::DomError;
use crate::mutation_observer::queue_child_list_record;
use crate::node::{
    get_parent_and_index, is_host_including_ancestor, next_sibling, node_document,
    propagate_tree_state, shadow_including_subtree, AttrData, ElementData, Handle, Node, NodeData,
    ShadowRootData,
};

/// <https://dom.spec.whatwg.org/#dom-node-insertbefore>
pub fn insert_before(
    parent: &Handle,
    node: &Handle,
    child: Option<&Handle>,
) -> Result<Handle, DomError> {
    ensure_pre_insertion_validity(parent, node, child)?;
    let _scope = CeReactionsScope::enter(parent);
    let mut reference = child.cloned();
    if let Some(ref r) = reference {
        if Rc::ptr_eq(r, node) {
            reference = next_sibling(node);
        }
    }
    do_insert(parent, node, reference.as_ref(), false);
    Ok(node.clone())
}

/// <https://dom.spec.whatwg.org/#dom-node-appendchild>
pub fn append_child(parent: &Handle, node: &Handle) -> Result<Handle, DomError> {
    insert_before(parent, node, None)
}

/// <https://dom.spec.whatwg.org/#dom-node-removechild>
pub fn remove_child(parent: &Handle, child: &Handle) -> Result<Handle, DomError> {
    ensure_is_child(parent, child)?;
    let _scope = CeReactionsScope::enter(parent);
    remove_node(child, false);
    Ok(child.clone())
}

/// <https://dom.spec.whatwg.org/#dom-node-replacechild>
///
/// Returns the replaced child. A single `childList` record covers the
/// whole exchange; disconnected/connected reactions fire as for a
/// removal followed by an insertion.
pub fn replace_child(parent: &Handle, node: &Handle, child: &Handle) -> Result<Handle, DomError> {
    ensure_parent_can_hold(parent)?;
    if is_host_including_ancestor(node, parent) {
        return Err(hierarchy("node is a host-including ancestor of parent"));
    }
    ensure_is_child(parent, child)?;
    ensure_allowed_child(parent, node)?;
    if parent.is_document() {
        check_document_structure(parent, node, Some(child), true)?;
    }
    ensure_same_document(parent, node)?;

    let _scope = CeReactionsScope::enter(parent);
    let mut reference = next_sibling(child);
    if let Some(ref r) = reference {
        if Rc::ptr_eq(r, node) {
            reference = next_sibling(node);
        }
    }
    if node.has_parent() && !Rc::ptr_eq(node, child) {
        remove_node(node, false);
    }
    let previous = crate::node::previous_sibling(child);
    let added = match node.data {
        NodeData::DocumentFragment => node.child_nodes(),
        _ => vec![node.clone()],
    };
    if child.has_parent() {
        remove_node(child, true);
    }
    do_insert(parent, node, reference.as_ref(), true);
    queue_child_list_record(parent, added, vec![child.clone()], previous, reference);
    Ok(child.clone())
}

/// <https://dom.spec.whatwg.org/#concept-node-adopt>
///
/// Removes `node` from its parent (a plain removal, observers and
/// disconnected reactions included), then rewrites `owner_document`
/// across the shadow-including subtree and enqueues `adopted` reactions
/// for every custom element in it. Adoption itself never fires
/// connected or disconnected callbacks.
pub fn adopt_node(document: &Handle, node: &Handle) -> Result<Handle, DomError> {
    if !document.is_document() {
        return Err(DomError::NotSupported("adoption target is not a document".into()));
    }
    if node.is_document() {
        return Err(DomError::NotSupported("a document cannot be adopted".into()));
    }
    if matches!(node.data, NodeData::ShadowRoot(..)) {
        return Err(hierarchy("a shadow root cannot be adopted"));
    }

    let old_document = node_document(node);
    if node.has_parent() {
        // The removal happens under the old document's reaction scope.
        let _scope = old_document.as_ref().and_then(CeReactionsScope::enter);
        remove_node(node, false);
    }

    let same = old_document
        .as_ref()
        .is_some_and(|old| Rc::ptr_eq(old, document));
    if !same {
        let _scope = CeReactionsScope::enter(document);
        let new_owner = Rc::downgrade(document);
        for descendant in shadow_including_subtree(node) {
            descendant.set_owner_document(Some(new_owner.clone()));
            let is_custom = descendant
                .element_data()
                .map(|data| data.custom_state.get() == CustomElementState::Custom)
                .unwrap_or(false);
            if is_custom {
                if let Some(ref old) = old_document {
                    enqueue_reaction(
                        &descendant,
                        Reaction::Adopted {
                            old_document: old.clone(),
                            new_document: document.clone(),
                        },
                    );
                }
            }
        }
    }
    Ok(node.clone())
}

/// Same-parent reorder. The node keeps its connected state, so no
/// connected/disconnected reactions fire; observers still see the move
/// as a removal record followed by an insertion record.
pub fn move_before(
    parent: &Handle,
    node: &Handle,
    child: Option<&Handle>,
) -> Result<(), DomError> {
    match node.parent() {
        Some(ref p) if Rc::ptr_eq(p, parent) => {},
        _ => return Err(hierarchy("moveBefore reorders children of one parent")),
    }
    if let Some(c) = child {
        ensure_is_child(parent, c)?;
        if Rc::ptr_eq(c, node) {
            return Ok(());
        }
    }

    let _scope = CeReactionsScope::enter(parent);
    let (_, index) = get_parent_and_index(node).expect("validated above");
    let previous = if index == 0 {
        None
    } else {
        parent.children().get(index - 1).cloned()
    };
    let next = parent.children().get(index + 1).cloned();
    parent.children_mut().remove(index);
    queue_child_list_record(parent, Vec::new(), vec![node.clone()], previous, next);

    let new_index = match child {
        Some(c) => index_of(parent, c).expect("validated above"),
        None => parent.children().len(),
    };
    let previous = if new_index == 0 {
        None
    } else {
        parent.children().get(new_index - 1).cloned()
    };
    parent.children_mut().insert(new_index, node.clone());
    queue_child_list_record(
        parent,
        vec![node.clone()],
        Vec::new(),
        previous,
        child.cloned(),
    );
    Ok(())
}

/// <https://dom.spec.whatwg.org/#dom-node-normalize>
///
/// Merges runs of adjacent text children into their first node and
/// drops empty text nodes, across the whole light subtree. Observers
/// see the absorptions as `characterData` records on the surviving node
/// and the drops as ordinary removals.
pub fn normalize(node: &Handle) {
    let _scope = CeReactionsScope::enter(node);
    normalize_children(node);
}

fn normalize_children(node: &Handle) {
    let mut i = 0;
    loop {
        let child = match node.children().get(i) {
            Some(c) => c.clone(),
            None => break,
        };
        if let NodeData::Text { ref contents } = child.data {
            if contents.borrow().is_empty() {
                remove_node(&child, false);
                continue;
            }
            // Absorb the following text siblings into this node.
            loop {
                let next = match node.children().get(i + 1) {
                    Some(c) => c.clone(),
                    None => break,
                };
                let NodeData::Text {
                    contents: ref next_contents,
                } = next.data
                else {
                    break;
                };
                let absorbed = next_contents.borrow().clone();
                let old = contents.borrow().clone();
                crate::mutation_observer::queue_character_data_record(&child, old);
                contents.borrow_mut().push_slice(&absorbed);
                remove_node(&next, false);
            }
        } else {
            normalize_children(&child);
        }
        i += 1;
    }
}

/// <https://dom.spec.whatwg.org/#dom-node-clonenode>
///
/// Elements clone their tag and attributes; a previously customized (or
/// upgrade-eligible) element clones as `Undefined` with no definition
/// link. Deep clones copy light children, and a host's shadow tree iff
/// the shadow root is `clonable`. Cloning a document, or a non-clonable
/// shadow root directly, is not supported.
pub fn clone_node(node: &Handle, deep: bool) -> Result<Handle, DomError> {
    match node.data {
        NodeData::Document(..) => {
            return Err(DomError::NotSupported("cannot clone a document".into()));
        },
        NodeData::ShadowRoot(ref data) if !data.clonable => {
            return Err(DomError::NotSupported("shadow root is not clonable".into()));
        },
        _ => {},
    }
    Ok(clone_subtree(node, deep))
}

fn clone_subtree(node: &Handle, deep: bool) -> Handle {
    let owner = node_document(node).map(|d| Rc::downgrade(&d));
    let data = match node.data {
        NodeData::Document(..) => unreachable!("checked by clone_node"),
        NodeData::DocumentFragment => NodeData::DocumentFragment,
        NodeData::ShadowRoot(ref data) => NodeData::ShadowRoot(ShadowRootData {
            mode: data.mode,
            delegates_focus: data.delegates_focus,
            slot_assignment: data.slot_assignment,
            clonable: data.clonable,
            serializable: data.serializable,
            host: Default::default(),
        }),
        NodeData::Doctype {
            ref name,
            ref public_id,
            ref system_id,
        } => NodeData::Doctype {
            name: name.clone(),
            public_id: public_id.clone(),
            system_id: system_id.clone(),
        },
        NodeData::Text { ref contents } => NodeData::Text {
            contents: contents.clone(),
        },
        NodeData::Cdata { ref contents } => NodeData::Cdata {
            contents: contents.clone(),
        },
        NodeData::Comment { ref contents } => NodeData::Comment {
            contents: contents.clone(),
        },
        NodeData::ProcessingInstruction {
            ref target,
            ref contents,
        } => NodeData::ProcessingInstruction {
            target: target.clone(),
            contents: contents.clone(),
        },
        NodeData::Element(ref data) => {
            let clone = ElementData::new(data.name.clone());
            *clone.attrs.borrow_mut() = data.attrs.borrow().clone();
            if data.custom_state.get() != CustomElementState::Uncustomized {
                clone.custom_state.set(CustomElementState::Undefined);
            }
            NodeData::Element(clone)
        },
        NodeData::Attr(ref data) => NodeData::Attr(AttrData {
            name: data.name.clone(),
            value: data.value.clone(),
            owner: Default::default(),
        }),
    };
    let clone = Node::new(data, owner);

    if deep {
        for child in node.children().iter() {
            let child_clone = clone_subtree(child, true);
            child_clone.set_parent(Some(Rc::downgrade(&clone)));
            clone.children_mut().push(child_clone);
        }
        if let Some(shadow) = node.shadow_root_internal() {
            let clonable = shadow
                .shadow_root_data()
                .map(|data| data.clonable)
                .unwrap_or(false);
            if clonable {
                let shadow_clone = clone_subtree(&shadow, true);
                if let Some(data) = shadow_clone.shadow_root_data() {
                    data.host.set(Some(Rc::downgrade(&clone)));
                }
                clone.with_rare_data(|rare| rare.shadow_root = Some(shadow_clone));
            }
        }
    }
    clone
}

// ------------------------------------------------------------------------
// Validation

fn hierarchy(msg: &'static str) -> DomError {
    DomError::HierarchyRequest(msg.into())
}

fn ensure_parent_can_hold(parent: &Handle) -> Result<(), DomError> {
    match parent.data {
        NodeData::Document(..) |
        NodeData::DocumentFragment |
        NodeData::ShadowRoot(..) |
        NodeData::Element(..) => Ok(()),
        _ => Err(hierarchy("parent cannot hold children")),
    }
}

fn ensure_is_child(parent: &Handle, child: &Handle) -> Result<(), DomError> {
    match child.parent() {
        Some(ref p) if Rc::ptr_eq(p, parent) => Ok(()),
        _ => Err(DomError::NotFound(
            "the reference node is not a child of this parent".into(),
        )),
    }
}

fn ensure_allowed_child(parent: &Handle, node: &Handle) -> Result<(), DomError> {
    match node.data {
        NodeData::Document(..) => Err(hierarchy("a document cannot be a child")),
        NodeData::ShadowRoot(..) => Err(hierarchy("a shadow root cannot be a child")),
        NodeData::Attr(..) => Err(hierarchy("an attribute node cannot be a child")),
        NodeData::Doctype { .. } if !parent.is_document() => {
            Err(hierarchy("a doctype must be a child of a document"))
        },
        NodeData::Text { .. } | NodeData::Cdata { .. } if parent.is_document() => {
            Err(hierarchy("a document cannot contain text"))
        },
        _ => Ok(()),
    }
}

fn ensure_same_document(parent: &Handle, node: &Handle) -> Result<(), DomError> {
    if let (Some(node_doc), Some(parent_doc)) = (node_document(node), node_document(parent)) {
        if !Rc::ptr_eq(&node_doc, &parent_doc) {
            return Err(DomError::WrongDocument);
        }
    }
    Ok(())
}

/// <https://dom.spec.whatwg.org/#concept-node-ensure-pre-insertion-validity>
fn ensure_pre_insertion_validity(
    parent: &Handle,
    node: &Handle,
    child: Option<&Handle>,
) -> Result<(), DomError> {
    ensure_parent_can_hold(parent)?;
    if is_host_including_ancestor(node, parent) {
        return Err(hierarchy("node is a host-including ancestor of parent"));
    }
    if let Some(child) = child {
        ensure_is_child(parent, child)?;
    }
    ensure_allowed_child(parent, node)?;
    if parent.is_document() {
        check_document_structure(parent, node, child, false)?;
    }
    ensure_same_document(parent, node)
}

/// The document-specific constraints: at most one element child, at most
/// one doctype, and the doctype precedes the document element.
fn check_document_structure(
    parent: &Handle,
    node: &Handle,
    child: Option<&Handle>,
    replacing: bool,
) -> Result<(), DomError> {
    let skip = if replacing { child } else { None };
    let children = parent.children();
    let has_element_child = children
        .iter()
        .any(|c| c.is_element() && skip.map_or(true, |s| !Rc::ptr_eq(c, s)));
    let has_doctype_child = children
        .iter()
        .any(|c| {
            matches!(c.data, NodeData::Doctype { .. }) && skip.map_or(true, |s| !Rc::ptr_eq(c, s))
        });
    let position = |n: &Handle| children.iter().position(|c| Rc::ptr_eq(c, n));

    let element_rules = || -> Result<(), DomError> {
        if has_element_child {
            return Err(hierarchy("document already has a document element"));
        }
        if let Some(c) = child {
            if !replacing && matches!(c.data, NodeData::Doctype { .. }) {
                return Err(hierarchy("cannot insert an element before the doctype"));
            }
            let at = position(c).expect("reference child validated");
            let doctype_after = children
                .iter()
                .skip(at + 1)
                .any(|n| matches!(n.data, NodeData::Doctype { .. }));
            if doctype_after {
                return Err(hierarchy("cannot insert an element before the doctype"));
            }
        }
        Ok(())
    };

    match node.data {
        NodeData::DocumentFragment => {
            let mut element_count = 0;
            for c in node.children().iter() {
                match c.data {
                    NodeData::Element(..) => element_count += 1,
                    NodeData::Text { .. } | NodeData::Cdata { .. } => {
                        return Err(hierarchy("a document cannot contain text"));
                    },
                    _ => {},
                }
            }
            if element_count > 1 {
                return Err(hierarchy("document can have only one document element"));
            }
            if element_count == 1 {
                element_rules()?;
            }
            Ok(())
        },
        NodeData::Element(..) => element_rules(),
        NodeData::Doctype { .. } => {
            if has_doctype_child {
                return Err(hierarchy("document already has a doctype"));
            }
            match child {
                Some(c) => {
                    let at = position(c).expect("reference child validated");
                    let element_before = children
                        .iter()
                        .take(at)
                        .any(|n| n.is_element());
                    if element_before {
                        return Err(hierarchy("doctype must precede the document element"));
                    }
                },
                None => {
                    if has_element_child {
                        return Err(hierarchy("doctype must precede the document element"));
                    }
                },
            }
            Ok(())
        },
        _ => Ok(()),
    }
}

// ------------------------------------------------------------------------
// The structural core

pub(crate) fn index_of(parent: &Handle, child: &Handle) -> Option<usize> {
    parent
        .children()
        .iter()
        .position(|c| Rc::ptr_eq(c, child))
}

/// <https://dom.spec.whatwg.org/#concept-node-insert>
///
/// `node` (or, for a fragment, its spliced-out children) goes into
/// `parent` before `child`. Callers have validated; `child` is a child
/// of `parent` or `None`.
fn do_insert(parent: &Handle, node: &Handle, child: Option<&Handle>, suppress_observers: bool) {
    let is_fragment = matches!(node.data, NodeData::DocumentFragment);
    let nodes: Vec<Handle> = if is_fragment {
        node.child_nodes()
    } else {
        vec![node.clone()]
    };
    if nodes.is_empty() {
        return;
    }

    if is_fragment {
        for n in &nodes {
            remove_node(n, true);
        }
        queue_child_list_record(node, Vec::new(), nodes.clone(), None, None);
    } else if node.has_parent() {
        remove_node(node, false);
    }

    let index = match child {
        Some(c) => index_of(parent, c).expect("reference child validated"),
        None => parent.children().len(),
    };
    let previous = if index == 0 {
        None
    } else {
        parent.children().get(index - 1).cloned()
    };
    {
        let mut children = parent.children_mut();
        for (offset, n) in nodes.iter().enumerate() {
            n.set_parent(Some(Rc::downgrade(parent)));
            children.insert(index + offset, n.clone());
        }
    }

    let connected = parent.is_connected();
    let in_shadow =
        parent.is_in_shadow_tree() || matches!(parent.data, NodeData::ShadowRoot(..));
    for n in &nodes {
        propagate_tree_state(n, connected, in_shadow);
    }

    if connected {
        for n in &nodes {
            for descendant in shadow_including_subtree(n) {
                let Some(data) = descendant.element_data() else {
                    continue;
                };
                match data.custom_state.get() {
                    CustomElementState::Custom => {
                        enqueue_reaction(&descendant, Reaction::Connected);
                    },
                    CustomElementState::Undefined => registry::try_to_upgrade(&descendant),
                    _ => {},
                }
            }
        }
    }

    if !suppress_observers {
        queue_child_list_record(parent, nodes, Vec::new(), previous, child.cloned());
    }
}

/// <https://dom.spec.whatwg.org/#concept-node-remove>
///
/// Disconnected reactions for the subtree are enqueued before the node
/// is unlinked; they run when the enclosing scope exits.
pub(crate) fn remove_node(node: &Handle, suppress_observers: bool) {
    let Some((parent, index)) = get_parent_and_index(node) else {
        return;
    };

    if node.is_connected() {
        for descendant in shadow_including_subtree(node) {
            let is_custom = descendant
                .element_data()
                .map(|data| data.custom_state.get() == CustomElementState::Custom)
                .unwrap_or(false);
            if is_custom {
                enqueue_reaction(&descendant, Reaction::Disconnected);
            }
        }
    }

    let previous = if index == 0 {
        None
    } else {
        parent.children().get(index - 1).cloned()
    };
    let next = parent.children().get(index + 1).cloned();
    parent.children_mut().remove(index);
    node.set_parent(None);
    propagate_tree_state(node, false, false);

    if !suppress_observers {
        queue_child_list_record(&parent, Vec::new(), vec![node.clone()], previous, next);
    }
}
