// Copyright 2014-2017 The dom5ever Project Developers. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The reference-counted node graph.
//!
//! This implementation stores the information associated with each node
//! once, and then hands out refs to children. Nodes are reference-counted
//! to avoid copying - you can create a new ref and then a node will
//! outlive the document. Nodes own their children (and their shadow root,
//! through the rare-data record), but only have weak references to their
//! parents, hosts and owner document, so the graph contains no strong
//! cycles.
//!
//! Everything a typical node does not need - shadow root, pending custom
//! element reactions, mutation observer registrations, cached `Attr`
//! nodes, event listeners - lives in a lazily allocated [`RareData`]
//! record, keeping the base node small.

use std::cell::{Cell, Ref, RefCell};
use std::collections::VecDeque;
use std::fmt;
use std::mem;
use std::rc::{Rc, Weak};

use bitflags::bitflags;
use tendril::StrTendril;

use crate::attributes::AttributeMap;
use crate::custom_elements::reactions::Reaction;
use crate::custom_elements::{CustomElementDefinition, CustomElementState};
use crate::document::DocumentData;
use crate::events::Listener;
use crate::interface::QualName;
use crate::mutation_observer::Registration;

/// Reference to a DOM node.
pub type Handle = Rc<Node>;

/// Weak reference to a DOM node, used for parent, host and owner-document
/// pointers.
pub type WeakHandle = Weak<Node>;

bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub(crate) struct NodeFlags: u8 {
        /// The node's shadow-including root is a Document.
        const IS_CONNECTED = 1 << 0;
        /// The node's root is a shadow root.
        const IS_IN_SHADOW_TREE = 1 << 1;
    }
}

/// Discriminator for [`NodeData`], convenient for matching on the kind
/// of a node without destructuring its payload.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum NodeType {
    Document,
    DocumentFragment,
    ShadowRoot,
    DocumentType,
    Element,
    Text,
    CdataSection,
    Comment,
    ProcessingInstruction,
    Attribute,
}

/// The different kinds of nodes in the DOM.
pub enum NodeData {
    /// The `Document` itself - the root node and the owner of the string
    /// pool, the custom element registry and the reaction stack.
    Document(DocumentData),

    /// A parentless container for a sequence of nodes.
    DocumentFragment,

    /// A document fragment rooted at a shadow host.
    ShadowRoot(ShadowRootData),

    /// A `DOCTYPE` with name, public id, and system id.
    Doctype {
        name: StrTendril,
        public_id: StrTendril,
        system_id: StrTendril,
    },

    /// A text node.
    Text { contents: RefCell<StrTendril> },

    /// A CDATA section. Distinct from `Text` only in how it serializes.
    Cdata { contents: RefCell<StrTendril> },

    /// A comment.
    Comment { contents: RefCell<StrTendril> },

    /// A processing instruction.
    ProcessingInstruction {
        target: StrTendril,
        contents: RefCell<StrTendril>,
    },

    /// An element with attributes.
    Element(ElementData),

    /// An attribute reified as a node, handed out by `NamedNodeMap`.
    Attr(AttrData),
}

/// The payload of an element node.
pub struct ElementData {
    /// The interned creation name. This core is case-sensitive.
    pub name: QualName,
    pub attrs: RefCell<AttributeMap>,
    pub(crate) custom_state: Cell<CustomElementState>,
    pub(crate) definition: RefCell<Option<Weak<CustomElementDefinition>>>,
}

impl ElementData {
    pub(crate) fn new(name: QualName) -> ElementData {
        ElementData {
            name,
            attrs: RefCell::new(AttributeMap::new()),
            custom_state: Cell::new(CustomElementState::Uncustomized),
            definition: RefCell::new(None),
        }
    }

    pub fn custom_state(&self) -> CustomElementState {
        self.custom_state.get()
    }

    /// The definition this element was upgraded with, if any.
    pub fn definition(&self) -> Option<Rc<CustomElementDefinition>> {
        self.definition.borrow().as_ref().and_then(Weak::upgrade)
    }
}

/// Encapsulation mode of a shadow root.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ShadowRootMode {
    Open,
    Closed,
}

/// How slottables are assigned to slots inside a shadow tree.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SlotAssignment {
    Named,
    Manual,
}

/// The payload of a shadow root node. The host link is non-owning; the
/// host owns the shadow root through its rare data.
pub struct ShadowRootData {
    pub mode: ShadowRootMode,
    pub delegates_focus: bool,
    pub slot_assignment: SlotAssignment,
    pub clonable: bool,
    pub serializable: bool,
    pub(crate) host: Cell<Option<WeakHandle>>,
}

impl ShadowRootData {
    pub fn host(&self) -> Option<Handle> {
        let host = self.host.take();
        let upgraded = host.as_ref().and_then(Weak::upgrade);
        self.host.set(host);
        upgraded
    }
}

/// The payload of an `Attr` node. The owner link is non-owning; the
/// element keeps the node alive through its attr cache.
pub struct AttrData {
    pub name: QualName,
    pub value: RefCell<StrTendril>,
    pub(crate) owner: Cell<Option<WeakHandle>>,
}

impl AttrData {
    pub fn owner_element(&self) -> Option<Handle> {
        let owner = self.owner.take();
        let upgraded = owner.as_ref().and_then(Weak::upgrade);
        self.owner.set(owner);
        upgraded
    }

    pub(crate) fn set_owner(&self, owner: Option<WeakHandle>) {
        self.owner.set(owner);
    }
}

/// Lazily allocated side storage for the uncommon parts of a node.
#[derive(Default)]
pub(crate) struct RareData {
    /// Owned shadow root of a host element.
    pub(crate) shadow_root: Option<Handle>,
    /// Pending custom element reactions, FIFO.
    pub(crate) reactions: VecDeque<Reaction>,
    /// Mutation observer registrations attached to this node.
    pub(crate) registrations: Vec<Rc<Registration>>,
    /// Reified `Attr` nodes, one per attribute that has been observed
    /// through the `NamedNodeMap` view.
    pub(crate) attr_cache: Vec<(QualName, Handle)>,
    /// Event listeners attached to this target.
    pub(crate) listeners: Vec<Rc<Listener>>,
}

/// A DOM node.
pub struct Node {
    /// Represents this node's data.
    pub data: NodeData,
    parent: Cell<Option<WeakHandle>>,
    children: RefCell<Vec<Handle>>,
    owner: Cell<Option<WeakHandle>>,
    flags: Cell<NodeFlags>,
    rare_data: RefCell<Option<Box<RareData>>>,
}

impl Node {
    /// Create a new parentless node from its contents.
    pub(crate) fn new(data: NodeData, owner: Option<WeakHandle>) -> Handle {
        Rc::new(Node {
            data,
            parent: Cell::new(None),
            children: RefCell::new(Vec::new()),
            owner: Cell::new(owner),
            flags: Cell::new(NodeFlags::empty()),
            rare_data: RefCell::new(None),
        })
    }

    /// Create a document node whose owner-document pointer refers to
    /// itself.
    pub(crate) fn new_document(build: impl FnOnce(&WeakHandle) -> DocumentData) -> Handle {
        Rc::new_cyclic(|weak| Node {
            data: NodeData::Document(build(weak)),
            parent: Cell::new(None),
            children: RefCell::new(Vec::new()),
            owner: Cell::new(Some(weak.clone())),
            flags: Cell::new(NodeFlags::IS_CONNECTED),
            rare_data: RefCell::new(None),
        })
    }

    pub fn node_type(&self) -> NodeType {
        match self.data {
            NodeData::Document(..) => NodeType::Document,
            NodeData::DocumentFragment => NodeType::DocumentFragment,
            NodeData::ShadowRoot(..) => NodeType::ShadowRoot,
            NodeData::Doctype { .. } => NodeType::DocumentType,
            NodeData::Element(..) => NodeType::Element,
            NodeData::Text { .. } => NodeType::Text,
            NodeData::Cdata { .. } => NodeType::CdataSection,
            NodeData::Comment { .. } => NodeType::Comment,
            NodeData::ProcessingInstruction { .. } => NodeType::ProcessingInstruction,
            NodeData::Attr(..) => NodeType::Attribute,
        }
    }

    pub fn is_element(&self) -> bool {
        matches!(self.data, NodeData::Element(..))
    }

    pub fn is_document(&self) -> bool {
        matches!(self.data, NodeData::Document(..))
    }

    /// True for the node kinds that carry character data.
    pub fn is_character_data(&self) -> bool {
        matches!(
            self.data,
            NodeData::Text { .. } |
                NodeData::Cdata { .. } |
                NodeData::Comment { .. } |
                NodeData::ProcessingInstruction { .. }
        )
    }

    pub fn element_data(&self) -> Option<&ElementData> {
        match self.data {
            NodeData::Element(ref data) => Some(data),
            _ => None,
        }
    }

    pub fn attr_data(&self) -> Option<&AttrData> {
        match self.data {
            NodeData::Attr(ref data) => Some(data),
            _ => None,
        }
    }

    pub fn shadow_root_data(&self) -> Option<&ShadowRootData> {
        match self.data {
            NodeData::ShadowRoot(ref data) => Some(data),
            _ => None,
        }
    }

    pub(crate) fn document_data(&self) -> Option<&DocumentData> {
        match self.data {
            NodeData::Document(ref data) => Some(data),
            _ => None,
        }
    }

    /// Parent node, if any.
    pub fn parent(&self) -> Option<Handle> {
        let parent = self.parent.take();
        let upgraded = parent.as_ref().and_then(Weak::upgrade);
        self.parent.set(parent);
        upgraded
    }

    pub fn has_parent(&self) -> bool {
        let parent = self.parent.take();
        let has = parent.is_some();
        self.parent.set(parent);
        has
    }

    pub(crate) fn set_parent(&self, parent: Option<WeakHandle>) {
        self.parent.set(parent);
    }

    /// Borrow of the child list. Callers must not hold this across any
    /// operation that can mutate the tree.
    pub fn children(&self) -> Ref<'_, Vec<Handle>> {
        self.children.borrow()
    }

    /// Snapshot of the child list.
    pub fn child_nodes(&self) -> Vec<Handle> {
        self.children.borrow().clone()
    }

    pub(crate) fn children_mut(&self) -> std::cell::RefMut<'_, Vec<Handle>> {
        self.children.borrow_mut()
    }

    pub fn first_child(&self) -> Option<Handle> {
        self.children.borrow().first().cloned()
    }

    pub fn last_child(&self) -> Option<Handle> {
        self.children.borrow().last().cloned()
    }

    pub fn has_children(&self) -> bool {
        !self.children.borrow().is_empty()
    }

    /// The document this node belongs to. For a document node this is
    /// the node itself.
    pub fn owner_document(&self) -> Option<Handle> {
        let owner = self.owner.take();
        let upgraded = owner.as_ref().and_then(Weak::upgrade);
        self.owner.set(owner);
        upgraded
    }

    pub(crate) fn set_owner_document(&self, owner: Option<WeakHandle>) {
        self.owner.set(owner);
    }

    /// Whether the node's shadow-including root is a Document.
    pub fn is_connected(&self) -> bool {
        self.flags.get().contains(NodeFlags::IS_CONNECTED)
    }

    /// Whether the node's root is a shadow root.
    pub fn is_in_shadow_tree(&self) -> bool {
        self.flags.get().contains(NodeFlags::IS_IN_SHADOW_TREE)
    }

    pub(crate) fn set_flag(&self, flag: NodeFlags, value: bool) {
        let mut flags = self.flags.get();
        flags.set(flag, value);
        self.flags.set(flags);
    }

    /// Runs `f` with the rare-data record, allocating it on first use.
    /// The record is borrowed for the duration of the call, so `f` must
    /// not re-enter rare-data access on the same node.
    pub(crate) fn with_rare_data<R>(&self, f: impl FnOnce(&mut RareData) -> R) -> R {
        let mut slot = self.rare_data.borrow_mut();
        f(slot.get_or_insert_with(Default::default))
    }

    /// Runs `f` with the rare-data record if one exists; never
    /// allocates. For read paths.
    pub(crate) fn try_rare_data<R>(&self, f: impl FnOnce(&RareData) -> R) -> Option<R> {
        self.rare_data.borrow().as_ref().map(|rare| f(rare))
    }

    pub fn has_rare_data(&self) -> bool {
        self.rare_data.borrow().is_some()
    }

    /// The shadow root attached to this element, open or closed. The
    /// mode-respecting accessor is `element::shadow_root`.
    pub(crate) fn shadow_root_internal(&self) -> Option<Handle> {
        self.rare_data
            .borrow()
            .as_ref()
            .and_then(|rare| rare.shadow_root.clone())
    }
}

impl Drop for Node {
    fn drop(&mut self) {
        // Flatten the subtree iteratively so that dropping a deep tree
        // does not recurse once per level. Shadow trees hang off rare
        // data and are owned here too.
        let mut nodes = mem::take(&mut *self.children.borrow_mut());
        if let Some(rare) = self.rare_data.borrow_mut().take() {
            if let Some(shadow) = rare.shadow_root {
                nodes.push(shadow);
            }
        }
        while let Some(node) = nodes.pop() {
            let mut children = mem::take(&mut *node.children.borrow_mut());
            if let Some(rare) = node.rare_data.borrow_mut().take() {
                if let Some(shadow) = rare.shadow_root {
                    children.push(shadow);
                }
            }
            nodes.extend(children);
        }
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.debug_struct("Node")
            .field("type", &self.node_type())
            .field("children", &self.children.borrow().len())
            .field("connected", &self.is_connected())
            .finish()
    }
}

/// If the node has a parent, get it and this node's position in its
/// children.
pub(crate) fn get_parent_and_index(target: &Handle) -> Option<(Handle, usize)> {
    let parent = target.parent()?;
    let i = match parent
        .children()
        .iter()
        .enumerate()
        .find(|&(_, child)| Rc::ptr_eq(child, target))
    {
        Some((i, _)) => i,
        None => panic!("have parent but couldn't find in parent's children!"),
    };
    Some((parent, i))
}

pub fn previous_sibling(node: &Handle) -> Option<Handle> {
    let (parent, i) = get_parent_and_index(node)?;
    if i == 0 {
        None
    } else {
        parent.children().get(i - 1).cloned()
    }
}

pub fn next_sibling(node: &Handle) -> Option<Handle> {
    let (parent, i) = get_parent_and_index(node)?;
    let sibling = parent.children().get(i + 1).cloned();
    sibling
}

/// Position of `node` among its parent's children.
pub fn index_in_parent(node: &Handle) -> Option<usize> {
    get_parent_and_index(node).map(|(_, i)| i)
}

/// The root of the tree `node` participates in. With `composed`, shadow
/// roots are pierced through their host links.
pub fn root(node: &Handle, composed: bool) -> Handle {
    let mut current = node.clone();
    loop {
        if let Some(parent) = current.parent() {
            current = parent;
            continue;
        }
        if composed {
            if let Some(host) = current.shadow_root_data().and_then(ShadowRootData::host) {
                current = host;
                continue;
            }
        }
        return current;
    }
}

/// Whether `other` is an inclusive descendant of `node` (light tree).
pub fn contains(node: &Handle, other: &Handle) -> bool {
    let mut current = Some(other.clone());
    while let Some(n) = current {
        if Rc::ptr_eq(&n, node) {
            return true;
        }
        current = n.parent();
    }
    false
}

/// Whether `other` is a host-including inclusive ancestor of `node`:
/// reached from `node` by any mix of parent and shadow-host links.
pub(crate) fn is_host_including_ancestor(other: &Handle, node: &Handle) -> bool {
    let mut current = Some(node.clone());
    while let Some(n) = current {
        if Rc::ptr_eq(&n, other) {
            return true;
        }
        current = match n.parent() {
            Some(parent) => Some(parent),
            None => n.shadow_root_data().and_then(ShadowRootData::host),
        };
    }
    false
}

/// The concatenated text of a node, following `textContent`: character
/// data nodes yield their contents, attributes their value, containers
/// the concatenation of their descendant text, documents and doctypes
/// nothing.
pub fn text_content(node: &Handle) -> Option<StrTendril> {
    match node.data {
        NodeData::Text { ref contents } | NodeData::Cdata { ref contents } => {
            Some(contents.borrow().clone())
        },
        NodeData::Comment { ref contents } => Some(contents.borrow().clone()),
        NodeData::ProcessingInstruction { ref contents, .. } => Some(contents.borrow().clone()),
        NodeData::Attr(ref data) => Some(data.value.borrow().clone()),
        NodeData::Element(..) | NodeData::DocumentFragment | NodeData::ShadowRoot(..) => {
            let mut out = StrTendril::new();
            let mut stack: Vec<Handle> = node.children().iter().rev().cloned().collect();
            while let Some(n) = stack.pop() {
                match n.data {
                    NodeData::Text { ref contents } | NodeData::Cdata { ref contents } => {
                        out.push_slice(&contents.borrow());
                    },
                    _ => {},
                }
                stack.extend(n.children().iter().rev().cloned());
            }
            Some(out)
        },
        NodeData::Document(..) | NodeData::Doctype { .. } => None,
    }
}

/// Pre-order walk of the subtree rooted at `node`, including `node`
/// itself. With `include_shadow`, each host's shadow tree is visited
/// before its light children.
pub(crate) fn collect_subtree(node: &Handle, include_shadow: bool) -> Vec<Handle> {
    let mut out = Vec::new();
    let mut stack = vec![node.clone()];
    while let Some(n) = stack.pop() {
        out.push(n.clone());
        for child in n.children().iter().rev() {
            stack.push(child.clone());
        }
        if include_shadow {
            if let Some(shadow) = n.shadow_root_internal() {
                stack.push(shadow);
            }
        }
    }
    out
}

/// Shadow-including pre-order walk.
pub(crate) fn shadow_including_subtree(node: &Handle) -> Vec<Handle> {
    collect_subtree(node, true)
}

/// Rewrites the connectedness and in-shadow flags of an entire subtree
/// after it moved. Shadow trees are always in-shadow regardless of where
/// their host sits.
pub(crate) fn propagate_tree_state(node: &Handle, connected: bool, in_shadow: bool) {
    let mut stack = vec![(node.clone(), in_shadow)];
    while let Some((n, shadowed)) = stack.pop() {
        n.set_flag(NodeFlags::IS_CONNECTED, connected);
        n.set_flag(NodeFlags::IS_IN_SHADOW_TREE, shadowed);
        for child in n.children().iter() {
            stack.push((child.clone(), shadowed));
        }
        if let Some(shadow) = n.shadow_root_internal() {
            stack.push((shadow, true));
        }
    }
}

/// The document a node belongs to, upgraded.
pub(crate) fn node_document(node: &Handle) -> Option<Handle> {
    node.owner_document()
}
