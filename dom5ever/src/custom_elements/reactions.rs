// Copyright 2014-2017 The dom5ever Project Developers. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The `[CEReactions]` machinery.
//!
//! Every mutating DOM entry point opens a [`CeReactionsScope`] before it
//! touches the tree. Mutations enqueue reactions on the affected
//! elements' per-element queues (in rare data) and note the element in
//! the current scope's element queue. When the scope is dropped - on
//! every exit path, panics included - the queued elements have their
//! pending reactions invoked in FIFO order.
//!
//! Enqueues that happen with no scope on the stack (host-driven
//! operations) land in the backup element queue instead, which the host
//! flushes explicitly via `Document::invoke_backup_queue` - the
//! stand-in for a microtask checkpoint.

use std::cell::RefCell;
use std::rc::Rc;

use log::{debug, warn};
use mac::unwrap_or_return;
use tendril::StrTendril;

use crate::custom_elements::{element_definition, registry, AttributeChange, CustomElementState};
use crate::interface::QualName;
use crate::node::{node_document, Handle};

/// A pending lifecycle callback on one element.
#[derive(Clone)]
pub enum Reaction {
    /// Run the upgrade procedure against the current definition for the
    /// element's tag name.
    Upgrade,
    Connected,
    Disconnected,
    Adopted {
        old_document: Handle,
        new_document: Handle,
    },
    AttributeChanged {
        name: QualName,
        old_value: Option<StrTendril>,
        new_value: Option<StrTendril>,
    },
}

impl std::fmt::Debug for Reaction {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Reaction::Upgrade => f.write_str("Upgrade"),
            Reaction::Connected => f.write_str("Connected"),
            Reaction::Disconnected => f.write_str("Disconnected"),
            Reaction::Adopted { .. } => f.write_str("Adopted"),
            Reaction::AttributeChanged { ref name, .. } => {
                write!(f, "AttributeChanged({})", name.local)
            },
        }
    }
}

/// The per-document LIFO of element queues.
///
/// Each `[CEReactions]` scope pushes one element queue; nested scopes
/// stack and are independent. The backup queue catches enqueues made
/// outside any scope.
#[derive(Default)]
pub struct CustomElementReactionStack {
    stack: RefCell<Vec<Vec<Handle>>>,
    backup: RefCell<Vec<Handle>>,
}

impl CustomElementReactionStack {
    pub(crate) fn push_queue(&self) {
        self.stack.borrow_mut().push(Vec::new());
    }

    pub(crate) fn pop_queue(&self) -> Vec<Handle> {
        self.stack.borrow_mut().pop().unwrap_or_default()
    }

    /// Notes `element` in the top element queue, or the backup queue if
    /// no scope is active. An element appears at most once per queue.
    pub(crate) fn enqueue_element(&self, element: &Handle) {
        let mut stack = self.stack.borrow_mut();
        let queue = match stack.last_mut() {
            Some(top) => top,
            None => {
                drop(stack);
                let mut backup = self.backup.borrow_mut();
                if !backup.iter().any(|e| Rc::ptr_eq(e, element)) {
                    backup.push(element.clone());
                }
                return;
            },
        };
        if !queue.iter().any(|e| Rc::ptr_eq(e, element)) {
            queue.push(element.clone());
        }
    }

    pub(crate) fn take_backup(&self) -> Vec<Handle> {
        std::mem::take(&mut *self.backup.borrow_mut())
    }

    /// Number of open scopes; the backup queue is only eligible when
    /// this is zero.
    pub fn depth(&self) -> usize {
        self.stack.borrow().len()
    }
}

/// RAII guard for one `[CEReactions]` scope. Dropping it pops the
/// element queue and invokes all pending reactions of its elements, in
/// the order the elements were first enqueued.
pub(crate) struct CeReactionsScope {
    document: Handle,
}

impl CeReactionsScope {
    /// Opens a scope on the document owning `node`. Returns `None` for
    /// nodes that have outlived their document; reactions are then
    /// unobservable anyway.
    pub(crate) fn enter(node: &Handle) -> Option<CeReactionsScope> {
        let document = node_document(node)?;
        document.document_data()?.reactions.push_queue();
        Some(CeReactionsScope { document })
    }
}

impl Drop for CeReactionsScope {
    fn drop(&mut self) {
        let queue = match self.document.document_data() {
            Some(data) => data.reactions.pop_queue(),
            None => return,
        };
        for element in queue {
            invoke_reactions(&element);
        }
    }
}

/// <https://html.spec.whatwg.org/multipage/#enqueue-a-custom-element-callback-reaction>
///
/// Appends to the element's own reaction queue and notes the element in
/// the document's current (or backup) element queue.
pub(crate) fn enqueue_reaction(element: &Handle, reaction: Reaction) {
    debug!("enqueue {:?} reaction", reaction);
    element.with_rare_data(|rare| rare.reactions.push_back(reaction));
    let document = unwrap_or_return!(node_document(element), ());
    if let Some(data) = document.document_data() {
        data.reactions.enqueue_element(element);
    }
}

/// Drains the element's reaction queue, FIFO. Reactions enqueued by a
/// running callback on the same element are picked up in the same drain.
pub(crate) fn invoke_reactions(element: &Handle) {
    loop {
        let reaction = element.with_rare_data(|rare| rare.reactions.pop_front());
        match reaction {
            Some(reaction) => run_reaction(element, reaction),
            None => break,
        }
    }
}

/// Runs one reaction. Callback failures are logged and never propagate
/// to the mutating caller; only a constructor failure during upgrade has
/// a lasting effect (the element goes to `Failed`, handled inside the
/// upgrade procedure).
fn run_reaction(element: &Handle, reaction: Reaction) {
    match reaction {
        Reaction::Upgrade => {
            if let Err(err) = registry::upgrade_from_reaction(element) {
                warn!("upgrade failed: {}", err);
            }
        },
        Reaction::Connected => {
            let definition = unwrap_or_return!(element_definition(element), ());
            if let Some(ref callback) = definition.callbacks.connected {
                if let Err(err) = callback(element) {
                    warn!("connected callback failed: {}", err);
                }
            }
        },
        Reaction::Disconnected => {
            let definition = unwrap_or_return!(element_definition(element), ());
            if let Some(ref callback) = definition.callbacks.disconnected {
                if let Err(err) = callback(element) {
                    warn!("disconnected callback failed: {}", err);
                }
            }
        },
        Reaction::Adopted {
            old_document,
            new_document,
        } => {
            let definition = unwrap_or_return!(element_definition(element), ());
            if let Some(ref callback) = definition.callbacks.adopted {
                if let Err(err) = callback(element, &old_document, &new_document) {
                    warn!("adopted callback failed: {}", err);
                }
            }
        },
        Reaction::AttributeChanged {
            name,
            old_value,
            new_value,
        } => {
            let definition = unwrap_or_return!(element_definition(element), ());
            if let Some(ref callback) = definition.callbacks.attribute_changed {
                let change = AttributeChange {
                    name,
                    old_value,
                    new_value,
                };
                if let Err(err) = callback(element, &change) {
                    warn!("attribute changed callback failed: {}", err);
                }
            }
        },
    }
}

/// Enqueues an `attribute_changed` reaction if the element is custom and
/// the attribute is observed by its definition.
pub(crate) fn enqueue_attribute_changed(
    element: &Handle,
    name: &QualName,
    old_value: Option<StrTendril>,
    new_value: Option<StrTendril>,
) {
    let data = unwrap_or_return!(element.element_data(), ());
    if data.custom_state.get() != CustomElementState::Custom {
        return;
    }
    let definition = unwrap_or_return!(element_definition(element), ());
    if !definition.observes(&name.local) {
        return;
    }
    enqueue_reaction(
        element,
        Reaction::AttributeChanged {
            name: name.clone(),
            old_value,
            new_value,
        },
    );
}

/// Flushes the backup element queue until it stays empty. Host-driven;
/// stands in for a microtask checkpoint.
pub(crate) fn flush_backup_queue(document: &Handle) {
    let data = unwrap_or_return!(document.document_data(), ());
    loop {
        let batch = data.reactions.take_backup();
        if batch.is_empty() {
            break;
        }
        for element in batch {
            invoke_reactions(&element);
        }
    }
}
