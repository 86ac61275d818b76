// Copyright 2014-2017 The dom5ever Project Developers. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Mutation observers.
//!
//! Registrations attach to both sides: the observer keeps the list of
//! targets it watches, and each target's rare data keeps the list of
//! registrations on it. When a mutation fires, the queueing helpers walk
//! from the mutation node up through its ancestors, collect the
//! observers whose options subscribe to that mutation, and push one
//! record per observer onto a bounded FIFO queue. Delivery is
//! host-driven: nothing is dispatched until the host calls
//! [`MutationObserver::notify`] at its own microtask checkpoints.

use std::cell::RefCell;
use std::collections::{HashSet, VecDeque};
use std::fmt;
use std::rc::{Rc, Weak};

use dom_atoms::{LocalName, Namespace};
use log::warn;
use tendril::StrTendril;

use crate::error::{CallbackError, DomError};
use crate::interface::QualName;
use crate::node::{Handle, WeakHandle};

/// Default bound of one observer's record queue; the oldest record is
/// evicted when it overflows.
pub const DEFAULT_MAX_QUEUE_SIZE: usize = 10_000;

/// What kind of mutation a record describes.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MutationType {
    Attributes,
    CharacterData,
    ChildList,
}

/// One observed mutation. Holds strong refs to the nodes involved,
/// released when the record is dropped.
#[derive(Clone)]
pub struct MutationRecord {
    pub record_type: MutationType,
    pub target: Handle,
    pub added_nodes: Vec<Handle>,
    pub removed_nodes: Vec<Handle>,
    pub previous_sibling: Option<Handle>,
    pub next_sibling: Option<Handle>,
    pub attribute_name: Option<LocalName>,
    pub attribute_namespace: Option<Namespace>,
    pub old_value: Option<StrTendril>,
}

impl fmt::Debug for MutationRecord {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("MutationRecord")
            .field("type", &self.record_type)
            .field("added", &self.added_nodes.len())
            .field("removed", &self.removed_nodes.len())
            .field("attribute_name", &self.attribute_name)
            .finish()
    }
}

/// Host callback receiving the drained record snapshot.
pub type MutationCallback =
    Rc<dyn Fn(&MutationObserver, &[Rc<MutationRecord>]) -> Result<(), CallbackError>>;

/// Subscription options for [`MutationObserver::observe`].
///
/// `attributes` and `character_data` follow the WHATWG implied
/// defaults: leaving them unset while requesting old values (or an
/// attribute filter) turns them on.
#[derive(Clone, Debug, Default)]
pub struct ObserverOptions {
    pub child_list: bool,
    pub attributes: Option<bool>,
    pub character_data: Option<bool>,
    pub subtree: bool,
    pub attribute_old_value: bool,
    pub character_data_old_value: bool,
    pub attribute_filter: Option<Vec<String>>,
}

impl ObserverOptions {
    pub(crate) fn resolved_attributes(&self) -> bool {
        self.attributes
            .unwrap_or(self.attribute_old_value || self.attribute_filter.is_some())
    }

    pub(crate) fn resolved_character_data(&self) -> bool {
        self.character_data.unwrap_or(self.character_data_old_value)
    }
}

/// One (observer, target, options) triple, linked from both the
/// observer and the target node's rare data.
pub(crate) struct Registration {
    observer: Weak<ObserverInner>,
    target: WeakHandle,
    options: RefCell<ObserverOptions>,
    filter: RefCell<Option<HashSet<LocalName>>>,
}

impl Registration {
    fn filter_allows(&self, local: &LocalName) -> bool {
        match *self.filter.borrow() {
            Some(ref set) => set.contains(local),
            None => true,
        }
    }

    fn set_options(&self, options: ObserverOptions) {
        *self.filter.borrow_mut() = options
            .attribute_filter
            .as_ref()
            .map(|names| names.iter().map(|n| LocalName::from(&**n)).collect());
        *self.options.borrow_mut() = options;
    }
}

pub(crate) struct ObserverInner {
    callback: MutationCallback,
    registrations: RefCell<Vec<Rc<Registration>>>,
    queue: RefCell<VecDeque<Rc<MutationRecord>>>,
    queue_limit: usize,
}

impl ObserverInner {
    fn push_record(&self, record: Rc<MutationRecord>) {
        let mut queue = self.queue.borrow_mut();
        if queue.len() >= self.queue_limit {
            queue.pop_front();
            warn!("mutation record queue overflowed; evicting the oldest record");
        }
        queue.push_back(record);
    }
}

/// <https://dom.spec.whatwg.org/#mutationobserver>
#[derive(Clone)]
pub struct MutationObserver {
    inner: Rc<ObserverInner>,
}

impl MutationObserver {
    pub fn new(callback: MutationCallback) -> MutationObserver {
        MutationObserver::with_queue_limit(callback, DEFAULT_MAX_QUEUE_SIZE)
    }

    /// An observer with a non-default record queue bound.
    pub fn with_queue_limit(callback: MutationCallback, queue_limit: usize) -> MutationObserver {
        MutationObserver {
            inner: Rc::new(ObserverInner {
                callback,
                registrations: RefCell::new(Vec::new()),
                queue: RefCell::new(VecDeque::new()),
                queue_limit,
            }),
        }
    }

    /// <https://dom.spec.whatwg.org/#dom-mutationobserver-observe>
    pub fn observe(&self, target: &Handle, options: ObserverOptions) -> Result<(), DomError> {
        let attributes = options.resolved_attributes();
        let character_data = options.resolved_character_data();
        if !(options.child_list || attributes || character_data) {
            return Err(DomError::InvalidState(
                "observe needs childList, attributes or characterData".into(),
            ));
        }
        if options.attributes == Some(false) &&
            (options.attribute_old_value || options.attribute_filter.is_some())
        {
            return Err(DomError::InvalidState(
                "attribute options conflict with attributes: false".into(),
            ));
        }
        if options.character_data == Some(false) && options.character_data_old_value {
            return Err(DomError::InvalidState(
                "characterDataOldValue conflicts with characterData: false".into(),
            ));
        }

        // Re-observing a known target replaces the options in place.
        for registration in self.inner.registrations.borrow().iter() {
            let same_target = registration
                .target
                .upgrade()
                .is_some_and(|t| Rc::ptr_eq(&t, target));
            if same_target {
                registration.set_options(options);
                return Ok(());
            }
        }

        let registration = Rc::new(Registration {
            observer: Rc::downgrade(&self.inner),
            target: Rc::downgrade(target),
            options: RefCell::new(ObserverOptions::default()),
            filter: RefCell::new(None),
        });
        registration.set_options(options);
        self.inner
            .registrations
            .borrow_mut()
            .push(registration.clone());
        target.with_rare_data(|rare| rare.registrations.push(registration));
        Ok(())
    }

    /// <https://dom.spec.whatwg.org/#dom-mutationobserver-disconnect>
    ///
    /// Synchronously removes every registration and clears any pending
    /// records.
    pub fn disconnect(&self) {
        let registrations = std::mem::take(&mut *self.inner.registrations.borrow_mut());
        for registration in registrations {
            if let Some(target) = registration.target.upgrade() {
                target.with_rare_data(|rare| {
                    rare.registrations
                        .retain(|r| !Rc::ptr_eq(r, &registration));
                });
            }
        }
        self.inner.queue.borrow_mut().clear();
    }

    /// <https://dom.spec.whatwg.org/#dom-mutationobserver-takerecords>
    pub fn take_records(&self) -> Vec<Rc<MutationRecord>> {
        self.inner.queue.borrow_mut().drain(..).collect()
    }

    /// Delivers pending records to the callback, clearing the queue.
    /// Called by the host at its microtask checkpoints; a no-op when
    /// the queue is empty. Callback failures are logged, never raised.
    pub fn notify(&self) {
        let records = self.take_records();
        if records.is_empty() {
            return;
        }
        if let Err(err) = (self.inner.callback)(self, &records) {
            warn!("mutation observer callback failed: {}", err);
        }
    }

    /// Number of records currently queued.
    pub fn pending_records(&self) -> usize {
        self.inner.queue.borrow().len()
    }
}

impl fmt::Debug for MutationObserver {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("MutationObserver")
            .field("targets", &self.inner.registrations.borrow().len())
            .field("pending_records", &self.inner.queue.borrow().len())
            .finish()
    }
}

// ------------------------------------------------------------------------
// Record queueing

#[derive(Clone, Copy)]
enum Interest<'a> {
    ChildList,
    Attributes(&'a QualName),
    CharacterData,
}

/// <https://dom.spec.whatwg.org/#queueing-a-mutation-record>
///
/// The ancestor walk follows plain parent links; `subtree: true` does
/// not pierce shadow boundaries. Each interested observer is collected
/// once, with its old-value flags OR-ed across matching registrations.
fn interested_observers(target: &Handle, interest: Interest) -> Vec<(Rc<ObserverInner>, bool)> {
    let mut out: Vec<(Rc<ObserverInner>, bool)> = Vec::new();
    let mut node = Some(target.clone());
    while let Some(n) = node {
        let registrations = n
            .try_rare_data(|rare| rare.registrations.clone())
            .unwrap_or_default();
        for registration in registrations {
            let Some(inner) = registration.observer.upgrade() else {
                continue;
            };
            let options = registration.options.borrow();
            let is_target = Rc::ptr_eq(&n, target);
            if !is_target && !options.subtree {
                continue;
            }
            let (wants, capture_old) = match interest {
                Interest::ChildList => (options.child_list, false),
                Interest::Attributes(name) => (
                    options.resolved_attributes() && registration.filter_allows(&name.local),
                    options.attribute_old_value,
                ),
                Interest::CharacterData => (
                    options.resolved_character_data(),
                    options.character_data_old_value,
                ),
            };
            if !wants {
                continue;
            }
            match out.iter_mut().find(|(o, _)| Rc::ptr_eq(o, &inner)) {
                Some(entry) => entry.1 |= capture_old,
                None => out.push((inner.clone(), capture_old)),
            }
        }
        node = n.parent();
    }
    out
}

pub(crate) fn queue_child_list_record(
    target: &Handle,
    added: Vec<Handle>,
    removed: Vec<Handle>,
    previous_sibling: Option<Handle>,
    next_sibling: Option<Handle>,
) {
    let interested = interested_observers(target, Interest::ChildList);
    for (observer, _) in interested {
        observer.push_record(Rc::new(MutationRecord {
            record_type: MutationType::ChildList,
            target: target.clone(),
            added_nodes: added.clone(),
            removed_nodes: removed.clone(),
            previous_sibling: previous_sibling.clone(),
            next_sibling: next_sibling.clone(),
            attribute_name: None,
            attribute_namespace: None,
            old_value: None,
        }));
    }
}

pub(crate) fn queue_attribute_record(
    target: &Handle,
    name: &QualName,
    old_value: Option<StrTendril>,
) {
    let interested = interested_observers(target, Interest::Attributes(name));
    for (observer, capture_old) in interested {
        observer.push_record(Rc::new(MutationRecord {
            record_type: MutationType::Attributes,
            target: target.clone(),
            added_nodes: Vec::new(),
            removed_nodes: Vec::new(),
            previous_sibling: None,
            next_sibling: None,
            attribute_name: Some(name.local.clone()),
            attribute_namespace: if name.ns.is_empty() {
                None
            } else {
                Some(name.ns.clone())
            },
            old_value: if capture_old { old_value.clone() } else { None },
        }));
    }
}

pub(crate) fn queue_character_data_record(target: &Handle, old_value: StrTendril) {
    let interested = interested_observers(target, Interest::CharacterData);
    for (observer, capture_old) in interested {
        observer.push_record(Rc::new(MutationRecord {
            record_type: MutationType::CharacterData,
            target: target.clone(),
            added_nodes: Vec::new(),
            removed_nodes: Vec::new(),
            previous_sibling: None,
            next_sibling: None,
            attribute_name: None,
            attribute_namespace: None,
            old_value: if capture_old { Some(old_value.clone()) } else { None },
        }));
    }
}
