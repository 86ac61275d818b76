// Copyright 2014-2017 The dom5ever Project Developers. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! `EventTarget` and the dispatch path.
//!
//! Any node is an event target; its listener list lives in rare data.
//! Dispatch builds a path from the target to the root - piercing shadow
//! boundaries when the event is composed, stopping at the shadow root
//! otherwise - and walks it in three phases: capturing (root towards
//! target, capture listeners only), at-target (all listeners, in
//! registration order), bubbling (target towards root, non-capture
//! listeners, only for bubbling events). Each node's listener list is
//! snapshotted before iteration, so listeners added during dispatch on
//! the same node do not fire for the current event.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use dom_atoms::LocalName;
use log::warn;

use crate::error::{CallbackError, DomError};
use crate::node::{Handle, ShadowRootData};

/// Upper bound of listeners on one target; `add_event_listener` fails
/// with `TooManyListeners` beyond it.
pub const MAX_LISTENERS_PER_TARGET: usize = 10_000;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum EventPhase {
    None,
    Capturing,
    AtTarget,
    Bubbling,
}

/// Host callback invoked per listener. An `Err` return models a
/// throwing listener; it is logged and dispatch continues.
pub type EventCallback = Rc<dyn Fn(&Event) -> Result<(), CallbackError>>;

#[derive(Copy, Clone, Debug, Default)]
pub struct EventInit {
    pub bubbles: bool,
    pub cancelable: bool,
    /// Whether the path pierces shadow boundaries.
    pub composed: bool,
}

/// <https://dom.spec.whatwg.org/#event>
pub struct Event {
    event_type: LocalName,
    bubbles: bool,
    cancelable: bool,
    composed: bool,
    target: RefCell<Option<Handle>>,
    current_target: RefCell<Option<Handle>>,
    phase: Cell<EventPhase>,
    stop_propagation: Cell<bool>,
    stop_immediate: Cell<bool>,
    canceled: Cell<bool>,
    dispatching: Cell<bool>,
    in_passive_listener: Cell<bool>,
    path: RefCell<Vec<Handle>>,
}

impl Event {
    pub fn new(event_type: &str, init: EventInit) -> Event {
        Event {
            event_type: LocalName::from(event_type),
            bubbles: init.bubbles,
            cancelable: init.cancelable,
            composed: init.composed,
            target: RefCell::new(None),
            current_target: RefCell::new(None),
            phase: Cell::new(EventPhase::None),
            stop_propagation: Cell::new(false),
            stop_immediate: Cell::new(false),
            canceled: Cell::new(false),
            dispatching: Cell::new(false),
            in_passive_listener: Cell::new(false),
            path: RefCell::new(Vec::new()),
        }
    }

    pub fn event_type(&self) -> &LocalName {
        &self.event_type
    }

    pub fn bubbles(&self) -> bool {
        self.bubbles
    }

    pub fn cancelable(&self) -> bool {
        self.cancelable
    }

    pub fn composed(&self) -> bool {
        self.composed
    }

    pub fn event_phase(&self) -> EventPhase {
        self.phase.get()
    }

    pub fn target(&self) -> Option<Handle> {
        self.target.borrow().clone()
    }

    pub fn current_target(&self) -> Option<Handle> {
        self.current_target.borrow().clone()
    }

    /// The dispatch path snapshot; empty outside dispatch.
    pub fn composed_path(&self) -> Vec<Handle> {
        self.path.borrow().clone()
    }

    /// One-way flag: no further nodes see this event.
    pub fn stop_propagation(&self) {
        self.stop_propagation.set(true);
    }

    /// One-way flag: no further listeners at all see this event.
    pub fn stop_immediate_propagation(&self) {
        self.stop_propagation.set(true);
        self.stop_immediate.set(true);
    }

    /// Cancels the event's default action, unless the event is not
    /// cancelable or the current listener is passive.
    pub fn prevent_default(&self) {
        if self.cancelable && !self.in_passive_listener.get() {
            self.canceled.set(true);
        }
    }

    pub fn default_prevented(&self) -> bool {
        self.canceled.get()
    }
}

impl std::fmt::Debug for Event {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("Event")
            .field("type", &self.event_type)
            .field("phase", &self.phase.get())
            .field("canceled", &self.canceled.get())
            .finish()
    }
}

#[derive(Copy, Clone, Debug, Default)]
pub struct AddEventListenerOptions {
    pub capture: bool,
    pub once: bool,
    pub passive: bool,
}

/// One registered listener. Identity is `(type, callback, capture)`.
pub(crate) struct Listener {
    event_type: LocalName,
    callback: EventCallback,
    capture: bool,
    once: bool,
    passive: bool,
    removed: Cell<bool>,
}

/// <https://dom.spec.whatwg.org/#dom-eventtarget-addeventlistener>
///
/// A duplicate by `(type, callback, capture)` identity is silently
/// discarded.
pub fn add_event_listener(
    target: &Handle,
    event_type: &str,
    callback: EventCallback,
    options: AddEventListenerOptions,
) -> Result<(), DomError> {
    let event_type = LocalName::from(event_type);
    let duplicate = target
        .try_rare_data(|rare| {
            rare.listeners.iter().any(|l| {
                !l.removed.get() &&
                    l.event_type == event_type &&
                    l.capture == options.capture &&
                    Rc::ptr_eq(&l.callback, &callback)
            })
        })
        .unwrap_or(false);
    if duplicate {
        return Ok(());
    }
    let count = target
        .try_rare_data(|rare| rare.listeners.len())
        .unwrap_or(0);
    if count >= MAX_LISTENERS_PER_TARGET {
        return Err(DomError::TooManyListeners(MAX_LISTENERS_PER_TARGET));
    }
    target.with_rare_data(|rare| {
        rare.listeners.push(Rc::new(Listener {
            event_type,
            callback,
            capture: options.capture,
            once: options.once,
            passive: options.passive,
            removed: Cell::new(false),
        }));
    });
    Ok(())
}

/// <https://dom.spec.whatwg.org/#dom-eventtarget-removeeventlistener>
///
/// Returns whether a listener was found. A listener removed while its
/// target is mid-dispatch no longer fires.
pub fn remove_event_listener(
    target: &Handle,
    event_type: &str,
    callback: &EventCallback,
    capture: bool,
) -> bool {
    let event_type = LocalName::from(event_type);
    if !target.has_rare_data() {
        return false;
    }
    target.with_rare_data(|rare| {
        let position = rare.listeners.iter().position(|l| {
            !l.removed.get() &&
                l.event_type == event_type &&
                l.capture == capture &&
                Rc::ptr_eq(&l.callback, callback)
        });
        match position {
            Some(i) => {
                rare.listeners[i].removed.set(true);
                rare.listeners.remove(i);
                true
            },
            None => false,
        }
    })
}

/// Live listeners on this target.
pub fn listener_count(target: &Handle) -> usize {
    target
        .try_rare_data(|rare| rare.listeners.iter().filter(|l| !l.removed.get()).count())
        .unwrap_or(0)
}

/// <https://dom.spec.whatwg.org/#concept-event-dispatch>
///
/// Returns `Ok(false)` iff a listener canceled the event's default
/// action. Re-dispatching an event that is already mid-dispatch fails
/// with `InvalidState`.
pub fn dispatch_event(target: &Handle, event: &Event) -> Result<bool, DomError> {
    if event.dispatching.get() {
        return Err(DomError::InvalidState(
            "event is already being dispatched".into(),
        ));
    }
    event.dispatching.set(true);
    *event.target.borrow_mut() = Some(target.clone());

    // Target first; each ancestor follows. Shadow boundaries are
    // pierced through the host link only for composed events.
    let mut path = vec![target.clone()];
    let mut current = target.clone();
    loop {
        if let Some(parent) = current.parent() {
            path.push(parent.clone());
            current = parent;
            continue;
        }
        if event.composed {
            if let Some(host) = current.shadow_root_data().and_then(ShadowRootData::host) {
                path.push(host.clone());
                current = host;
                continue;
            }
        }
        break;
    }
    *event.path.borrow_mut() = path.clone();

    event.phase.set(EventPhase::Capturing);
    for node in path.iter().skip(1).rev() {
        if event.stop_propagation.get() {
            break;
        }
        invoke_listeners(node, event, EventPhase::Capturing);
    }

    if !event.stop_propagation.get() {
        event.phase.set(EventPhase::AtTarget);
        invoke_listeners(target, event, EventPhase::AtTarget);
    }

    if event.bubbles && !event.stop_propagation.get() {
        event.phase.set(EventPhase::Bubbling);
        for node in path.iter().skip(1) {
            if event.stop_propagation.get() {
                break;
            }
            invoke_listeners(node, event, EventPhase::Bubbling);
        }
    }

    event.phase.set(EventPhase::None);
    *event.current_target.borrow_mut() = None;
    event.path.borrow_mut().clear();
    event.dispatching.set(false);
    Ok(!event.canceled.get())
}

fn invoke_listeners(node: &Handle, event: &Event, phase: EventPhase) {
    *event.current_target.borrow_mut() = Some(node.clone());
    let snapshot: Vec<Rc<Listener>> = node
        .try_rare_data(|rare| rare.listeners.clone())
        .unwrap_or_default();
    let mut removed_any = false;
    for listener in snapshot {
        if event.stop_immediate.get() {
            break;
        }
        if listener.removed.get() || listener.event_type != event.event_type {
            continue;
        }
        let phase_matches = match phase {
            EventPhase::Capturing => listener.capture,
            EventPhase::Bubbling => !listener.capture,
            EventPhase::AtTarget => true,
            EventPhase::None => false,
        };
        if !phase_matches {
            continue;
        }
        if listener.once {
            // Removed before invocation so a recursive dispatch from
            // inside the callback cannot fire it again.
            listener.removed.set(true);
            removed_any = true;
        }
        if listener.passive {
            event.in_passive_listener.set(true);
        }
        if let Err(err) = (listener.callback)(event) {
            warn!("listener for {} failed: {}", event.event_type, err);
        }
        event.in_passive_listener.set(false);
    }
    if removed_any {
        node.with_rare_data(|rare| rare.listeners.retain(|l| !l.removed.get()));
    }
}
