// Copyright 2014-2017 The dom5ever Project Developers. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The per-document custom element registry.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use dom_atoms::{ns, LocalName, Namespace, RESERVED_CUSTOM_ELEMENT_NAMES};
use log::{debug, warn};
use mac::unwrap_or_return;

use crate::custom_elements::reactions::{enqueue_reaction, CeReactionsScope, Reaction};
use crate::custom_elements::{
    CustomElementDefinition, CustomElementState, LifecycleCallbacks,
};
use crate::error::CustomElementError;
use crate::node::{collect_subtree, node_document, Handle, WeakHandle};

/// Options for [`CustomElementRegistry::define`].
#[derive(Clone, Default)]
pub struct ElementDefinitionOptions {
    /// Attribute local names whose changes fire `attribute_changed`.
    pub observed_attributes: Vec<String>,
    pub disable_internals: bool,
    pub disable_shadow: bool,
    /// Namespace of elements this definition upgrades. Defaults to the
    /// HTML namespace, which `Document::create_element` uses.
    pub namespace: Option<Namespace>,
}

/// How far [`CustomElementRegistry::upgrade_with`] descends.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum UpgradeScope {
    /// Walk light-tree children only.
    #[default]
    LightTree,
    /// Also descend into shadow trees at each host.
    IncludeShadowRoots,
}

/// name -> definition map plus upgrade-candidate bookkeeping.
///
/// `define` is not reentrant: a lifecycle callback that calls back into
/// `define` gets [`CustomElementError::DefinitionRunning`].
pub struct CustomElementRegistry {
    document: WeakHandle,
    definitions: RefCell<Vec<Rc<CustomElementDefinition>>>,
    upgrade_candidates: RefCell<HashMap<LocalName, Vec<WeakHandle>>>,
    is_defining: Cell<bool>,
}

/// Resets `is_defining` on every exit path out of `define`.
struct DefiningGuard<'a>(&'a Cell<bool>);

impl Drop for DefiningGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

impl CustomElementRegistry {
    pub(crate) fn new(document: WeakHandle) -> CustomElementRegistry {
        CustomElementRegistry {
            document,
            definitions: RefCell::new(Vec::new()),
            upgrade_candidates: RefCell::new(HashMap::new()),
            is_defining: Cell::new(false),
        }
    }

    /// <https://html.spec.whatwg.org/multipage/#dom-customelementregistry-define>
    ///
    /// Registers a definition and runs the upgrade candidates recorded
    /// for the name. Candidate upgrades happen through the reactions
    /// machinery: a candidate whose constructor fails is logged and
    /// marked `Failed` without failing the `define` call itself.
    pub fn define(
        &self,
        name: &str,
        callbacks: LifecycleCallbacks,
        options: ElementDefinitionOptions,
    ) -> Result<(), CustomElementError> {
        if self.is_defining.get() {
            return Err(CustomElementError::DefinitionRunning);
        }
        self.is_defining.set(true);
        let _guard = DefiningGuard(&self.is_defining);

        validate_custom_element_name(name)?;

        let document = self.document.upgrade();
        let type_name = match document.as_ref().and_then(|d| d.document_data()) {
            Some(data) => data.string_pool.intern_local(name),
            None => LocalName::from(name),
        };
        if self.lookup_by_type_name(&type_name).is_some() {
            return Err(CustomElementError::AlreadyDefined(name.to_string()));
        }

        let ns = options.namespace.unwrap_or(ns!(html));
        let observed_attributes = match document.as_ref().and_then(|d| d.document_data()) {
            Some(data) => options
                .observed_attributes
                .iter()
                .map(|a| data.string_pool.intern_local(a))
                .collect(),
            None => options
                .observed_attributes
                .iter()
                .map(|a| LocalName::from(&**a))
                .collect(),
        };
        let definition = Rc::new(CustomElementDefinition {
            type_name: type_name.clone(),
            local_name: type_name.clone(),
            ns,
            callbacks,
            observed_attributes,
            disable_internals: options.disable_internals,
            disable_shadow: options.disable_shadow,
            construction_stack: RefCell::new(Vec::new()),
        });
        self.definitions.borrow_mut().push(definition);
        debug!("defined custom element {:?}", name);

        let candidates = self.upgrade_candidates.borrow_mut().remove(&type_name);
        if let (Some(candidates), Some(document)) = (candidates, document) {
            let _scope = CeReactionsScope::enter(&document);
            for weak in candidates {
                if let Some(element) = weak.upgrade() {
                    let undefined = element
                        .element_data()
                        .map(|data| data.custom_state.get() == CustomElementState::Undefined)
                        .unwrap_or(false);
                    if undefined {
                        enqueue_reaction(&element, Reaction::Upgrade);
                    }
                }
            }
        }
        Ok(())
    }

    /// The definition registered under `name`, if any.
    pub fn get(&self, name: &str) -> Option<Rc<CustomElementDefinition>> {
        let name = LocalName::from(name);
        self.lookup_by_type_name(&name)
    }

    pub fn is_defined(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    fn lookup_by_type_name(&self, name: &LocalName) -> Option<Rc<CustomElementDefinition>> {
        self.definitions
            .borrow()
            .iter()
            .find(|d| d.type_name == *name)
            .cloned()
    }

    /// The definition upgrading elements named `(local, ns)`.
    pub(crate) fn lookup(
        &self,
        local: &LocalName,
        ns: &Namespace,
    ) -> Option<Rc<CustomElementDefinition>> {
        self.definitions
            .borrow()
            .iter()
            .find(|d| d.local_name == *local && d.ns == *ns)
            .cloned()
    }

    /// Records an `Undefined` element to be upgraded when a definition
    /// for its tag name arrives.
    pub fn register_upgrade_candidate(&self, element: &Handle) {
        let data = unwrap_or_return!(element.element_data(), ());
        if data.custom_state.get() != CustomElementState::Undefined {
            return;
        }
        self.add_upgrade_candidate(data.name.local.clone(), element);
    }

    pub(crate) fn add_upgrade_candidate(&self, name: LocalName, element: &Handle) {
        let mut candidates = self.upgrade_candidates.borrow_mut();
        let list = candidates.entry(name).or_default();
        let already = list
            .iter()
            .any(|w| w.upgrade().is_some_and(|e| Rc::ptr_eq(&e, element)));
        if !already {
            list.push(Rc::downgrade(element));
        }
    }

    /// Whether any candidates are still recorded under `name`. The entry
    /// is removed wholesale when `define` runs for the name.
    pub fn has_upgrade_candidates(&self, name: &str) -> bool {
        self.upgrade_candidates
            .borrow()
            .contains_key(&LocalName::from(name))
    }

    /// Parser/host entry point: enqueue an upgrade attempt for one
    /// element without opening a `[CEReactions]` scope. With no scope
    /// active the element lands in the backup queue, which the host
    /// drains via `Document::invoke_backup_queue`.
    pub fn enqueue_upgrade(&self, element: &Handle) {
        try_to_upgrade(element);
    }

    /// Synchronously upgrades one element, surfacing a constructor
    /// failure to the caller. Elements that are not `Undefined`, or
    /// whose tag name has no definition, are left untouched.
    pub fn try_upgrade(&self, element: &Handle) -> Result<(), CustomElementError> {
        let data = match element.element_data() {
            Some(data) => data,
            None => return Ok(()),
        };
        if data.custom_state.get() != CustomElementState::Undefined {
            return Ok(());
        }
        let definition = match self.lookup(&data.name.local, &data.name.ns) {
            Some(definition) => definition,
            None => return Ok(()),
        };
        let _scope = self.document.upgrade().and_then(|d| CeReactionsScope::enter(&d));
        upgrade_element(element, &definition)
    }

    /// <https://html.spec.whatwg.org/multipage/#dom-customelementregistry-upgrade>
    ///
    /// Depth-first pre-order walk enqueuing an upgrade attempt for every
    /// element. Light-tree children only; see [`UpgradeScope`].
    pub fn upgrade(&self, root: &Handle) {
        self.upgrade_with(root, UpgradeScope::default());
    }

    pub fn upgrade_with(&self, root: &Handle, scope: UpgradeScope) {
        let _scope = self.document.upgrade().and_then(|d| CeReactionsScope::enter(&d));
        let include_shadow = scope == UpgradeScope::IncludeShadowRoots;
        for node in collect_subtree(root, include_shadow) {
            if node.is_element() {
                try_to_upgrade(&node);
            }
        }
    }
}

impl std::fmt::Debug for CustomElementRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("CustomElementRegistry")
            .field("definitions", &self.definitions.borrow().len())
            .field("is_defining", &self.is_defining.get())
            .finish()
    }
}

/// <https://html.spec.whatwg.org/multipage/#valid-custom-element-name>
///
/// Restricted to the ASCII-plus-Latin-1 subset of the
/// potential-custom-element-name grammar, with a minimum length of 3.
pub fn is_valid_custom_element_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_lowercase() => {},
        _ => return false,
    }
    if name.chars().count() < 3 || !name[1..].contains('-') {
        return false;
    }
    if !chars.all(is_pcen_char) {
        return false;
    }
    !RESERVED_CUSTOM_ELEMENT_NAMES.contains(name)
}

fn is_pcen_char(c: char) -> bool {
    matches!(c,
        'a'..='z' | '0'..='9' | '.' | '_' | '-' |
        '\u{B7}' |
        '\u{C0}'..='\u{D6}' |
        '\u{D8}'..='\u{F6}' |
        '\u{F8}'..)
}

fn validate_custom_element_name(name: &str) -> Result<(), CustomElementError> {
    if RESERVED_CUSTOM_ELEMENT_NAMES.contains(name) {
        return Err(CustomElementError::ReservedName(name.to_string()));
    }
    if is_valid_custom_element_name(name) {
        Ok(())
    } else {
        Err(CustomElementError::InvalidName(name.to_string()))
    }
}

/// <https://html.spec.whatwg.org/multipage/#upgrades>
///
/// `Undefined -> Custom` on success, `Undefined -> Failed` on a throwing
/// constructor (which also clears any reactions already queued on the
/// element). Lifecycle callbacks other than the constructor are left to
/// the reactions machinery: on a connected element, a `Connected`
/// reaction is enqueued behind the upgrade.
pub(crate) fn upgrade_element(
    element: &Handle,
    definition: &Rc<CustomElementDefinition>,
) -> Result<(), CustomElementError> {
    let data = match element.element_data() {
        Some(data) => data,
        None => return Ok(()),
    };
    if data.custom_state.get() != CustomElementState::Undefined {
        return Ok(());
    }

    data.custom_state.set(CustomElementState::Precustomized);
    definition
        .construction_stack
        .borrow_mut()
        .push(Rc::downgrade(element));
    let result = match definition.callbacks.constructor {
        Some(ref constructor) => constructor(element),
        None => Ok(()),
    };
    definition.construction_stack.borrow_mut().pop();

    match result {
        Ok(()) => {
            data.custom_state.set(CustomElementState::Custom);
            *data.definition.borrow_mut() = Some(Rc::downgrade(definition));
            debug!("upgraded <{}>", definition.local_name);
            if element.is_connected() && definition.callbacks.connected.is_some() {
                enqueue_reaction(element, Reaction::Connected);
            }
            Ok(())
        },
        Err(err) => {
            data.custom_state.set(CustomElementState::Failed);
            element.with_rare_data(|rare| rare.reactions.clear());
            warn!("constructor for <{}> failed: {}", definition.local_name, err);
            Err(CustomElementError::ConstructorThrew(err))
        },
    }
}

/// Resolves the element's definition and upgrades; used when an
/// `Upgrade` reaction is invoked.
pub(crate) fn upgrade_from_reaction(element: &Handle) -> Result<(), CustomElementError> {
    let data = match element.element_data() {
        Some(data) => data,
        None => return Ok(()),
    };
    let document = match node_document(element) {
        Some(document) => document,
        None => return Ok(()),
    };
    let definition = match document
        .document_data()
        .and_then(|d| d.registry.lookup(&data.name.local, &data.name.ns))
    {
        Some(definition) => definition,
        None => return Ok(()),
    };
    upgrade_element(element, &definition)
}

/// <https://html.spec.whatwg.org/multipage/#concept-try-upgrade>
///
/// Enqueues an upgrade reaction if the element's tag name is defined,
/// otherwise records the element as an upgrade candidate. Called on
/// insertion, adoption and cloning of `Undefined` elements.
pub(crate) fn try_to_upgrade(element: &Handle) {
    let data = unwrap_or_return!(element.element_data(), ());
    if data.custom_state.get() != CustomElementState::Undefined {
        return;
    }
    let document = unwrap_or_return!(node_document(element), ());
    let doc_data = unwrap_or_return!(document.document_data(), ());
    match doc_data.registry.lookup(&data.name.local, &data.name.ns) {
        Some(_) => enqueue_reaction(element, Reaction::Upgrade),
        None => doc_data
            .registry
            .add_upgrade_candidate(data.name.local.clone(), element),
    }
}

#[cfg(test)]
mod tests {
    use super::is_valid_custom_element_name;

    #[test]
    fn name_grammar() {
        assert!(is_valid_custom_element_name("a-b"));
        assert!(is_valid_custom_element_name("x-widget"));
        assert!(is_valid_custom_element_name("math-\u{e9}quation"));
        assert!(is_valid_custom_element_name("emotion-\u{B7}"));

        // Too short, no hyphen, bad leading char, uppercase, reserved.
        assert!(!is_valid_custom_element_name("a-"));
        assert!(!is_valid_custom_element_name("ab"));
        assert!(!is_valid_custom_element_name("-ab"));
        assert!(!is_valid_custom_element_name("X-foo"));
        assert!(!is_valid_custom_element_name("x-Foo"));
        assert!(!is_valid_custom_element_name("font-face"));
        assert!(!is_valid_custom_element_name("annotation-xml"));
    }
}
