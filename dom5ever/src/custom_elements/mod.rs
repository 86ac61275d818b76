// Copyright 2014-2017 The dom5ever Project Developers. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Custom elements: definitions, the registry, and the reactions
//! machinery that batches lifecycle callbacks.

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use dom_atoms::{LocalName, Namespace};
use tendril::StrTendril;

use crate::error::CallbackError;
use crate::interface::QualName;
use crate::node::{Handle, WeakHandle};

pub mod reactions;
pub mod registry;

pub use reactions::{CustomElementReactionStack, Reaction};
pub use registry::{
    is_valid_custom_element_name, CustomElementRegistry, ElementDefinitionOptions, UpgradeScope,
};

/// <https://dom.spec.whatwg.org/#concept-element-custom-element-state>
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CustomElementState {
    /// An ordinary element; never eligible for upgrade.
    Uncustomized,
    /// Eligible for upgrade once a matching definition appears.
    Undefined,
    /// Mid-upgrade: the constructor is running.
    Precustomized,
    /// Successfully upgraded.
    Custom,
    /// The constructor threw; the element is permanently inert.
    Failed,
}

/// Host callback invoked as a custom element constructor during upgrade.
/// A `Err` return models a throwing constructor.
pub type ConstructorCallback = Rc<dyn Fn(&Handle) -> Result<(), CallbackError>>;

/// Host callback for connected/disconnected notifications.
pub type LifecycleCallback = Rc<dyn Fn(&Handle) -> Result<(), CallbackError>>;

/// Host callback for adoption: `(element, old_document, new_document)`.
pub type AdoptedCallback = Rc<dyn Fn(&Handle, &Handle, &Handle) -> Result<(), CallbackError>>;

/// Host callback for observed attribute changes.
pub type AttributeChangedCallback = Rc<dyn Fn(&Handle, &AttributeChange) -> Result<(), CallbackError>>;

/// The change handed to `attribute_changed` callbacks.
#[derive(Clone, Debug)]
pub struct AttributeChange {
    pub name: QualName,
    pub old_value: Option<StrTendril>,
    pub new_value: Option<StrTendril>,
}

/// The lifecycle hooks of one definition. All optional; a definition
/// with no hooks still upgrades elements (state tracking only).
#[derive(Clone, Default)]
pub struct LifecycleCallbacks {
    pub constructor: Option<ConstructorCallback>,
    pub connected: Option<LifecycleCallback>,
    pub disconnected: Option<LifecycleCallback>,
    pub adopted: Option<AdoptedCallback>,
    pub attribute_changed: Option<AttributeChangedCallback>,
}

/// <https://html.spec.whatwg.org/multipage/#custom-element-definition>
///
/// Identity is `(ns, local_name)`; definitions live for the registry's
/// lifetime and elements link back to them weakly.
pub struct CustomElementDefinition {
    /// The name `define` was called with.
    pub type_name: LocalName,
    /// The tag name upgraded elements carry. Equal to `type_name` for
    /// autonomous custom elements, which are the only kind this core
    /// supports.
    pub local_name: LocalName,
    pub ns: Namespace,
    pub callbacks: LifecycleCallbacks,
    /// Attribute local names whose changes fire `attribute_changed`.
    pub observed_attributes: HashSet<LocalName>,
    pub disable_internals: bool,
    pub disable_shadow: bool,
    /// Elements currently running this definition's constructor.
    pub(crate) construction_stack: RefCell<Vec<WeakHandle>>,
}

impl CustomElementDefinition {
    pub fn observes(&self, local: &LocalName) -> bool {
        self.observed_attributes.contains(local)
    }
}

impl std::fmt::Debug for CustomElementDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("CustomElementDefinition")
            .field("type_name", &self.type_name)
            .field("local_name", &self.local_name)
            .field("ns", &self.ns)
            .field("observed_attributes", &self.observed_attributes)
            .finish()
    }
}

/// The definition linked from an upgraded element, if it is still alive.
pub(crate) fn element_definition(element: &Handle) -> Option<Rc<CustomElementDefinition>> {
    element.element_data().and_then(|data| data.definition())
}
