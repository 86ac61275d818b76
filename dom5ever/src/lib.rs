// Copyright 2014-2017 The dom5ever Project Developers. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! A reference-counted implementation of the WHATWG DOM core: the node
//! tree and its mutation semantics, the custom element lifecycle, the
//! attribute model with its live views, shadow-tree encapsulation, event
//! dispatch and mutation observers.
//!
//! This is an embeddable engine, not a browser: parsing, selectors,
//! layout and script bindings are the host's business. The host drives
//! delivery too - mutation observer callbacks and the custom element
//! backup queue fire only when the host calls `notify` /
//! `invoke_backup_queue` at its own checkpoints; everything else runs
//! synchronously on the caller's stack.
//!
//! ```
//! use dom5ever::{element, tree, Document, StringPool};
//!
//! let doc = Document::new(StringPool::new());
//! let div = doc.create_element("div").unwrap();
//! tree::append_child(doc.node(), &div).unwrap();
//! element::set_attribute(&div, "id", "root").unwrap();
//! assert!(div.is_connected());
//! ```

pub use dom_atoms::{local_name, namespace_prefix, namespace_url, ns};
pub use dom_atoms::{LocalName, Namespace, Prefix};

/// Re-export the tendril crate.
pub use tendril;

pub mod attributes;
pub mod character_data;
pub mod custom_elements;
pub mod document;
pub mod element;
pub mod error;
pub mod events;
pub mod interface;
pub mod mutation_observer;
pub mod named_node_map;
pub mod node;
pub mod string_pool;
pub mod token_list;
pub mod tree;

pub use attributes::{Attribute, AttributeMap};
pub use custom_elements::{
    is_valid_custom_element_name, AttributeChange, CustomElementDefinition,
    CustomElementReactionStack, CustomElementRegistry, CustomElementState,
    ElementDefinitionOptions, LifecycleCallbacks, UpgradeScope,
};
pub use document::Document;
pub use element::ShadowRootInit;
pub use error::{CallbackError, CustomElementError, DomError};
pub use events::{
    AddEventListenerOptions, Event, EventCallback, EventInit, EventPhase,
    MAX_LISTENERS_PER_TARGET,
};
pub use interface::{ExpandedName, QualName};
pub use mutation_observer::{
    MutationCallback, MutationObserver, MutationRecord, MutationType, ObserverOptions,
    DEFAULT_MAX_QUEUE_SIZE,
};
pub use named_node_map::NamedNodeMap;
pub use node::{
    Handle, Node, NodeData, NodeType, ShadowRootMode, SlotAssignment, WeakHandle,
};
pub use string_pool::StringPool;
pub use token_list::DomTokenList;
