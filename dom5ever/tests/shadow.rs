// Copyright 2014-2017 The dom5ever Project Developers. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use std::rc::Rc;

use dom5ever::{
    element, node, tree, Document, DomError, ElementDefinitionOptions, NodeType, ShadowRootInit,
    ShadowRootMode, StringPool,
};

fn new_doc() -> Document {
    Document::new(StringPool::new())
}

#[test]
fn closed_mode_hides_the_root_but_it_exists() {
    let doc = new_doc();
    let host = doc.create_element("div").unwrap();
    let shadow = element::attach_shadow(&host, ShadowRootInit::new(ShadowRootMode::Closed))
        .unwrap();

    // The accessor hides it; the returned handle is the internal way in.
    assert!(element::shadow_root(&host).is_none());
    assert_eq!(shadow.node_type(), NodeType::ShadowRoot);
    assert!(Rc::ptr_eq(&element::host(&shadow).unwrap(), &host));
}

#[test]
fn open_mode_is_visible() {
    let doc = new_doc();
    let host = doc.create_element("div").unwrap();
    let shadow = element::attach_shadow(&host, ShadowRootInit::new(ShadowRootMode::Open))
        .unwrap();
    assert!(Rc::ptr_eq(&element::shadow_root(&host).unwrap(), &shadow));
}

#[test]
fn attach_twice_is_not_supported() {
    let doc = new_doc();
    let host = doc.create_element("div").unwrap();
    element::attach_shadow(&host, Default::default()).unwrap();
    assert!(matches!(
        element::attach_shadow(&host, Default::default()),
        Err(DomError::NotSupported(_))
    ));
}

#[test]
fn definition_can_disable_shadow() {
    let doc = new_doc();
    doc.registry()
        .define(
            "x-solid",
            Default::default(),
            ElementDefinitionOptions {
                disable_shadow: true,
                ..Default::default()
            },
        )
        .unwrap();
    let elem = doc.create_element("x-solid").unwrap();
    element::set_is_undefined(&elem);
    doc.registry().try_upgrade(&elem).unwrap();

    assert!(matches!(
        element::attach_shadow(&elem, Default::default()),
        Err(DomError::NotSupported(_))
    ));
}

#[test]
fn connectedness_crosses_the_shadow_boundary() {
    let doc = new_doc();
    let host = doc.create_element("div").unwrap();
    let shadow = element::attach_shadow(&host, Default::default()).unwrap();
    let inner = doc.create_element("span").unwrap();
    tree::append_child(&shadow, &inner).unwrap();

    assert!(!inner.is_connected());
    assert!(inner.is_in_shadow_tree());

    tree::append_child(doc.node(), &host).unwrap();
    assert!(host.is_connected());
    assert!(shadow.is_connected());
    assert!(inner.is_connected());

    // Light root stops at the shadow root; the composed root pierces it.
    assert!(Rc::ptr_eq(&node::root(&inner, false), &shadow));
    assert!(Rc::ptr_eq(&node::root(&inner, true), doc.node()));

    tree::remove_child(doc.node(), &host).unwrap();
    assert!(!inner.is_connected());
    assert!(inner.is_in_shadow_tree());
}

#[test]
fn deep_clone_copies_clonable_shadow_trees() {
    let doc = new_doc();
    let host = doc.create_element("div").unwrap();
    let init = ShadowRootInit {
        clonable: true,
        ..Default::default()
    };
    let shadow = element::attach_shadow(&host, init).unwrap();
    tree::append_child(&shadow, &doc.create_text_node("inside")).unwrap();

    let clone = tree::clone_node(&host, true).unwrap();
    let shadow_clone = element::shadow_root(&clone).expect("shadow cloned");
    assert!(!Rc::ptr_eq(&shadow_clone, &shadow));
    assert!(Rc::ptr_eq(&element::host(&shadow_clone).unwrap(), &clone));
    assert_eq!(node::text_content(&shadow_clone).as_deref(), Some("inside"));
}

#[test]
fn non_clonable_shadow_is_skipped_or_rejected() {
    let doc = new_doc();
    let host = doc.create_element("div").unwrap();
    let shadow = element::attach_shadow(&host, Default::default()).unwrap();

    // Deep-cloning the host silently skips the non-clonable shadow.
    let clone = tree::clone_node(&host, true).unwrap();
    assert!(element::shadow_root(&clone).is_none());

    // Cloning the shadow root itself is refused.
    assert!(matches!(
        tree::clone_node(&shadow, true),
        Err(DomError::NotSupported(_))
    ));
}

#[test]
fn shadow_roots_cannot_be_inserted_or_adopted() {
    let doc = new_doc();
    let host = doc.create_element("div").unwrap();
    let shadow = element::attach_shadow(&host, Default::default()).unwrap();

    let target = doc.create_element("p").unwrap();
    assert!(matches!(
        tree::append_child(&target, &shadow),
        Err(DomError::HierarchyRequest(_))
    ));

    let other = new_doc();
    assert!(matches!(
        other.adopt_node(&shadow),
        Err(DomError::HierarchyRequest(_))
    ));
}
