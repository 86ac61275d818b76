// Copyright 2014-2017 The dom5ever Project Developers. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use std::cell::Cell;
use std::rc::Rc;

use dom5ever::{
    character_data, element, tree, Document, DomError, MutationObserver, MutationType,
    ObserverOptions, StringPool, DEFAULT_MAX_QUEUE_SIZE,
};

fn new_doc() -> Document {
    Document::new(StringPool::new())
}

fn observer() -> MutationObserver {
    MutationObserver::new(Rc::new(|_obs, _records| Ok(())))
}

#[test]
fn child_list_records_carry_siblings() {
    let doc = new_doc();
    let parent = doc.create_element("div").unwrap();
    let a = doc.create_element("a").unwrap();
    let c = doc.create_element("code").unwrap();
    tree::append_child(&parent, &a).unwrap();
    tree::append_child(&parent, &c).unwrap();

    let obs = observer();
    obs.observe(
        &parent,
        ObserverOptions {
            child_list: true,
            ..Default::default()
        },
    )
    .unwrap();

    let b = doc.create_element("b").unwrap();
    tree::insert_before(&parent, &b, Some(&c)).unwrap();
    tree::remove_child(&parent, &a).unwrap();

    let records = obs.take_records();
    assert_eq!(records.len(), 2);

    let insert = &records[0];
    assert_eq!(insert.record_type, MutationType::ChildList);
    assert_eq!(insert.added_nodes.len(), 1);
    assert!(Rc::ptr_eq(&insert.added_nodes[0], &b));
    assert!(Rc::ptr_eq(insert.previous_sibling.as_ref().unwrap(), &a));
    assert!(Rc::ptr_eq(insert.next_sibling.as_ref().unwrap(), &c));

    let removal = &records[1];
    assert_eq!(removal.removed_nodes.len(), 1);
    assert!(Rc::ptr_eq(&removal.removed_nodes[0], &a));
    assert!(removal.previous_sibling.is_none());
    assert!(Rc::ptr_eq(removal.next_sibling.as_ref().unwrap(), &b));

    // Drained.
    assert!(obs.take_records().is_empty());
}

#[test]
fn subtree_option_extends_to_descendants() {
    let doc = new_doc();
    let root = doc.create_element("div").unwrap();
    let inner = doc.create_element("span").unwrap();
    tree::append_child(&root, &inner).unwrap();

    let shallow = observer();
    shallow
        .observe(
            &root,
            ObserverOptions {
                child_list: true,
                ..Default::default()
            },
        )
        .unwrap();
    let deep = observer();
    deep.observe(
        &root,
        ObserverOptions {
            child_list: true,
            subtree: true,
            ..Default::default()
        },
    )
    .unwrap();

    tree::append_child(&inner, &doc.create_text_node("x")).unwrap();
    assert_eq!(shallow.take_records().len(), 0);
    assert_eq!(deep.take_records().len(), 1);
}

#[test]
fn attribute_records_and_old_values() {
    let doc = new_doc();
    let el = doc.create_element("div").unwrap();
    element::set_attribute(&el, "id", "before").unwrap();

    let plain = observer();
    plain
        .observe(
            &el,
            ObserverOptions {
                attributes: Some(true),
                ..Default::default()
            },
        )
        .unwrap();
    let with_old = observer();
    with_old
        .observe(
            &el,
            ObserverOptions {
                attribute_old_value: true,
                ..Default::default()
            },
        )
        .unwrap();

    element::set_attribute(&el, "id", "after").unwrap();

    let records = plain.take_records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].record_type, MutationType::Attributes);
    assert_eq!(records[0].attribute_name.as_deref(), Some("id"));
    assert!(records[0].old_value.is_none());

    let records = with_old.take_records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].old_value.as_deref(), Some("before"));
}

#[test]
fn attribute_filter_narrows_delivery() {
    let doc = new_doc();
    let el = doc.create_element("div").unwrap();

    let obs = observer();
    obs.observe(
        &el,
        ObserverOptions {
            attribute_filter: Some(vec!["class".into()]),
            ..Default::default()
        },
    )
    .unwrap();

    element::set_attribute(&el, "class", "a").unwrap();
    element::set_attribute(&el, "id", "b").unwrap();

    let records = obs.take_records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].attribute_name.as_deref(), Some("class"));
}

#[test]
fn character_data_records_capture_old_text() {
    let doc = new_doc();
    let text = doc.create_text_node("start");

    let obs = observer();
    obs.observe(
        &text,
        ObserverOptions {
            character_data_old_value: true,
            ..Default::default()
        },
    )
    .unwrap();

    character_data::set_data(&text, "changed").unwrap();
    character_data::append_data(&text, "!").unwrap();

    let records = obs.take_records();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].record_type, MutationType::CharacterData);
    assert_eq!(records[0].old_value.as_deref(), Some("start"));
    assert_eq!(records[1].old_value.as_deref(), Some("changed"));
    assert_eq!(character_data::data(&text).as_deref(), Some("changed!"));
}

#[test]
fn observe_validates_options() {
    let doc = new_doc();
    let el = doc.create_element("div").unwrap();
    let obs = observer();

    assert!(matches!(
        obs.observe(&el, ObserverOptions::default()),
        Err(DomError::InvalidState(_))
    ));
    assert!(matches!(
        obs.observe(
            &el,
            ObserverOptions {
                attributes: Some(false),
                attribute_old_value: true,
                child_list: true,
                ..Default::default()
            },
        ),
        Err(DomError::InvalidState(_))
    ));
    assert!(matches!(
        obs.observe(
            &el,
            ObserverOptions {
                character_data: Some(false),
                character_data_old_value: true,
                child_list: true,
                ..Default::default()
            },
        ),
        Err(DomError::InvalidState(_))
    ));
}

#[test]
fn reobserving_replaces_options() {
    let doc = new_doc();
    let el = doc.create_element("div").unwrap();
    let obs = observer();

    obs.observe(
        &el,
        ObserverOptions {
            attributes: Some(true),
            ..Default::default()
        },
    )
    .unwrap();
    // Narrow to childList only; attribute changes stop arriving.
    obs.observe(
        &el,
        ObserverOptions {
            child_list: true,
            ..Default::default()
        },
    )
    .unwrap();

    element::set_attribute(&el, "id", "x").unwrap();
    assert!(obs.take_records().is_empty());
}

#[test]
fn disconnect_clears_everything() {
    let doc = new_doc();
    let el = doc.create_element("div").unwrap();
    let obs = observer();
    obs.observe(
        &el,
        ObserverOptions {
            attributes: Some(true),
            ..Default::default()
        },
    )
    .unwrap();

    element::set_attribute(&el, "id", "x").unwrap();
    assert_eq!(obs.pending_records(), 1);

    obs.disconnect();
    assert_eq!(obs.pending_records(), 0);

    element::set_attribute(&el, "id", "y").unwrap();
    assert!(obs.take_records().is_empty());
}

#[test]
fn queue_overflow_evicts_the_oldest() {
    let doc = new_doc();
    let el = doc.create_element("div").unwrap();
    let obs = MutationObserver::with_queue_limit(Rc::new(|_obs, _records| Ok(())), 3);
    obs.observe(
        &el,
        ObserverOptions {
            attribute_old_value: true,
            ..Default::default()
        },
    )
    .unwrap();

    for value in ["1", "2", "3", "4"] {
        element::set_attribute(&el, "id", value).unwrap();
    }

    let records = obs.take_records();
    assert_eq!(records.len(), 3);
    // The record for the first write (old value None) was evicted; the
    // oldest survivor saw "1" -> "2".
    assert_eq!(records[0].old_value.as_deref(), Some("1"));
    assert_eq!(records[2].old_value.as_deref(), Some("3"));

    assert_eq!(DEFAULT_MAX_QUEUE_SIZE, 10_000);
}

#[test]
fn notify_delivers_a_snapshot() {
    let doc = new_doc();
    let el = doc.create_element("div").unwrap();
    let seen = Rc::new(Cell::new(0));
    let seen2 = seen.clone();
    let obs = MutationObserver::new(Rc::new(move |_obs, records| {
        seen2.set(seen2.get() + records.len());
        Ok(())
    }));
    obs.observe(
        &el,
        ObserverOptions {
            attributes: Some(true),
            ..Default::default()
        },
    )
    .unwrap();

    element::set_attribute(&el, "a", "1").unwrap();
    element::set_attribute(&el, "b", "2").unwrap();

    // Nothing is delivered until the host's checkpoint.
    assert_eq!(seen.get(), 0);
    obs.notify();
    assert_eq!(seen.get(), 2);
    assert_eq!(obs.pending_records(), 0);

    // An empty queue is not delivered.
    obs.notify();
    assert_eq!(seen.get(), 2);
}
