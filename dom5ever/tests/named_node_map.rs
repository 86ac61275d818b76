// Copyright 2014-2017 The dom5ever Project Developers. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use std::rc::Rc;

use dom5ever::{element, Document, DomError, StringPool};

fn new_doc() -> Document {
    Document::new(StringPool::new())
}

#[test]
fn attr_nodes_have_stable_identity() {
    let doc = new_doc();
    let el = doc.create_element("div").unwrap();
    element::set_attribute(&el, "id", "x").unwrap();
    element::set_attribute(&el, "title", "t").unwrap();

    let map = element::attributes(&el);
    assert_eq!(map.length(), 2);

    let first = map.item(0).unwrap();
    let again = map.item(0).unwrap();
    assert!(Rc::ptr_eq(&first, &again));
    assert!(Rc::ptr_eq(
        &map.get_named_item("id").unwrap(),
        &first
    ));

    let data = first.attr_data().unwrap();
    assert_eq!(&*data.name.local, "id");
    assert_eq!(&**data.value.borrow(), "x");
    assert!(Rc::ptr_eq(&data.owner_element().unwrap(), &el));
}

#[test]
fn attr_nodes_track_attribute_writes() {
    let doc = new_doc();
    let el = doc.create_element("div").unwrap();
    element::set_attribute(&el, "id", "one").unwrap();

    let map = element::attributes(&el);
    let attr = map.get_named_item("id").unwrap();
    element::set_attribute(&el, "id", "two").unwrap();
    assert_eq!(&**attr.attr_data().unwrap().value.borrow(), "two");
}

#[test]
fn set_named_item_rejects_foreign_owners() {
    let doc = new_doc();
    let a = doc.create_element("a").unwrap();
    let b = doc.create_element("b").unwrap();
    element::set_attribute(&a, "href", "#").unwrap();

    let stolen = element::attributes(&a).get_named_item("href").unwrap();
    assert!(matches!(
        element::attributes(&b).set_named_item(&stolen),
        Err(DomError::InUseAttribute)
    ));
}

#[test]
fn set_named_item_writes_through_and_returns_the_old_node() {
    let doc = new_doc();
    let el = doc.create_element("div").unwrap();
    element::set_attribute(&el, "id", "old").unwrap();
    let map = element::attributes(&el);
    let old_node = map.get_named_item("id").unwrap();

    let fresh = doc.create_attribute("id").unwrap();
    *fresh.attr_data().unwrap().value.borrow_mut() =
        dom5ever::tendril::StrTendril::from_slice("new");

    let replaced = map.set_named_item(&fresh).unwrap().unwrap();
    assert!(Rc::ptr_eq(&replaced, &old_node));
    // The replaced node is detached but keeps its last value.
    assert!(replaced.attr_data().unwrap().owner_element().is_none());
    assert_eq!(&**replaced.attr_data().unwrap().value.borrow(), "old");

    assert_eq!(element::get_attribute(&el, "id").as_deref(), Some("new"));
    assert!(Rc::ptr_eq(&map.get_named_item("id").unwrap(), &fresh));
    assert!(Rc::ptr_eq(
        &fresh.attr_data().unwrap().owner_element().unwrap(),
        &el
    ));
}

#[test]
fn remove_named_item_detaches() {
    let doc = new_doc();
    let el = doc.create_element("div").unwrap();
    element::set_attribute(&el, "id", "x").unwrap();
    let map = element::attributes(&el);

    let removed = map.remove_named_item("id").unwrap();
    assert!(removed.attr_data().unwrap().owner_element().is_none());
    assert_eq!(&**removed.attr_data().unwrap().value.borrow(), "x");
    assert!(!element::has_attribute(&el, "id"));
    assert_eq!(map.length(), 0);

    assert!(matches!(
        map.remove_named_item("id"),
        Err(DomError::NotFound(_))
    ));
}

#[test]
fn namespaced_lookup() {
    let doc = new_doc();
    let el = doc.create_element("svg").unwrap();
    element::set_attribute_ns(&el, "http://www.w3.org/1999/xlink", "xlink:href", "#a").unwrap();

    let map = element::attributes(&el);
    let attr = map
        .get_named_item_ns(Some("http://www.w3.org/1999/xlink"), "href")
        .unwrap();
    assert_eq!(&**attr.attr_data().unwrap().value.borrow(), "#a");
    assert_eq!(attr.attr_data().unwrap().name.qualified(), "xlink:href");
    assert!(map.get_named_item_ns(None, "href").is_none());

    let removed = map
        .remove_named_item_ns(Some("http://www.w3.org/1999/xlink"), "href")
        .unwrap();
    assert!(removed.attr_data().unwrap().owner_element().is_none());
    assert!(!element::has_attribute_ns(
        &el,
        Some("http://www.w3.org/1999/xlink"),
        "href"
    ));
}
