// Copyright 2014-2017 The dom5ever Project Developers. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use dom5ever::{element, Document, DomError, DomTokenList, Handle, StringPool};

fn classy() -> (Document, Handle, DomTokenList) {
    let doc = Document::new(StringPool::new());
    let el = doc.create_element("div").unwrap();
    let list = element::class_list(&el);
    (doc, el, list)
}

#[test]
fn reads_collapse_duplicates_but_storage_does_not() {
    let (_doc, el, list) = classy();
    list.set_value("foo foo bar");

    assert_eq!(list.len(), 2);
    assert_eq!(list.item(0).as_deref(), Some("foo"));
    assert_eq!(list.item(1).as_deref(), Some("bar"));
    assert_eq!(list.item(2), None);

    // The stored attribute keeps the duplicate until a list write.
    assert_eq!(
        element::get_attribute(&el, "class").as_deref(),
        Some("foo foo bar")
    );

    list.add(&["baz"]).unwrap();
    assert_eq!(
        element::get_attribute(&el, "class").as_deref(),
        Some("foo bar baz")
    );
}

#[test]
fn add_is_idempotent() {
    let (_doc, _el, list) = classy();
    list.add(&["t"]).unwrap();
    list.add(&["t"]).unwrap();
    assert_eq!(list.len(), 1);
    assert!(list.contains("t"));
}

#[test]
fn add_validates_every_token_before_mutating() {
    let (_doc, el, list) = classy();
    list.set_value("a b");

    // Scenario: one bad token poisons the whole call; no partial add.
    assert!(matches!(list.add(&["c", ""]), Err(DomError::Syntax)));
    assert_eq!(element::get_attribute(&el, "class").as_deref(), Some("a b"));

    assert!(matches!(
        list.add(&["c", "sp ace"]),
        Err(DomError::InvalidCharacter(_))
    ));
    assert_eq!(element::get_attribute(&el, "class").as_deref(), Some("a b"));
}

#[test]
fn remove_rewrites_the_ordered_set() {
    let (_doc, el, list) = classy();
    list.set_value("a b a c");
    list.remove(&["a"]).unwrap();
    assert_eq!(element::get_attribute(&el, "class").as_deref(), Some("b c"));

    // Removing from a missing attribute does not create it.
    let other = _doc.create_element("p").unwrap();
    let other_list = element::class_list(&other);
    other_list.remove(&["ghost"]).unwrap();
    assert!(!element::has_attribute(&other, "class"));
}

#[test]
fn toggle_forced_is_idempotent() {
    let (_doc, _el, list) = classy();

    assert!(list.toggle("t", None).unwrap());
    assert!(!list.toggle("t", None).unwrap());

    assert!(list.toggle("t", Some(true)).unwrap());
    assert!(list.toggle("t", Some(true)).unwrap());
    assert_eq!(list.len(), 1);

    assert!(!list.toggle("t", Some(false)).unwrap());
    assert!(!list.toggle("t", Some(false)).unwrap());
    assert!(!list.contains("t"));
}

#[test]
fn replace_collapses_resulting_duplicates() {
    let (_doc, el, list) = classy();
    list.set_value("a b c b");

    assert!(list.replace("a", "b").unwrap());
    // "b" already existed, so the replacement collapses into it.
    assert_eq!(element::get_attribute(&el, "class").as_deref(), Some("b c"));

    assert!(!list.replace("zzz", "q").unwrap());
    assert_eq!(element::get_attribute(&el, "class").as_deref(), Some("b c"));
}

#[test]
fn supports_is_not_supported_for_class() {
    let (_doc, _el, list) = classy();
    assert!(matches!(
        list.supports("anything"),
        Err(DomError::NotSupported(_))
    ));
}
