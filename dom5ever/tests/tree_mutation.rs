// Copyright 2014-2017 The dom5ever Project Developers. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use std::rc::Rc;

use dom5ever::{element, node, tree, Document, DomError, Handle, NodeType, StringPool};

fn new_doc() -> Document {
    Document::new(StringPool::new())
}

/// Every child appears exactly once with a consistent parent link, and
/// the connected flag agrees with an actual root walk.
fn assert_tree_consistent(root: &Handle) {
    let mut stack = vec![root.clone()];
    while let Some(n) = stack.pop() {
        let children = n.child_nodes();
        for (i, child) in children.iter().enumerate() {
            let parent = child.parent().expect("child has a parent");
            assert!(Rc::ptr_eq(&parent, &n), "parent link mismatch");
            let duplicates = children
                .iter()
                .enumerate()
                .filter(|(j, c)| *j != i && Rc::ptr_eq(c, child))
                .count();
            assert_eq!(duplicates, 0, "child appears more than once");
            stack.push(child.clone());
        }
        assert_eq!(n.is_connected(), node::root(&n, true).is_document());
    }
}

#[test]
fn append_connects_and_links_siblings() {
    let doc = new_doc();
    let html = doc.create_element("html").unwrap();
    tree::append_child(doc.node(), &html).unwrap();
    assert!(html.is_connected());

    let a = doc.create_element("div").unwrap();
    let b = doc.create_element("span").unwrap();
    let c = doc.create_text_node("hi");
    tree::append_child(&html, &a).unwrap();
    tree::append_child(&html, &b).unwrap();
    tree::append_child(&html, &c).unwrap();

    assert!(Rc::ptr_eq(&html.first_child().unwrap(), &a));
    assert!(Rc::ptr_eq(&html.last_child().unwrap(), &c));
    assert!(node::previous_sibling(&a).is_none());
    assert!(Rc::ptr_eq(&node::next_sibling(&a).unwrap(), &b));
    assert!(Rc::ptr_eq(&node::previous_sibling(&c).unwrap(), &b));
    assert!(node::next_sibling(&c).is_none());
    assert_eq!(node::index_in_parent(&b), Some(1));
    assert!(a.is_connected() && b.is_connected() && c.is_connected());
    assert_tree_consistent(doc.node());
}

#[test]
fn insert_before_positions_node() {
    let doc = new_doc();
    let html = doc.create_element("html").unwrap();
    tree::append_child(doc.node(), &html).unwrap();
    let a = doc.create_element("a").unwrap();
    let b = doc.create_element("b").unwrap();
    let c = doc.create_element("span").unwrap();
    tree::append_child(&html, &a).unwrap();
    tree::append_child(&html, &c).unwrap();
    tree::insert_before(&html, &b, Some(&c)).unwrap();

    let order: Vec<_> = html
        .child_nodes()
        .iter()
        .map(|n| n.element_data().unwrap().name.local.to_string())
        .collect();
    assert_eq!(order, ["a", "b", "span"]);
    assert_tree_consistent(doc.node());
}

#[test]
fn insert_existing_child_moves_it() {
    let doc = new_doc();
    let html = doc.create_element("html").unwrap();
    tree::append_child(doc.node(), &html).unwrap();
    let a = doc.create_element("a").unwrap();
    let b = doc.create_element("b").unwrap();
    tree::append_child(&html, &a).unwrap();
    tree::append_child(&html, &b).unwrap();

    // Re-appending an existing child removes it first.
    tree::append_child(&html, &a).unwrap();
    let order: Vec<_> = html
        .child_nodes()
        .iter()
        .map(|n| n.element_data().unwrap().name.local.to_string())
        .collect();
    assert_eq!(order, ["b", "a"]);
    assert_eq!(html.child_nodes().len(), 2);
    assert_tree_consistent(doc.node());
}

#[test]
fn remove_child_disconnects_subtree() {
    let doc = new_doc();
    let html = doc.create_element("html").unwrap();
    let div = doc.create_element("div").unwrap();
    let text = doc.create_text_node("x");
    tree::append_child(doc.node(), &html).unwrap();
    tree::append_child(&html, &div).unwrap();
    tree::append_child(&div, &text).unwrap();
    assert!(text.is_connected());

    let removed = tree::remove_child(&html, &div).unwrap();
    assert!(Rc::ptr_eq(&removed, &div));
    assert!(div.parent().is_none());
    assert!(!div.is_connected());
    assert!(!text.is_connected());
    assert_tree_consistent(doc.node());

    // Removing again is NotFound.
    assert!(matches!(
        tree::remove_child(&html, &div),
        Err(DomError::NotFound(_))
    ));
}

#[test]
fn replace_child_swaps_in_place() {
    let doc = new_doc();
    let html = doc.create_element("html").unwrap();
    tree::append_child(doc.node(), &html).unwrap();
    let a = doc.create_element("a").unwrap();
    let b = doc.create_element("b").unwrap();
    let c = doc.create_element("code").unwrap();
    tree::append_child(&html, &a).unwrap();
    tree::append_child(&html, &b).unwrap();

    let old = tree::replace_child(&html, &c, &a).unwrap();
    assert!(Rc::ptr_eq(&old, &a));
    assert!(a.parent().is_none());
    assert!(!a.is_connected());
    assert!(c.is_connected());
    let order: Vec<_> = html
        .child_nodes()
        .iter()
        .map(|n| n.element_data().unwrap().name.local.to_string())
        .collect();
    assert_eq!(order, ["code", "b"]);
    assert_tree_consistent(doc.node());
}

#[test]
fn hierarchy_violations_are_rejected_atomically() {
    let doc = new_doc();
    let html = doc.create_element("html").unwrap();
    tree::append_child(doc.node(), &html).unwrap();

    // Text directly under a document.
    let text = doc.create_text_node("nope");
    assert!(matches!(
        tree::append_child(doc.node(), &text),
        Err(DomError::HierarchyRequest(_))
    ));

    // Second document element.
    let body = doc.create_element("body").unwrap();
    assert!(matches!(
        tree::append_child(doc.node(), &body),
        Err(DomError::HierarchyRequest(_))
    ));

    // Doctype under an element.
    let doctype = doc.create_document_type("html", "", "").unwrap();
    assert!(matches!(
        tree::append_child(&html, &doctype),
        Err(DomError::HierarchyRequest(_))
    ));

    // A cycle: the parent into its own descendant.
    let div = doc.create_element("div").unwrap();
    tree::append_child(&html, &div).unwrap();
    assert!(matches!(
        tree::append_child(&div, &html),
        Err(DomError::HierarchyRequest(_))
    ));

    // Text cannot hold children.
    let t = doc.create_text_node("leaf");
    tree::append_child(&div, &t).unwrap();
    let other = doc.create_element("em").unwrap();
    assert!(matches!(
        tree::append_child(&t, &other),
        Err(DomError::HierarchyRequest(_))
    ));

    // The failures left the tree unchanged.
    assert_eq!(doc.node().child_nodes().len(), 1);
    assert_tree_consistent(doc.node());
}

#[test]
fn doctype_ordering_is_enforced() {
    let doc = new_doc();
    let doctype = doc.create_document_type("html", "", "").unwrap();
    let html = doc.create_element("html").unwrap();
    tree::append_child(doc.node(), &doctype).unwrap();
    tree::append_child(doc.node(), &html).unwrap();

    // An element cannot be inserted before the doctype.
    let early = doc.create_element("div").unwrap();
    assert!(matches!(
        tree::insert_before(doc.node(), &early, Some(&doctype)),
        Err(DomError::HierarchyRequest(_))
    ));

    // A second doctype is rejected.
    let second = doc.create_document_type("html", "", "").unwrap();
    assert!(matches!(
        tree::append_child(doc.node(), &second),
        Err(DomError::HierarchyRequest(_))
    ));
}

#[test]
fn foreign_nodes_need_adoption() {
    let doc1 = new_doc();
    let doc2 = new_doc();
    let html = doc1.create_element("html").unwrap();
    tree::append_child(doc1.node(), &html).unwrap();

    let alien = doc2.create_element("div").unwrap();
    let alien_child = doc2.create_text_node("t");
    tree::append_child(&alien, &alien_child).unwrap();

    assert!(matches!(
        tree::append_child(&html, &alien),
        Err(DomError::WrongDocument)
    ));

    doc1.adopt_node(&alien).unwrap();
    assert!(Rc::ptr_eq(&alien.owner_document().unwrap(), doc1.node()));
    assert!(Rc::ptr_eq(&alien_child.owner_document().unwrap(), doc1.node()));
    tree::append_child(&html, &alien).unwrap();
    assert!(alien_child.is_connected());
    assert_tree_consistent(doc1.node());
}

#[test]
fn fragment_insertion_splices_children() {
    let doc = new_doc();
    let html = doc.create_element("html").unwrap();
    tree::append_child(doc.node(), &html).unwrap();

    let fragment = doc.create_document_fragment();
    let a = doc.create_element("a").unwrap();
    let b = doc.create_element("b").unwrap();
    tree::append_child(&fragment, &a).unwrap();
    tree::append_child(&fragment, &b).unwrap();

    tree::append_child(&html, &fragment).unwrap();
    assert_eq!(fragment.child_nodes().len(), 0);
    assert_eq!(html.child_nodes().len(), 2);
    assert!(a.is_connected() && b.is_connected());
    assert!(Rc::ptr_eq(&a.parent().unwrap(), &html));
    assert_tree_consistent(doc.node());
}

#[test]
fn move_before_reorders_without_detaching() {
    let doc = new_doc();
    let html = doc.create_element("html").unwrap();
    tree::append_child(doc.node(), &html).unwrap();
    let a = doc.create_element("a").unwrap();
    let b = doc.create_element("b").unwrap();
    let c = doc.create_element("code").unwrap();
    for n in [&a, &b, &c] {
        tree::append_child(&html, n).unwrap();
    }

    tree::move_before(&html, &c, Some(&a)).unwrap();
    let order: Vec<_> = html
        .child_nodes()
        .iter()
        .map(|n| n.element_data().unwrap().name.local.to_string())
        .collect();
    assert_eq!(order, ["code", "a", "b"]);
    assert!(c.is_connected());

    // Moving a non-child is a hierarchy error.
    let stray = doc.create_element("div").unwrap();
    assert!(matches!(
        tree::move_before(&html, &stray, None),
        Err(DomError::HierarchyRequest(_))
    ));
    assert_tree_consistent(doc.node());
}

#[test]
fn clone_node_copies_structure() {
    let doc = new_doc();
    let div = doc.create_element("div").unwrap();
    element::set_attribute(&div, "id", "orig").unwrap();
    let span = doc.create_element("span").unwrap();
    tree::append_child(&div, &span).unwrap();
    tree::append_child(&span, &doc.create_text_node("deep")).unwrap();

    let shallow = tree::clone_node(&div, false).unwrap();
    assert_eq!(shallow.node_type(), NodeType::Element);
    assert_eq!(
        element::get_attribute(&shallow, "id").as_deref(),
        Some("orig")
    );
    assert_eq!(shallow.child_nodes().len(), 0);

    let deep = tree::clone_node(&div, true).unwrap();
    assert_eq!(deep.child_nodes().len(), 1);
    let span_clone = deep.first_child().unwrap();
    assert!(!Rc::ptr_eq(&span_clone, &span));
    assert_eq!(
        node::text_content(&deep).as_deref(),
        Some("deep")
    );

    // Documents do not clone.
    assert!(matches!(
        tree::clone_node(doc.node(), true),
        Err(DomError::NotSupported(_))
    ));
}

#[test]
fn text_content_concatenates_descendants() {
    let doc = new_doc();
    let div = doc.create_element("div").unwrap();
    tree::append_child(&div, &doc.create_text_node("a")).unwrap();
    let span = doc.create_element("span").unwrap();
    tree::append_child(&span, &doc.create_text_node("b")).unwrap();
    tree::append_child(&div, &span).unwrap();
    tree::append_child(&div, &doc.create_comment("not text")).unwrap();
    tree::append_child(&div, &doc.create_text_node("c")).unwrap();

    assert_eq!(node::text_content(&div).as_deref(), Some("abc"));
    assert_eq!(node::text_content(doc.node()), None);
}

#[test]
fn dropping_the_last_handle_destroys_the_subtree() {
    let doc = new_doc();
    let html = doc.create_element("html").unwrap();
    let div = doc.create_element("div").unwrap();
    tree::append_child(doc.node(), &html).unwrap();
    tree::append_child(&html, &div).unwrap();
    let weak_div = Rc::downgrade(&div);

    // The parent edge holds the child alive after our handle goes away.
    drop(div);
    assert!(weak_div.upgrade().is_some());

    // Removal gives the handle back; once every strong ref is gone the
    // node is destroyed.
    let div = tree::remove_child(&html, &weak_div.upgrade().unwrap()).unwrap();
    drop(div);
    assert!(weak_div.upgrade().is_none());

    // Dropping a whole document releases a deep subtree without issue.
    let weak_html = Rc::downgrade(&html);
    drop(html);
    drop(doc);
    assert!(weak_html.upgrade().is_none());
}

#[test]
fn contains_and_root_walk_the_light_tree() {
    let doc = new_doc();
    let html = doc.create_element("html").unwrap();
    let div = doc.create_element("div").unwrap();
    tree::append_child(doc.node(), &html).unwrap();
    tree::append_child(&html, &div).unwrap();

    assert!(node::contains(doc.node(), &div));
    assert!(node::contains(&html, &div));
    assert!(!node::contains(&div, &html));
    assert!(Rc::ptr_eq(&node::root(&div, false), doc.node()));

    let detached = doc.create_element("p").unwrap();
    assert!(Rc::ptr_eq(&node::root(&detached, false), &detached));
}
