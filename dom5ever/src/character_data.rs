// Copyright 2014-2017 The dom5ever Project Developers. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Character data operations over text, CDATA, comment and processing
//! instruction nodes.
//!
//! Writes queue `characterData` mutation records with the old value
//! captured before the change, under a `[CEReactions]` scope like every
//! other mutating entry point.

use std::cell::RefCell;

use tendril::StrTendril;

use crate::custom_elements::reactions::CeReactionsScope;
use crate::error::DomError;
use crate::mutation_observer::queue_character_data_record;
use crate::node::{Handle, Node, NodeData};

fn contents(node: &Node) -> Option<&RefCell<StrTendril>> {
    match node.data {
        NodeData::Text { ref contents } |
        NodeData::Cdata { ref contents } |
        NodeData::Comment { ref contents } |
        NodeData::ProcessingInstruction { ref contents, .. } => Some(contents),
        _ => None,
    }
}

/// The node's character data, or `None` for nodes that carry none.
pub fn data(node: &Handle) -> Option<StrTendril> {
    contents(node).map(|cell| cell.borrow().clone())
}

/// Byte length of the node's character data.
pub fn length(node: &Handle) -> Option<u32> {
    contents(node).map(|cell| cell.borrow().len32())
}

/// <https://dom.spec.whatwg.org/#dom-characterdata-data>
pub fn set_data(node: &Handle, value: &str) -> Result<(), DomError> {
    let cell = contents(node).ok_or_else(|| {
        DomError::NotSupported("node does not hold character data".into())
    })?;
    let _scope = CeReactionsScope::enter(node);
    let old = cell.borrow().clone();
    queue_character_data_record(node, old);
    *cell.borrow_mut() = StrTendril::from_slice(value);
    Ok(())
}

/// <https://dom.spec.whatwg.org/#dom-characterdata-appenddata>
pub fn append_data(node: &Handle, value: &str) -> Result<(), DomError> {
    let cell = contents(node).ok_or_else(|| {
        DomError::NotSupported("node does not hold character data".into())
    })?;
    let _scope = CeReactionsScope::enter(node);
    let old = cell.borrow().clone();
    queue_character_data_record(node, old);
    cell.borrow_mut().push_slice(value);
    Ok(())
}

/// Checks a byte offset against the data: past-the-end or mid-code-point
/// offsets are `IndexSize`.
fn checked_offset(data: &str, offset: usize) -> Result<usize, DomError> {
    if offset > data.len() || !data.is_char_boundary(offset) {
        Err(DomError::IndexSize)
    } else {
        Ok(offset)
    }
}

/// <https://dom.spec.whatwg.org/#concept-cd-substring>
///
/// Offsets are byte offsets into the UTF-8 data. A count that runs past
/// the end is clamped rather than rejected, like the WHATWG substring.
pub fn substring_data(node: &Handle, offset: usize, count: usize) -> Result<StrTendril, DomError> {
    let cell = contents(node).ok_or_else(|| {
        DomError::NotSupported("node does not hold character data".into())
    })?;
    let data = cell.borrow();
    let start = checked_offset(&data, offset)?;
    let end = match start.checked_add(count) {
        Some(end) if end < data.len() => checked_offset(&data, end)?,
        _ => data.len(),
    };
    Ok(StrTendril::from_slice(&data[start..end]))
}

/// <https://dom.spec.whatwg.org/#concept-cd-replace>
///
/// The workhorse behind `insert_data` and `delete_data`: replaces the
/// `count` bytes at `offset` with `value`, queueing one `characterData`
/// record with the full old value.
pub fn replace_data(
    node: &Handle,
    offset: usize,
    count: usize,
    value: &str,
) -> Result<(), DomError> {
    let cell = contents(node).ok_or_else(|| {
        DomError::NotSupported("node does not hold character data".into())
    })?;
    let old = cell.borrow().clone();
    let start = checked_offset(&old, offset)?;
    let end = match start.checked_add(count) {
        Some(end) if end < old.len() => checked_offset(&old, end)?,
        _ => old.len(),
    };

    let _scope = CeReactionsScope::enter(node);
    queue_character_data_record(node, old.clone());
    let mut new = StrTendril::from_slice(&old[..start]);
    new.push_slice(value);
    new.push_slice(&old[end..]);
    *cell.borrow_mut() = new;
    Ok(())
}

/// <https://dom.spec.whatwg.org/#dom-characterdata-insertdata>
pub fn insert_data(node: &Handle, offset: usize, value: &str) -> Result<(), DomError> {
    replace_data(node, offset, 0, value)
}

/// <https://dom.spec.whatwg.org/#dom-characterdata-deletedata>
pub fn delete_data(node: &Handle, offset: usize, count: usize) -> Result<(), DomError> {
    replace_data(node, offset, count, "")
}
