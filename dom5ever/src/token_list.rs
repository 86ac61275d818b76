// Copyright 2014-2017 The dom5ever Project Developers. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! `DOMTokenList`: a live ordered-set view over one attribute.
//!
//! Reads parse the attribute value on each access and collapse duplicate
//! tokens (first occurrence wins) without touching the stored value.
//! Writes validate every token up front - failure is atomic, the
//! attribute is untouched - and then reserialize the ordered set through
//! the element's attribute pipeline, so `[CEReactions]`, mutation
//! records and observed-attribute callbacks all apply.

use dom_atoms::{ns, LocalName};
use tendril::StrTendril;

use crate::element::set_attribute_qualified;
use crate::error::DomError;
use crate::interface::QualName;
use crate::node::Handle;

/// ASCII whitespace per the HTML spec.
const ASCII_WHITESPACE: &[char] = &[' ', '\t', '\n', '\r', '\x0c'];

/// A live view over one attribute of one element.
#[derive(Clone)]
pub struct DomTokenList {
    element: Handle,
    local: LocalName,
}

impl DomTokenList {
    pub(crate) fn new(element: Handle, local: LocalName) -> DomTokenList {
        DomTokenList { element, local }
    }

    pub fn element(&self) -> &Handle {
        &self.element
    }

    /// The raw attribute value; absent attributes read as empty.
    pub fn value(&self) -> StrTendril {
        self.element
            .element_data()
            .and_then(|data| data.attrs.borrow().get(&self.local, &ns!()).cloned())
            .unwrap_or_else(StrTendril::new)
    }

    /// Replaces the raw attribute value wholesale, without token
    /// validation (mirrors assigning to `DOMTokenList.value`).
    pub fn set_value(&self, value: &str) {
        set_attribute_qualified(
            &self.element,
            self.name(),
            StrTendril::from_slice(value),
        );
    }

    /// The tokens as an ordered set: split on ASCII whitespace, first
    /// occurrence of each duplicate kept.
    pub fn tokens(&self) -> Vec<String> {
        let value = self.value();
        let mut out: Vec<String> = Vec::new();
        for token in value.split(ASCII_WHITESPACE) {
            if !token.is_empty() && !out.iter().any(|t| t == token) {
                out.push(token.to_string());
            }
        }
        out
    }

    /// Ordered-set length; duplicates in the stored value collapse.
    pub fn len(&self) -> usize {
        self.tokens().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn item(&self, index: usize) -> Option<String> {
        self.tokens().into_iter().nth(index)
    }

    pub fn contains(&self, token: &str) -> bool {
        self.tokens().iter().any(|t| t == token)
    }

    /// <https://dom.spec.whatwg.org/#dom-domtokenlist-add>
    ///
    /// All tokens are validated before any mutation.
    pub fn add(&self, tokens: &[&str]) -> Result<(), DomError> {
        validate_tokens(tokens)?;
        let mut set = self.tokens();
        for token in tokens {
            if !set.iter().any(|t| t == token) {
                set.push(token.to_string());
            }
        }
        self.update(&set);
        Ok(())
    }

    /// <https://dom.spec.whatwg.org/#dom-domtokenlist-remove>
    pub fn remove(&self, tokens: &[&str]) -> Result<(), DomError> {
        validate_tokens(tokens)?;
        let had_attribute = self
            .element
            .element_data()
            .map(|data| data.attrs.borrow().contains(&self.local, &ns!()))
            .unwrap_or(false);
        let mut set = self.tokens();
        set.retain(|t| !tokens.iter().any(|r| r == t));
        if set.is_empty() && !had_attribute {
            return Ok(());
        }
        self.update(&set);
        Ok(())
    }

    /// <https://dom.spec.whatwg.org/#dom-domtokenlist-toggle>
    ///
    /// Returns whether the token is present afterwards. `force: true`
    /// always adds, `force: false` always removes.
    pub fn toggle(&self, token: &str, force: Option<bool>) -> Result<bool, DomError> {
        validate_token(token)?;
        let present = self.contains(token);
        match (present, force) {
            (true, Some(true)) => Ok(true),
            (true, _) => {
                self.remove(&[token])?;
                Ok(false)
            },
            (false, Some(false)) => Ok(false),
            (false, _) => {
                self.add(&[token])?;
                Ok(true)
            },
        }
    }

    /// <https://dom.spec.whatwg.org/#dom-domtokenlist-replace>
    ///
    /// Replaces the first occurrence of `old` with `new`, collapsing any
    /// duplicate that results. Returns whether `old` was present.
    pub fn replace(&self, old: &str, new: &str) -> Result<bool, DomError> {
        validate_token(old)?;
        validate_token(new)?;
        let set = self.tokens();
        let Some(position) = set.iter().position(|t| t == old) else {
            return Ok(false);
        };
        let mut out: Vec<String> = Vec::new();
        for (i, token) in set.into_iter().enumerate() {
            let token = if i == position { new.to_string() } else { token };
            if !out.iter().any(|t| *t == token) {
                out.push(token);
            }
        }
        self.update(&out);
        Ok(true)
    }

    /// <https://dom.spec.whatwg.org/#dom-domtokenlist-supports>
    ///
    /// This core attaches token lists to attributes with no defined set
    /// of supported tokens, so the query itself is unsupported.
    pub fn supports(&self, _token: &str) -> Result<bool, DomError> {
        Err(DomError::NotSupported(
            "attribute has no supported tokens definition".into(),
        ))
    }

    fn name(&self) -> QualName {
        QualName::new(None, ns!(), self.local.clone())
    }

    /// Serializes the ordered set back into the attribute, space
    /// separated.
    fn update(&self, tokens: &[String]) {
        let mut value = StrTendril::new();
        for (i, token) in tokens.iter().enumerate() {
            if i > 0 {
                value.push_char(' ');
            }
            value.push_slice(token);
        }
        set_attribute_qualified(&self.element, self.name(), value);
    }
}

fn validate_token(token: &str) -> Result<(), DomError> {
    if token.is_empty() {
        return Err(DomError::Syntax);
    }
    if token.contains(ASCII_WHITESPACE) {
        return Err(DomError::InvalidCharacter(token.to_string()));
    }
    Ok(())
}

fn validate_tokens(tokens: &[&str]) -> Result<(), DomError> {
    for token in tokens {
        validate_token(token)?;
    }
    Ok(())
}
