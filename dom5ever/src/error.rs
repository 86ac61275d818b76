// Copyright 2014-2017 The dom5ever Project Developers. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Error types surfaced by the DOM core.
//!
//! Structural operations are atomic: whenever one of these errors is
//! returned, the tree is unchanged. Host callback failures are *not*
//! routed through these types - they are caught and logged, with the one
//! exception of a custom element constructor failing during upgrade
//! ([`CustomElementError::ConstructorThrew`]).

use std::borrow::Cow;

use thiserror::Error;

/// The DOMException-shaped errors raised by tree mutation, attributes,
/// token lists, events and observers.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum DomError {
    /// The operation would violate a parent/child constraint of the tree.
    #[error("hierarchy request: {0}")]
    HierarchyRequest(Cow<'static, str>),

    /// The node belongs to a different document and has not been adopted.
    #[error("node is from a different document")]
    WrongDocument,

    /// A reference child or named item was not where the caller said it is.
    #[error("not found: {0}")]
    NotFound(Cow<'static, str>),

    /// A qualified name or token contains characters the grammar forbids.
    #[error("invalid character in {0:?}")]
    InvalidCharacter(String),

    /// An empty token was passed where a token is required.
    #[error("empty token")]
    Syntax,

    /// A character-data offset points outside the node's data or into
    /// the middle of a code point.
    #[error("index or size is out of range")]
    IndexSize,

    /// The attribute node is already owned by another element.
    #[error("attribute is in use by another element")]
    InUseAttribute,

    /// The target cannot support the requested operation.
    #[error("not supported: {0}")]
    NotSupported(Cow<'static, str>),

    /// The object is not in a state that allows the operation.
    #[error("invalid state: {0}")]
    InvalidState(Cow<'static, str>),

    /// The per-target event listener cap was reached.
    #[error("listener limit of {0} reached for this target")]
    TooManyListeners(usize),
}

/// Opaque failure reported by a host callback. The core never inspects
/// the message; it only logs it (or, for constructors, wraps it).
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct CallbackError(pub Cow<'static, str>);

impl CallbackError {
    pub fn new<M: Into<Cow<'static, str>>>(message: M) -> CallbackError {
        CallbackError(message.into())
    }
}

/// Errors raised by the custom element registry.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum CustomElementError {
    /// The name does not match the potential-custom-element-name grammar.
    #[error("{0:?} is not a valid custom element name")]
    InvalidName(String),

    /// The name is one of the reserved hyphenated element names.
    #[error("{0:?} is a reserved element name")]
    ReservedName(String),

    /// A definition with this name already exists in the registry.
    #[error("{0:?} is already defined")]
    AlreadyDefined(String),

    /// `define` was re-entered while another definition was in progress.
    #[error("a definition is already being registered")]
    DefinitionRunning,

    /// The constructor callback failed while upgrading an element; the
    /// element state is now `Failed`.
    #[error("custom element constructor failed: {0}")]
    ConstructorThrew(#[from] CallbackError),
}
