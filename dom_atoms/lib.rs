// Copyright 2014-2017 The dom5ever Project Developers. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Interned string types for the dom5ever DOM core.
//!
//! Tag names, attribute local names, namespace urls and namespace prefixes
//! are all [`string_cache`] atoms: equality between two atoms is a pointer
//! comparison, and a fixed set of well-known names is baked in at build
//! time so the common case never allocates. Names outside the static set
//! fall back to the dynamic atom table.

#![allow(macro_expanded_macro_exports_accessed_by_absolute_paths)]

pub use string_cache;

include!(concat!(env!("OUT_DIR"), "/generated.rs"));
