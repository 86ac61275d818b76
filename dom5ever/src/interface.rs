// Copyright 2014-2017 The dom5ever Project Developers. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use std::fmt;

use dom_atoms::{LocalName, Namespace, Prefix};

use crate::error::DomError;
use crate::string_pool::StringPool;

/// <https://www.w3.org/TR/REC-xml-names/#dt-expname>
#[derive(Copy, Clone, Eq, Hash)]
pub struct ExpandedName<'a> {
    pub ns: &'a Namespace,
    pub local: &'a LocalName,
}

impl<'a, 'b> PartialEq<ExpandedName<'a>> for ExpandedName<'b> {
    fn eq(&self, other: &ExpandedName<'a>) -> bool {
        self.ns == other.ns && self.local == other.local
    }
}

impl<'a> fmt::Debug for ExpandedName<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.ns.is_empty() {
            write!(f, "{}", self.local)
        } else {
            write!(f, "{{{}}}:{}", self.ns, self.local)
        }
    }
}

/// Fully qualified name. Used to depict names of tags and attributes.
///
/// The prefix is what appears before the colon in source markup; when
/// resolved it gives the namespace url. Two qualified names denote the
/// same attribute or tag iff their `(local, ns)` pairs are equal - the
/// prefix is carried for serialization only and takes no part in
/// identity (compare via [`QualName::expanded`]).
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Clone)]
pub struct QualName {
    pub prefix: Option<Prefix>,
    pub ns: Namespace,
    pub local: LocalName,
}

impl QualName {
    #[inline]
    pub fn new(prefix: Option<Prefix>, ns: Namespace, local: LocalName) -> QualName {
        QualName { prefix, ns, local }
    }

    #[inline]
    pub fn expanded(&self) -> ExpandedName {
        ExpandedName {
            ns: &self.ns,
            local: &self.local,
        }
    }

    /// The `prefix:local` form, or just `local` without a prefix.
    pub fn qualified(&self) -> String {
        match self.prefix {
            Some(ref prefix) => format!("{}:{}", prefix, self.local),
            None => self.local.to_string(),
        }
    }
}

fn is_name_start_char(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')
}

/// Checks one colon-free part of a qualified name against the XML Name
/// production (restricted to ASCII, which is all this core accepts).
pub fn validate_name_part(part: &str) -> Result<(), DomError> {
    let mut chars = part.chars();
    match chars.next() {
        Some(c) if is_name_start_char(c) => {},
        _ => return Err(DomError::InvalidCharacter(part.to_string())),
    }
    if chars.all(is_name_char) {
        Ok(())
    } else {
        Err(DomError::InvalidCharacter(part.to_string()))
    }
}

/// Splits `qualified` on a single colon and validates both parts,
/// interning them in `pool`.
///
/// Empty parts, a leading or trailing colon, more than one colon, or any
/// character outside the Name grammar fail with
/// [`DomError::InvalidCharacter`].
pub fn parse_qualified_name(
    pool: &StringPool,
    qualified: &str,
) -> Result<(Option<Prefix>, LocalName), DomError> {
    let mut parts = qualified.splitn(3, ':');
    let first = parts.next().unwrap_or("");
    let second = parts.next();
    if parts.next().is_some() {
        return Err(DomError::InvalidCharacter(qualified.to_string()));
    }
    match second {
        None => {
            validate_name_part(first)?;
            Ok((None, pool.intern_local(first)))
        },
        Some(local) => {
            validate_name_part(first)?;
            validate_name_part(local)?;
            Ok((Some(pool.intern_prefix(first)), pool.intern_local(local)))
        },
    }
}
