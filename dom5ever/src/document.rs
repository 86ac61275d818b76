// Copyright 2014-2017 The dom5ever Project Developers. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The document node and its factories.
//!
//! A document owns the three per-document singletons: the injected
//! [`StringPool`], the [`CustomElementRegistry`] and the
//! [`CustomElementReactionStack`] (with its backup queue). Every node a
//! factory creates carries a weak pointer back to the document; the
//! document's own pointer refers to itself.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use dom_atoms::ns;
use tendril::StrTendril;

use crate::custom_elements::reactions::flush_backup_queue;
use crate::custom_elements::{CustomElementReactionStack, CustomElementRegistry};
use crate::error::DomError;
use crate::interface::{parse_qualified_name, validate_name_part, QualName};
use crate::node::{AttrData, ElementData, Handle, Node, NodeData};
use crate::string_pool::StringPool;
use crate::tree;

/// The per-document payload stored in the document node.
pub struct DocumentData {
    pub(crate) string_pool: StringPool,
    pub(crate) registry: CustomElementRegistry,
    pub(crate) reactions: CustomElementReactionStack,
}

/// A handle to a document node, with the factory API.
#[derive(Clone)]
pub struct Document {
    node: Handle,
}

impl Document {
    /// Creates an empty document around the injected string pool.
    pub fn new(string_pool: StringPool) -> Document {
        let node = Node::new_document(|weak| DocumentData {
            string_pool,
            registry: CustomElementRegistry::new(weak.clone()),
            reactions: CustomElementReactionStack::default(),
        });
        Document { node }
    }

    /// Wraps an existing document node.
    pub fn from_node(node: &Handle) -> Option<Document> {
        if node.is_document() {
            Some(Document { node: node.clone() })
        } else {
            None
        }
    }

    pub fn node(&self) -> &Handle {
        &self.node
    }

    pub fn into_node(self) -> Handle {
        self.node
    }

    fn data(&self) -> &DocumentData {
        self.node
            .document_data()
            .expect("document handle wraps a document node")
    }

    pub fn string_pool(&self) -> &StringPool {
        &self.data().string_pool
    }

    pub fn registry(&self) -> &CustomElementRegistry {
        &self.data().registry
    }

    pub fn reaction_stack(&self) -> &CustomElementReactionStack {
        &self.data().reactions
    }

    /// Flushes the backup element queue - the host's stand-in for a
    /// microtask checkpoint.
    pub fn invoke_backup_queue(&self) {
        flush_backup_queue(&self.node);
    }

    fn new_node(&self, data: NodeData) -> Handle {
        Node::new(data, Some(Rc::downgrade(&self.node)))
    }

    /// <https://dom.spec.whatwg.org/#dom-document-createelement>
    ///
    /// The element is created in the HTML namespace, `Uncustomized`.
    /// Hosts that want the upgrade machinery opt in with
    /// `element::set_is_undefined`.
    pub fn create_element(&self, local: &str) -> Result<Handle, DomError> {
        validate_name_part(local)?;
        let name = QualName::new(None, ns!(html), self.data().string_pool.intern_local(local));
        Ok(self.new_node(NodeData::Element(ElementData::new(name))))
    }

    /// <https://dom.spec.whatwg.org/#dom-document-createelementns>
    pub fn create_element_ns(&self, namespace: &str, qualified: &str) -> Result<Handle, DomError> {
        let (prefix, local) = parse_qualified_name(&self.data().string_pool, qualified)?;
        let ns = self.data().string_pool.intern_namespace(namespace);
        Ok(self.new_node(NodeData::Element(ElementData::new(QualName::new(
            prefix, ns, local,
        )))))
    }

    pub fn create_text_node(&self, data: &str) -> Handle {
        self.new_node(NodeData::Text {
            contents: RefCell::new(StrTendril::from_slice(data)),
        })
    }

    pub fn create_cdata_section(&self, data: &str) -> Handle {
        self.new_node(NodeData::Cdata {
            contents: RefCell::new(StrTendril::from_slice(data)),
        })
    }

    pub fn create_comment(&self, data: &str) -> Handle {
        self.new_node(NodeData::Comment {
            contents: RefCell::new(StrTendril::from_slice(data)),
        })
    }

    pub fn create_processing_instruction(
        &self,
        target: &str,
        data: &str,
    ) -> Result<Handle, DomError> {
        validate_name_part(target)?;
        Ok(self.new_node(NodeData::ProcessingInstruction {
            target: StrTendril::from_slice(target),
            contents: RefCell::new(StrTendril::from_slice(data)),
        }))
    }

    pub fn create_document_fragment(&self) -> Handle {
        self.new_node(NodeData::DocumentFragment)
    }

    /// <https://dom.spec.whatwg.org/#dom-document-createattribute>
    ///
    /// The attribute node starts detached, with an empty value.
    pub fn create_attribute(&self, local: &str) -> Result<Handle, DomError> {
        validate_name_part(local)?;
        let name = QualName::new(None, ns!(), self.data().string_pool.intern_local(local));
        Ok(self.new_node(NodeData::Attr(AttrData {
            name,
            value: RefCell::new(StrTendril::new()),
            owner: Cell::new(None),
        })))
    }

    pub fn create_attribute_ns(&self, namespace: &str, qualified: &str) -> Result<Handle, DomError> {
        let (prefix, local) = parse_qualified_name(&self.data().string_pool, qualified)?;
        let ns = self.data().string_pool.intern_namespace(namespace);
        Ok(self.new_node(NodeData::Attr(AttrData {
            name: QualName::new(prefix, ns, local),
            value: RefCell::new(StrTendril::new()),
            owner: Cell::new(None),
        })))
    }

    pub fn create_document_type(
        &self,
        name: &str,
        public_id: &str,
        system_id: &str,
    ) -> Result<Handle, DomError> {
        validate_name_part(name)?;
        Ok(self.new_node(NodeData::Doctype {
            name: StrTendril::from_slice(name),
            public_id: StrTendril::from_slice(public_id),
            system_id: StrTendril::from_slice(system_id),
        }))
    }

    /// <https://dom.spec.whatwg.org/#dom-document-adoptnode>
    pub fn adopt_node(&self, node: &Handle) -> Result<Handle, DomError> {
        tree::adopt_node(&self.node, node)
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Document")
            .field("children", &self.node.children().len())
            .field("registry", &self.data().registry)
            .finish()
    }
}
