//! In-memory document.
//!
//! An arena-backed element tree implementing [`Document`]. It records every
//! attribute write, every synthetic click and every registered listener so
//! tests can observe exactly what components did, and it can be loaded from a
//! YAML or JSON element tree for the terminal demo.

use indexmap::IndexMap;
use keynav_types::{ElementId, EventKind, ListenerId, attributes};
use serde::{Deserialize, Serialize};

use crate::document::Document;
use crate::error::KeynavError;

/// Serializable element tree used to describe documents in files.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementSpec {
    pub tag: String,
    #[serde(default)]
    pub attributes: IndexMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ElementSpec>,
}

/// Top-level document file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentSpec {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub body: Vec<ElementSpec>,
}

#[derive(Debug, Clone)]
struct Node {
    tag: String,
    attributes: IndexMap<String, String>,
    text: Option<String>,
    parent: Option<ElementId>,
    children: Vec<ElementId>,
}

impl Node {
    fn new(tag: &str, parent: Option<ElementId>) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            attributes: IndexMap::new(),
            text: None,
            parent,
            children: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MemoryDocument {
    title: Option<String>,
    nodes: Vec<Node>,
    focused: Option<ElementId>,
    pending_clicks: Vec<ElementId>,
    click_log: Vec<ElementId>,
    attribute_writes: usize,
    listeners: IndexMap<ListenerId, (ElementId, EventKind)>,
    next_listener: u64,
}

impl Default for MemoryDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDocument {
    /// Creates an empty document holding only the root node.
    pub fn new() -> Self {
        Self {
            title: None,
            nodes: vec![Node::new("#document", None)],
            focused: None,
            pending_clicks: Vec::new(),
            click_log: Vec::new(),
            attribute_writes: 0,
            listeners: IndexMap::new(),
            next_listener: 0,
        }
    }

    pub fn from_spec(spec: &DocumentSpec) -> Self {
        let mut document = Self::new();
        document.title = spec.title.clone();
        let root = document.root();
        for element in &spec.body {
            document.append_spec(root, element);
        }
        document
    }

    pub fn from_yaml_str(source: &str) -> Result<Self, KeynavError> {
        let spec: DocumentSpec =
            serde_yaml::from_str(source).map_err(|error| KeynavError::DocumentFormat(error.to_string()))?;
        Ok(Self::from_spec(&spec))
    }

    pub fn from_json_str(source: &str) -> Result<Self, KeynavError> {
        let spec: DocumentSpec =
            serde_json::from_str(source).map_err(|error| KeynavError::DocumentFormat(error.to_string()))?;
        Ok(Self::from_spec(&spec))
    }

    /// Appends a child element and returns its handle.
    pub fn append(&mut self, parent: ElementId, tag: &str) -> ElementId {
        let id = ElementId(self.nodes.len());
        self.nodes.push(Node::new(tag, Some(parent)));
        if let Some(node) = self.nodes.get_mut(parent.0) {
            node.children.push(id);
        }
        id
    }

    /// Appends a child element with initial attributes. Initial attributes do
    /// not count as writes.
    pub fn append_with(&mut self, parent: ElementId, tag: &str, attrs: &[(&str, &str)]) -> ElementId {
        let id = self.append(parent, tag);
        let node = &mut self.nodes[id.0];
        for (name, value) in attrs {
            node.attributes.insert((*name).to_string(), (*value).to_string());
        }
        id
    }

    fn append_spec(&mut self, parent: ElementId, spec: &ElementSpec) -> ElementId {
        let id = self.append(parent, &spec.tag);
        {
            let node = &mut self.nodes[id.0];
            node.attributes = spec.attributes.clone();
            node.text = spec.text.clone();
        }
        for child in &spec.children {
            self.append_spec(id, child);
        }
        id
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn set_text(&mut self, id: ElementId, text: impl Into<String>) {
        if let Some(node) = self.nodes.get_mut(id.0) {
            node.text = Some(text.into());
        }
    }

    pub fn text(&self, id: ElementId) -> Option<&str> {
        self.nodes.get(id.0).and_then(|node| node.text.as_deref())
    }

    /// First element whose `id` attribute equals `value`.
    pub fn find_by_id(&self, value: &str) -> Option<ElementId> {
        self.nodes
            .iter()
            .position(|node| node.attributes.get(attributes::ID).map(String::as_str) == Some(value))
            .map(ElementId)
    }

    /// Number of `set_attribute`/`remove_attribute` calls so far.
    pub fn attribute_writes(&self) -> usize {
        self.attribute_writes
    }

    /// Every synthetic click requested so far, including drained ones.
    pub fn click_log(&self) -> &[ElementId] {
        &self.click_log
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub fn listeners_on(&self, target: ElementId) -> Vec<(ListenerId, EventKind)> {
        self.listeners
            .iter()
            .filter(|(_, (t, _))| *t == target)
            .map(|(id, (_, kind))| (*id, *kind))
            .collect()
    }

    /// All elements in document order, root excluded.
    pub fn elements(&self) -> Vec<ElementId> {
        let mut out = Vec::new();
        let mut stack: Vec<ElementId> = self.nodes[0].children.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.nodes[id.0].children.iter().rev().copied());
        }
        out
    }

    /// Nesting depth below the root (top-level elements are depth 0).
    pub fn depth(&self, id: ElementId) -> usize {
        let mut depth = 0;
        let mut current = self.parent(id);
        while let Some(parent) = current {
            if parent == self.root() {
                break;
            }
            depth += 1;
            current = self.parent(parent);
        }
        depth
    }
}

impl Document for MemoryDocument {
    fn root(&self) -> ElementId {
        ElementId(0)
    }

    fn contains_element(&self, id: ElementId) -> bool {
        id.0 < self.nodes.len()
    }

    fn parent(&self, id: ElementId) -> Option<ElementId> {
        self.nodes.get(id.0).and_then(|node| node.parent)
    }

    fn children(&self, id: ElementId) -> Vec<ElementId> {
        self.nodes.get(id.0).map(|node| node.children.clone()).unwrap_or_default()
    }

    fn tag_name(&self, id: ElementId) -> Option<String> {
        self.nodes.get(id.0).map(|node| node.tag.clone())
    }

    fn attribute(&self, id: ElementId, name: &str) -> Option<String> {
        self.nodes.get(id.0).and_then(|node| node.attributes.get(name).cloned())
    }

    fn set_attribute(&mut self, id: ElementId, name: &str, value: &str) {
        if let Some(node) = self.nodes.get_mut(id.0) {
            node.attributes.insert(name.to_string(), value.to_string());
            self.attribute_writes += 1;
        }
    }

    fn remove_attribute(&mut self, id: ElementId, name: &str) {
        if let Some(node) = self.nodes.get_mut(id.0)
            && node.attributes.shift_remove(name).is_some()
        {
            self.attribute_writes += 1;
        }
    }

    fn focus(&mut self, id: ElementId) {
        if self.contains_element(id) {
            self.focused = Some(id);
        }
    }

    fn active_element(&self) -> Option<ElementId> {
        self.focused
    }

    fn click(&mut self, id: ElementId) {
        if self.contains_element(id) {
            self.pending_clicks.push(id);
            self.click_log.push(id);
        }
    }

    fn take_synthetic_clicks(&mut self) -> Vec<ElementId> {
        std::mem::take(&mut self.pending_clicks)
    }

    fn add_event_listener(&mut self, target: ElementId, kind: EventKind) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.insert(id, (target, kind));
        id
    }

    fn remove_event_listener(&mut self, id: ListenerId) -> bool {
        self.listeners.shift_remove(&id).is_some()
    }
}
