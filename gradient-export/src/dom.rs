//! Minimal document model for snapshot export.
//!
//! Elements carry their laid-out bounds and computed style. A [`Document`]
//! tracks which element trees are currently attached; snapshot export attaches
//! a normalized clone for the duration of one rasterization only.

use crate::error::{ExportError, ExportResult};
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;

/// Laid-out box of an element in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Bounds {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Bounds {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// An element with computed style.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Element {
    pub tag: String,
    pub id: Option<String>,
    pub bounds: Bounds,
    pub style: BTreeMap<String, String>,
    pub children: Vec<Element>,
}

impl Element {
    pub fn new(tag: &str, bounds: Bounds) -> Self {
        Self {
            tag: tag.to_string(),
            bounds,
            ..Default::default()
        }
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }

    pub fn with_style(mut self, property: &str, value: &str) -> Self {
        self.set_style(property, value);
        self
    }

    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    pub fn style(&self, property: &str) -> Option<&str> {
        self.style.get(property).map(String::as_str)
    }

    pub fn set_style(&mut self, property: &str, value: &str) {
        self.style.insert(property.to_string(), value.to_string());
    }

    /// Visit this element and all descendants in document order.
    pub fn walk(&self, visit: &mut impl FnMut(&Element)) {
        visit(self);
        for child in &self.children {
            child.walk(visit);
        }
    }

    /// Mutable variant of [`Element::walk`].
    pub fn walk_mut(&mut self, visit: &mut impl FnMut(&mut Element)) {
        visit(self);
        for child in &mut self.children {
            child.walk_mut(visit);
        }
    }

    /// Find a descendant (or self) by id.
    pub fn find(&self, id: &str) -> Option<&Element> {
        if self.id.as_deref() == Some(id) {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(id))
    }
}

/// An on-screen SVG node: its markup and live bounding box.
#[derive(Debug, Clone, PartialEq)]
pub struct SvgNode {
    pub markup: String,
    pub width: f32,
    pub height: f32,
}

impl SvgNode {
    /// Take the node's size from the markup's own `width`/`height`/`viewBox`.
    pub fn from_markup(markup: &str) -> ExportResult<Self> {
        let tree = usvg::Tree::from_str(markup, &usvg::Options::default())
            .map_err(|e| ExportError::ImageDecodeFailure(format!("invalid SVG: {}", e)))?;
        let size = tree.size();
        Ok(Self {
            markup: markup.to_string(),
            width: size.width(),
            height: size.height(),
        })
    }
}

/// The live page: element trees currently attached.
#[derive(Debug, Default)]
pub struct Document {
    attached: RefCell<Vec<(u64, Rc<Element>)>>,
    next_handle: Cell<u64>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach an element tree; it stays attached until the guard is dropped.
    pub fn attach(&self, element: Element) -> AttachedNode<'_> {
        let handle = self.next_handle.get();
        self.next_handle.set(handle + 1);
        let element = Rc::new(element);
        self.attached.borrow_mut().push((handle, element.clone()));
        log::debug!(target: "export", "attached node #{} <{}>", handle, element.tag);
        AttachedNode {
            document: self,
            handle,
            element,
        }
    }

    /// Attach an element tree for the lifetime of the document.
    pub fn append(&self, element: Element) {
        let handle = self.next_handle.get();
        self.next_handle.set(handle + 1);
        self.attached.borrow_mut().push((handle, Rc::new(element)));
    }

    fn detach(&self, handle: u64) {
        self.attached.borrow_mut().retain(|(h, _)| *h != handle);
        log::debug!(target: "export", "detached node #{}", handle);
    }

    /// Number of attached element trees.
    pub fn attached_count(&self) -> usize {
        self.attached.borrow().len()
    }

    /// Look up an attached element (at any depth) by id.
    pub fn get_element_by_id(&self, id: &str) -> Option<Element> {
        self.attached
            .borrow()
            .iter()
            .find_map(|(_, root)| root.find(id).cloned())
    }
}

/// An element tree attached to a [`Document`]; detaches itself when dropped.
#[derive(Debug)]
pub struct AttachedNode<'a> {
    document: &'a Document,
    handle: u64,
    element: Rc<Element>,
}

impl AttachedNode<'_> {
    pub fn element(&self) -> &Element {
        &self.element
    }
}

impl Drop for AttachedNode<'_> {
    fn drop(&mut self) {
        self.document.detach(self.handle);
    }
}
