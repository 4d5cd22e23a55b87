use std::cell::Cell;
use std::rc::Rc;

/// Source of the client widths the evaluator compares conditions against.
pub trait Viewport {
    /// Client width of the document element.
    fn root_client_width(&self) -> f64;

    /// Client width of `<body>`; zero when unknown.
    fn body_client_width(&self) -> f64 {
        0.0
    }
}

/// Picks the width to evaluate against.
///
/// Standards-mode documents use the document element's width when it is
/// non-zero; quirks-mode documents (or a zero root width) use the body's,
/// falling back to the root's when the body reports nothing.
pub fn effective_width(viewport: &dyn Viewport, quirks: bool) -> f64 {
    let root = viewport.root_client_width();
    if !quirks && root != 0.0 {
        return root;
    }
    match viewport.body_client_width() {
        body if body != 0.0 => body,
        _ => root,
    }
}

/// A viewport the host resizes by hand. Clones share the same size.
#[derive(Debug, Clone, Default)]
pub struct SharedViewport {
    root: Rc<Cell<f64>>,
    body: Rc<Cell<f64>>,
}

impl SharedViewport {
    pub fn new(width: f64) -> Self {
        let viewport = SharedViewport::default();
        viewport.set_width(width);
        viewport
    }

    /// Resizes both the document element and the body.
    pub fn set_width(&self, width: f64) {
        self.root.set(width);
        self.body.set(width);
    }

    pub fn set_body_width(&self, width: f64) {
        self.body.set(width);
    }
}

impl Viewport for SharedViewport {
    fn root_client_width(&self) -> f64 {
        self.root.get()
    }

    fn body_client_width(&self) -> f64 {
        self.body.get()
    }
}
