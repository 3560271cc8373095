use std::cell::Cell;
use std::rc::Rc;

use crate::foundation::geometry::LayoutBox;

/// Measurement capability of a rendered instance, bound to a node on mount.
///
/// `measure` reads the instance's current box in page coordinates and must not mutate it.
/// `None` means the instance cannot be measured right now (detached, not laid out yet).
pub trait MeasureInstance {
    fn measure(&self) -> Option<LayoutBox>;
}

impl<F> MeasureInstance for F
where
    F: Fn() -> Option<LayoutBox>,
{
    fn measure(&self) -> Option<LayoutBox> {
        self()
    }
}

/// Host-writable box shared between a layout engine and the projection tree.
///
/// Clones share the same cell: the host keeps one clone and writes new layouts into it, the
/// node measures the other.
#[derive(Clone, Debug, Default)]
pub struct SharedLayout(Rc<Cell<Option<LayoutBox>>>);

impl SharedLayout {
    pub fn new(initial: LayoutBox) -> Self {
        Self(Rc::new(Cell::new(Some(initial))))
    }

    pub fn unmeasured() -> Self {
        Self::default()
    }

    pub fn set(&self, layout: LayoutBox) {
        self.0.set(Some(layout));
    }

    pub fn clear(&self) {
        self.0.set(None);
    }

    pub fn get(&self) -> Option<LayoutBox> {
        self.0.get()
    }
}

impl MeasureInstance for SharedLayout {
    fn measure(&self) -> Option<LayoutBox> {
        self.0.get()
    }
}
