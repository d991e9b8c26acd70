use std::any::Any;
use std::fmt;

/// Object-safe vtable over a cloneable, type-erased value. This is the
/// property itself: `State` maps each reference-identity straight to a
/// `Box<dyn ErasedProperty>`, with no intermediate owned wrapper.
///
/// Blanket-implemented for any `V: Any + Clone + Debug`. Pointer-typed
/// values (`Rc<RefCell<T>>`) get shared-handle clone semantics and owned
/// values get deep-copy semantics for free, since the distinction lives
/// entirely in `V`'s own `Clone` impl, not here.
pub trait ErasedProperty: fmt::Debug {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn clone_box(&self) -> Box<dyn ErasedProperty>;
}

impl<V> ErasedProperty for V
where
    V: Any + Clone + fmt::Debug,
{
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn clone_box(&self) -> Box<dyn ErasedProperty> {
        Box::new(self.clone())
    }
}
