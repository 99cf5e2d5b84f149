use std::any::Any;
use std::fmt::Debug;

/// A value stored in [`StateCtx`](crate::StateCtx), keyed by its concrete type.
pub trait State: Any + Debug {
    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}
