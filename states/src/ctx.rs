use std::any::{TypeId, type_name};
use std::collections::BTreeMap;

use crate::{Error, State};

/// Type-keyed storage for everything a screen owns between frames.
#[derive(Debug, Default)]
pub struct StateCtx {
    storage: BTreeMap<TypeId, Box<dyn State>>,
}

impl StateCtx {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `state`, replacing any previous value of the same type.
    pub fn add_state<T: State>(&mut self, state: T) {
        if self
            .storage
            .insert(TypeId::of::<T>(), Box::new(state))
            .is_some()
        {
            log::debug!("Replaced state {}", type_name::<T>());
        }
    }

    pub fn contains<T: State>(&self) -> bool {
        self.storage.contains_key(&TypeId::of::<T>())
    }

    /// Looks up the state of type `T`.
    pub fn try_state<T: State>(&self) -> Result<&T, Error> {
        self.storage
            .get(&TypeId::of::<T>())
            .and_then(|boxed| boxed.as_any().downcast_ref::<T>())
            .ok_or_else(|| Error::state_not_found(type_name::<T>()))
    }

    pub fn try_state_mut<T: State>(&mut self) -> Result<&mut T, Error> {
        self.storage
            .get_mut(&TypeId::of::<T>())
            .and_then(|boxed| boxed.as_any_mut().downcast_mut::<T>())
            .ok_or_else(|| Error::state_not_found(type_name::<T>()))
    }

    /// # Panics
    /// Panics if `T` was never registered with [`StateCtx::add_state`].
    pub fn state<T: State>(&self) -> &T {
        self.try_state::<T>().unwrap_or_else(|err| panic!("{err}"))
    }

    /// # Panics
    /// Panics if `T` was never registered with [`StateCtx::add_state`].
    pub fn state_mut<T: State>(&mut self) -> &mut T {
        self.try_state_mut::<T>().unwrap_or_else(|err| panic!("{err}"))
    }

    pub fn clear(&mut self) {
        self.storage.clear();
    }
}
