//! Identity-keyed entity table shared by IR construction and cloning

use std::collections::HashMap;
use std::rc::Rc;

/// Maps source entities, by address, to their IR counterparts
///
/// A counterpart is registered before its links are filled in, so a lookup
/// that reaches an entity still under construction returns the partly built
/// counterpart and recursion through a self-referential type stops there.
pub(crate) struct EntityTable<S, T> {
    map: HashMap<*const S, Rc<T>>,
    order: Vec<Rc<T>>,
}

impl<S, T> Default for EntityTable<S, T> {
    fn default() -> Self {
        Self {
            map: HashMap::new(),
            order: Vec::new(),
        }
    }
}

impl<S, T> EntityTable<S, T> {
    pub fn find(
        &self,
        source: &Rc<S>,
    ) -> Option<Rc<T>> {
        self.map.get(&Rc::as_ptr(source)).cloned()
    }

    fn register(
        &mut self,
        source: &Rc<S>,
        target: &Rc<T>,
    ) {
        self.map.insert(Rc::as_ptr(source), Rc::clone(target));
    }

    fn complete(
        &mut self,
        target: Rc<T>,
    ) {
        self.order.push(target);
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Counterparts in completion order: dependencies before dependents
    pub fn into_order(self) -> Vec<Rc<T>> {
        self.order
    }
}

/// Entity that can be copied through the context `Cx`
pub(crate) trait Copyable<Cx>: Sized {
    type Target;

    fn table(cx: &mut Cx) -> &mut EntityTable<Self, Self::Target>;

    /// Counterpart carrying the scalar fields; links stay empty
    fn shell(&self) -> Rc<Self::Target>;

    /// Fill the counterpart's links, copying each dependency through `cx`
    fn link(
        &self,
        target: &Self::Target,
        cx: &mut Cx,
    );
}

/// Counterpart of `source`, creating it on first sight
pub(crate) fn copy<Cx, S: Copyable<Cx>>(
    cx: &mut Cx,
    source: &Rc<S>,
) -> Rc<S::Target> {
    if let Some(found) = S::table(cx).find(source) {
        return found;
    }
    let target = source.shell();
    S::table(cx).register(source, &target);
    source.link(&target, cx);
    S::table(cx).complete(Rc::clone(&target));
    target
}
