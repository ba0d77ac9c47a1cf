use std::collections::HashMap;
use std::fmt;

use crate::gfx::GraphicsApi;

use super::Shape;

/// Lookup of an identifier that was never registered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownShape {
    pub id: String,
}

impl fmt::Display for UnknownShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "no shape registered as `{}`", self.id)
    }
}

impl std::error::Error for UnknownShape {}

/// Owns shapes by identifier. Callers only ever borrow entries.
pub struct ShapeRegistry<A: GraphicsApi> {
    shapes: HashMap<String, Shape<A>>,
}

impl<A: GraphicsApi> ShapeRegistry<A> {
    pub fn new() -> Self {
        Self { shapes: HashMap::new() }
    }

    /// Registers `shape` under `id`, last write wins.
    ///
    /// Returns the displaced shape, if any; dropping it releases its GPU
    /// resources.
    pub fn add_shape(&mut self, id: impl Into<String>, shape: Shape<A>) -> Option<Shape<A>> {
        let id = id.into();
        if id != shape.id() {
            log::warn!("shape `{}` registered under a different id `{id}`", shape.id());
        }
        let previous = self.shapes.insert(id, shape);
        if let Some(prev) = &previous {
            log::debug!("shape `{}` replaced", prev.id());
        }
        previous
    }

    pub fn get_shape(&self, id: &str) -> Result<&Shape<A>, UnknownShape> {
        self.shapes.get(id).ok_or_else(|| UnknownShape { id: id.to_string() })
    }

    pub fn contains(&self, id: &str) -> bool {
        self.shapes.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    /// Registered identifiers, in no particular order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.shapes.keys().map(String::as_str)
    }
}

impl<A: GraphicsApi> Default for ShapeRegistry<A> {
    fn default() -> Self {
        Self::new()
    }
}
