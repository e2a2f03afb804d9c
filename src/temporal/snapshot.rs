//! TemporalSnapshot - Immutable binding of a context and a structure
//!
//! The handle of a snapshot is derived, never set independently:
//! it always equals `(structure.identifier(), context.version, context.revision)`.

use super::{ContextHandle, HasIdentifier, TemporalContext, TemporalStructure};

/// One immutable stored (context, structure) pair.
///
/// All fields are private to enforce immutability.
#[derive(Clone, Debug, PartialEq)]
pub struct TemporalSnapshot<S: TemporalStructure> {
    context: TemporalContext,
    structure: S,
    handle: ContextHandle<S::Id>,
}

impl<S: TemporalStructure> TemporalSnapshot<S> {
    /// Binds `structure` to `context` and derives the exact handle.
    pub fn new(context: TemporalContext, structure: S) -> Self {
        let handle = ContextHandle::exact(
            structure.identifier(),
            context.version(),
            context.revision(),
        );
        Self {
            context,
            structure,
            handle,
        }
    }

    /// Binds `structure` to a default context (version 1, revision 0, now).
    pub fn initial(structure: S) -> Self {
        Self::new(TemporalContext::default(), structure)
    }

    #[inline]
    pub fn context(&self) -> &TemporalContext {
        &self.context
    }

    #[inline]
    pub fn structure(&self) -> &S {
        &self.structure
    }

    #[inline]
    pub fn handle(&self) -> &ContextHandle<S::Id> {
        &self.handle
    }

    #[inline]
    pub fn identifier(&self) -> &S::Id {
        self.handle.identifier()
    }

    #[inline]
    pub fn version(&self) -> u32 {
        self.context.version()
    }

    #[inline]
    pub fn revision(&self) -> u32 {
        self.context.revision()
    }

}
