//! Definitions, assumptions and externals, and resolving node context tags
//! against them.

use tracing::debug;
use vellum_types::{Assumption, ContextRef, Definition, External, NodeId};

use super::State;
use crate::error::{EntityKind, StateError};

/// One context reference of a node, looked up in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedContext<'a> {
    Definition(&'a Definition),
    Assumption(&'a Assumption),
    External(&'a External),
    /// A recognized tag whose entity is not (yet) in the store.
    Unresolved(&'a ContextRef),
    /// A tag with no recognized prefix; carried but otherwise ignored.
    Inert(&'a ContextRef),
}

impl ResolvedContext<'_> {
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        matches!(
            self,
            Self::Definition(_) | Self::Assumption(_) | Self::External(_)
        )
    }
}

impl State {
    pub fn add_definition(&mut self, definition: Definition) -> Result<(), StateError> {
        let id = definition.id.clone();
        Self::insert_indexed(
            &mut self.definitions,
            &mut self.definition_index,
            EntityKind::Definition,
            &id,
            definition,
        )?;
        debug!(definition = %id, "Definition added");
        Ok(())
    }

    pub fn add_assumption(&mut self, assumption: Assumption) -> Result<(), StateError> {
        let id = assumption.id.clone();
        Self::insert_indexed(
            &mut self.assumptions,
            &mut self.assumption_index,
            EntityKind::Assumption,
            &id,
            assumption,
        )?;
        debug!(assumption = %id, "Assumption added");
        Ok(())
    }

    pub fn add_external(&mut self, external: External) -> Result<(), StateError> {
        let id = external.id.clone();
        Self::insert_indexed(
            &mut self.externals,
            &mut self.external_index,
            EntityKind::External,
            &id,
            external,
        )?;
        debug!(external = %id, "External added");
        Ok(())
    }

    /// Look a definition up by ID, falling back to its name.
    #[must_use]
    pub fn get_definition(&self, name_or_id: &str) -> Option<&Definition> {
        self.definition_index
            .get(name_or_id)
            .map(|&i| &self.definitions[i])
            .or_else(|| self.get_definition_by_name(name_or_id))
    }

    /// First definition registered under `name`.
    #[must_use]
    pub fn get_definition_by_name(&self, name: &str) -> Option<&Definition> {
        self.definitions.iter().find(|d| d.name == name)
    }

    #[must_use]
    pub fn get_assumption(&self, id: &str) -> Option<&Assumption> {
        self.assumption_index.get(id).map(|&i| &self.assumptions[i])
    }

    #[must_use]
    pub fn get_external(&self, id: &str) -> Option<&External> {
        self.external_index.get(id).map(|&i| &self.externals[i])
    }

    #[must_use]
    pub fn all_definitions(&self) -> &[Definition] {
        &self.definitions
    }

    #[must_use]
    pub fn all_assumptions(&self) -> &[Assumption] {
        &self.assumptions
    }

    #[must_use]
    pub fn all_externals(&self) -> &[External] {
        &self.externals
    }

    /// Look up every context tag of node `id`, in the node's order.
    pub fn resolve_context(&self, id: &NodeId) -> Result<Vec<ResolvedContext<'_>>, StateError> {
        let node = self.require_node(id)?;
        Ok(node
            .context
            .iter()
            .map(|tag| match tag {
                ContextRef::Definition(name) => self
                    .get_definition(name)
                    .map_or(ResolvedContext::Unresolved(tag), ResolvedContext::Definition),
                ContextRef::Assumption(aid) => self
                    .get_assumption(aid)
                    .map_or(ResolvedContext::Unresolved(tag), ResolvedContext::Assumption),
                ContextRef::External(eid) => self
                    .get_external(eid)
                    .map_or(ResolvedContext::Unresolved(tag), ResolvedContext::External),
                ContextRef::Unknown(_) => ResolvedContext::Inert(tag),
            })
            .collect())
    }
}
