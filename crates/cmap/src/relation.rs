//! Relations between components.
//!
//! A relation is registered on every component it depends on. When one of
//! those components is resolved during a settle pass, the relation is told
//! which component changed and rewrites the derived geometry it owns.
//!
//! - [`Connection`] binds the endpoints of a link to up to two shapes.
//! - [`ConnectorRelation`] keeps a connector marker on its link endpoint.

use std::collections::HashMap;

use crate::{
    component::Components,
    id::{ComponentId, RelationId},
    scheduler::Scheduler,
};

mod connection;
mod connector;

pub use connection::{Connection, anchored_geometry, rotated_midpoint};
pub use connector::ConnectorRelation;

#[derive(Debug, Clone)]
pub enum Relation {
    Connection(Connection),
    Connector(ConnectorRelation),
}

impl Relation {
    pub fn id(&self) -> RelationId {
        match self {
            Self::Connection(connection) => connection.id(),
            Self::Connector(connector) => connector.id(),
        }
    }

    /// Reacts to `changed` having been resolved in the running settle pass.
    pub(crate) fn update(
        &mut self,
        changed: ComponentId,
        components: &mut Components,
        scheduler: &mut Scheduler,
    ) {
        match self {
            Self::Connection(connection) => connection.update(changed, components, scheduler),
            Self::Connector(connector) => connector.update(changed, components, scheduler),
        }
    }

    pub fn as_connection(&self) -> Option<&Connection> {
        match self {
            Self::Connection(connection) => Some(connection),
            Self::Connector(_) => None,
        }
    }

    pub fn as_connector(&self) -> Option<&ConnectorRelation> {
        match self {
            Self::Connector(connector) => Some(connector),
            Self::Connection(_) => None,
        }
    }

    pub(crate) fn as_connection_mut(&mut self) -> Option<&mut Connection> {
        match self {
            Self::Connection(connection) => Some(connection),
            Self::Connector(_) => None,
        }
    }
}

/// Table of live relations.
#[derive(Debug, Default)]
pub(crate) struct Relations {
    relations: HashMap<RelationId, Relation>,
    next_id: u32,
}

impl Relations {
    pub(crate) fn next_id(&mut self) -> RelationId {
        self.next_id += 1;
        RelationId::new(self.next_id)
    }

    pub(crate) fn insert(&mut self, relation: Relation) {
        self.relations.insert(relation.id(), relation);
    }

    pub(crate) fn get(&self, id: RelationId) -> Option<&Relation> {
        self.relations.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: RelationId) -> Option<&mut Relation> {
        self.relations.get_mut(&id)
    }

    pub(crate) fn connection(&self, id: RelationId) -> Option<&Connection> {
        self.get(id).and_then(Relation::as_connection)
    }

    pub(crate) fn connection_mut(&mut self, id: RelationId) -> Option<&mut Connection> {
        self.get_mut(id).and_then(Relation::as_connection_mut)
    }

    pub(crate) fn remove(&mut self, id: RelationId) -> Option<Relation> {
        self.relations.remove(&id)
    }

    /// Drops every pending one-shot update suppression.
    pub(crate) fn clear_suppressions(&mut self) {
        for relation in self.relations.values_mut() {
            if let Relation::Connection(connection) = relation {
                connection.clear_suppression();
            }
        }
    }
}
