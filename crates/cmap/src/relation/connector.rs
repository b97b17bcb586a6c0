//! Keeps connector markers on their link endpoints.

use log::trace;

use crate::{
    component::{Components, MarkerState},
    id::{ComponentId, End, LinkId, MarkerId, RelationId},
    scheduler::Scheduler,
};

/// Binds one [`ConnectorMarker`](crate::component::ConnectorMarker) to one
/// end of a link. Exists only while the marker is shown.
#[derive(Debug, Clone)]
pub struct ConnectorRelation {
    id: RelationId,
    link: LinkId,
    end: End,
    marker: MarkerId,
}

impl ConnectorRelation {
    pub(crate) fn new(id: RelationId, link: LinkId, end: End, marker: MarkerId) -> Self {
        Self {
            id,
            link,
            end,
            marker,
        }
    }

    pub fn id(&self) -> RelationId {
        self.id
    }

    pub fn link(&self) -> LinkId {
        self.link
    }

    pub fn end(&self) -> End {
        self.end
    }

    pub fn marker(&self) -> MarkerId {
        self.marker
    }

    pub(crate) fn update(
        &self,
        changed: ComponentId,
        components: &mut Components,
        scheduler: &mut Scheduler,
    ) {
        if changed != ComponentId::Link(self.link) {
            return;
        }
        let Some(position) = components.link(self.link).map(|link| link.endpoint(self.end)) else {
            return;
        };
        if let Some(marker) = components.marker_mut(self.marker) {
            if marker.set_position(position, scheduler) {
                trace!(marker:% = self.marker, position:?; "Moved connector marker");
            }
        }
    }

    pub(crate) fn set_connected(
        &self,
        connected: bool,
        components: &mut Components,
        scheduler: &mut Scheduler,
    ) {
        if let Some(marker) = components.marker_mut(self.marker) {
            marker.set_state(MarkerState::from(connected), scheduler);
        }
    }
}
