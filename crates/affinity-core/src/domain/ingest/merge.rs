//! Coalescing of queued link requests
//!
//! Requests that pile up while a link is in flight are grouped by edge
//! identity. Relative requests in a group sum their weights; an absolute
//! request turns the group absolute with the latest distance. A relative
//! request arriving after an absolute one opens a new group, so applying the
//! groups in order has the same effect as applying the requests one by one.

use crate::domain::edge::Direction;
use crate::domain::graph::LinkRequest;

/// Identity of the logical edge a request targets
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LinkIdentity {
    pub namespace: Option<String>,
    pub from_node: String,
    pub to_node: String,
    pub entity: String,
    pub direction: Direction,
}

impl LinkIdentity {
    pub fn of(request: &LinkRequest) -> Self {
        Self {
            namespace: request.namespace.clone(),
            from_node: request.from_node.clone(),
            to_node: request.to_node.clone(),
            entity: request.entity.clone(),
            direction: request.direction,
        }
    }
}

/// A merged request and the records that produced it
#[derive(Debug, Clone, PartialEq)]
pub struct PendingLink {
    pub request: LinkRequest,
    pub record_ids: Vec<String>,
}

impl PendingLink {
    pub fn new(record_id: impl Into<String>, request: LinkRequest) -> Self {
        Self {
            request,
            record_ids: vec![record_id.into()],
        }
    }

    pub fn identity(&self) -> LinkIdentity {
        LinkIdentity::of(&self.request)
    }

    /// Fold `request` into this group, handing it back when it cannot merge
    pub fn absorb(&mut self, record_id: &str, request: LinkRequest) -> Option<LinkRequest> {
        if LinkIdentity::of(&request) != self.identity() {
            return Some(request);
        }
        match (self.request.absolute_distance, request.absolute_distance) {
            (_, Some(absolute)) => self.request.absolute_distance = Some(absolute),
            (None, None) => self.request.weight += request.weight,
            (Some(_), None) => return Some(request),
        }
        self.record_ids.push(record_id.to_string());
        None
    }
}

/// Group a drained batch, keeping first-appearance order between groups
///
/// Requests without a namespace are resolved to `default_namespace` first, so
/// they group with requests naming that namespace explicitly.
pub fn coalesce(
    batch: impl IntoIterator<Item = (String, LinkRequest)>,
    default_namespace: &str,
) -> Vec<PendingLink> {
    let mut groups: Vec<PendingLink> = Vec::new();
    for (record_id, mut request) in batch {
        request
            .namespace
            .get_or_insert_with(|| default_namespace.to_string());
        let identity = LinkIdentity::of(&request);
        let open = groups.iter_mut().rev().find(|group| group.identity() == identity);
        let leftover = match open {
            Some(group) => group.absorb(&record_id, request),
            None => Some(request),
        };
        if let Some(request) = leftover {
            groups.push(PendingLink::new(record_id, request));
        }
    }
    groups
}
