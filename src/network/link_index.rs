use std::collections::HashMap;

use super::model::{Link, ProcessId};

/// Bidirectional adjacency over the process links of one product system.
///
/// Built once and then only read; builds running in the background share it
/// behind an `Arc`.
#[derive(Debug, Default)]
pub struct LinkIndex {
    links: Vec<Link>,
    /// consumer -> links it receives, in insertion order
    incoming: HashMap<ProcessId, Vec<Link>>,
    /// provider -> links it feeds, in insertion order
    outgoing: HashMap<ProcessId, Vec<Link>>,
}

impl LinkIndex {
    pub fn build<I>(links: I) -> Self
    where
        I: IntoIterator<Item = Link>,
    {
        let mut index = LinkIndex::default();
        for link in links {
            index.incoming.entry(link.consumer).or_default().push(link);
            index.outgoing.entry(link.provider).or_default().push(link);
            index.links.push(link);
        }
        index
    }

    /// Links whose consumer is `process`
    pub fn incoming(&self, process: ProcessId) -> &[Link] {
        self.incoming.get(&process).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Links whose provider is `process`
    pub fn outgoing(&self, process: ProcessId) -> &[Link] {
        self.outgoing.get(&process).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// All process ids that appear on either side of a link
    pub fn processes(&self) -> impl Iterator<Item = ProcessId> + '_ {
        self.incoming
            .keys()
            .chain(self.outgoing.keys().filter(|p| !self.incoming.contains_key(p)))
            .copied()
    }
}
