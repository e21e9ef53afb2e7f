use crate::codec::KeyCodec;
use crate::keyspace::{Keyspace, Shared};
use fxhash::FxHashMap;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::debug;

/// One node of the namespace tree.
///
/// Children and keyspaces are created on first request and cached for the
/// lifetime of the node, so concurrent requests for the same name always
/// observe a single instance.
#[derive(Debug)]
pub(crate) struct Monitor {
    shared: Arc<Shared>,
    codec: KeyCodec,
    subs: Mutex<FxHashMap<String, Arc<Self>>>,
    keyspaces: Mutex<FxHashMap<String, Keyspace>>,
}

impl Monitor {
    pub(crate) fn new(shared: Arc<Shared>, codec: KeyCodec) -> Self {
        Self { shared, codec, subs: Mutex::default(), keyspaces: Mutex::default() }
    }

    pub(crate) const fn codec(&self) -> &KeyCodec {
        &self.codec
    }

    pub(crate) fn shared(&self) -> &Shared {
        &self.shared
    }

    /// The keyspace `name`; the empty name shares this node's prefix.
    pub(crate) fn keyspace(&self, name: &str) -> Keyspace {
        let mut keyspaces = self.keyspaces.lock();
        if let Some(keyspace) = keyspaces.get(name) {
            return keyspace.clone();
        }

        let codec = if name.is_empty() { self.codec.clone() } else { self.codec.child(name) };
        debug!(name, prefix = codec.prefix(), "Opened keyspace");
        let keyspace = Keyspace::new(Arc::clone(&self.shared), codec);
        keyspaces.insert(name.to_owned(), keyspace.clone());
        keyspace
    }

    pub(crate) fn sub(&self, name: &str) -> Arc<Self> {
        let mut subs = self.subs.lock();
        if let Some(sub) = subs.get(name) {
            return Arc::clone(sub);
        }

        let codec = self.codec.child(name);
        debug!(name, prefix = codec.prefix(), "Opened namespace");
        let sub = Arc::new(Self::new(Arc::clone(&self.shared), codec));
        subs.insert(name.to_owned(), Arc::clone(&sub));
        sub
    }
}
