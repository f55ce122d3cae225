//! Watchable configuration store
//!
//! Owns the configuration set a host edits and keeps the layered view
//! current: every mutation stages a copy, validates it, recomputes the
//! layers from scratch and broadcasts change events to all subscribers.
//! A mutation that fails validation (unknown id, self-association,
//! cycle) leaves the store exactly as it was.

use crossbeam::channel::{unbounded, Receiver, Sender};

use crate::stack::{
    layer_stacks, AssociationId, ConfigId, ConfigurationSet, Layer, PlaylistAssociation,
    PlaylistConfiguration, StackError, StackResult,
};

/// Change notifications sent to every store subscriber
#[derive(Debug, Clone)]
pub enum StackEvent {
    /// The configuration set changed (add, remove, connect, ...)
    ConfigurationsChanged { revision: u64 },
    /// The layered view was recomputed for a new revision
    LayersChanged { revision: u64, layers: Vec<Layer> },
}

/// In-memory store over a configuration set with change subscriptions
pub struct StackStore {
    set: ConfigurationSet,
    layers: Vec<Layer>,
    revision: u64,
    subscribers: Vec<Sender<StackEvent>>,
    next_playlist: u64,
    next_association: u64,
}

impl StackStore {
    /// Empty store at revision 0
    pub fn new() -> Self {
        Self {
            set: ConfigurationSet::new(),
            layers: Vec::new(),
            revision: 0,
            subscribers: Vec::new(),
            next_playlist: 0,
            next_association: 0,
        }
    }

    /// Store over an existing set, e.g. loaded from a snapshot.
    /// Fails if the set does not validate.
    pub fn with_set(set: ConfigurationSet) -> StackResult<Self> {
        let layers = layer_stacks(&set)?;
        Ok(Self {
            set,
            layers,
            revision: 0,
            subscribers: Vec::new(),
            next_playlist: 0,
            next_association: 0,
        })
    }

    /// Subscribe to change events. Every subscriber receives every event;
    /// dropped receivers are pruned on the next broadcast.
    pub fn subscribe(&mut self) -> Receiver<StackEvent> {
        let (tx, rx) = unbounded();
        self.subscribers.push(tx);
        rx
    }

    pub fn set(&self) -> &ConfigurationSet {
        &self.set
    }

    /// The layered view for the current revision
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Add a plain playlist configuration with a generated id
    pub fn add_playlist(
        &mut self,
        name: &str,
        spotify_playlist_id: Option<String>,
    ) -> StackResult<ConfigId> {
        let id = self.next_playlist_id();
        let mut config = PlaylistConfiguration::new(id.clone(), name);
        config.spotify_playlist_id = spotify_playlist_id;

        let mut staged = self.set.clone();
        staged.insert(config)?;
        self.commit(staged)?;
        Ok(id)
    }

    /// Add a configuration the caller already has (imported data).
    /// The whole staged set is revalidated, so a configuration arriving
    /// with bad associations is rejected as a unit.
    pub fn add_existing(&mut self, config: PlaylistConfiguration) -> StackResult<()> {
        let mut staged = self.set.clone();
        staged.insert(config)?;
        self.commit(staged)
    }

    pub fn rename(&mut self, id: &ConfigId, name: &str) -> StackResult<()> {
        let mut staged = self.set.clone();
        let config = staged
            .get_mut(id)
            .ok_or_else(|| StackError::UnknownConfiguration { id: id.clone() })?;
        config.name = name.to_string();
        self.commit(staged)
    }

    pub fn set_spotify_id(
        &mut self,
        id: &ConfigId,
        spotify_playlist_id: Option<String>,
    ) -> StackResult<()> {
        let mut staged = self.set.clone();
        let config = staged
            .get_mut(id)
            .ok_or_else(|| StackError::UnknownConfiguration { id: id.clone() })?;
        config.spotify_playlist_id = spotify_playlist_id;
        self.commit(staged)
    }

    /// Set the track-merge order of a mixstack. Every entry must name an
    /// existing configuration; entries may go stale later and are then
    /// ignored by the planner.
    pub fn set_playlist_order(&mut self, id: &ConfigId, order: Vec<ConfigId>) -> StackResult<()> {
        let mut staged = self.set.clone();
        for entry in &order {
            if !staged.contains(entry) {
                return Err(StackError::UnknownConfiguration { id: entry.clone() });
            }
        }
        let config = staged
            .get_mut(id)
            .ok_or_else(|| StackError::UnknownConfiguration { id: id.clone() })?;
        config.playlist_order = order;
        self.commit(staged)
    }

    /// Create a parent -> child association.
    ///
    /// The association is written into both endpoints' lists (the
    /// resolved shape) and the parent becomes a mixstack. Fails without
    /// side effects on unknown ids, self-association, or a resulting
    /// cycle.
    pub fn connect(&mut self, parent: &ConfigId, child: &ConfigId) -> StackResult<AssociationId> {
        if parent == child {
            return Err(StackError::SelfAssociation { id: parent.clone() });
        }
        if !self.set.contains(parent) {
            return Err(StackError::UnknownConfiguration { id: parent.clone() });
        }
        if !self.set.contains(child) {
            return Err(StackError::UnknownConfiguration { id: child.clone() });
        }

        let association_id = self.next_association_id();
        let association = PlaylistAssociation::new(
            association_id.clone(),
            Some(parent.clone()),
            Some(child.clone()),
        );

        let mut staged = self.set.clone();
        if let Some(config) = staged.get_mut(parent) {
            config.associations.push(association.clone());
            config.is_mixstack = true;
        }
        if let Some(config) = staged.get_mut(child) {
            config.associations.push(association);
        }

        self.commit(staged)?;
        Ok(association_id)
    }

    /// Remove every association between the pair, from both lists
    pub fn disconnect(&mut self, parent: &ConfigId, child: &ConfigId) -> StackResult<()> {
        if !self.set.contains(parent) {
            return Err(StackError::UnknownConfiguration { id: parent.clone() });
        }
        if !self.set.contains(child) {
            return Err(StackError::UnknownConfiguration { id: child.clone() });
        }

        let mut staged = self.set.clone();
        for endpoint in [parent, child] {
            if let Some(config) = staged.get_mut(endpoint) {
                config.associations.retain(|a| {
                    !(a.parent_id.as_ref() == Some(parent) && a.child_id.as_ref() == Some(child))
                });
            }
        }
        self.commit(staged)
    }

    /// Remove a configuration and every reference to it: associations in
    /// other configurations' lists and playlist_order entries
    pub fn remove(&mut self, id: &ConfigId) -> StackResult<()> {
        let mut staged = self.set.clone();
        if staged.remove(id).is_none() {
            return Err(StackError::UnknownConfiguration { id: id.clone() });
        }

        let remaining: Vec<ConfigId> = staged.ids().cloned().collect();
        for other in remaining {
            if let Some(config) = staged.get_mut(&other) {
                config
                    .associations
                    .retain(|a| a.parent_id.as_ref() != Some(id) && a.child_id.as_ref() != Some(id));
                config.playlist_order.retain(|entry| entry != id);
            }
        }
        self.commit(staged)
    }

    /// Replace the whole set, e.g. after loading a snapshot
    pub fn replace_all(&mut self, set: ConfigurationSet) -> StackResult<()> {
        self.commit(set)
    }

    /// Validate the staged set, recompute layers, swap it in, notify.
    /// On error nothing is swapped and no event goes out.
    fn commit(&mut self, staged: ConfigurationSet) -> StackResult<()> {
        let layers = layer_stacks(&staged)?;
        self.set = staged;
        self.layers = layers;
        self.revision += 1;
        self.broadcast();
        Ok(())
    }

    fn broadcast(&mut self) {
        let revision = self.revision;
        let configs_event = StackEvent::ConfigurationsChanged { revision };
        let layers_event = StackEvent::LayersChanged {
            revision,
            layers: self.layers.clone(),
        };
        self.subscribers.retain(|tx| {
            tx.send(configs_event.clone()).is_ok() && tx.send(layers_event.clone()).is_ok()
        });
        log::debug!(
            "broadcast: revision {} to {} subscribers",
            revision,
            self.subscribers.len()
        );
    }

    fn next_playlist_id(&mut self) -> ConfigId {
        loop {
            self.next_playlist += 1;
            let candidate = ConfigId::new(format!("p{}", self.next_playlist));
            if !self.set.contains(&candidate) {
                return candidate;
            }
        }
    }

    fn next_association_id(&mut self) -> AssociationId {
        self.next_association += 1;
        AssociationId::new(format!("a{}", self.next_association))
    }
}

impl Default for StackStore {
    fn default() -> Self {
        Self::new()
    }
}
