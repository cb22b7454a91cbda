//! Name/identifier indexes and the interaction topology shared by the loaders.
//!
//! The gene and interaction-type indexes are two-column tab-separated files
//! (`<id>\t<name>`) written by the path-finding stage. [`InteractionStore`]
//! owns the interaction-type index together with the regulatory flags and
//! the adjacency of every interaction that appears in a loaded path.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::types::{GeneId, InteractionId, InteractionSet, InteractionTypeId, NeticError};

/// Bidirectional name <-> id map with ids starting at 1.
#[derive(Debug, Clone)]
pub struct IdMap<Id> {
    next_id: Id,
    id_to_name: BTreeMap<Id, String>,
    name_to_id: HashMap<String, Id>,
}

impl<Id> Default for IdMap<Id>
where
    Id: Copy + Ord + From<u8>,
{
    fn default() -> Self {
        Self {
            next_id: Id::from(1),
            id_to_name: BTreeMap::new(),
            name_to_id: HashMap::new(),
        }
    }
}

impl<Id> IdMap<Id>
where
    Id: Copy + Ord + From<u8> + std::ops::Add<Output = Id> + std::fmt::Display + std::str::FromStr,
{
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `name` with an explicit id.
    ///
    /// Re-registering the same pair is a no-op; a conflicting pair is an error.
    pub fn insert(&mut self, name: &str, id: Id) -> Result<Id, NeticError> {
        if let Some(&known) = self.name_to_id.get(name) {
            if known != id {
                return Err(NeticError::ParseError(format!(
                    "name {name} is registered with id {known}, not {id}"
                )));
            }
            return Ok(known);
        }
        if let Some(known) = self.id_to_name.get(&id) {
            return Err(NeticError::ParseError(format!(
                "id {id} is registered for {known}, not {name}"
            )));
        }
        if id >= self.next_id {
            self.next_id = id + Id::from(1);
        }
        self.id_to_name.insert(id, name.to_string());
        self.name_to_id.insert(name.to_string(), id);
        Ok(id)
    }

    /// Register `name` with the next free id, or return its existing id.
    pub fn register(&mut self, name: &str) -> Result<Id, NeticError> {
        match self.name_to_id.get(name) {
            Some(&known) => Ok(known),
            None => self.insert(name, self.next_id),
        }
    }

    #[must_use]
    pub fn id(&self, name: &str) -> Option<Id> {
        self.name_to_id.get(name).copied()
    }

    #[must_use]
    pub fn name(&self, id: Id) -> Option<&str> {
        self.id_to_name.get(&id).map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.id_to_name.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.id_to_name.is_empty()
    }

    /// Iterate `(id, name)` pairs in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = (Id, &str)> {
        self.id_to_name.iter().map(|(id, name)| (*id, name.as_str()))
    }

    /// Read an index file. A missing file yields an empty map.
    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self, NeticError> {
        let path = path.as_ref();
        let mut map = Self::new();
        if !path.exists() {
            tracing::warn!(file = %path.display(), "index file not found, using empty index");
            return Ok(map);
        }
        let reader = BufReader::new(File::open(path)?);
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let Some((id, name)) = line.split_once('\t') else {
                return Err(NeticError::ParseError(format!(
                    "index entries should have two columns: {line}"
                )));
            };
            let id = id
                .trim()
                .parse::<Id>()
                .map_err(|_| NeticError::ParseError(format!("id {id} is not a number")))?;
            map.insert(name, id)?;
        }
        Ok(map)
    }

    /// Index file contents, one `id\tname` line per entry in id order.
    #[must_use]
    pub fn to_lines(&self) -> Vec<String> {
        self.iter().map(|(id, name)| format!("{id}\t{name}")).collect()
    }
}

/// Gene name index.
pub type GeneIdMap = IdMap<GeneId>;

/// Interaction type index.
pub type InteractionTypeMap = IdMap<InteractionTypeId>;

/// Interaction types, their regulatory flags, and the topology of loaded interactions.
#[derive(Debug, Clone, Default)]
pub struct InteractionStore {
    interaction_types: InteractionTypeMap,
    regulatory: BTreeSet<InteractionTypeId>,
    outgoing: HashMap<GeneId, InteractionSet>,
    incoming: HashMap<GeneId, InteractionSet>,
    interaction_count: usize,
}

impl InteractionStore {
    #[must_use]
    pub fn new(interaction_types: InteractionTypeMap) -> Self {
        Self {
            interaction_types,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn interaction_types(&self) -> &InteractionTypeMap {
        &self.interaction_types
    }

    /// Flag the interaction type called `name` as regulatory.
    pub fn set_regulatory(&mut self, name: &str) -> Result<(), NeticError> {
        let id = self.interaction_types.id(name).ok_or_else(|| {
            NeticError::ConfigError(format!("unknown interaction type '{name}'"))
        })?;
        self.regulatory.insert(id);
        Ok(())
    }

    #[must_use]
    pub fn is_regulatory(&self, interaction: InteractionId) -> bool {
        self.regulatory.contains(&interaction.interaction_type())
    }

    /// Name of the interaction's type, if the type is indexed.
    #[must_use]
    pub fn interaction_type_name(&self, interaction: InteractionId) -> Option<&str> {
        self.interaction_types.name(interaction.interaction_type())
    }

    /// Record an interaction; returns `false` if it was already known.
    pub fn add_interaction(&mut self, interaction: InteractionId) -> bool {
        let added = self
            .outgoing
            .entry(interaction.from())
            .or_default()
            .insert(interaction);
        self.incoming
            .entry(interaction.to())
            .or_default()
            .insert(interaction);
        if added {
            self.interaction_count += 1;
        }
        added
    }

    #[must_use]
    pub fn interaction_count(&self) -> usize {
        self.interaction_count
    }

    #[must_use]
    pub fn gene_count(&self) -> usize {
        self.outgoing
            .keys()
            .chain(self.incoming.keys())
            .collect::<BTreeSet<_>>()
            .len()
    }

    /// Interactions leaving `gene`.
    pub fn outgoing(&self, gene: GeneId) -> impl Iterator<Item = InteractionId> + '_ {
        self.outgoing.get(&gene).into_iter().flatten().copied()
    }

    /// Interactions entering `gene`.
    pub fn incoming(&self, gene: GeneId) -> impl Iterator<Item = InteractionId> + '_ {
        self.incoming.get(&gene).into_iter().flatten().copied()
    }

    /// Annotation lines of the results file: `% <type name> regulatory|non-regulatory`.
    #[must_use]
    pub fn interaction_type_lines(&self) -> Vec<String> {
        self.interaction_types
            .iter()
            .map(|(id, name)| {
                let kind = if self.regulatory.contains(&id) {
                    "regulatory"
                } else {
                    "non-regulatory"
                };
                format!("% {name} {kind}")
            })
            .collect()
    }
}
