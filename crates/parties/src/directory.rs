use std::collections::HashMap;

use controltower_core::Entity;

use crate::party::{Party, PartyId};

/// Id-keyed index of known parties.
#[derive(Debug, Default)]
pub struct Directory {
    parties: Vec<Party>,
    ix: HashMap<PartyId, usize>,
}

impl Directory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, party: Party) -> PartyId {
        let id = party.id();
        self.ix.insert(id, self.parties.len());
        self.parties.push(party);
        id
    }

    pub fn get(&self, id: PartyId) -> Option<&Party> {
        self.ix.get(&id).map(|&i| &self.parties[i])
    }

    /// Display name, falling back to the raw id for unknown parties.
    pub fn name_of(&self, id: PartyId) -> String {
        match self.get(id) {
            Some(party) => party.name().to_owned(),
            None => id.to_string(),
        }
    }
}
