use std::collections::HashMap;

use super::Shelter;

/// Shelter features keyed by id, in the order the data store returned them.
///
/// Ids are assumed unique; on a duplicate the first row wins.
#[derive(Debug, Clone, Default)]
pub struct ShelterCollection {
    features: Vec<Shelter>,
    index: HashMap<i64, usize>,
}

impl ShelterCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a shelter, returning `false` if its id was already present
    pub fn insert(&mut self, shelter: Shelter) -> bool {
        if self.index.contains_key(&shelter.id) {
            return false;
        }
        self.index.insert(shelter.id, self.features.len());
        self.features.push(shelter);
        true
    }

    pub fn get(&self, id: i64) -> Option<&Shelter> {
        self.index.get(&id).map(|&i| &self.features[i])
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Shelter> {
        self.features.iter()
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Total number of places across all shelters
    pub fn total_capacity(&self) -> i64 {
        self.features.iter().map(|s| s.capacity).sum()
    }
}

impl FromIterator<Shelter> for ShelterCollection {
    fn from_iter<I: IntoIterator<Item = Shelter>>(iter: I) -> Self {
        let mut collection = ShelterCollection::new();
        for shelter in iter {
            if !collection.insert(shelter) {
                log::warn!("Duplicate shelter id in data set, keeping first occurrence");
            }
        }
        collection
    }
}

impl<'a> IntoIterator for &'a ShelterCollection {
    type Item = &'a Shelter;
    type IntoIter = std::slice::Iter<'a, Shelter>;

    fn into_iter(self) -> Self::IntoIter {
        self.features.iter()
    }
}
