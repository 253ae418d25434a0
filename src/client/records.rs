use std::collections::HashMap;

use uuid::Uuid;

use crate::backgrounds::repo::Background;
use crate::pictures::repo::Picture;
use crate::user_pictures::repo::UserPicture;

/// Anything a `RecordMap` can hold.
pub trait Keyed {
    fn key(&self) -> Uuid;
}

impl Keyed for Picture {
    fn key(&self) -> Uuid {
        self.id
    }
}

impl Keyed for UserPicture {
    fn key(&self) -> Uuid {
        self.id
    }
}

impl Keyed for Background {
    fn key(&self) -> Uuid {
        self.id
    }
}

/// Ordered, id-keyed cache of a server-owned collection. `set_all`
/// replaces, `add_one`/`add_many` merge: an existing id is updated in
/// place, a new id is appended, so iteration always preserves insertion
/// order.
#[derive(Debug)]
pub struct RecordMap<T: Keyed> {
    order: Vec<Uuid>,
    by_id: HashMap<Uuid, T>,
}

impl<T: Keyed> Default for RecordMap<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Keyed> RecordMap<T> {
    pub fn new() -> Self {
        Self {
            order: Vec::new(),
            by_id: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn get(&self, id: &Uuid) -> Option<&T> {
        self.by_id.get(id)
    }

    pub fn contains(&self, id: &Uuid) -> bool {
        self.by_id.contains_key(id)
    }

    /// Replaces the whole collection, taking the new insertion order.
    pub fn set_all(&mut self, records: Vec<T>) {
        self.order.clear();
        self.by_id.clear();
        self.add_many(records);
    }

    pub fn add_one(&mut self, record: T) {
        let id = record.key();
        if self.by_id.insert(id, record).is_none() {
            self.order.push(id);
        }
    }

    pub fn add_many(&mut self, records: Vec<T>) {
        for record in records {
            self.add_one(record);
        }
    }

    pub fn clear(&mut self) {
        self.order.clear();
        self.by_id.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.order.iter().filter_map(|id| self.by_id.get(id))
    }

    pub fn ids(&self) -> &[Uuid] {
        &self.order
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Rec {
        id: Uuid,
        label: &'static str,
    }

    impl Keyed for Rec {
        fn key(&self) -> Uuid {
            self.id
        }
    }

    fn rec(label: &'static str) -> Rec {
        Rec {
            id: Uuid::new_v4(),
            label,
        }
    }

    #[test]
    fn preserves_insertion_order() {
        let mut map = RecordMap::new();
        let (a, b, c) = (rec("a"), rec("b"), rec("c"));
        map.add_many(vec![a.clone(), b.clone(), c.clone()]);
        let labels: Vec<_> = map.iter().map(|r| r.label).collect();
        assert_eq!(labels, vec!["a", "b", "c"]);
    }

    #[test]
    fn add_one_merges_in_place() {
        let mut map = RecordMap::new();
        let a = rec("a");
        let b = rec("b");
        map.add_many(vec![a.clone(), b.clone()]);

        // Same id, new payload: position is kept.
        map.add_one(Rec {
            id: a.id,
            label: "a2",
        });
        let labels: Vec<_> = map.iter().map(|r| r.label).collect();
        assert_eq!(labels, vec!["a2", "b"]);
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn set_all_replaces() {
        let mut map = RecordMap::new();
        map.add_many(vec![rec("a"), rec("b")]);
        let c = rec("c");
        map.set_all(vec![c.clone()]);
        assert_eq!(map.len(), 1);
        assert_eq!(map.ids(), &[c.id]);
        assert!(map.get(&c.id).is_some());
    }
}
