use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Id of a marker inside the native map layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NativeMarkerId(pub String);

impl std::fmt::Display for NativeMarkerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NativeMarkerId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MarkerHandle {
    pub app_id: String,
    pub native_id: NativeMarkerId,
}

/// A bijection between app marker ids and native marker ids, with a value stored per pair.
/// Both lookup directions are only ever changed together, so every native id maps to exactly one
/// app id and back.
#[derive(Debug)]
pub struct MarkerIdMap<V> {
    forward: HashMap<String, (NativeMarkerId, V)>,
    reverse: HashMap<NativeMarkerId, String>,
}

impl<V> Default for MarkerIdMap<V> {
    fn default() -> Self {
        Self {
            forward: Default::default(),
            reverse: Default::default(),
        }
    }
}

impl<V> MarkerIdMap<V> {
    /// Binds `app_id` to `native_id`.
    /// Pairs that used either id before are unbound and returned, so that the caller can clean
    /// up their native markers.
    pub fn insert(
        &mut self,
        app_id: String,
        native_id: NativeMarkerId,
        value: V,
    ) -> Vec<(MarkerHandle, V)> {
        let mut displaced = vec![];
        if let Some(old) = self.remove(&app_id) {
            displaced.push(old);
        }
        if let Some(other_app) = self.reverse.get(&native_id).cloned() {
            if let Some(old) = self.remove(&other_app) {
                displaced.push(old);
            }
        }
        self.reverse.insert(native_id.clone(), app_id.clone());
        self.forward.insert(app_id, (native_id, value));
        displaced
    }

    pub fn remove(&mut self, app_id: &str) -> Option<(MarkerHandle, V)> {
        let (app_id, (native_id, value)) = self.forward.remove_entry(app_id)?;
        self.reverse.remove(&native_id);
        Some((MarkerHandle { app_id, native_id }, value))
    }

    pub fn native_id(&self, app_id: &str) -> Option<&NativeMarkerId> {
        self.forward.get(app_id).map(|(native, _)| native)
    }

    pub fn app_id(&self, native_id: &NativeMarkerId) -> Option<&str> {
        self.reverse.get(native_id).map(String::as_str)
    }

    pub fn handle(&self, app_id: &str) -> Option<MarkerHandle> {
        self.native_id(app_id).map(|native_id| MarkerHandle {
            app_id: app_id.to_owned(),
            native_id: native_id.clone(),
        })
    }

    pub fn get(&self, app_id: &str) -> Option<(&NativeMarkerId, &V)> {
        self.forward.get(app_id).map(|(native, value)| (native, value))
    }

    pub fn get_mut(&mut self, app_id: &str) -> Option<(&NativeMarkerId, &mut V)> {
        self.forward
            .get_mut(app_id)
            .map(|(native, value)| (&*native, value))
    }

    /// looks up the value through the native id
    pub fn get_by_native(&self, native_id: &NativeMarkerId) -> Option<(&str, &V)> {
        let app_id = self.reverse.get(native_id)?;
        let (_, value) = self.forward.get(app_id)?;
        Some((app_id.as_str(), value))
    }

    pub fn contains(&self, app_id: &str) -> bool {
        self.forward.contains_key(app_id)
    }

    pub fn len(&self) -> usize {
        self.forward.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &NativeMarkerId, &V)> {
        self.forward
            .iter()
            .map(|(app, (native, value))| (app.as_str(), native, value))
    }

    /// true if both directions describe the same set of pairs
    pub fn is_consistent(&self) -> bool {
        self.forward.len() == self.reverse.len()
            && self
                .forward
                .iter()
                .all(|(app, (native, _))| self.reverse.get(native) == Some(app))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use similar_asserts::assert_eq;

    fn native(id: &str) -> NativeMarkerId {
        NativeMarkerId::from(id)
    }

    #[test]
    fn insert_then_remove_leaves_nothing() {
        let mut map = MarkerIdMap::default();
        assert!(map.insert("a".into(), native("m0"), 1).is_empty());
        assert_eq!(map.app_id(&native("m0")), Some("a"));
        assert_eq!(map.native_id("a"), Some(&native("m0")));
        let (handle, value) = map.remove("a").unwrap();
        assert_eq!(
            handle,
            MarkerHandle {
                app_id: "a".into(),
                native_id: native("m0")
            }
        );
        assert_eq!(value, 1);
        assert!(map.is_empty());
        assert_eq!(map.app_id(&native("m0")), None);
        assert!(map.is_consistent());
    }

    #[test]
    fn rebinding_an_app_id_frees_the_old_native_id() {
        let mut map = MarkerIdMap::default();
        map.insert("a".into(), native("m0"), 1);
        let displaced = map.insert("a".into(), native("m1"), 2);
        assert_eq!(displaced.len(), 1);
        assert_eq!(displaced[0].0.native_id, native("m0"));
        assert_eq!(map.app_id(&native("m0")), None);
        assert_eq!(map.app_id(&native("m1")), Some("a"));
        assert_eq!(map.len(), 1);
        assert!(map.is_consistent());
    }

    #[test]
    fn rebinding_a_native_id_frees_the_old_app_id() {
        let mut map = MarkerIdMap::default();
        map.insert("a".into(), native("m0"), ());
        map.insert("b".into(), native("m1"), ());
        let displaced = map.insert("b".into(), native("m0"), ());
        // both b -> m1 and a -> m0 are gone
        assert_eq!(displaced.len(), 2);
        assert!(!map.contains("a"));
        assert_eq!(map.app_id(&native("m0")), Some("b"));
        assert_eq!(map.app_id(&native("m1")), None);
        assert!(map.is_consistent());
    }

    #[test]
    fn remove_unknown_is_none() {
        let mut map: MarkerIdMap<()> = MarkerIdMap::default();
        assert!(map.remove("ghost").is_none());
        assert!(map.is_consistent());
    }

    #[test]
    fn values_are_reachable_from_both_sides() {
        let mut map = MarkerIdMap::default();
        map.insert("a".into(), native("m0"), 10);
        if let Some((_, value)) = map.get_mut("a") {
            *value += 1;
        }
        assert_eq!(map.get_by_native(&native("m0")), Some(("a", &11)));
        assert_eq!(map.get("a").map(|(_, v)| *v), Some(11));
    }
}
