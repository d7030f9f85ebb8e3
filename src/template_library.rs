use std::collections::HashMap;

use rand::seq::SliceRandom;

use crate::error::AssetError;

struct Entry<T> {
    id: usize,
    template: T,
}

/// Templates keyed by handle, with a dense id assigned in insertion order.
///
/// Ids are never reused. Upserting an existing handle replaces the template
/// but keeps its id.
pub struct TemplateLibrary<T> {
    name: &'static str,
    templates: HashMap<String, Entry<T>>,
    handles_by_id: Vec<String>,
}

impl<T> TemplateLibrary<T> {
    /// `name` is only used in log and error messages.
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            templates: HashMap::new(),
            handles_by_id: Vec::new(),
        }
    }

    pub fn upsert(&mut self, handle: impl Into<String>, template: T) -> usize {
        let handle = handle.into();
        if let Some(entry) = self.templates.get_mut(&handle) {
            entry.template = template;
            return entry.id;
        }
        let id = self.handles_by_id.len();
        self.handles_by_id.push(handle.clone());
        self.templates.insert(handle, Entry { id, template });
        id
    }

    pub fn get(&self, handle: &str) -> Option<&T> {
        self.templates.get(handle).map(|entry| &entry.template)
    }

    pub fn get_mut(&mut self, handle: &str) -> Option<&mut T> {
        self.templates.get_mut(handle).map(|entry| &mut entry.template)
    }

    pub fn contains(&self, handle: &str) -> bool {
        self.templates.contains_key(handle)
    }

    pub fn id_of(&self, handle: &str) -> Option<usize> {
        self.templates.get(handle).map(|entry| entry.id)
    }

    pub fn handle_by_id(&self, id: usize) -> Result<&str, AssetError> {
        self.handles_by_id
            .get(id)
            .map(|handle| handle.as_str())
            .ok_or_else(|| AssetError::not_found(self.name, format!("id {}", id)))
    }

    pub fn get_by_id(&self, id: usize) -> Result<&T, AssetError> {
        let handle = self.handle_by_id(id)?;
        self.get(handle)
            .ok_or_else(|| AssetError::not_found(self.name, handle))
    }

    pub fn len(&self) -> usize {
        self.handles_by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles_by_id.is_empty()
    }

    /// Handles in id order.
    pub fn handles(&self) -> impl Iterator<Item = &str> {
        self.handles_by_id.iter().map(|handle| handle.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.handles_by_id
            .iter()
            .filter_map(|handle| self.get(handle).map(|t| (handle.as_str(), t)))
    }

    pub fn random_handle(&self) -> Result<&str, AssetError> {
        self.random_handle_where(|_| true)
    }

    /// Uniformly picks one of the handles whose template passes `filter`.
    pub fn random_handle_where(&self, filter: impl Fn(&T) -> bool) -> Result<&str, AssetError> {
        let candidates: Vec<&str> = self
            .iter()
            .filter(|(_, template)| filter(*template))
            .map(|(handle, _)| handle)
            .collect();
        match candidates.choose(&mut rand::thread_rng()) {
            Some(handle) => Ok(*handle),
            None => {
                log::error!(
                    "Attempting to get a random {} handle but none are loaded",
                    self.name
                );
                Err(AssetError::EmptyLibrary(self.name))
            }
        }
    }

    /// All handles containing `query`, ignoring case. An empty query matches everything.
    pub fn handles_matching(&self, query: &str) -> Vec<String> {
        self.handles_matching_where(query, |_| true)
    }

    pub fn handles_matching_where(&self, query: &str, filter: impl Fn(&T) -> bool) -> Vec<String> {
        let query = query.to_lowercase();
        self.iter()
            .filter(|(_, template)| filter(*template))
            .filter(|(handle, _)| query.is_empty() || handle.to_lowercase().contains(&query))
            .map(|(handle, _)| handle.to_string())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_dense_and_stable() {
        let mut library = TemplateLibrary::new("test");
        assert_eq!(library.upsert("a", 1), 0);
        assert_eq!(library.upsert("b", 2), 1);
        assert_eq!(library.upsert("a", 3), 0);
        assert_eq!(library.len(), 2);
        assert_eq!(library.get("a"), Some(&3));
        assert_eq!(library.handle_by_id(1).unwrap(), "b");
        assert!(matches!(
            library.get_by_id(2),
            Err(AssetError::NotFound { .. })
        ));
    }

    #[test]
    fn id_and_handle_stay_a_bijection() {
        let mut library = TemplateLibrary::new("test");
        for round in 0..3 {
            for name in ["cube", "sphere", "cone", "cube"] {
                library.upsert(name, round);
            }
        }
        for (id, handle) in library.handles().enumerate() {
            assert_eq!(library.id_of(handle), Some(id));
        }
        assert_eq!(library.len(), 3);
    }

    #[test]
    fn random_handle_from_empty_library_fails() {
        let library = TemplateLibrary::<()>::new("empty");
        assert!(matches!(
            library.random_handle(),
            Err(AssetError::EmptyLibrary("empty"))
        ));
    }

    #[test]
    fn random_handle_respects_filter() {
        let mut library = TemplateLibrary::new("test");
        library.upsert("even", 2);
        library.upsert("odd", 3);
        for _ in 0..10 {
            assert_eq!(library.random_handle_where(|v| v % 2 == 1).unwrap(), "odd");
        }
        assert!(library.random_handle_where(|v| *v > 10).is_err());
    }

    #[test]
    fn substring_search_ignores_case() {
        let mut library = TemplateLibrary::new("test");
        library.upsert("data/Chair.phys_properties.json", ());
        library.upsert("data/table.phys_properties.json", ());
        assert_eq!(
            library.handles_matching("CHAIR"),
            vec!["data/Chair.phys_properties.json".to_string()]
        );
        assert_eq!(library.handles_matching("").len(), 2);
        assert!(library.handles_matching("lamp").is_empty());
        assert!(TemplateLibrary::<()>::new("empty").handles_matching("").is_empty());
    }
}
