//! Container for all loaded vocabulary items, with the browse filters used by the UI.
use super::{CefrLevel, VocabularyItem};
use serde::{Deserialize, Serialize};

#[derive(Clone, Default, Serialize, Deserialize)]
pub struct VocabularySet {
    pub items: Vec<VocabularyItem>,
}

/// Category/level filter. `None` means "all".
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VocabularyFilter {
    pub category: Option<String>,
    pub level: Option<CefrLevel>,
}

impl VocabularyFilter {
    pub fn matches(&self, item: &VocabularyItem) -> bool {
        let category_ok = self
            .category
            .as_deref()
            .is_none_or(|category| item.category == category);
        let level_ok = self.level.is_none_or(|level| item.level == level);
        category_ok && level_ok
    }
}

impl VocabularySet {
    pub fn new(items: Vec<VocabularyItem>) -> Self {
        Self { items }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&VocabularyItem> {
        self.items.iter().find(|item| item.id == id)
    }

    /// Adds the item, replacing an existing one with the same id.
    pub fn upsert(&mut self, item: VocabularyItem) {
        match self.items.iter_mut().find(|existing| existing.id == item.id) {
            Some(existing) => *existing = item,
            None => self.items.push(item),
        }
    }

    /// Sorted, de-duplicated category names.
    pub fn categories(&self) -> Vec<String> {
        let mut categories: Vec<String> = self.items.iter().map(|i| i.category.clone()).collect();
        categories.sort();
        categories.dedup();
        categories
    }

    pub fn filtered<'a>(
        &'a self,
        filter: &'a VocabularyFilter,
    ) -> impl Iterator<Item = &'a VocabularyItem> + 'a {
        self.items.iter().filter(move |item| filter.matches(item))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_set() -> VocabularySet {
        VocabularySet::new(vec![
            VocabularyItem::new("hlyab", "хляб", "Brot", "food", CefrLevel::A1),
            VocabularyItem::new("kashta", "къща", "Haus", "home", CefrLevel::A1),
            VocabularyItem::new("vecherya", "вечеря", "Abendessen", "food", CefrLevel::A2),
        ])
    }

    #[test]
    fn test_categories_sorted_unique() {
        assert_eq!(sample_set().categories(), vec!["food", "home"]);
    }

    #[test]
    fn test_filter_by_category_and_level() {
        let set = sample_set();

        let all = VocabularyFilter::default();
        assert_eq!(set.filtered(&all).count(), 3);

        let food = VocabularyFilter {
            category: Some("food".to_string()),
            level: None,
        };
        assert_eq!(set.filtered(&food).count(), 2);

        let food_a2 = VocabularyFilter {
            category: Some("food".to_string()),
            level: Some(CefrLevel::A2),
        };
        let ids: Vec<_> = set.filtered(&food_a2).map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["vecherya"]);
    }

    #[test]
    fn test_upsert_replaces_existing() {
        let mut set = sample_set();
        set.upsert(VocabularyItem::new("hlyab", "хляб", "das Brot", "food", CefrLevel::A1));
        assert_eq!(set.len(), 3);
        assert_eq!(set.get("hlyab").unwrap().german, "das Brot");

        set.upsert(VocabularyItem::new("voda", "вода", "Wasser", "food", CefrLevel::A1));
        assert_eq!(set.len(), 4);
    }
}
