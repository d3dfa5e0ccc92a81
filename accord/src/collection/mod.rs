//! In-memory record arrays with a derived filtered view.

use crate::error::{AccordError, Result};
use crate::filter::{FilterContext, Filtered, RecordFilter};
use crate::schema::{Record, RecordId};
use crate::store::Store;
use crate::validation::ValidationErrors;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

/// The authoritative array for one record type plus its filtered view.
#[derive(Debug, Clone)]
pub struct Collection<R: Filtered> {
    items: Vec<R>,
    /// Indices into `items`, in collection order.
    filtered: Vec<usize>,
    filter: R::Filter,
    ctx: FilterContext,
}

impl<R: Filtered> Collection<R> {
    pub fn load(store: &Store, ctx: FilterContext) -> Result<Self> {
        let data = store.load_data()?;
        let items = R::slice(&data).clone();
        log::debug!("loaded {} {}", items.len(), R::ENTITY.collection_name());
        Ok(Self::from_items(items, ctx))
    }

    pub fn from_items(items: Vec<R>, ctx: FilterContext) -> Self {
        let filtered = (0..items.len()).collect();
        Collection {
            items,
            filtered,
            filter: R::Filter::default(),
            ctx,
        }
    }

    /// Re-read from the store and clear the filter.
    pub fn reload(&mut self, store: &Store) -> Result<()> {
        let data = store.load_data()?;
        self.items = R::slice(&data).clone();
        self.filter = R::Filter::default();
        self.filtered = (0..self.items.len()).collect();
        Ok(())
    }

    pub fn items(&self) -> &[R] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn filtered(&self) -> Vec<&R> {
        self.filtered.iter().filter_map(|&i| self.items.get(i)).collect()
    }

    pub fn filter(&self) -> &R::Filter {
        &self.filter
    }

    pub fn context(&self) -> &FilterContext {
        &self.ctx
    }

    pub fn get(&self, id: RecordId) -> Option<&R> {
        self.items.iter().find(|r| r.id() == id)
    }

    pub fn require(&self, id: RecordId) -> Result<&R> {
        self.get(id)
            .ok_or_else(|| AccordError::not_found(R::ENTITY.collection_name(), id))
    }

    pub fn set_filter(&mut self, filter: R::Filter, ctx: FilterContext) {
        self.filter = filter;
        self.refresh(ctx);
    }

    /// Recompute the filtered view, e.g. after the date changed.
    pub fn refresh(&mut self, ctx: FilterContext) {
        self.ctx = ctx;
        self.filtered = self.filter.apply(&self.items, &self.ctx);
    }

    /// Append `record` under a fresh id derived from `now`.
    pub fn insert(&mut self, store: &Store, mut record: R, now: DateTime<Utc>) -> Result<RecordId> {
        let id = next_id(&self.items, now);
        record.set_id(id);
        let mut items = self.items.clone();
        items.push(record);
        self.commit(store, items)?;
        log::info!("created {} {id}", R::ENTITY);
        Ok(id)
    }

    /// Merge an allow-listed patch over the stored record.
    pub fn update(&mut self, store: &Store, id: RecordId, patch: &Map<String, Value>) -> Result<R> {
        let index = self.index_of(id)?;
        let updated = merge_patch(&self.items[index], patch)?;
        let mut items = self.items.clone();
        items[index] = updated.clone();
        self.commit(store, items)?;
        log::info!("updated {} {id}", R::ENTITY);
        Ok(updated)
    }

    /// Swap in a whole record with the same id.
    pub fn replace(&mut self, store: &Store, record: R) -> Result<()> {
        let id = record.id();
        let index = self.index_of(id)?;
        let mut items = self.items.clone();
        items[index] = record;
        self.commit(store, items)?;
        log::info!("replaced {} {id}", R::ENTITY);
        Ok(())
    }

    pub fn delete(&mut self, store: &Store, id: RecordId) -> Result<R> {
        let index = self.index_of(id)?;
        let mut items = self.items.clone();
        let removed = items.remove(index);
        self.commit(store, items)?;
        log::info!("deleted {} {id}", R::ENTITY);
        Ok(removed)
    }

    fn index_of(&self, id: RecordId) -> Result<usize> {
        self.items
            .iter()
            .position(|r| r.id() == id)
            .ok_or_else(|| AccordError::not_found(R::ENTITY.collection_name(), id))
    }

    fn commit(&mut self, store: &Store, items: Vec<R>) -> Result<()> {
        store.update_data(|data| {
            *R::slice_mut(data) = items.clone();
            Ok(())
        })?;
        self.items = items;
        self.filtered = self.filter.apply(&self.items, &self.ctx);
        Ok(())
    }
}

/// Millisecond timestamp of `now`, bumped past any id already taken.
pub fn next_id<R: Record>(existing: &[R], now: DateTime<Utc>) -> RecordId {
    let mut id = now.timestamp_millis();
    while existing.iter().any(|r| r.id() == id) {
        id += 1;
    }
    id
}

/// Shallow merge of `patch` over `record`.
///
/// Keys must be in the record's field list; `id` is rejected and JSON
/// nulls leave the existing value in place.
pub fn merge_patch<R: Record>(record: &R, patch: &Map<String, Value>) -> Result<R> {
    let mut errors = ValidationErrors::new();
    for key in patch.keys() {
        if key == "id" {
            errors.add(key, "id cannot be changed");
        } else if R::field(key).is_none() {
            errors.add(key, format!("Unknown field '{key}'"));
        }
    }
    errors.into_result()?;

    let mut value = serde_json::to_value(record)?;
    if let Value::Object(ref mut map) = value {
        for (key, v) in patch {
            if !v.is_null() {
                map.insert(key.clone(), v.clone());
            }
        }
    }
    serde_json::from_value(value).map_err(|e| {
        let mut errors = ValidationErrors::new();
        errors.add("record", e.to_string());
        AccordError::Validation(errors)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;
    use crate::schema::{Donation, Member};
    use chrono::{NaiveDate, TimeZone};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn ctx() -> FilterContext {
        FilterContext::new(NaiveDate::from_ymd_opt(2024, 5, 15).unwrap())
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 15, 10, 0, 0).unwrap()
    }

    fn member(first: &str) -> Member {
        Member {
            first_name: first.into(),
            last_name: "Ansah".into(),
            membership_status: "Active".into(),
            ..Default::default()
        }
    }

    fn setup_members(store: &Store, names: &[&str]) -> Collection<Member> {
        let mut members = Collection::<Member>::load(store, ctx()).unwrap();
        for name in names {
            members.insert(store, member(name), now()).unwrap();
        }
        members
    }

    fn patch(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_insert_assigns_unique_ids_in_same_millisecond() {
        let store = Store::in_memory();
        let members = setup_members(&store, &["Kofi", "Ama", "Yaw"]);
        let ids: Vec<RecordId> = members.items().iter().map(|m| m.id).collect();
        let base = now().timestamp_millis();
        assert_eq!(ids, vec![base, base + 1, base + 2]);
    }

    #[test]
    fn test_save_and_reload_round_trip() {
        let store = Store::in_memory();
        let members = setup_members(&store, &["Kofi", "Ama"]);
        let reloaded = Collection::<Member>::load(&store, ctx()).unwrap();
        assert_eq!(reloaded.items(), members.items());
    }

    #[test]
    fn test_delete_keeps_relative_order() {
        let store = Store::in_memory();
        let mut members = setup_members(&store, &["A", "B", "C", "D"]);
        let target = members.items()[1].id;

        let removed = members.delete(&store, target).unwrap();
        assert_eq!(removed.first_name, "B");

        let names: Vec<&str> = members.items().iter().map(|m| m.first_name.as_str()).collect();
        assert_eq!(names, vec!["A", "C", "D"]);
        let stored = store.load_data().unwrap();
        assert_eq!(stored.members, members.items());
    }

    #[test]
    fn test_missing_record_is_not_found() {
        let store = Store::in_memory();
        let mut members = setup_members(&store, &["A"]);
        assert!(matches!(
            members.delete(&store, 42),
            Err(AccordError::NotFound { .. })
        ));
        assert!(matches!(
            members.update(&store, 42, &Map::new()),
            Err(AccordError::NotFound { .. })
        ));
    }

    #[test]
    fn test_update_merges_and_skips_nulls() {
        let store = Store::in_memory();
        let mut members = setup_members(&store, &["Kofi"]);
        let id = members.items()[0].id;

        let updated = members
            .update(
                &store,
                id,
                &patch(json!({"email": "kofi@example.org", "lastName": null})),
            )
            .unwrap();
        assert_eq!(updated.email, "kofi@example.org");
        assert_eq!(updated.last_name, "Ansah");
        assert_eq!(store.load_data().unwrap().members[0].email, "kofi@example.org");
    }

    #[test]
    fn test_update_rejects_unknown_fields_and_id() {
        let store = Store::in_memory();
        let mut members = setup_members(&store, &["Kofi"]);
        let id = members.items()[0].id;

        let err = members
            .update(&store, id, &patch(json!({"isAdmin": true, "id": 7})))
            .unwrap_err();
        match err {
            AccordError::Validation(errors) => {
                assert!(errors.get("isAdmin").is_some());
                assert!(errors.get("id").is_some());
            }
            other => panic!("expected validation error, got {other:?}"),
        }
        assert_eq!(members.items()[0].id, id);
    }

    #[test]
    fn test_filter_view_follows_mutations() {
        let store = Store::in_memory();
        let mut members = setup_members(&store, &["Grace", "Hope"]);
        members.set_filter(
            crate::filter::MemberFilter {
                search: "grace".into(),
                ..Default::default()
            },
            ctx(),
        );
        assert_eq!(members.filtered().len(), 1);

        members.insert(&store, member("Gracelyn"), now()).unwrap();
        assert_eq!(members.filtered().len(), 2);

        members.reload(&store).unwrap();
        assert_eq!(members.filtered().len(), 3);
    }

    #[test]
    fn test_sections_owned_by_others_survive() {
        let store = Store::in_memory();
        setup_members(&store, &["A"]);
        let mut donations = Collection::<Donation>::load(&store, ctx()).unwrap();
        donations
            .insert(
                &store,
                Donation {
                    amount: Money::from_major(20),
                    ..Default::default()
                },
                now(),
            )
            .unwrap();

        let data = store.load_data().unwrap();
        assert_eq!(data.members.len(), 1);
        assert_eq!(data.donations.len(), 1);
    }
}
