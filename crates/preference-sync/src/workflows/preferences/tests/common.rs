use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use axum::response::Response;
use serde_json::Value;

use crate::workflows::preferences::{
    boundary, ItemId, PreferenceList, PreferenceSession, RecordingSink, SharedSession,
};

pub(super) fn list_of(items: &[&str]) -> PreferenceList {
    let mut list = PreferenceList::new();
    for item in items {
        list.add(ItemId::new(*item)).expect("distinct items add");
    }
    list.take_row_ops();
    list
}

pub(super) fn ranks(list: &PreferenceList) -> Vec<(String, u32)> {
    list.entries()
        .iter()
        .map(|entry| (entry.item_id().to_string(), entry.rank()))
        .collect()
}

pub(super) fn expected(pairs: &[(&str, u32)]) -> Vec<(String, u32)> {
    pairs
        .iter()
        .map(|(item, rank)| (item.to_string(), *rank))
        .collect()
}

/// Asserts every structural invariant of the list, including move legality.
pub(super) fn assert_consistent(list: &PreferenceList) {
    let entries = list.entries();
    let len = entries.len();
    assert_eq!(list.total_count(), len, "total count tracks entry count");

    let mut items = HashSet::new();
    let mut rows = HashSet::new();
    for (index, entry) in entries.iter().enumerate() {
        assert_eq!(entry.rank() as usize, index + 1, "display order equals rank order");
        let record = entry.record();
        assert_eq!(record.index, index, "record index equals rank - 1");
        assert_eq!(record.rank, Some(entry.rank()), "record mirrors rank");
        assert_eq!(record.item_id.as_ref(), Some(entry.item_id()), "record mirrors item");
        assert!(items.insert(entry.item_id().clone()), "items are unique");
        assert!(rows.insert(entry.row()), "rows are unique");
        assert_eq!(
            entry.controls(),
            boundary::controls_for(index, len),
            "move controls match position"
        );
    }

    for slot in list.empty_slots() {
        assert!(slot.record.is_empty());
        assert!(slot.record.index >= len, "empty slots sit after every entry");
        assert!(list.band().contains(slot.record.index));
        assert!(rows.insert(slot.row), "slot rows are distinct from entry rows");
    }
}

pub(super) fn session_of(items: &[&str]) -> PreferenceSession<RecordingSink> {
    PreferenceSession::new(list_of(items), RecordingSink::default())
}

pub(super) fn shared_session(items: &[&str]) -> SharedSession<RecordingSink> {
    Arc::new(Mutex::new(session_of(items)))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("body readable");
    serde_json::from_slice(&body).expect("body is json")
}
