use dmail_core::{Mall, PaginationFilter, Record, User, DEFAULT_PAGE_SIZE};

#[test]
fn record_serialization_uses_expected_wire_fields() {
    let record = Record {
        id: Some(7),
        data: User::new("Alice", 30),
        created_at: 1_700_000_000_000,
        updated_at: None,
    };

    let json = serde_json::to_value(&record).unwrap();
    assert_eq!(json["id"], 7);
    assert_eq!(json["data"]["name"], "Alice");
    assert_eq!(json["data"]["age"], 30);
    assert_eq!(json["created_at"], 1_700_000_000_000_i64);
    assert!(json["updated_at"].is_null());

    let decoded: Record<User> = serde_json::from_value(json).unwrap();
    assert_eq!(decoded, record);
}

#[test]
fn create_payload_may_omit_identity_and_timestamps() {
    let payload: Record<Mall> =
        serde_json::from_str(r#"{"id": null, "data": {"name": "Central", "location": "Downtown"}}"#)
            .unwrap();
    assert_eq!(payload.id, None);
    assert_eq!(payload.data, Mall::new("Central", "Downtown"));
    assert_eq!(payload.updated_at, None);
}

#[test]
fn pagination_filter_reads_query_style_keys() {
    let page: PaginationFilter<User> =
        serde_json::from_str(r#"{"id": 5, "age": 30, "pn": 2, "ps": 25}"#).unwrap();
    assert_eq!(page.cursor_id, Some(5));
    assert_eq!(
        page.filter,
        User {
            name: None,
            age: Some(30)
        }
    );
    assert_eq!(page.page_number, 2);
    assert_eq!(page.page_size, 25);
}

#[test]
fn pagination_filter_defaults_missing_controls() {
    let mut page: PaginationFilter<Mall> =
        serde_json::from_str(r#"{"location": "Downtown"}"#).unwrap();
    assert_eq!(page.cursor_id, None);
    assert_eq!(page.filter.location.as_deref(), Some("Downtown"));
    assert_eq!(page.page_size, 0);

    page.set_defaults();
    assert_eq!(page.page_size, DEFAULT_PAGE_SIZE);
    assert_eq!(page.page_number, 0);
}
