use library_core::db::open_db_in_memory;
use library_core::{
    BorrowerInput, EntityKind, ErrorKind, RegistryService, ServiceError, SqliteBorrowerRepository,
};
use rusqlite::Connection;

fn setup() -> Connection {
    open_db_in_memory().unwrap()
}

fn registry(conn: &Connection) -> RegistryService<SqliteBorrowerRepository<'_>> {
    RegistryService::new(SqliteBorrowerRepository::try_new(conn).unwrap())
}

#[test]
fn add_borrower_persists_contact_fields() {
    let conn = setup();
    let service = registry(&conn);

    let borrower = service
        .add_borrower(
            BorrowerInput::new("John Doe")
                .with_email("john@example.com")
                .with_phone("555-1234"),
        )
        .unwrap();

    assert_eq!(borrower.name, "John Doe");
    assert_eq!(borrower.email.as_deref(), Some("john@example.com"));
    assert_eq!(borrower.phone.as_deref(), Some("555-1234"));
    assert_eq!(service.get_borrower(borrower.id).unwrap(), borrower);
}

#[test]
fn add_borrower_requires_name() {
    let conn = setup();
    let service = registry(&conn);

    let err = service
        .add_borrower(BorrowerInput::new(" ").with_email("x@example.com"))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert!(service.list_borrowers().unwrap().is_empty());
}

#[test]
fn duplicate_email_is_a_conflict_on_add_and_update() {
    let conn = setup();
    let service = registry(&conn);
    service
        .add_borrower(BorrowerInput::new("John Doe").with_email("john@example.com"))
        .unwrap();
    let jane = service
        .add_borrower(BorrowerInput::new("Jane Smith").with_email("jane@example.com"))
        .unwrap();

    let err = service
        .add_borrower(BorrowerInput::new("Johnny").with_email("john@example.com"))
        .unwrap_err();
    assert!(matches!(err, ServiceError::Conflict { field: "email", .. }));

    let err = service
        .update_borrower(
            jane.id,
            BorrowerInput::new("Jane Smith").with_email("john@example.com"),
        )
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert_eq!(
        service.get_borrower(jane.id).unwrap().email.as_deref(),
        Some("jane@example.com")
    );
}

#[test]
fn borrowers_without_email_do_not_conflict() {
    let conn = setup();
    let service = registry(&conn);

    service.add_borrower(BorrowerInput::new("Anon")).unwrap();
    service
        .add_borrower(BorrowerInput::new("Anon").with_email(""))
        .unwrap();

    assert_eq!(service.list_borrowers().unwrap().len(), 2);
}

#[test]
fn update_borrower_replaces_all_fields() {
    let conn = setup();
    let service = registry(&conn);
    let borrower = service
        .add_borrower(BorrowerInput::new("Jane").with_phone("555-5678"))
        .unwrap();

    let updated = service
        .update_borrower(
            borrower.id,
            BorrowerInput::new("Jane Smith").with_email("jane@example.com"),
        )
        .unwrap();

    assert_eq!(updated.name, "Jane Smith");
    assert_eq!(updated.email.as_deref(), Some("jane@example.com"));
    assert_eq!(updated.phone, None);
    assert_eq!(updated.created_at, borrower.created_at);
}

#[test]
fn update_and_delete_report_missing_borrower() {
    let conn = setup();
    let service = registry(&conn);

    let err = service
        .update_borrower(9, BorrowerInput::new("Nobody"))
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::NotFound {
            entity: EntityKind::Borrower,
            id: 9
        }
    ));
    assert_eq!(
        service.delete_borrower(9).unwrap_err().kind(),
        ErrorKind::NotFound
    );
}

#[test]
fn list_borrowers_orders_by_name() {
    let conn = setup();
    let service = registry(&conn);
    for name in ["Zoe", "adam", "Mia"] {
        service.add_borrower(BorrowerInput::new(name)).unwrap();
    }

    let names: Vec<String> = service
        .list_borrowers()
        .unwrap()
        .into_iter()
        .map(|borrower| borrower.name)
        .collect();
    assert_eq!(names, vec!["adam", "Mia", "Zoe"]);
}
