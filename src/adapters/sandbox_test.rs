use super::component_registry::InMemoryComponentRegistry;
use super::editor::{Affordance, FieldEdit};
use super::fixture_store::InMemoryFixtureStore;
use super::sandbox::SandboxSession;
use crate::domain::cursor::Cursor;
use crate::domain::error::{CursorError, SandboxError};
use crate::domain::{Component, FixtureSet, FixtureStore};
use crate::generation::static_config;
use crate::prop_types::{PropError, ValidatorLibrary};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;

async fn session() -> (SandboxSession, InMemoryFixtureStore) {
    let lib = Arc::new(ValidatorLibrary::new());
    lib.instrument();

    let registry = InMemoryComponentRegistry::new(Arc::clone(&lib));
    registry
        .register(
            Component::new("Card")
                .prop("title", lib.string().is_required())
                .prop("tags", lib.array_of(lib.string().is_required()))
                .prop("style", lib.shape([("color", lib.string())])),
        )
        .await;
    registry
        .register(Component::new("Badge").prop("count", lib.number().is_required()))
        .await;

    let store = InMemoryFixtureStore::with_fixtures(HashMap::from([(
        "Card".to_string(),
        FixtureSet::new(vec![json!({ "title": "Hello", "tags": ["a"] })]),
    )]));

    let session = SandboxSession::new(lib, Arc::new(registry), Arc::new(store.clone()));
    (session, store)
}

#[tokio::test]
async fn test_load_component_list() {
    let (session, _) = session().await;
    assert!(session.component_list().await.is_none());

    let list = session.load_component_list().await.unwrap();
    let names: Vec<_> = list.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["Badge", "Card"]);
    assert_eq!(session.component_list().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_select_loads_component_types_and_fixtures() {
    let (session, _) = session().await;
    session.select_component("Card").await.unwrap();

    assert_eq!(session.selected_key().await.as_deref(), Some("Card"));
    assert_eq!(session.component().await.unwrap().name, "Card");
    let types = session.inferred_types().await.unwrap();
    assert_eq!(types.keys().cloned().collect::<Vec<_>>(), vec!["style", "tags", "title"]);
    assert_eq!(session.fixtures().await.unwrap().len(), 1);

    let again = session.inferred_types().await.unwrap();
    assert!(Arc::ptr_eq(&types, &again));
}

#[tokio::test]
async fn test_select_unknown_component_fails() {
    let (session, _) = session().await;
    let err = session.select_component("Nope").await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<SandboxError>(),
        Some(SandboxError::ComponentNotFound(key)) if key == "Nope"
    ));
}

#[tokio::test]
async fn test_late_loads_for_a_previous_selection_are_ignored() {
    let (session, _) = session().await;
    session.select_component("Card").await.unwrap();
    session.select_component("Badge").await.unwrap();

    let stale = FixtureSet::new(vec![json!({ "title": "stale" })]);
    assert!(!session.fixtures_did_load("Card", stale).await);
    assert!(!session.component_did_load("Card", Arc::new(Component::new("Card"))).await);

    assert_eq!(session.selected_key().await.as_deref(), Some("Badge"));
    assert_eq!(session.component().await.unwrap().name, "Badge");
    assert!(session.fixtures().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_update_fixture_by_cursor() {
    let (session, _) = session().await;
    session.select_component("Card").await.unwrap();

    let cursor = Cursor::root().child(0).child("style").child("color");
    session.update_fixture(&cursor, json!("#fff")).await.unwrap();
    session
        .update_fixture(&Cursor::root().child(0).child("tags").child(1), json!("b"))
        .await
        .unwrap();

    let fixtures = session.fixtures().await.unwrap();
    assert_eq!(
        fixtures.instances[0],
        json!({ "title": "Hello", "tags": ["a", "b"], "style": { "color": "#fff" } })
    );

    let err = session
        .update_fixture(&Cursor::root().child(3).child("title"), json!("x"))
        .await
        .unwrap_err();
    assert!(matches!(err, SandboxError::InstanceOutOfRange { index: 3, len: 1 }));
}

#[tokio::test]
async fn test_edits_require_a_selection() {
    let (session, _) = session().await;
    let err = session.add_fixture(&static_config()).await.unwrap_err();
    assert!(matches!(err, SandboxError::NoComponentSelected));
}

#[tokio::test]
async fn test_add_fixture_generates_a_valid_instance() {
    let (session, _) = session().await;
    session.select_component("Card").await.unwrap();

    let index = session.add_fixture(&static_config()).await.unwrap();
    assert_eq!(index, 1);
    let fixtures = session.fixtures().await.unwrap();
    assert_eq!(
        fixtures.instances[1],
        json!({ "style": null, "tags": null, "title": "" })
    );
    assert!(session.invalid_props(1).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_apply_edit_and_invalid_props() {
    let (session, _) = session().await;
    session.select_component("Card").await.unwrap();

    session
        .apply_edit(&Cursor::root().child(0).child("title"), FieldEdit::Clear, &static_config())
        .await
        .unwrap();
    session
        .apply_edit(&Cursor::root().child(0).child("tags"), FieldEdit::AppendItem, &static_config())
        .await
        .unwrap();

    let fixtures = session.fixtures().await.unwrap();
    assert_eq!(fixtures.instances[0]["tags"], json!(["a", ""]));

    let errors = session.invalid_props(0).await.unwrap();
    assert_eq!(errors.len(), 1);
    assert!(matches!(&errors[0], PropError::Missing { prop, owner, .. } if prop == "title" && owner == "Card"));

    let err = session
        .apply_edit(&Cursor::root().child(0).child("unknown"), FieldEdit::Clear, &static_config())
        .await
        .unwrap_err();
    assert!(matches!(err, SandboxError::Cursor(_)));
}

#[tokio::test]
async fn test_form_cursors_start_with_instance_index() {
    let (session, _) = session().await;
    session.select_component("Card").await.unwrap();

    let form = session.form(0).await.unwrap();
    let tags = form.iter().find(|v| v.label == "tags").unwrap();
    assert_eq!(tags.cursor, Cursor::root().child(0).child("tags"));
    let Affordance::List { items } = &tags.affordance else {
        panic!("expected a list");
    };
    assert_eq!(items[0].cursor, Cursor::root().child(0).child("tags").child(0));

    assert!(matches!(
        session.form(5).await.unwrap_err(),
        SandboxError::InstanceOutOfRange { index: 5, .. }
    ));
}

#[tokio::test]
async fn test_form_cursors_write_back_through_apply_edit() {
    let (session, _) = session().await;
    session.select_component("Card").await.unwrap();

    let form = session.form(0).await.unwrap();
    let title = form.iter().find(|v| v.label == "title").unwrap();
    session
        .apply_edit(&title.cursor, FieldEdit::Set(json!("x")), &static_config())
        .await
        .unwrap();

    let tags = form.iter().find(|v| v.label == "tags").unwrap();
    let Affordance::List { items } = &tags.affordance else {
        panic!("expected a list");
    };
    session
        .apply_edit(&items[0].cursor, FieldEdit::Set(json!("z")), &static_config())
        .await
        .unwrap();

    let fixtures = session.fixtures().await.unwrap();
    assert_eq!(fixtures.instances[0]["title"], json!("x"));
    assert_eq!(fixtures.instances[0]["tags"], json!(["z"]));

    let refreshed = session.form(0).await.unwrap();
    let title = refreshed.iter().find(|v| v.label == "title").unwrap();
    assert_eq!(title.value, json!("x"));
}

#[tokio::test]
async fn test_apply_edit_rejects_cursor_without_instance_index() {
    let (session, _) = session().await;
    session.select_component("Card").await.unwrap();

    let err = session
        .apply_edit(&Cursor::root().child("title"), FieldEdit::Clear, &static_config())
        .await
        .unwrap_err();
    assert!(matches!(err, SandboxError::Cursor(CursorError::TypeMismatch { .. })));

    let err = session
        .apply_edit(&Cursor::root().child(4).child("title"), FieldEdit::Clear, &static_config())
        .await
        .unwrap_err();
    assert!(matches!(err, SandboxError::InstanceOutOfRange { index: 4, len: 1 }));
}

#[tokio::test]
async fn test_save_writes_through_the_store() {
    let (session, store) = session().await;
    session.select_component("Card").await.unwrap();
    session.add_fixture(&static_config()).await.unwrap();
    session.save().await.unwrap();

    assert_eq!(store.load_fixtures("Card").await.unwrap().len(), 2);
}
