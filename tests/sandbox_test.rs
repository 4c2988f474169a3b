use eidos::adapters::component_registry::InMemoryComponentRegistry;
use eidos::adapters::fixture_store::FileFixtureStore;
use eidos::adapters::sandbox::SandboxSession;
use eidos::cli::Command;
use eidos::config::{PolicyKind, Settings};
use eidos::domain::FixtureStore;
use eidos::prop_types::ValidatorLibrary;
use serde_json::{json, Value};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

const BUTTON_YAML: &str = r#"
name: Button
description: A clickable button
props:
  label: string.isRequired
  size: { type: oneOf, values: [small, large] }
  items: { type: arrayOf, of: number.isRequired, required: true }
  style: { type: shape, fields: { color: string } }
  value: { type: oneOfType, types: [number, bool] }
  when: { type: instanceOf, class: Date }
  onClick: func
"#;

const CARD_JSON: &str = r#"
{
    "name": "Card",
    "props": {
        "title": "string.isRequired",
        "children": "node"
    }
}
"#;

const BROKEN_TOML: &str = r#"
name = "Broken"

[props.items]
type = "arrayOf"
"#;

fn write_sandbox(root: &Path) -> anyhow::Result<()> {
    fs::create_dir_all(root.join("components"))?;
    fs::create_dir_all(root.join("fixtures"))?;
    fs::write(root.join("components/Button.yaml"), BUTTON_YAML)?;
    fs::write(root.join("components/Card.json"), CARD_JSON)?;
    fs::write(root.join("components/Broken.toml"), BROKEN_TOML)?;
    fs::write(root.join("components/README.md"), "not a component")?;
    fs::write(
        root.join("fixtures/Card.yaml"),
        "instances:\n  - title: Hello\n  - title: 42\n",
    )?;
    Ok(())
}

async fn open(settings: &Settings) -> anyhow::Result<SandboxSession> {
    let library = Arc::new(ValidatorLibrary::new());
    library.instrument();

    let registry = InMemoryComponentRegistry::new(Arc::clone(&library));
    registry.load_from_dir(&settings.components_path()).await?;
    let store = FileFixtureStore::new(settings.fixtures_path());

    Ok(SandboxSession::new(library, Arc::new(registry), Arc::new(store)))
}

#[tokio::test]
async fn test_list_skips_unreadable_declarations() -> anyhow::Result<()> {
    let temp_dir = TempDir::new()?;
    write_sandbox(temp_dir.path())?;
    let settings = Settings::from_root(temp_dir.path())?;
    let session = open(&settings).await?;

    let out = eidos::execute(&Command::List, &session, &settings).await?;

    assert!(out.contains("Button: A clickable button"));
    assert!(out.contains("props: items, label, onClick, size, style, value, when"));
    assert!(out.contains("Card\n  props: children, title"));
    assert!(!out.contains("Broken"));

    Ok(())
}

#[tokio::test]
async fn test_infer_prints_type_descriptions() -> anyhow::Result<()> {
    let temp_dir = TempDir::new()?;
    write_sandbox(temp_dir.path())?;
    let settings = Settings::from_root(temp_dir.path())?;
    let session = open(&settings).await?;

    let command = Command::Infer {
        component: "Button".to_string(),
    };
    let out = eidos::execute(&command, &session, &settings).await?;
    let types: Value = serde_json::from_str(&out)?;

    assert_eq!(
        types["items"],
        json!({ "kind": "arrayOf", "required": true, "args": [{ "kind": "number", "required": true }] })
    );
    assert_eq!(types["label"], json!({ "kind": "string", "required": true }));
    assert_eq!(types["size"]["args"], json!([["small", "large"]]));
    assert_eq!(types["when"]["args"], json!(["Date"]));

    Ok(())
}

#[tokio::test]
async fn test_generate_save_then_check() -> anyhow::Result<()> {
    let temp_dir = TempDir::new()?;
    write_sandbox(temp_dir.path())?;
    let settings = Settings::from_root(temp_dir.path())?;
    let session = open(&settings).await?;

    let command = Command::Generate {
        component: "Button".to_string(),
        count: 2,
        save: true,
    };
    let out = eidos::execute(&command, &session, &settings).await?;
    assert!(out.contains("// instance 0"));
    assert!(out.contains("// instance 1"));
    assert!(out.contains("\"label\": \"\""));

    let stored = FileFixtureStore::new(settings.fixtures_path())
        .load_fixtures("Button")
        .await?;
    assert_eq!(stored.len(), 2);
    assert_eq!(
        stored.instances[0],
        json!({
            "items": [0],
            "label": "",
            "onClick": null,
            "size": null,
            "style": null,
            "value": null,
            "when": null
        })
    );

    let fresh = open(&settings).await?;
    let command = Command::Check {
        component: "Button".to_string(),
    };
    let out = eidos::execute(&command, &fresh, &settings).await?;
    assert_eq!(out, "instance 0: ok\ninstance 1: ok\n");

    Ok(())
}

#[tokio::test]
async fn test_random_policy_generates_valid_instances() -> anyhow::Result<()> {
    let temp_dir = TempDir::new()?;
    write_sandbox(temp_dir.path())?;
    let mut settings = Settings::from_root(temp_dir.path())?;
    settings.generation.policy = PolicyKind::Random;
    settings.generation.seed = Some(11);
    let session = open(&settings).await?;

    let command = Command::Generate {
        component: "Button".to_string(),
        count: 20,
        save: false,
    };
    eidos::execute(&command, &session, &settings).await?;

    for index in 0..20 {
        assert!(session.invalid_props(index).await?.is_empty());
    }
    assert!(!temp_dir.path().join("fixtures/Button.json").exists());

    Ok(())
}

#[tokio::test]
async fn test_check_reports_invalid_fixtures() -> anyhow::Result<()> {
    let temp_dir = TempDir::new()?;
    write_sandbox(temp_dir.path())?;
    let settings = Settings::from_root(temp_dir.path())?;
    let session = open(&settings).await?;

    let command = Command::Check {
        component: "Card".to_string(),
    };
    let out = eidos::execute(&command, &session, &settings).await?;

    assert!(out.starts_with("instance 0: ok\ninstance 1:\n"));
    assert!(out.contains(
        "Invalid prop `title` of type `number` supplied to `Card`, expected `string`."
    ));

    Ok(())
}

#[tokio::test]
async fn test_show_and_form() -> anyhow::Result<()> {
    let temp_dir = TempDir::new()?;
    write_sandbox(temp_dir.path())?;
    let settings = Settings::from_root(temp_dir.path())?;
    let session = open(&settings).await?;

    let command = Command::Show {
        component: "Card".to_string(),
    };
    let out = eidos::execute(&command, &session, &settings).await?;
    assert_eq!(
        out,
        "// instance 0\n{\n    \"title\": \"Hello\"\n}\n// instance 1\n{\n    \"title\": 42\n}\n"
    );

    let command = Command::Form {
        component: "Card".to_string(),
        instance: 1,
    };
    let out = eidos::execute(&command, &session, &settings).await?;
    let form: Value = serde_json::from_str(&out)?;
    let title = form
        .as_array()
        .and_then(|fields| fields.iter().find(|f| f["label"] == "title"))
        .cloned()
        .unwrap_or_default();
    assert_eq!(title["cursor"], json!([1, "title"]));
    assert_eq!(title["valid"], json!(false));
    assert_eq!(title["affordance"]["type"], json!("text"));

    Ok(())
}

#[tokio::test]
async fn test_unknown_component_is_an_error() -> anyhow::Result<()> {
    let temp_dir = TempDir::new()?;
    write_sandbox(temp_dir.path())?;
    let settings = Settings::from_root(temp_dir.path())?;
    let session = open(&settings).await?;

    let command = Command::Show {
        component: "Nope".to_string(),
    };
    let err = eidos::execute(&command, &session, &settings).await.unwrap_err();
    assert!(err.to_string().contains("Nope"));

    Ok(())
}
