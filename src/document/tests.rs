//! Tests for document parsing.

use super::*;
use crate::error::PromptError;
use crate::imports::ImportSpec;
use crate::test_support::write_file;
use std::path::Path;
use tempfile::TempDir;

fn parse(yaml: &str, file_name: &str) -> crate::error::Result<Document> {
    let value: serde_yaml::Value = serde_yaml::from_str(yaml).unwrap();
    parse_document(&value, Path::new(file_name))
}

// =========================================================================
// Templates
// =========================================================================

#[test]
fn test_parse_template() {
    let yaml = r#"
version: 2.0
name: base
template: "masterpiece, {prompt}, detailed"
negative_prompt: "lowres, {negprompt}"
parameters:
  steps: 30
  sampler: DPM++ 2M
imports:
  Style: styles.yaml
"#;
    let Document::Template(doc) = parse(yaml, "base.template.yaml").unwrap() else {
        panic!("expected template");
    };
    assert_eq!(doc.version, "2.0");
    assert_eq!(doc.name, "base");
    assert_eq!(doc.template, "masterpiece, {prompt}, detailed");
    assert_eq!(doc.negative_prompt, "lowres, {negprompt}");
    assert_eq!(doc.parameters.len(), 2);
    assert_eq!(
        doc.imports.get("Style"),
        Some(&Some(ImportSpec::Source("styles.yaml".to_string())))
    );
    assert_eq!(doc.path, Path::new("base.template.yaml"));
}

#[test]
fn test_template_without_prompt_token_is_rejected() {
    let err = parse("template: just a scene\n", "base.template.yaml").unwrap_err();
    assert!(matches!(err, PromptError::ReservedPlaceholder { .. }));
}

#[test]
fn test_template_given_as_mapping_gets_quoting_hint() {
    // Unquoted `{prompt}` at the start of a value is a YAML flow mapping.
    let err = parse("template: {prompt}\n", "base.template.yaml").unwrap_err();
    match err {
        PromptError::MalformedDocument { message, hint, .. } => {
            assert!(message.contains("'template' must be a string"));
            assert!(hint.unwrap().contains("quotes"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn test_template_missing_template_field() {
    let err = parse("name: base\n", "base.template.yaml").unwrap_err();
    match err {
        PromptError::MalformedDocument { message, .. } => {
            assert!(message.contains("missing required field 'template'"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

// =========================================================================
// Chunks
// =========================================================================

#[test]
fn test_parse_chunk() {
    let yaml = r#"
version: "1.0"
type: character
template: "{Hair}, {Eyes} eyes, {Pose}"
imports:
  Hair: hair.yaml
defaults:
  Pose: standing
"#;
    let Document::Chunk(doc) = parse(yaml, "girl.chunk.yaml").unwrap() else {
        panic!("expected chunk");
    };
    assert_eq!(doc.chunk_type, "character");
    assert_eq!(doc.defaults.get("Pose").map(String::as_str), Some("standing"));
    assert_eq!(doc.imports.len(), 1);
}

#[test]
fn test_chunk_defaults_accept_unquoted_scalars() {
    let dir = TempDir::new().unwrap();
    let path = write_file(
        dir.path(),
        "girl.chunk.yaml",
        "type: character\ntemplate: \"{Age} years, {Height}\"\ndefaults:\n  Age: 20\n  Height: 1.6\n  Smiling: true\n",
    );

    let doc = load_chunk(&path).unwrap();
    assert_eq!(doc.defaults.get("Age").map(String::as_str), Some("20"));
    assert_eq!(doc.defaults.get("Height").map(String::as_str), Some("1.6"));
    assert_eq!(doc.defaults.get("Smiling").map(String::as_str), Some("true"));
}

#[test]
fn test_chunk_default_must_be_scalar() {
    let yaml = "type: character\ntemplate: \"{Age}\"\ndefaults:\n  Age: [1, 2]\n";
    let err = parse(yaml, "girl.chunk.yaml").unwrap_err();
    assert!(matches!(err, PromptError::MalformedDocument { .. }));
}

#[test]
fn test_chunk_with_reserved_token_is_rejected() {
    for token in ["{prompt}", "{negprompt}", "{loras}"] {
        let yaml = format!("type: character\ntemplate: \"a girl, {}\"\n", token);
        let err = parse(&yaml, "girl.chunk.yaml").unwrap_err();
        assert!(
            matches!(err, PromptError::ReservedPlaceholder { .. }),
            "token {} should be rejected",
            token
        );
    }
}

#[test]
fn test_chunk_without_template_needs_parent() {
    let err = parse("type: character\n", "girl.chunk.yaml").unwrap_err();
    assert!(matches!(err, PromptError::MalformedDocument { .. }));

    let ok = parse("type: character\nimplements: base.chunk.yaml\n", "girl.chunk.yaml");
    assert!(ok.is_ok());
}

// =========================================================================
// Prompts
// =========================================================================

#[test]
fn test_parse_prompt_with_generation() {
    let yaml = r#"
name: portraits
implements: base.template.yaml
generation:
  mode: random
  seed: 100
  seed_mode: fixed
  max_images: 5
  seeds: [1, 2, 3]
prompt: "1girl, {Hair}"
negative_prompt: blurry
"#;
    let Document::Prompt(doc) = parse(yaml, "portraits.prompt.yaml").unwrap() else {
        panic!("expected prompt");
    };
    assert_eq!(doc.implements, "base.template.yaml");
    assert_eq!(doc.generation.mode, GenerationMode::Random);
    assert_eq!(doc.generation.seed, 100);
    assert_eq!(doc.generation.seed_mode, SeedMode::Fixed);
    assert_eq!(doc.generation.max_images, 5);
    assert_eq!(doc.generation.seeds, Some(vec![1, 2, 3]));
    assert_eq!(doc.negative_prompt.as_deref(), Some("blurry"));
}

#[test]
fn test_prompt_generation_defaults() {
    let yaml = "implements: base.template.yaml\nprompt: a cat\n";
    let Document::Prompt(doc) = parse(yaml, "cat.prompt.yaml").unwrap() else {
        panic!("expected prompt");
    };
    assert_eq!(doc.generation, GenerationSpec::default());
    assert_eq!(doc.generation.seed_mode, SeedMode::Progressive);
    assert_eq!(doc.version, "1.0");
}

#[test]
fn test_prompt_using_template_field_is_reserved_error() {
    let yaml = "implements: base.template.yaml\ntemplate: a cat\n";
    let err = parse(yaml, "cat.prompt.yaml").unwrap_err();
    match err {
        PromptError::ReservedPlaceholder { message, .. } => assert!(message.contains("prompt:")),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn test_prompt_using_variations_field_is_reserved_error() {
    let yaml = "implements: base.template.yaml\nprompt: a cat\nvariations:\n  Hair: hair.yaml\n";
    let err = parse(yaml, "cat.prompt.yaml").unwrap_err();
    match err {
        PromptError::ReservedPlaceholder { message, .. } => assert!(message.contains("imports:")),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn test_prompt_requires_implements() {
    let err = parse("prompt: a cat\n", "cat.prompt.yaml").unwrap_err();
    match err {
        PromptError::MalformedDocument { message, .. } => assert!(message.contains("implements")),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn test_invalid_generation_mode_is_malformed() {
    let yaml = "implements: t.template.yaml\nprompt: x\ngeneration:\n  mode: sideways\n";
    let err = parse(yaml, "x.prompt.yaml").unwrap_err();
    assert!(matches!(err, PromptError::MalformedDocument { .. }));
}

// =========================================================================
// Kind detection
// =========================================================================

#[test]
fn test_kind_is_sniffed_without_suffix() {
    assert_eq!(
        parse("template: \"a, {prompt}\"\n", "base.yaml").unwrap().kind(),
        DocumentKind::Template
    );
    assert_eq!(
        parse("type: scene\ntemplate: a beach\n", "beach.yaml").unwrap().kind(),
        DocumentKind::Chunk
    );
    assert_eq!(
        parse("implements: t.yaml\nprompt: a cat\n", "cat.yaml").unwrap().kind(),
        DocumentKind::Prompt
    );
    assert_eq!(
        parse("BobCut: short\n", "hair.yaml").unwrap().kind(),
        DocumentKind::Variations
    );
}

#[test]
fn test_file_name_suffixes() {
    assert_eq!(DocumentKind::from_file_name("a.template.yml"), Some(DocumentKind::Template));
    assert_eq!(DocumentKind::from_file_name("a.chunk.yaml"), Some(DocumentKind::Chunk));
    assert_eq!(DocumentKind::from_file_name("a.prompt.yaml"), Some(DocumentKind::Prompt));
    assert_eq!(DocumentKind::from_file_name("hair.yaml"), None);
    assert_eq!(DocumentKind::from_file_name("notes.txt"), None);
}

#[test]
fn test_load_distinguishes_missing_and_malformed() {
    let dir = TempDir::new().unwrap();
    let err = load_document(dir.path().join("missing.prompt.yaml")).unwrap_err();
    assert!(matches!(err, PromptError::DocumentNotFound { .. }));

    let bad = write_file(dir.path(), "bad.prompt.yaml", "prompt: [unclosed\n");
    let err = load_document(&bad).unwrap_err();
    assert!(matches!(err, PromptError::DocumentSyntax { .. }));
}

#[test]
fn test_load_template_rejects_other_kinds() {
    let dir = TempDir::new().unwrap();
    let path = write_file(dir.path(), "hair.yaml", "BobCut: short\n");
    let err = load_template(&path).unwrap_err();
    match err {
        PromptError::MalformedDocument { message, .. } => {
            assert!(message.contains("expected a template document"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
}
