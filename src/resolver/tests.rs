//! Tests for chunk expansion and placeholder resolution.

use super::*;
use crate::error::PromptError;
use crate::imports::{ImportMap, ResolvedImports, resolve_imports};
use crate::test_support::write_file;
use crate::variations::{VariationDictionary, VariationValue};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::collections::BTreeMap;
use tempfile::TempDir;

fn rng() -> StdRng {
    StdRng::seed_from_u64(42)
}

fn dict(pairs: &[(&str, &str)]) -> VariationDictionary {
    pairs.iter().copied().collect()
}

fn hair_parts() -> VariationDictionary {
    let mut dict = VariationDictionary::new();
    let parts: BTreeMap<String, String> = [
        ("main".to_string(), "long braided hair".to_string()),
        ("lora".to_string(), "<lora:braids:0.7>".to_string()),
    ]
    .into_iter()
    .collect();
    dict.insert("Braids", VariationValue::Parts(parts), "hair.yaml");
    dict
}

fn context(entries: Vec<(&str, VariationDictionary)>) -> ResolvedContext {
    let imports: ResolvedImports = entries
        .into_iter()
        .map(|(name, dict)| (name.to_string(), dict))
        .collect();
    ResolvedContext::new(imports)
}

/// Workspace with a `Girl` chunk and a `HairStyles` dictionary.
fn chunk_workspace() -> (TempDir, ResolvedContext) {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "chunks/vars/hair.yaml", "BobCut: short bob\n");
    write_file(
        dir.path(),
        "chunks/girl.chunk.yaml",
        concat!(
            "type: character\n",
            "template: \"1girl, {Hair}, {Age} years\"\n",
            "defaults:\n",
            "  Age: 20\n",
            "imports:\n",
            "  Hair: vars/hair.yaml\n",
        ),
    );
    write_file(
        dir.path(),
        "styles.yaml",
        "Long: long hair\nBraids:\n  main: braids\n  lora: <lora:braids:0.7>\n",
    );

    let imports: ImportMap = serde_yaml::from_str(
        "Girl: chunks/girl.chunk.yaml\nHairStyles: styles.yaml\nScene: a park\n",
    )
    .unwrap();
    let resolved = resolve_imports(&imports, dir.path()).unwrap();
    (dir, ResolvedContext::new(resolved))
}

// =========================================================================
// Phase 2: placeholders
// =========================================================================

#[test]
fn test_single_shot_takes_first_selected_value() {
    let ctx = context(vec![("Hair", dict(&[("A", "short"), ("B", "long"), ("C", "curly")]))]);
    let mut rng = rng();

    assert_eq!(resolve("{Hair}", &ctx, &mut rng).unwrap(), "short");
    assert_eq!(resolve("{Hair[#2]}", &ctx, &mut rng).unwrap(), "curly");
    assert_eq!(resolve("{Hair[B]}", &ctx, &mut rng).unwrap(), "long");
}

#[test]
fn test_multi_part_main_and_named_part() {
    let ctx = context(vec![("Hair", hair_parts())]);
    let text = resolve("1girl, {Hair}, {Hair:lora}", &ctx, &mut rng()).unwrap();
    assert_eq!(text, "1girl, long braided hair, <lora:braids:0.7>");
}

#[test]
fn test_missing_part_of_multi_part_is_empty() {
    let ctx = context(vec![("Hair", hair_parts())]);
    assert_eq!(resolve("[{Hair:color}]", &ctx, &mut rng()).unwrap(), "[]");
}

#[test]
fn test_part_of_scalar_is_error() {
    let ctx = context(vec![("Mood", dict(&[("A", "calm")]))]);
    let err = resolve("{Mood:lora}", &ctx, &mut rng()).unwrap_err();
    match err {
        PromptError::NotMultiPart { placeholder, part } => {
            assert_eq!(placeholder, "Mood");
            assert_eq!(part, "lora");
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn test_state_overrides_imports() {
    let ctx = context(vec![("Hair", dict(&[("A", "short")]))]);
    let mut state = VariationState::new();
    state.insert("Hair".to_string(), "long".into());

    let text = resolve_placeholders("{Hair}!", &ctx, &state, &mut rng()).unwrap();
    assert_eq!(text, "long!");
}

#[test]
fn test_removed_and_unknown_names_resolve_empty() {
    let mut ctx = context(vec![]);
    ctx.removed.insert("Outfit".to_string());
    let text = resolve("a{Outfit}b{Nobody}c", &ctx, &mut rng()).unwrap();
    assert_eq!(text, "abc");
}

#[test]
fn test_reserved_tokens_come_from_parameters() {
    let mut parameters = crate::document::Parameters::new();
    parameters.insert(
        "loras".to_string(),
        serde_yaml::Value::String("<lora:detail:0.5>".to_string()),
    );
    let ctx = context(vec![]).with_parameters(parameters);

    let text = resolve("x {loras} {negprompt}", &ctx, &mut rng()).unwrap();
    assert_eq!(text, "x <lora:detail:0.5> ");
}

#[test]
fn test_non_placeholder_braces_survive() {
    let ctx = context(vec![]);
    let text = resolve(r#"{ "a": 1 }"#, &ctx, &mut rng()).unwrap();
    assert_eq!(text, r#"{ "a": 1 }"#);
}

// =========================================================================
// Phase 1: chunks
// =========================================================================

#[test]
fn test_chunk_uses_defaults_and_leaves_imports_for_phase_two() {
    let (_dir, ctx) = chunk_workspace();
    let expansion = expand_chunks("@Girl, {Scene}", &ctx, &mut rng()).unwrap();

    assert_eq!(expansion.text, "1girl, {Hair}, 20 years, {Scene}");
    assert!(expansion.imports.variations("Hair").is_some());
    assert_eq!(
        resolve("@Girl, {Scene}", &ctx, &mut rng()).unwrap(),
        "1girl, short bob, 20 years, a park"
    );
}

#[test]
fn test_literal_argument_overrides_default() {
    let (_dir, ctx) = chunk_workspace();
    let text = resolve("@{Girl with Age:30}", &ctx, &mut rng()).unwrap();
    assert_eq!(text, "1girl, short bob, 30 years");
}

#[test]
fn test_bare_placeholder_argument_is_forwarded() {
    let (_dir, ctx) = chunk_workspace();
    let expansion = expand_chunks("@{Girl with Hair:{HairStyles}}", &ctx, &mut rng()).unwrap();
    assert_eq!(expansion.text, "1girl, {HairStyles}, 20 years");
}

#[test]
fn test_selected_argument_resolves_to_one_value() {
    let (_dir, ctx) = chunk_workspace();
    let text = resolve("@{Girl with Hair:{HairStyles[Long]}}", &ctx, &mut rng()).unwrap();
    assert_eq!(text, "1girl, long hair, 20 years");

    let text = resolve("@{Girl with Hair:{HairStyles[#1]}}", &ctx, &mut rng()).unwrap();
    assert_eq!(text, "1girl, braids, 20 years");
}

#[test]
fn test_multi_part_argument_and_forwarded_import() {
    let (_dir, ctx) = chunk_workspace();
    let text = resolve("@{Girl with Hair:{HairStyles[Braids]}, Age:{Scene}}", &ctx, &mut rng())
        .unwrap();
    assert_eq!(text, "1girl, braids, a park years");
}

#[test]
fn test_unknown_chunk_is_error() {
    let (_dir, ctx) = chunk_workspace();
    let err = expand_chunks("@Boy", &ctx, &mut rng()).unwrap_err();
    assert!(matches!(err, PromptError::ChunkNotFound { name } if name == "Boy"));
}

#[test]
fn test_unknown_argument_source_is_unresolved() {
    let (_dir, ctx) = chunk_workspace();
    let err = expand_chunks("@{Girl with Hair:{Nowhere[1]}}", &ctx, &mut rng()).unwrap_err();
    match err {
        PromptError::UnresolvedPlaceholders { missing, available } => {
            assert_eq!(missing, vec!["Nowhere"]);
            assert!(available.contains(&"HairStyles".to_string()));
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn test_self_referencing_chunk_is_cyclic() {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "loop.chunk.yaml", "type: x\ntemplate: \"again @Loop\"\n");
    let imports: ImportMap = serde_yaml::from_str("Loop: loop.chunk.yaml\n").unwrap();
    let ctx = ResolvedContext::new(resolve_imports(&imports, dir.path()).unwrap());

    let err = expand_chunks("@Loop", &ctx, &mut rng()).unwrap_err();
    match err {
        PromptError::CyclicChunkReference { chain } => assert_eq!(chain, vec!["Loop", "Loop"]),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn test_stray_at_signs_are_text() {
    let ctx = context(vec![]);
    let expansion = expand_chunks("mail me @ home, 50@", &ctx, &mut rng()).unwrap();
    assert_eq!(expansion.text, "mail me @ home, 50@");

    let text = "user@example.com, <lora:style@v2:0.7>, a@{b}";
    let expansion = expand_chunks(text, &ctx, &mut rng()).unwrap();
    assert_eq!(expansion.text, text);
}

#[test]
fn test_dotted_chunk_reference() {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "pos.chunk.yaml", "type: quality\ntemplate: masterpiece\n");
    let imports: ImportMap =
        serde_yaml::from_str("chunks:\n  positive: pos.chunk.yaml\n").unwrap();
    let ctx = ResolvedContext::new(resolve_imports(&imports, dir.path()).unwrap());

    let text = resolve("@chunks.positive, 1girl", &ctx, &mut rng()).unwrap();
    assert_eq!(text, "masterpiece, 1girl");
}
