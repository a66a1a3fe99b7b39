//! End-to-end build scenarios over temp-dir vaults.

use std::fs;

use tempfile::TempDir;

use narra_context::ContextBuilder;
use narra_core::{ForeshadowAction, PhaseOrder, SceneIdentifier};

fn vault(files: &[(&str, &str)]) -> TempDir {
    let tmp = TempDir::new().unwrap();
    for (rel, content) in files {
        let path = tmp.path().join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }
    tmp
}

#[test]
fn empty_vault_builds_empty_success() {
    let tmp = vault(&[("_ai_control/visibility.yaml", "")]);
    let mut builder = ContextBuilder::new(tmp.path());

    let result = builder.build(&SceneIdentifier::new("ep001")).unwrap();

    assert!(result.success);
    assert!(result.errors.is_empty());
    assert!(result.context.plot_l1.is_none());
    assert!(result.context.plot_l3.is_none());
    assert!(result.context.summary_l1.is_none());
    assert!(result.context.style_guide.is_none());
    assert!(result.context.characters.is_empty());
    assert!(result.context.world_settings.is_empty());
    assert!(result.foreshadow_instructions.instructions.is_empty());
    assert!(result.forbidden_keywords.is_empty());
    assert!(result.hints.is_empty());
    // Missing optional files show up as warnings, never as errors.
    assert!(result.warnings.iter().any(|w| w.contains("not found")));
}

#[test]
fn minimal_vault_builds_plot_and_character() {
    let tmp = vault(&[
        ("_plot/l1_theme.md", "Theme: Redemption"),
        ("_plot/l3_ep010.md", "Scene structure"),
        (
            "characters/Alice.md",
            "---\nname: Alice\nsections:\n  基本情報: Protagonist\n---\n",
        ),
        ("episodes/ep010.md", "[[Alice]]"),
    ]);
    let mut builder = ContextBuilder::new(tmp.path());

    let result = builder.build(&SceneIdentifier::new("ep010")).unwrap();

    assert!(result.success);
    assert_eq!(result.context.plot_l1.as_deref(), Some("Theme: Redemption"));
    assert_eq!(result.context.plot_l3.as_deref(), Some("Scene structure"));
    assert!(result.context.characters["Alice"].contains("Protagonist"));
    assert!(result.context.plot_l2.is_none());
    assert!(result.context.summary_l1.is_none());
    assert!(result.context.summary_l3.is_none());
    assert!(result.context.style_guide.is_none());
    assert!(result.context.world_settings.is_empty());
}

#[test]
fn phase_gating_hides_future_arcs() {
    let tmp = vault(&[
        (
            "characters/Alice.md",
            "---\nname: Alice\nphases:\n  - name: initial\n    episodes: 1-10\n  - name: arc_1\n    episodes: 11-20\nsections:\n  initial: Village girl\n  arc_1: Secret princess\n---\n",
        ),
        ("episodes/ep005.md", "[[Alice]]"),
    ]);
    let mut builder = ContextBuilder::new(tmp.path())
        .with_phase_order(PhaseOrder::new(vec!["initial".into(), "arc_1".into()]));

    let scene = SceneIdentifier::new("ep005").with_phase("initial");
    let result = builder.build(&scene).unwrap();

    let alice = &result.context.characters["Alice"];
    assert!(alice.contains("Village girl"));
    assert!(!alice.contains("Secret princess"));
}

#[test]
fn unknown_phase_fails_fast() {
    let tmp = vault(&[
        ("characters/Alice.md", "---\nname: Alice\n---\n"),
        ("episodes/ep005.md", "[[Alice]]"),
    ]);
    let mut builder = ContextBuilder::new(tmp.path());

    let scene = SceneIdentifier::new("ep005").with_phase("finale");
    assert!(builder.build(&scene).is_err());
}

#[test]
fn visibility_hides_marked_sections() {
    let tmp = vault(&[
        (
            "characters/Bob.md",
            "---\nname: Bob\n---\n## 正体\n<!-- ai_visibility: 0 -->\nBob is the villain.\n\n## 過去\n<!-- ai_visibility: 1 -->\nBob lost his family.\n",
        ),
        ("episodes/ep003.md", "[[Bob]]"),
    ]);
    let mut builder = ContextBuilder::new(tmp.path()).with_visibility_filtering();

    let result = builder.build(&SceneIdentifier::new("ep003")).unwrap();

    assert!(!result.context.characters["Bob"].contains("villain"));
    let visibility = result.visibility_context.as_ref().unwrap();
    assert!(visibility
        .excluded_sections
        .contains(&"character.Bob".to_owned()));

    // The AWARE section produced exactly one hint; the HIDDEN one none.
    assert_eq!(visibility.hints.len(), 1);
    assert!(visibility.hints[0].hint_text.contains("過去"));
    assert_eq!(result.hints.len(), 1);
    assert!(!result.context.characters["Bob"].contains("lost his family"));
}

#[test]
fn registered_foreshadowing_plants_on_its_episode() {
    let tmp = vault(&[(
        "_foreshadowing/registry.yaml",
        "version: \"1.0\"\nforeshadowing:\n  - id: FS-010-secret\n    status: registered\n    subtlety_level: 7\n    seed:\n      content: 王家の紋章\n      description: hint naturally\n",
    )]);
    let mut builder = ContextBuilder::new(tmp.path());

    let result = builder.build(&SceneIdentifier::new("ep010")).unwrap();

    assert_eq!(result.foreshadow_instructions.instructions.len(), 1);
    let instruction = &result.foreshadow_instructions.instructions[0];
    assert_eq!(instruction.foreshadowing_id, "FS-010-secret");
    assert_eq!(instruction.action, ForeshadowAction::Plant);
    assert!((5..=7).contains(&instruction.subtlety_target));
    assert_eq!(instruction.note.as_deref(), Some("hint naturally"));

    // Off-episode scenes get nothing.
    let quiet = builder.build(&SceneIdentifier::new("ep011")).unwrap();
    assert!(quiet.foreshadow_instructions.instructions.is_empty());
}

#[test]
fn forbidden_keywords_aggregate_across_sources() {
    let tmp = vault(&[
        (
            "_ai_control/forbidden_keywords.txt",
            "竜王の秘密\n# comment\n封印の鍵\n",
        ),
        (
            "_ai_control/visibility.yaml",
            "global_forbidden_keywords: [真の名前]\n",
        ),
        (
            "_foreshadowing/registry.yaml",
            "version: \"1.0\"\nforeshadowing:\n  - id: FS-010-secret\n    status: registered\n    subtlety_level: 5\n    ai_visibility:\n      forbidden_keywords: [王族]\n",
        ),
    ]);
    let mut builder = ContextBuilder::new(tmp.path());
    let scene = SceneIdentifier::new("ep010");

    let result = builder.build(&scene).unwrap();
    assert_eq!(
        result.forbidden_keywords,
        vec!["封印の鍵", "王族", "真の名前", "竜王の秘密"]
    );

    let sources = builder.get_forbidden_by_source(&scene);
    assert_eq!(sources.global, vec!["竜王の秘密", "封印の鍵"]);
    assert_eq!(sources.visibility, vec!["真の名前"]);
    assert_eq!(sources.foreshadowing, vec!["王族"]);

    assert_eq!(
        builder.check_text_for_forbidden(&scene, "彼は竜王の秘密を知っていた"),
        vec!["竜王の秘密"]
    );
    assert!(!builder.is_text_clean(&scene, "彼は竜王の秘密を知っていた"));
    assert!(builder.is_text_clean(&scene, "彼は村を出た"));
}

#[test]
fn repeated_builds_are_idempotent_and_cached() {
    let tmp = vault(&[
        ("_plot/l1_theme.md", "Theme"),
        ("_plot/l3_ep010.md", "Structure"),
        ("episodes/ep010.md", "[[Alice]]"),
        ("characters/Alice.md", "---\nname: Alice\n---\nBody.\n"),
    ]);
    let mut builder = ContextBuilder::new(tmp.path());
    let scene = SceneIdentifier::new("ep010");

    let first = builder.build(&scene).unwrap();
    let stats_after_first = builder.loader().stats();
    let second = builder.build(&scene).unwrap();
    let stats_after_second = builder.loader().stats();

    assert_eq!(first, second);
    // Every file read by the first build is served from cache the second
    // time; only still-missing files go back to disk.
    assert_eq!(stats_after_first.size, stats_after_second.size);
    assert!(stats_after_second.hits > stats_after_first.hits);
}

#[test]
fn hints_are_priority_ordered() {
    let tmp = vault(&[
        (
            "characters/Bob.md",
            "---\nname: Bob\n---\n## 過去\n<!-- ai_visibility: 1 -->\nHidden history.\n",
        ),
        ("episodes/ep003.md", "[[Bob]]"),
        (
            "_foreshadowing/registry.yaml",
            "version: \"1.0\"\nforeshadowing:\n  - id: FS-001-ring\n    status: planted\n    subtlety_level: 5\n    related:\n      characters: [Bob]\n",
        ),
    ]);
    let mut builder = ContextBuilder::new(tmp.path()).with_visibility_filtering();

    let result = builder.build(&SceneIdentifier::new("ep003")).unwrap();

    // Visibility hint (0.8 × 0.5) outranks the foreshadowing hint (1.0 × 0.3).
    assert_eq!(result.hints.len(), 2);
    let priorities: Vec<f64> = result.hints.hints().iter().map(|h| h.priority()).collect();
    assert!(priorities.windows(2).all(|w| w[0] >= w[1]));
    assert_eq!(result.hints.hints()[0].category, "character");
    assert_eq!(result.hints.hints()[1].entity_id, "FS-001-ring");
}
