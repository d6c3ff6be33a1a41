use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        CompileError::invalid_range("x")
            .to_string()
            .contains("invalid range:")
    );
    assert!(
        CompileError::invalid_path("x")
            .to_string()
            .contains("invalid path:")
    );
    assert!(
        CompileError::invalid_command("echo", "x")
            .to_string()
            .contains("invalid command 'echo':")
    );
    assert!(
        CompileError::unknown_task("x")
            .to_string()
            .contains("unknown task:")
    );
    assert!(
        CompileError::duplicate_task_name("x")
            .to_string()
            .contains("duplicate task name:")
    );
    assert!(
        CompileError::empty_task("x")
            .to_string()
            .contains("has no commands")
    );
    assert!(
        CompileError::script("simple-blender-render", "x")
            .to_string()
            .contains("script error in job type 'simple-blender-render':")
    );
    assert!(
        CompileError::invalid_options("x")
            .to_string()
            .contains("invalid options:")
    );
    assert!(
        CompileError::serde("x")
            .to_string()
            .contains("serialization error:")
    );
}

#[test]
fn cycle_lists_participants_in_order() {
    let err = CompileError::Cycle {
        tasks: vec!["a".into(), "b".into(), "a".into()],
    };
    assert_eq!(err.to_string(), "cycle detected: a -> b -> a");
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = CompileError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}
