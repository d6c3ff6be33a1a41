use super::*;

#[test]
fn parses_single_frames_and_spans() {
    let set = FrameSet::parse("1-10, 20 ,30-40").unwrap();
    assert_eq!(
        set.spans(),
        &[
            FrameSpan { start: 1, end: 10 },
            FrameSpan::single(20),
            FrameSpan { start: 30, end: 40 },
        ]
    );
    assert_eq!(set.len_frames(), 10 + 1 + 11);
    assert_eq!(set.first(), 1);
    assert_eq!(set.last(), 40);
    assert_eq!(set.to_string(), "1-10,20,30-40");
}

#[test]
fn adjacent_items_are_merged() {
    let set = FrameSet::parse("1-5,6-10,11").unwrap();
    assert_eq!(set.spans(), &[FrameSpan { start: 1, end: 11 }]);
}

#[test]
fn negative_bounds_are_supported() {
    let set = FrameSet::parse("-5--1,3").unwrap();
    assert_eq!(
        set.spans(),
        &[FrameSpan { start: -5, end: -1 }, FrameSpan::single(3)]
    );
    assert!(set.contains(-3));
    assert!(!set.contains(0));
}

#[test]
fn blender_rendering_uses_double_dot() {
    let set = FrameSet::parse("0-12,34").unwrap();
    assert_eq!(set.display_with(".."), "0..12,34");
}

#[test]
fn malformed_specs_are_rejected() {
    for spec in ["", "  ", "1-", "a-b", "1,,2", "10-1", "1-10,5-20", "10,3", "1-2-3", "4,4"] {
        assert!(
            matches!(FrameSet::parse(spec), Err(CompileError::InvalidRange(_))),
            "spec {spec:?} should be rejected"
        );
    }
}

#[test]
fn from_spans_validates_order() {
    assert!(FrameSet::from_spans([FrameSpan::single(3), FrameSpan::single(1)]).is_err());
    assert!(FrameSet::from_spans(Vec::<FrameSpan>::new()).is_err());
    let set = FrameSet::from_spans([FrameSpan::single(1), FrameSpan::single(2)]).unwrap();
    assert_eq!(set.to_string(), "1-2");
}

#[test]
fn frames_iterates_in_order() {
    let set = FrameSet::parse("1-3,7").unwrap();
    assert_eq!(set.frames().collect::<Vec<_>>(), vec![1, 2, 3, 7]);
}

#[test]
fn span_length_is_checked() {
    assert_eq!(FrameSpan { start: 1, end: 10 }.len_frames(), Some(10));
    assert_eq!(FrameSpan { start: 5, end: 4 }.len_frames(), None);
    assert_eq!(
        FrameSpan { start: 0, end: i64::MAX }.len_frames(),
        Some(1 << 63)
    );
    assert_eq!(
        FrameSpan { start: i64::MIN, end: i64::MAX - 1 }.len_frames(),
        Some(u64::MAX)
    );
    assert_eq!(FrameSpan { start: i64::MIN, end: i64::MAX }.len_frames(), None);
}

#[test]
fn sets_too_large_to_count_are_rejected() {
    for spec in [
        "-9223372036854775808-9223372036854775807",
        "-9223372036854775808--1,0-9223372036854775807",
    ] {
        assert!(
            matches!(FrameSet::parse(spec), Err(CompileError::InvalidRange(_))),
            "spec {spec:?} should be rejected"
        );
    }
    assert!(matches!(
        FrameSet::from_spans([FrameSpan { start: i64::MIN, end: i64::MAX }]),
        Err(CompileError::InvalidRange(_))
    ));
}

#[test]
fn extreme_bounds_that_fit_are_counted() {
    let set = FrameSet::parse("0-9223372036854775807").unwrap();
    assert_eq!(set.len_frames(), 1 << 63);

    let set = FrameSet::parse("-9223372036854775808-9223372036854775806").unwrap();
    assert_eq!(set.len_frames(), u64::MAX);
    assert_eq!(set.first(), i64::MIN);
    assert_eq!(set.last(), i64::MAX - 1);
}
