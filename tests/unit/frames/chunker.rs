use super::*;

fn names(chunks: Chunks) -> Vec<String> {
    chunks.map(|c| c.to_string()).collect()
}

fn assert_partition(set: &FrameSet, chunks: Chunks) {
    let mut seen = Vec::<i64>::new();
    let mut prev_last = None;
    for chunk in chunks {
        if let Some(p) = prev_last {
            assert!(chunk.first() > p, "chunks must be increasing and disjoint");
        }
        prev_last = Some(chunk.last());
        for span in chunk.spans() {
            seen.extend(span.start..=span.end);
        }
    }
    assert_eq!(seen, set.frames().collect::<Vec<_>>());
}

#[test]
fn fixed_size_splits_simple_range() {
    let chunks = FixedSizeChunker { size: 3 }.chunk("1-10").unwrap();
    assert_eq!(names(chunks), vec!["1-3", "4-6", "7-9", "10"]);
}

#[test]
fn fixed_size_chunks_may_span_several_items() {
    let chunks = FixedSizeChunker { size: 20 }
        .chunk("0-12,34-56,78-90")
        .unwrap();
    let chunks: Vec<Chunk> = chunks.collect();
    let rendered: Vec<String> = chunks.iter().map(|c| c.to_string()).collect();
    assert_eq!(rendered, vec!["0-12,34-40", "41-56,78-81", "82-90"]);
    assert_eq!(chunks[0].blender_arg(), "0..12,34..40");
    assert_eq!(chunks[0].len_frames(), 20);
}

#[test]
fn fixed_count_produces_equal_chunks() {
    let chunks = FixedCountChunker { count: 3 }.chunk("1-30").unwrap();
    assert_eq!(names(chunks), vec!["1-10", "11-20", "21-30"]);
}

#[test]
fn fixed_count_puts_remainder_first_and_caps_at_frame_count() {
    let chunks = FixedCountChunker { count: 3 }.chunk("1-11").unwrap();
    assert_eq!(names(chunks), vec!["1-4", "5-8", "9-11"]);

    let chunks = FixedCountChunker { count: 5 }.chunk("1-2").unwrap();
    assert_eq!(names(chunks), vec!["1", "2"]);
}

#[test]
fn chunks_partition_the_input() {
    let specs = ["1-100", "-10-10", "1,3,5-9,40-77,80", "7"];
    for spec in specs {
        let set = FrameSet::parse(spec).unwrap();
        for size in [1, 2, 7, 50, 1000] {
            assert_partition(&set, FixedSizeChunker { size }.chunks(set.clone()).unwrap());
        }
        for count in [1, 3, 8, 200] {
            assert_partition(&set, FixedCountChunker { count }.chunks(set.clone()).unwrap());
        }
    }
}

#[test]
fn sequence_is_restartable_and_deterministic() {
    let chunks = ChunkPolicy::FixedSize { size: 4 }.chunk("1-17").unwrap();
    let again = chunks.clone();
    assert_eq!(chunks.size_hint(), (5, Some(5)));
    assert_eq!(names(chunks), names(again));

    let a = names(ChunkPolicy::FixedCount { count: 4 }.chunk("3-40").unwrap());
    let b = names(ChunkPolicy::FixedCount { count: 4 }.chunk("3-40").unwrap());
    assert_eq!(a, b);
}

#[test]
fn invalid_input_and_zero_sizes_are_rejected() {
    assert!(matches!(
        FixedSizeChunker { size: 0 }.chunk("1-10"),
        Err(CompileError::InvalidRange(_))
    ));
    assert!(matches!(
        FixedCountChunker { count: 0 }.chunk("1-10"),
        Err(CompileError::InvalidRange(_))
    ));
    assert!(matches!(
        ChunkPolicy::default().chunk("10-1"),
        Err(CompileError::InvalidRange(_))
    ));
}

#[test]
fn policy_deserializes_from_tagged_json() {
    let p: ChunkPolicy = serde_json::from_str(r#"{ "mode": "fixed_count", "count": 3 }"#).unwrap();
    assert_eq!(p, ChunkPolicy::FixedCount { count: 3 });
    assert_eq!(ChunkPolicy::default(), ChunkPolicy::FixedSize { size: 10 });
}

#[test]
fn single_chunk_reaches_i64_max() {
    let chunks: Vec<Chunk> = FixedCountChunker { count: 1 }
        .chunk("0-9223372036854775807")
        .unwrap()
        .collect();
    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].first(), 0);
    assert_eq!(chunks[0].last(), i64::MAX);
    assert_eq!(chunks[0].len_frames(), 1 << 63);
}

#[test]
fn extreme_ranges_are_still_partitioned() {
    let spec = "-9223372036854775808-9223372036854775806";
    let policies: [&dyn FrameChunker; 3] = [
        &FixedCountChunker { count: 3 },
        &FixedSizeChunker { size: 1 << 62 },
        &FixedSizeChunker { size: u64::MAX },
    ];
    for chunker in policies {
        let chunks: Vec<Chunk> = chunker.chunk(spec).unwrap().collect();
        assert!(!chunks.is_empty());
        assert_eq!(chunks[0].first(), i64::MIN);
        assert_eq!(chunks[chunks.len() - 1].last(), i64::MAX - 1);
        for pair in chunks.windows(2) {
            assert_eq!(pair[0].last().checked_add(1), Some(pair[1].first()));
        }
        let total = chunks
            .iter()
            .try_fold(0u64, |acc, c| acc.checked_add(c.len_frames()));
        assert_eq!(total, Some(u64::MAX));
    }
}

#[test]
fn full_i64_range_is_rejected_by_every_policy() {
    let spec = "-9223372036854775808-9223372036854775807";
    for policy in [
        ChunkPolicy::FixedSize { size: 10 },
        ChunkPolicy::FixedCount { count: 3 },
    ] {
        assert!(matches!(
            policy.chunk(spec),
            Err(CompileError::InvalidRange(_))
        ));
    }
}

#[test]
fn remaining_chunks_is_known_without_iterating() {
    let chunks = ChunkPolicy::default().chunk("1-100000000000").unwrap();
    assert_eq!(chunks.remaining_chunks(), 10_000_000_000);

    let mut chunks = FixedCountChunker { count: 3 }.chunk("1-30").unwrap();
    chunks.next();
    assert_eq!(chunks.remaining_chunks(), 2);
}
