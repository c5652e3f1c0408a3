//! Framing through the full producer/queue/consumer path.

use std::thread;

use linepump_reader::{DelimitedReader, ReaderConfig, ReaderEvent, Termination};
use proptest::prelude::*;

use crate::common::{blocking_collect, collect, payloads};

#[tokio::test]
async fn test_newline_scenario_with_small_queue() {
    let config = ReaderConfig::default()
        .try_with_queue_capacity(2)
        .unwrap();
    let mut stream = DelimitedReader::with_config(&b"a\nbb\n\nccc\n"[..], config).spawn();

    let (records, terminal) = collect(&mut stream).await;
    assert_eq!(records, payloads(&["a", "bb", "", "ccc"]));
    assert_eq!(terminal, Some(ReaderEvent::EndOfStream { records: 4 }));

    // Closed for good.
    assert!(stream.recv().await.is_none());
    assert!(stream.next_record().await.unwrap().is_none());
}

#[tokio::test]
async fn test_unterminated_tail_is_dropped() {
    let mut stream = DelimitedReader::new(&b"x;y;z"[..])
        .with_delimiter(b';')
        .spawn();

    let (records, terminal) = collect(&mut stream).await;
    assert_eq!(records, payloads(&["x", "y"]));
    assert_eq!(terminal, Some(ReaderEvent::EndOfStream { records: 2 }));
}

#[tokio::test]
async fn test_empty_source_closes_immediately() {
    let mut stream = DelimitedReader::new(&b""[..]).spawn();
    let (records, terminal) = collect(&mut stream).await;
    assert!(records.is_empty());
    assert_eq!(terminal, Some(ReaderEvent::EndOfStream { records: 0 }));

    assert_eq!(stream.stop().await, 0);
    let summary = stream.summary().unwrap();
    assert_eq!(summary.termination(), &Termination::EndOfStream);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_order_survives_heavy_backpressure() {
    let input: String = (0..5_000).map(|i| format!("{i}\n")).collect();
    let config = ReaderConfig::default()
        .try_with_queue_capacity(1)
        .unwrap();
    let mut stream = DelimitedReader::with_config(std::io::Cursor::new(input), config).spawn();

    let mut expected = 0u32;
    while let Some(record) = stream.next_record().await.unwrap() {
        assert_eq!(record.to_string_lossy(), expected.to_string());
        expected += 1;
    }
    assert_eq!(expected, 5_000);
}

#[test]
fn test_split_with_caller_owned_thread() {
    let (producer, mut stream) = DelimitedReader::new(&b"1|2|3|"[..])
        .with_delimiter(b'|')
        .with_name("pipes")
        .split();
    let handle = thread::Builder::new()
        .name(format!("producer-{}", producer.name()))
        .spawn(move || producer.run())
        .unwrap();

    let (records, _) = blocking_collect(&mut stream);
    let summary = handle.join().unwrap();

    assert_eq!(records, payloads(&["1", "2", "3"]));
    assert_eq!(summary.records(), 3);
    assert_eq!(summary.termination(), &Termination::EndOfStream);
}

#[test]
fn test_binary_payloads_pass_through() {
    let input: &'static [u8] = &[0xff, 0x00, 0x1e, 0xfe, 0x1e, 0x1e];
    let (producer, mut stream) = DelimitedReader::new(&input[..])
        .with_delimiter(0x1e)
        .split();
    let handle = thread::spawn(move || producer.run());

    let (records, _) = blocking_collect(&mut stream);
    handle.join().unwrap();
    assert_eq!(records, vec![vec![0xff, 0x00], vec![0xfe], vec![]]);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_n_delimiters_yield_n_records(
        delimiter in any::<u8>(),
        capacity in 1usize..4,
        seed in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..16), 0..24),
        tail in prop::collection::vec(any::<u8>(), 0..8),
    ) {
        let strip = |bytes: Vec<u8>| -> Vec<u8> {
            bytes.into_iter().filter(|b| *b != delimiter).collect()
        };
        let segments: Vec<Vec<u8>> = seed.into_iter().map(&strip).collect();
        let tail = strip(tail);

        let mut input = Vec::new();
        for segment in &segments {
            input.extend_from_slice(segment);
            input.push(delimiter);
        }
        input.extend_from_slice(&tail);

        let config = ReaderConfig::default()
            .with_delimiter(delimiter)
            .try_with_queue_capacity(capacity)
            .unwrap();
        let (producer, mut stream) =
            DelimitedReader::with_config(std::io::Cursor::new(input), config).split();
        let handle = thread::spawn(move || producer.run());

        let (records, terminal) = blocking_collect(&mut stream);
        let summary = handle.join().unwrap();

        prop_assert_eq!(&records, &segments);
        prop_assert_eq!(
            terminal,
            Some(ReaderEvent::EndOfStream { records: segments.len() as u64 })
        );
        prop_assert_eq!(summary.records(), segments.len() as u64);
    }
}
