//! Contract Test - perilaku publik CircularBuffer
//!
//! Skenario mengikuti suite cirbuf klasik (capacity 65536) ditambah
//! wraparound, guard full/empty, dan independensi antar buffer.
//!
//! Usage:
//!   cargo test --test buffer_contract_test

use cirbuf::{page_size, AllocationError, CircularBuffer};
use proptest::prelude::*;
use std::collections::VecDeque;

const CAPACITY: usize = 65536;

fn new_buffer() -> CircularBuffer {
    CircularBuffer::new(CAPACITY).expect("65536 is page aligned")
}

#[test]
fn set_size_with_init() {
    let cb = new_buffer();
    assert_eq!(cb.capacity(), CAPACITY);
}

#[test]
fn is_empty_after_init() {
    let cb = new_buffer();
    assert!(cb.is_empty());
    assert_eq!(cb.used_space(), 0);
    assert_eq!(cb.unused_space(), CAPACITY);
    assert!(cb.peek().is_none());
}

#[test]
fn is_not_empty_after_offer() {
    let mut cb = new_buffer();
    assert_eq!(cb.offer(b"abcd"), 4);
    assert!(!cb.is_empty());
}

#[test]
fn is_empty_after_poll_release() {
    let mut cb = new_buffer();
    cb.offer(b"abcd");
    cb.poll(4);
    assert!(cb.is_empty());
}

#[test]
fn used_space_is_zero_after_poll_release() {
    let mut cb = new_buffer();
    cb.offer(b"abcd");
    assert_eq!(cb.used_space(), 4);
    cb.poll(4);
    assert_eq!(cb.used_space(), 0);
}

#[test]
fn cant_offer_if_not_enough_space() {
    let mut cb = new_buffer();
    let data = vec![b'1'; 1 << 17];
    assert_eq!(cb.offer(&data), 0);
    assert!(cb.is_empty());
}

#[test]
fn cant_offer_if_buffer_will_be_completely_full() {
    let mut cb = new_buffer();
    let data = vec![b'1'; 1 << 16];
    assert_eq!(cb.offer(&data), 0);
    assert!(cb.is_empty());
    assert_eq!(cb.unused_space(), CAPACITY);

    // Satu byte lebih sedikit masih boleh
    assert_eq!(cb.offer(&data[1..]), CAPACITY - 1);
    assert_eq!(cb.offer(b"x"), 0);
}

#[test]
fn offer_and_poll() {
    let mut cb = new_buffer();
    cb.offer(b"abcd");
    assert_eq!(cb.poll(4), Some(&b"abcd"[..]));
}

#[test]
fn cant_poll_nonexistent() {
    let mut cb = new_buffer();
    assert!(cb.poll(4).is_none());
}

#[test]
fn cant_poll_twice_when_released() {
    let mut cb = new_buffer();
    cb.offer(b"1000");
    assert!(cb.poll(4).is_some());
    assert!(cb.poll(4).is_none());
    assert!(cb.poll(4).is_none());
}

#[test]
fn cant_poll_more_than_used() {
    let mut cb = new_buffer();
    cb.offer(b"abcd");
    assert!(cb.poll(5).is_none());
    assert_eq!(cb.used_space(), 4);
    assert_eq!(cb.peek(), Some(&b"abcd"[..]));
}

#[test]
fn independent_of_each_other() {
    let mut cb = new_buffer();
    let mut cb2 = new_buffer();
    cb.offer(b"abcd");
    cb2.offer(b"efgh");
    assert_eq!(cb.poll(4), Some(&b"abcd"[..]));
    assert_eq!(cb2.used_space(), 4);
    assert_eq!(cb2.poll(4), Some(&b"efgh"[..]));
}

#[test]
fn independent_of_each_other_with_no_polling() {
    let mut cb = new_buffer();
    let mut cb2 = new_buffer();
    cb.offer(b"abcd");
    cb2.offer(b"efgh");
    assert_eq!(cb.peek(), Some(&b"abcd"[..]));
    assert_eq!(cb2.peek(), Some(&b"efgh"[..]));
}

#[test]
fn wraparound_is_transparent() {
    let mut cb = new_buffer();
    let k = 5000;
    let chunk = vec![0xAAu8; k];

    // Dorong write cursor sampai wrap ke nilai < k
    let rounds = CAPACITY / k + 1;
    for _ in 0..rounds {
        assert_eq!(cb.offer(&chunk), k);
        assert_eq!(cb.poll(k).map(<[u8]>::len), Some(k));
    }
    assert!(cb.is_empty());

    // Tulis hampir penuh: data melewati titik wrap sekali lagi
    let payload: Vec<u8> = (0..cb.unused_space() - 1).map(|i| (i % 251) as u8).collect();
    assert_eq!(cb.offer(&payload), payload.len());
    assert_eq!(cb.peek(), Some(&payload[..]));
    assert_eq!(cb.poll(payload.len()), Some(&payload[..]));
    assert!(cb.is_empty());
}

#[test]
fn example_scenario() {
    let mut cb = CircularBuffer::new(65536).unwrap();
    assert_eq!(cb.offer(b"abcd"), 4);
    assert_eq!(cb.used_space(), 4);
    assert_eq!(cb.poll(4), Some(&[b'a', b'b', b'c', b'd'][..]));
    assert!(cb.is_empty());
}

#[test]
fn unaligned_capacity_is_rejected() {
    match CircularBuffer::new(page_size() + 1) {
        Err(AllocationError::InvalidCapacity { capacity, page_size: page }) => {
            assert_eq!(capacity, page_size() + 1);
            assert_eq!(page, page_size());
        }
        other => panic!("expected InvalidCapacity, got {:?}", other.map(|cb| cb.capacity())),
    }
}

#[test]
fn with_min_capacity_rounds_up() {
    let cb = CircularBuffer::with_min_capacity(10_000).unwrap();
    assert!(cb.capacity() >= 10_000);
    assert_eq!(cb.capacity() % page_size(), 0);
}

#[derive(Debug, Clone)]
enum Op {
    Offer(Vec<u8>),
    Poll(usize),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        prop::collection::vec(any::<u8>(), 0..3000).prop_map(Op::Offer),
        (0usize..3000).prop_map(Op::Poll),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Bandingkan dengan VecDeque sebagai model
    #[test]
    fn matches_vecdeque_model(ops in prop::collection::vec(op(), 1..200)) {
        let mut cb = CircularBuffer::new(page_size()).unwrap();
        let cap = cb.capacity();
        let mut model: VecDeque<u8> = VecDeque::new();

        for op in ops {
            match op {
                Op::Offer(data) => {
                    let written = cb.offer(&data);
                    if data.len() >= cap - model.len() {
                        prop_assert_eq!(written, 0);
                    } else {
                        prop_assert_eq!(written, data.len());
                        model.extend(data.iter().copied());
                    }
                }
                Op::Poll(len) => {
                    let polled = cb.poll(len).map(<[u8]>::to_vec);
                    if model.is_empty() || len > model.len() {
                        prop_assert!(polled.is_none());
                    } else {
                        let expected: Vec<u8> = model.drain(..len).collect();
                        prop_assert_eq!(polled, Some(expected));
                    }
                }
            }

            prop_assert_eq!(cb.used_space(), model.len());
            prop_assert_eq!(cb.unused_space(), cap - model.len());
            prop_assert_eq!(cb.is_empty(), model.is_empty());
            prop_assert!(cb.used_space() < cap);
            let peeked = cb.peek().map(<[u8]>::to_vec).unwrap_or_default();
            prop_assert_eq!(peeked, model.iter().copied().collect::<Vec<u8>>());
        }
    }
}
