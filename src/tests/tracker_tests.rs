use std::{num::NonZeroUsize, sync::Arc};

use rand::{Rng, seq::SliceRandom};

use crate::{
    message::Message,
    tracker::{AddOutcome, MessageTracker, RecencyTracker, TrackerError},
};

fn generate_message(n: usize) -> Message {
    Message::new(format!("someID{n}"), format!("somePeerID{n}"), vec![0, 1, 1])
}

fn tracker(capacity: usize) -> RecencyTracker {
    RecencyTracker::new(NonZeroUsize::new(capacity).expect("Test capacity must be non zero"))
}

fn ids(messages: &[Arc<Message>]) -> Vec<String> {
    messages.iter().map(|m| m.id.clone()).collect()
}

fn expected_ids(range: impl IntoIterator<Item = usize>) -> Vec<String> {
    range.into_iter().map(|n| generate_message(n).id).collect()
}

#[test]
fn test_add_get_then_list() -> Result<(), anyhow::Error> {
    let length = 5;
    let mt = tracker(length);

    for i in 0..length {
        assert_eq!(mt.add(generate_message(i)), AddOutcome::Inserted);
        let msg = mt.get(&generate_message(i).id)?;
        assert_eq!(*msg, generate_message(i), "Stored message differs from the added one");
    }

    assert_eq!(ids(&mt.list()), expected_ids(0..5));
    assert_eq!(mt.len(), length);
    Ok(())
}

#[test]
fn test_delete_some() -> Result<(), anyhow::Error> {
    let length = 5;
    let mt = tracker(length);

    for i in 0..length {
        mt.add(generate_message(i));
    }
    for i in 0..length - 2 {
        mt.delete(&generate_message(i).id)?;
    }

    assert_eq!(ids(&mt.list()), expected_ids(3..5));
    for i in 0..length - 2 {
        assert_eq!(
            mt.get(&generate_message(i).id),
            Err(TrackerError::NotFound(generate_message(i).id)),
            "Deleted message is still reachable"
        );
    }
    Ok(())
}

#[test]
fn test_not_full_with_duplicates() {
    let length = 5;
    let mt = tracker(length);

    for i in 0..length - 1 {
        mt.add(generate_message(i));
    }
    for _ in 0..length - 1 {
        assert!(mt.add(generate_message(length - 2)).is_duplicate());
    }

    assert_eq!(ids(&mt.list()), expected_ids(0..4));
}

#[test]
fn test_duplicates_from_other_peers_keep_original() -> Result<(), anyhow::Error> {
    let length = 5;
    let mt = tracker(length);

    for i in 0..length - 1 {
        mt.add(generate_message(i));
    }
    for _ in 0..length - 1 {
        let mut msg = generate_message(length - 2);
        msg.origin = "somePeerID0".to_string();
        msg.payload = vec![9, 9, 9];
        assert_eq!(mt.add(msg), AddOutcome::Refreshed);
    }

    let stored = mt.get(&generate_message(length - 2).id)?;
    assert_eq!(
        *stored,
        generate_message(length - 2),
        "Duplicate add must not overwrite the stored message"
    );
    assert_eq!(mt.list().len(), length - 1);
    Ok(())
}

#[test]
fn test_overflow_evicts_oldest() {
    let length = 5;
    let mt = tracker(length);

    for i in 0..length * 2 {
        let outcome = mt.add(generate_message(i));
        if i < length {
            assert_eq!(outcome, AddOutcome::Inserted);
        } else {
            assert_eq!(
                outcome,
                AddOutcome::Evicted(Arc::new(generate_message(i - length))),
                "Wrong message evicted"
            );
        }
        assert!(mt.len() <= length, "Capacity exceeded");
    }

    assert_eq!(ids(&mt.list()), expected_ids(5..10));
}

#[test]
fn test_overflow_with_duplicates() {
    let length = 5;
    let mt = tracker(length);

    for i in 0..length * 2 {
        mt.add(generate_message(i));
    }
    for i in length..length * 2 {
        assert!(mt.add(generate_message(i)).is_duplicate());
    }

    assert_eq!(ids(&mt.list()), expected_ids(5..10));
}

#[test]
fn test_duplicates_move_to_front() {
    let mt = tracker(5);

    for i in [0, 1, 2, 3, 4, 0, 1] {
        mt.add(generate_message(i));
    }

    assert_eq!(ids(&mt.list()), expected_ids([2, 3, 4, 0, 1]));

    // The refreshed ids now outlive the ones inserted after them
    mt.add(generate_message(5));
    mt.add(generate_message(6));
    assert_eq!(ids(&mt.list()), expected_ids([4, 0, 1, 5, 6]));
}

#[test]
fn test_delete_missing() {
    let mt = tracker(5);
    assert_eq!(mt.delete("bleh"), Err(TrackerError::NotFound("bleh".to_string())));

    mt.add(generate_message(0));
    assert!(mt.delete("bleh").is_err());
    assert_eq!(ids(&mt.list()), expected_ids([0]), "Failed delete changed state");
}

#[test]
fn test_get_missing() {
    let mt = tracker(5);
    let err = mt.get("bleh").expect_err("Empty tracker returned a message");
    assert_eq!(err.to_string(), "Message not found: bleh");
    assert!(!mt.contains("bleh"));
}

#[test]
fn test_get_does_not_reorder() -> Result<(), anyhow::Error> {
    let mt = tracker(3);
    for i in 0..3 {
        mt.add(generate_message(i));
    }

    for _ in 0..10 {
        mt.get(&generate_message(0).id)?;
        assert!(mt.contains(&generate_message(0).id));
    }
    assert_eq!(ids(&mt.list()), expected_ids(0..3));

    // Oldest is still the first to go
    mt.add(generate_message(3));
    assert!(!mt.contains(&generate_message(0).id), "Get refreshed recency");
    Ok(())
}

#[test]
fn test_capacity_one() {
    let mt = tracker(1);
    assert_eq!(mt.capacity(), 1);

    mt.add(generate_message(0));
    assert!(mt.add(generate_message(0)).is_duplicate());
    mt.add(generate_message(1));

    assert_eq!(ids(&mt.list()), expected_ids([1]));
}

#[test]
fn test_reinsert_after_delete() -> Result<(), anyhow::Error> {
    let mt = tracker(3);
    for i in 0..3 {
        mt.add(generate_message(i));
    }
    mt.delete(&generate_message(1).id)?;

    // Room was freed, nothing is evicted
    assert_eq!(mt.add(generate_message(1)), AddOutcome::Inserted);
    assert_eq!(ids(&mt.list()), expected_ids([0, 2, 1]));

    mt.delete(&generate_message(0).id)?;
    mt.delete(&generate_message(2).id)?;
    mt.delete(&generate_message(1).id)?;
    assert!(mt.is_empty());
    assert!(mt.list().is_empty());
    Ok(())
}

/// Random adds and deletes checked against a simple vector of ids
#[test]
fn test_random_operations_match_model() {
    let capacity = 8;
    let mt = tracker(capacity);
    let mut model: Vec<String> = Vec::new(); // Oldest first
    let mut rng = rand::rng();

    let mut pool: Vec<usize> = (0..24).collect();
    pool.shuffle(&mut rng);

    for step in 0..2000 {
        let n = pool[rng.random_range(0..pool.len())];
        let id = generate_message(n).id;

        if rng.random_bool(0.25) {
            let result = mt.delete(&id);
            match model.iter().position(|m| *m == id) {
                Some(pos) => {
                    assert!(result.is_ok(), "Step {step}: delete of present id failed");
                    model.remove(pos);
                }
                None => assert!(result.is_err(), "Step {step}: delete of absent id succeeded"),
            }
        } else {
            mt.add(generate_message(n));
            match model.iter().position(|m| *m == id) {
                Some(pos) => {
                    model.remove(pos);
                }
                None => {
                    if model.len() >= capacity {
                        model.remove(0);
                    }
                }
            }
            model.push(id);
        }

        assert_eq!(ids(&mt.list()), model, "Step {step}: tracker diverged from model");
    }
}
