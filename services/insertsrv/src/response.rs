//! Response packager (spec.md §4.5): builds the single-entry wire reply
//! map clients see as the final word on an insert request.

use crate::job::InsertOutcome;
use siridb_wire::Encoder;

fn encode_single_entry(key: &'static str, value: &str) -> Vec<u8> {
    let mut enc = Encoder::new();
    enc.open_map();
    enc.push_raw_term(key.as_bytes());
    enc.push_raw(value.as_bytes());
    enc.close_map();
    enc.into_inner()
}

pub fn success_reply(points: u64) -> Vec<u8> {
    encode_single_entry(
        "success_msg",
        &format!("Inserted {points} point(s) successfully."),
    )
}

pub fn error_reply(message: &str) -> Vec<u8> {
    encode_single_entry("error_msg", message)
}

/// Builds the final reply from a settled job outcome: success if every
/// pool acknowledged, otherwise an error naming the failing pools and the
/// points that did make it in (spec.md §7 tier 2 — no cross-pool
/// rollback).
pub fn reply_for_outcome(outcome: &InsertOutcome) -> Vec<u8> {
    if outcome.failures.is_empty() {
        return success_reply(outcome.successful_points);
    }

    let pool_list = outcome
        .failures
        .iter()
        .map(|f| f.to_string())
        .collect::<Vec<_>>()
        .join("; ");
    let message = format!(
        "insert failed on {} pool(s) ({}); {} point(s) written successfully",
        outcome.failures.len(),
        pool_list,
        outcome.successful_points
    );
    error_reply(&message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use siridb_errors::PoolFailure;
    use siridb_wire::{Decoder, Token};

    #[test]
    fn success_reply_contains_point_count_in_decimal() {
        let buf = success_reply(3);
        let mut dec = Decoder::new(&buf);
        assert_eq!(dec.next().unwrap(), Token::MapOpen);
        assert_eq!(dec.next().unwrap(), Token::Raw(b"success_msg"));
        match dec.next().unwrap() {
            Token::Raw(msg) => {
                assert_eq!(
                    std::str::from_utf8(msg).unwrap(),
                    "Inserted 3 point(s) successfully."
                );
            }
            other => panic!("unexpected token {other:?}"),
        }
        assert_eq!(dec.next().unwrap(), Token::MapClose);
    }

    #[test]
    fn error_reply_uses_error_msg_key() {
        let buf = error_reply("boom");
        let mut dec = Decoder::new(&buf);
        assert_eq!(dec.next().unwrap(), Token::MapOpen);
        assert_eq!(dec.next().unwrap(), Token::Raw(b"error_msg"));
        assert_eq!(dec.next().unwrap(), Token::Raw(b"boom"));
        assert_eq!(dec.next().unwrap(), Token::MapClose);
    }

    #[test]
    fn partial_failure_names_pool_and_surviving_points() {
        let outcome = InsertOutcome {
            successful_points: 3,
            failures: vec![PoolFailure::Timeout { pool_id: 1 }],
        };
        let buf = reply_for_outcome(&outcome);
        let mut dec = Decoder::new(&buf);
        assert_eq!(dec.next().unwrap(), Token::MapOpen);
        assert_eq!(dec.next().unwrap(), Token::Raw(b"error_msg"));
        match dec.next().unwrap() {
            Token::Raw(msg) => {
                let msg = std::str::from_utf8(msg).unwrap();
                assert!(msg.contains("pool 1"));
                assert!(msg.contains('3'));
            }
            other => panic!("unexpected token {other:?}"),
        }
    }
}
