// Copyright 2026 Adobe. All rights reserved.
// This file is licensed to you under the Apache License,
// Version 2.0 (http://www.apache.org/licenses/LICENSE-2.0)
// or the MIT license (http://opensource.org/licenses/MIT),
// at your option.

// Unless required by applicable law or agreed to in writing,
// this software is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR REPRESENTATIONS OF ANY KIND, either express or
// implied. See the LICENSE-MIT and LICENSE-APACHE files for the
// specific language governing permissions and limitations under
// each license.

//! Decoding input that arrives in pieces.
//!
//! Each chunk is presented as a fresh `Input` over the bytes the decoder has
//! not consumed yet, the way a network reader would refill its buffer.

use cbor_object::{
    CborError, Decoder, DecoderState, Encoder, Input, Map, OutputStatic, Result, Value, from_slice,
    to_vec,
};

fn sample_document() -> Value {
    let mut profile = Map::new(3);
    profile.insert("name", "Alice");
    profile.insert("age", 30);
    profile.insert("tags", vec![Value::from("admin"), Value::from("ops")]);

    let mut root = Map::new(6);
    root.insert("profile", profile);
    root.insert("id", u64::MAX);
    root.insert("balance", Value::extra_int(true, (1 << 63) + 10).unwrap());
    root.insert("blob", vec![0x5au8; 300]);
    root.insert("nested", vec![Value::from(vec![Value::array(0), Value::map(0)])]);
    root.insert(
        "misc",
        vec![
            Value::Null,
            Value::Undefined,
            Value::Bool(true),
            Value::Tag(1),
            Value::from(1700000000),
            Value::ExtraTag(1 << 40),
            Value::Special(99),
            Value::ExtraSpecial(1 << 33),
            Value::from("x".repeat(70000)),
        ],
    );
    Value::Map(root)
}

/// Feeds `bytes` to one decoder, `chunk` new bytes at a time.
fn decode_in_chunks(bytes: &[u8], chunk: usize) -> Result<Value> {
    let mut decoder = Decoder::new();
    let mut consumed = 0;
    let mut available = 0;
    loop {
        available = (available + chunk).min(bytes.len());
        let mut input = Input::new(&bytes[consumed..available]);
        if let Some(value) = decoder.poll(&mut input)? {
            return Ok(value);
        }
        consumed += input.position();
        if available == bytes.len() {
            return decoder.run(&mut Input::new(&bytes[consumed..]));
        }
    }
}

#[test]
fn test_every_chunk_size_matches_whole_decode() {
    let document = sample_document();
    let encoded = to_vec(&document).unwrap();
    assert_eq!(from_slice(&encoded).unwrap(), document);

    for chunk in [1, 2, 3, 5, 7, 8, 9, 16, 64, 1000, 65536] {
        assert_eq!(
            decode_in_chunks(&encoded, chunk).unwrap(),
            document,
            "chunk size {}",
            chunk
        );
    }
}

#[test]
fn test_truncated_document_reports_open_structures() {
    let encoded = to_vec(&sample_document()).unwrap();
    for cut in [1, 10, encoded.len() / 2, encoded.len() - 1] {
        assert_eq!(
            decode_in_chunks(&encoded[..cut], 4),
            Err(CborError::UnterminatedStructure),
            "cut at {}",
            cut
        );
    }
}

#[test]
fn test_truncated_scalar_reports_nothing() {
    let encoded = to_vec(&Value::from("hello world")).unwrap();
    for cut in 0..encoded.len() {
        assert_eq!(
            decode_in_chunks(&encoded[..cut], 3),
            Err(CborError::DecodedNothing)
        );
    }
}

#[test]
fn test_run_resumes_after_incomplete_errors() {
    // [1, "abc", {"k": 2}]
    let encoded = [
        0x83, 0x01, 0x63, 0x61, 0x62, 0x63, 0xa1, 0x61, 0x6b, 0x02,
    ];
    let mut decoder = Decoder::new();
    let mut consumed = 0;

    for end in 1..encoded.len() {
        let mut input = Input::new(&encoded[consumed..end]);
        let err = decoder.run(&mut input).unwrap_err();
        assert!(err.is_incomplete());
        assert!(!decoder.is_failed());
        consumed += input.position();
    }

    let value = decoder.run(&mut Input::new(&encoded[consumed..])).unwrap();
    let mut map = Map::new(1);
    map.insert("k", 2);
    assert_eq!(
        value,
        Value::from(vec![Value::from(1), Value::from("abc"), Value::Map(map)])
    );
}

#[test]
fn test_partial_input_is_left_unconsumed() {
    // 2-byte argument, 4-byte argument, then a 3-byte string
    let encoded = [
        0x83, 0x19, 0x01, 0x00, 0x1a, 0x00, 0x01, 0x00, 0x00, 0x63, 0x61, 0x62, 0x63,
    ];
    let mut decoder = Decoder::new();

    let mut input = Input::new(&encoded[..3]);
    assert_eq!(decoder.poll(&mut input), Ok(None));
    assert_eq!(input.position(), 2);
    assert_eq!(decoder.state(), DecoderState::PosInt);
    assert_eq!(decoder.depth(), 1);

    let mut input = Input::new(&encoded[2..8]);
    assert_eq!(decoder.poll(&mut input), Ok(None));
    assert_eq!(input.position(), 3);
    assert_eq!(decoder.state(), DecoderState::PosInt);

    let mut input = Input::new(&encoded[5..12]);
    assert_eq!(decoder.poll(&mut input), Ok(None));
    assert_eq!(input.position(), 5);
    assert_eq!(decoder.state(), DecoderState::StringData);

    let mut input = Input::new(&encoded[10..]);
    let value = decoder.poll(&mut input).unwrap().unwrap();
    assert!(input.is_empty());
    assert_eq!(
        value,
        Value::from(vec![
            Value::from(256),
            Value::from(65536),
            Value::from("abc")
        ])
    );
}

#[test]
fn test_error_in_later_chunk_poisons_decoder() {
    let mut decoder = Decoder::new();
    assert_eq!(decoder.poll(&mut Input::new(&[0x82, 0x01])), Ok(None));
    assert!(matches!(
        decoder.poll(&mut Input::new(&[0x1e])),
        Err(CborError::InvalidMinor {
            major: 0,
            minor: 30
        })
    ));
    assert!(decoder.is_failed());
    assert_eq!(
        decoder.poll(&mut Input::new(&[0x02])),
        Err(CborError::Poisoned)
    );
}

#[test]
fn test_map_key_error_across_chunks() {
    // {"a": 1, 1: ...}
    let mut decoder = Decoder::new();
    assert_eq!(decoder.poll(&mut Input::new(&[0xa2, 0x61])), Ok(None));
    assert_eq!(decoder.poll(&mut Input::new(&[0x61, 0x01])), Ok(None));
    assert_eq!(decoder.depth(), 1);
    assert_eq!(
        decoder.poll(&mut Input::new(&[0x01])),
        Err(CborError::InvalidMapKey(cbor_object::ValueType::Int))
    );
    assert!(decoder.is_failed());
}

#[test]
fn test_encode_into_exact_fixed_buffer() {
    let document = sample_document();
    let size = to_vec(&document).unwrap().len();

    let mut encoder = Encoder::new(OutputStatic::new(size));
    encoder.write_value(&document).unwrap();
    let encoded = encoder.into_inner().into_vec();
    assert_eq!(encoded.len(), size);
    assert_eq!(decode_in_chunks(&encoded, 128), Ok(document.clone()));

    let mut encoder = Encoder::new(OutputStatic::new(size - 1));
    assert!(matches!(
        encoder.write_value(&document),
        Err(CborError::CapacityExceeded { .. })
    ));
}
