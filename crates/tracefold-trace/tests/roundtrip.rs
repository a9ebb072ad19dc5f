//! Wire round trips and end-to-end consolidation of trace logs.

use proptest::prelude::*;
use tracefold_core::{Consolidator, Locator, Operation, Provenance};
use tracefold_trace::format::{AnnotatedVariable, Header, TraceLog};
use tracefold_trace::io::{
    decode, encode, read_trace_log_auto, read_trace_log_json, write_trace_log_auto,
};

const SAMPLE: &str = r#"{
  "header": {
    "version": 2,
    "annotatedVariables": {
      "a": { "identifier": "a", "rawType": "array", "abstractType": "array",
             "visual": "bar", "attributes": { "size": 2 } }
    },
    "sources": { "Sort.java": ["int t = a[0];", "a[0] = a[1];", "a[1] = t;"] }
  },
  "body": [
    { "operation": "init",
      "operationBody": { "target": { "identifier": "a" }, "size": [2], "value": [5, 3] } },
    { "operation": "read",
      "operationBody": { "source": { "identifier": "a", "index": [0] },
                         "target": { "identifier": "t" }, "value": [5] },
      "source": "Sort.java", "beginLine": 1, "endLine": 1 },
    { "operation": "message", "operationBody": { "value": "swapping" } },
    { "operation": "write",
      "operationBody": { "source": { "identifier": "a", "index": [1] },
                         "target": { "identifier": "a", "index": [0] }, "value": [3] },
      "source": "Sort.java", "beginLine": 2, "endLine": 2 },
    { "operation": "remove", "operationBody": { "target": { "identifier": "x" } } },
    { "operation": "write",
      "operationBody": { "source": { "identifier": "t" },
                         "target": { "identifier": "a", "index": [1] }, "value": [5] },
      "source": "Sort.java", "beginLine": 3, "endLine": 3 }
  ]
}"#;

#[test]
fn sample_consolidates_to_swap() {
    let log = decode(SAMPLE.as_bytes()).unwrap();
    assert_eq!(log.header.version, 2);
    assert_eq!(log.header.annotated_variables["a"].visual.as_deref(), Some("bar"));
    // `remove` is skipped on decode.
    assert_eq!(log.len(), 5);

    let header = log.header.clone();
    let (out, stats) = log.consolidate(&Consolidator::default()).unwrap();
    assert_eq!(out.header, header);
    assert_eq!(stats.composites_total(), 1);

    let a = |i| Locator::indexed("a", vec![i]);
    assert!(out.body[0].is_control());
    assert_eq!(
        out.body[1],
        Operation::swap(a(0), a(1)).with_provenance(Provenance::line("Sort.java", 1))
    );
    assert_eq!(out.body[2], Operation::message("swapping"));
    assert_eq!(out.len(), 3);
}

#[test]
fn files_round_trip_in_both_encodings() {
    let dir = std::env::temp_dir().join(format!("tracefold-rt-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let log = decode(SAMPLE.as_bytes()).unwrap();

    for name in ["log.json", "log.cbor", "log.JSON"] {
        let p = dir.join(name);
        write_trace_log_auto(&p, &log).unwrap();
        assert_eq!(read_trace_log_auto(&p).unwrap(), log, "{name}");
    }
    // CBOR bytes are not JSON.
    assert!(read_trace_log_json(dir.join("log.cbor")).is_err());
    std::fs::remove_dir_all(&dir).unwrap();
}

/* ---------------- property tests ---------------- */

fn arb_locator() -> impl Strategy<Value = Locator> {
    prop_oneof![
        "[a-z]{1,3}".prop_map(Locator::scalar),
        ("[a-z]{1,3}", proptest::collection::vec(-3i64..16, 1..3))
            .prop_map(|(id, ix)| Locator::indexed(id, ix)),
    ]
}

fn arb_values() -> impl Strategy<Value = Option<Vec<f64>>> {
    proptest::option::of(proptest::collection::vec(-1.0e6f64..1.0e6, 0..4))
}

fn arb_provenance() -> impl Strategy<Value = Provenance> {
    (
        proptest::option::of("[A-Z][a-z]{0,5}\\.java"),
        proptest::option::of(1u32..500),
        proptest::option::of(0u32..80),
    )
        .prop_map(|(source, line, col)| Provenance {
            source,
            begin_line: line,
            end_line: line,
            begin_column: col,
            end_column: col.map(|c| c + 1),
        })
}

fn arb_operation() -> impl Strategy<Value = Operation> {
    let op = prop_oneof![
        (arb_locator(), arb_values()).prop_map(|(t, v)| {
            let op = Operation::init(t);
            match v {
                Some(v) => op.with_value(v),
                None => op,
            }
        }),
        "[ -~]{0,12}".prop_map(Operation::message),
        (arb_locator(), proptest::option::of(arb_locator()), arb_values()).prop_map(
            |(s, t, v)| {
                let op = Operation::read(s, t);
                match v {
                    Some(v) => op.with_value(v),
                    None => op,
                }
            }
        ),
        (proptest::option::of(arb_locator()), arb_locator(), arb_values()).prop_map(
            |(s, t, v)| {
                let op = Operation::write(s, t);
                match v {
                    Some(v) => op.with_value(v),
                    None => op,
                }
            }
        ),
        (arb_locator(), arb_locator()).prop_map(|(x, y)| Operation::swap(x, y)),
    ];
    (op, arb_provenance()).prop_map(|(op, p)| op.with_provenance(p))
}

fn arb_attribute() -> impl Strategy<Value = serde_json::Value> {
    prop_oneof![
        any::<i64>().prop_map(serde_json::Value::from),
        (-1.0e9f64..1.0e9).prop_map(serde_json::Value::from),
        "[a-zA-Z0-9 ]{0,8}".prop_map(serde_json::Value::from),
        any::<bool>().prop_map(serde_json::Value::from),
    ]
}

fn arb_variable() -> impl Strategy<Value = AnnotatedVariable> {
    (
        "[a-z]{1,4}",
        prop_oneof![Just("array"), Just("independentElement")],
        proptest::option::of(prop_oneof![Just("binaryTree"), Just("array")]),
        proptest::option::of(prop_oneof![Just("bar"), Just("box")]),
        proptest::collection::btree_map("[a-z]{1,6}", arb_attribute(), 0..3),
    )
        .prop_map(|(id, raw, abs, visual, attributes)| {
            let mut v = AnnotatedVariable::new(id, raw);
            v.abstract_type = abs.map(str::to_owned);
            v.visual = visual.map(str::to_owned);
            v.attributes = attributes;
            v
        })
}

fn arb_log() -> impl Strategy<Value = TraceLog> {
    (
        0u32..4,
        proptest::collection::vec(arb_variable(), 0..3),
        proptest::collection::btree_map(
            "[A-Z][a-z]{0,5}\\.java",
            proptest::collection::vec("[ -~]{0,20}", 0..4),
            0..3,
        ),
        proptest::collection::vec(arb_operation(), 0..30),
    )
        .prop_map(|(version, vars, sources, body)| {
            let mut header = Header { version, sources, ..Header::default() };
            for v in vars {
                header.declare(v);
            }
            TraceLog { header, body }
        })
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 96,
        .. ProptestConfig::default()
    })]

    // Property: decode(encode(log)) == log, header and body field for field.
    #[test]
    fn json_round_trip(log in arb_log()) {
        let bytes = encode(&log).unwrap();
        prop_assert_eq!(decode(&bytes).unwrap(), log);
    }

    // Property: full-precision values survive the JSON text form exactly.
    #[test]
    fn json_values_keep_every_bit(x in -1.0e6f64..1.0e6) {
        let log = TraceLog {
            body: vec![Operation::write(None, Locator::scalar("v")).with_value(vec![x])],
            ..TraceLog::default()
        };
        let back = decode(&encode(&log).unwrap()).unwrap();
        let got = back.body[0].value().unwrap()[0];
        prop_assert_eq!(got.to_bits(), x.to_bits());
    }
}
