// crates/tracefold-trace/src/wire.rs

//! Wire shape of the trace body.
//!
//! Each operation travels as
//! `{ "operation": "<kind>", "operationBody": { ... }, <provenance> }`.
//! Bodies use the keys `target`, `source`, `var1`, `var2`, `value` and `size`.
//! On decode:
//!
//! - unknown `operation` strings are skipped with a warning;
//! - `value` may be a scalar, an array, or nested arrays, and is flattened
//!   row-major (a message carries its text there instead);
//! - a missing required field fails with the entry's position and kind.
//!
//! Used as `#[serde(with = "crate::wire")]` on [`crate::format::TraceLog::body`].

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![warn(
    missing_docs,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::unwrap_used,
    clippy::expect_used
)]

use serde::de::Error as _;
use serde::ser::SerializeSeq;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracefold_core::{
    Init, Locator, Message, Operation, OperationKind, Provenance, Read, Swap, Write,
};
use tracing::warn;

/// Value payload as it appears on the wire.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
enum WireValue {
    Scalar(f64),
    Text(String),
    List(Vec<WireValue>),
}

impl WireValue {
    fn numbers(v: &[f64]) -> Self {
        Self::List(v.iter().copied().map(Self::Scalar).collect())
    }

    /// Row-major flattening; `None` if any leaf is text.
    fn flatten(self) -> Option<Vec<f64>> {
        fn go(v: WireValue, out: &mut Vec<f64>) -> Option<()> {
            match v {
                WireValue::Scalar(x) => out.push(x),
                WireValue::Text(_) => return None,
                WireValue::List(xs) => {
                    for x in xs {
                        go(x, out)?;
                    }
                }
            }
            Some(())
        }
        let mut out = Vec::new();
        go(self, &mut out)?;
        Some(out)
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
struct Body {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    target: Option<Locator>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    source: Option<Locator>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    var1: Option<Locator>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    var2: Option<Locator>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    value: Option<WireValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    size: Option<Vec<i64>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RecordOut<'a> {
    operation: &'static str,
    operation_body: Body,
    #[serde(flatten)]
    provenance: &'a Provenance,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecordIn {
    operation: String,
    #[serde(default)]
    operation_body: serde_json::Value,
    #[serde(flatten)]
    provenance: Provenance,
}

fn to_record(op: &Operation) -> RecordOut<'_> {
    let mut body = Body::default();
    match op {
        Operation::Init(x) => {
            body.target = Some(x.target.clone());
            body.size.clone_from(&x.size);
            body.value = x.value.as_deref().map(WireValue::numbers);
        }
        Operation::Message(x) => body.value = Some(WireValue::Text(x.text.clone())),
        Operation::Read(x) => {
            body.source = Some(x.source.clone());
            body.target.clone_from(&x.target);
            body.value = x.value.as_deref().map(WireValue::numbers);
        }
        Operation::Write(x) => {
            body.source.clone_from(&x.source);
            body.target = Some(x.target.clone());
            body.value = x.value.as_deref().map(WireValue::numbers);
        }
        Operation::Swap(x) => {
            body.var1 = Some(x.var1.clone());
            body.var2 = Some(x.var2.clone());
            body.value = x.value.as_deref().map(WireValue::numbers);
        }
    }
    RecordOut {
        operation: op.kind().as_str(),
        operation_body: body,
        provenance: op.provenance(),
    }
}

/// Why a record could not become an [`Operation`].
#[derive(Debug)]
enum Reject {
    Malformed(String),
    Missing(&'static str),
    TextValue,
}

fn require<T>(v: Option<T>, field: &'static str) -> Result<T, Reject> {
    v.ok_or(Reject::Missing(field))
}

fn numbers(v: Option<WireValue>) -> Result<Option<Vec<f64>>, Reject> {
    v.map(|v| v.flatten().ok_or(Reject::TextValue)).transpose()
}

fn from_record(
    kind: OperationKind,
    body: serde_json::Value,
    provenance: Provenance,
) -> Result<Operation, Reject> {
    let body: Body = if body.is_null() {
        Body::default()
    } else {
        serde_json::from_value(body).map_err(|e| Reject::Malformed(e.to_string()))?
    };
    Ok(match kind {
        OperationKind::Init => Operation::Init(Init {
            target: require(body.target, "target")?,
            size: body.size,
            value: numbers(body.value)?,
            provenance,
        }),
        OperationKind::Message => {
            let text = match body.value {
                Some(WireValue::Text(s)) => s,
                Some(WireValue::Scalar(x)) => x.to_string(),
                Some(WireValue::List(_)) => return Err(Reject::Malformed("list as message".into())),
                None => return Err(Reject::Missing("value")),
            };
            Operation::Message(Message { text, provenance })
        }
        OperationKind::Read => Operation::Read(Read {
            source: require(body.source, "source")?,
            target: body.target,
            value: numbers(body.value)?,
            provenance,
        }),
        OperationKind::Write => Operation::Write(Write {
            source: body.source,
            target: require(body.target, "target")?,
            value: numbers(body.value)?,
            provenance,
        }),
        OperationKind::Swap => Operation::Swap(Swap {
            var1: require(body.var1, "var1")?,
            var2: require(body.var2, "var2")?,
            value: numbers(body.value)?,
            provenance,
        }),
    })
}

/// Serialize a body as a sequence of wire records.
pub fn serialize<S: Serializer>(ops: &[Operation], s: S) -> Result<S::Ok, S::Error> {
    let mut seq = s.serialize_seq(Some(ops.len()))?;
    for op in ops {
        seq.serialize_element(&to_record(op))?;
    }
    seq.end()
}

/// Deserialize a body, skipping records of unknown kind.
pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<Operation>, D::Error> {
    let records = Option::<Vec<RecordIn>>::deserialize(d)?.unwrap_or_default();
    let mut ops = Vec::with_capacity(records.len());
    for (pos, rec) in records.into_iter().enumerate() {
        let Ok(kind) = rec.operation.parse::<OperationKind>() else {
            warn!(position = pos, operation = %rec.operation, "skipping unknown operation");
            continue;
        };
        let op = from_record(kind, rec.operation_body, rec.provenance).map_err(|r| match r {
            Reject::Missing(field) => {
                D::Error::custom(format!("body[{pos}] ({kind}): missing `{field}`"))
            }
            Reject::TextValue => {
                D::Error::custom(format!("body[{pos}] ({kind}): `value` must be numeric"))
            }
            Reject::Malformed(e) => D::Error::custom(format!("body[{pos}] ({kind}): {e}")),
        })?;
        ops.push(op);
    }
    Ok(ops)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::TraceLog;
    use serde_json::json;

    fn body_of(v: serde_json::Value) -> Result<Vec<Operation>, serde_json::Error> {
        serde_json::from_value::<TraceLog>(json!({ "body": v })).map(|t| t.body)
    }

    #[test]
    fn nested_values_are_flattened() {
        let ops = body_of(json!([
            { "operation": "init",
              "operationBody": { "target": { "identifier": "m" }, "size": [2, 2],
                                 "value": [[1, 2], [3, 4]] } }
        ]))
        .unwrap();
        assert_eq!(ops[0].value(), Some(&[1.0, 2.0, 3.0, 4.0][..]));
        let Operation::Init(init) = &ops[0] else { panic!("not init") };
        assert_eq!(init.size.as_deref(), Some(&[2, 2][..]));
    }

    #[test]
    fn scalar_value_becomes_singleton() {
        let ops = body_of(json!([
            { "operation": "write",
              "operationBody": { "target": { "identifier": "a", "index": [3] }, "value": 7 } }
        ]))
        .unwrap();
        assert_eq!(ops[0].value(), Some(&[7.0][..]));
        assert_eq!(ops[0].source(), None);
    }

    #[test]
    fn unknown_kinds_are_skipped() {
        let ops = body_of(json!([
            { "operation": "remove", "operationBody": { "target": { "identifier": "x" } } },
            { "operation": "message", "operationBody": { "value": "hello" } },
            { "operation": "pass" }
        ]))
        .unwrap();
        assert_eq!(ops, vec![Operation::message("hello")]);
    }

    #[test]
    fn missing_field_names_position_and_kind() {
        let err = body_of(json!([
            { "operation": "message", "operationBody": { "value": "ok" } },
            { "operation": "read", "operationBody": { "target": { "identifier": "t" } } }
        ]))
        .unwrap_err()
        .to_string();
        assert!(err.contains("body[1] (read): missing `source`"), "{err}");
    }

    #[test]
    fn provenance_sits_beside_the_body() {
        let ops = body_of(json!([
            { "operation": "swap",
              "operationBody": { "var1": { "identifier": "a", "index": [0] },
                                 "var2": { "identifier": "a", "index": [1] } },
              "source": "Sort.java", "beginLine": 8, "endLine": 8 }
        ]))
        .unwrap();
        assert_eq!(ops[0].provenance(), &Provenance::line("Sort.java", 8));

        let out = serde_json::to_value(TraceLog { body: ops, ..TraceLog::default() }).unwrap();
        let rec = &out["body"][0];
        assert_eq!(rec["operation"], "swap");
        assert_eq!(rec["beginLine"], 8);
        assert!(rec["operationBody"].get("value").is_none());
    }

    #[test]
    fn text_value_on_numeric_kind_is_rejected() {
        let err = body_of(json!([
            { "operation": "write",
              "operationBody": { "target": { "identifier": "a" }, "value": "oops" } }
        ]))
        .unwrap_err()
        .to_string();
        assert!(err.contains("must be numeric"), "{err}");
    }
}
