use bytes::Bytes;

/// A single time-series value.
///
/// Mirrors the three value shapes the wire codec can carry: `INT64`,
/// `DOUBLE` and `RAW`. A series' value type is fixed at creation (inferred
/// from the first point written for that series) but this enum itself is
/// untyped — type consistency is a registry concern, not a `Point` concern.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
    Raw(Bytes),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "integer",
            Value::Float(_) => "float",
            Value::Raw(_) => "string",
        }
    }
}

/// `(timestamp, value)` pair, in submission order.
#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    pub timestamp: i64,
    pub value: Value,
}

impl Point {
    pub fn new(timestamp: i64, value: Value) -> Self {
        Self { timestamp, value }
    }
}
