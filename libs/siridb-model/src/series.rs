use crate::Point;
use bytes::Bytes;

/// A named series together with its points, in submission order.
///
/// `series_name` borrows nothing — by the time a `SeriesBatch` exists it has
/// already been validated as non-empty and lifted out of the decoder's
/// input-buffer-borrowed form (see `siridb_wire::decoder`).
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesBatch {
    pub series_name: Bytes,
    pub points: Vec<Point>,
}

impl SeriesBatch {
    pub fn new(series_name: Bytes, points: Vec<Point>) -> Self {
        Self {
            series_name,
            points,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Value;

    #[test]
    fn preserves_submission_order() {
        let batch = SeriesBatch::new(
            Bytes::from_static(b"cpu.load"),
            vec![
                Point::new(1000, Value::Float(0.5)),
                Point::new(1001, Value::Float(0.6)),
            ],
        );
        assert_eq!(batch.series_name, Bytes::from_static(b"cpu.load"));
        assert_eq!(batch.points[0].timestamp, 1000);
        assert_eq!(batch.points[1].timestamp, 1001);
    }
}
