//! `BatchAssembler`: accumulates points into a direction-respecting
//! `Batch`, applying value-filter push-down as they arrive.
//!
//! Points handed to the assembler are already produced in direction
//! order by their source (a page decoder for a non-overlapped page, or
//! the priority merge reader for an overlapped one — both already yield
//! ASC-ascending / DESC-descending timestamps), so the assembler's job is
//! purely filtering and packaging, not reordering.

use crate::direction::Direction;
use crate::model::{Batch, DataType, TimeValuePair, ValueFilter};

pub struct BatchAssembler {
    data_type: DataType,
    direction: Direction,
    points: Vec<TimeValuePair>,
}

impl BatchAssembler {
    pub fn new(data_type: DataType, direction: Direction) -> Self {
        Self {
            data_type,
            direction,
            points: Vec::new(),
        }
    }

    /// Append `point` if it passes `filter`. Returns whether it was kept.
    pub fn push_filtered(&mut self, point: TimeValuePair, filter: &ValueFilter) -> bool {
        if filter.accepts(&point.value) {
            self.points.push(point);
            true
        } else {
            false
        }
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn finish(self) -> Batch {
        Batch::from_points(self.data_type, self.direction, self.points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Value;

    #[test]
    fn drops_points_the_filter_rejects() {
        let mut a = BatchAssembler::new(DataType::I64, Direction::Asc);
        let filter = ValueFilter::Predicate(std::sync::Arc::new(|v: &crate::model::Value| matches!(v, Value::I64(n) if *n > 10)));
        assert!(!a.push_filtered(TimeValuePair::new(1, Value::I64(5)), &filter));
        assert!(a.push_filtered(TimeValuePair::new(2, Value::I64(15)), &filter));
        let batch = a.finish();
        assert_eq!(batch.len(), 1);
    }

    #[test]
    fn no_filter_keeps_everything_in_arrival_order() {
        let mut a = BatchAssembler::new(DataType::I64, Direction::Desc);
        a.push_filtered(TimeValuePair::new(3, Value::I64(30)), &ValueFilter::None);
        a.push_filtered(TimeValuePair::new(2, Value::I64(20)), &ValueFilter::None);
        let batch = a.finish();
        assert!(batch.is_monotone());
    }
}
