//! Per-file grouping of records by region.
//!
//! Buffers are flushed to a [`FeatureSink`] once they reach the threshold at
//! a batch boundary, and drained completely when the file ends. Regions are
//! flushed in key order so output is reproducible.

use std::collections::BTreeMap;

use tileprep_core::{Record, RegionKey};

use crate::WriteError;
use crate::output::FeatureSink;

pub(crate) struct RegionAccumulator<'s, S: FeatureSink + ?Sized> {
    sink: &'s S,
    threshold: usize,
    buffers: BTreeMap<RegionKey, Vec<Record>>,
    written: BTreeMap<RegionKey, u64>,
}

impl<'s, S: FeatureSink + ?Sized> RegionAccumulator<'s, S> {
    pub(crate) fn new(sink: &'s S, threshold: usize) -> Self {
        Self {
            sink,
            threshold: threshold.max(1),
            buffers: BTreeMap::new(),
            written: BTreeMap::new(),
        }
    }

    pub(crate) fn push(&mut self, record: Record) {
        self.buffers
            .entry(record.region().clone())
            .or_default()
            .push(record);
    }

    /// Flush every buffer that reached the threshold.
    pub(crate) fn end_batch(&mut self) -> Result<(), WriteError> {
        let full: Vec<RegionKey> = self
            .buffers
            .iter()
            .filter(|(_, records)| records.len() >= self.threshold)
            .map(|(region, _)| region.clone())
            .collect();
        for region in full {
            self.flush(&region)?;
        }
        Ok(())
    }

    /// Flush all remaining buffers and return features written per region.
    pub(crate) fn finish(mut self) -> Result<BTreeMap<RegionKey, u64>, WriteError> {
        let pending: Vec<RegionKey> = self.buffers.keys().cloned().collect();
        for region in pending {
            self.flush(&region)?;
        }
        Ok(self.written)
    }

    fn flush(&mut self, region: &RegionKey) -> Result<(), WriteError> {
        let Some(records) = self.buffers.remove(region) else {
            return Ok(());
        };
        if records.is_empty() {
            return Ok(());
        }
        self.sink.write_batch(region, &records)?;
        *self.written.entry(region.clone()).or_default() +=
            u64::try_from(records.len()).unwrap_or(u64::MAX);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{Geometry, Point};
    use parking_lot::Mutex;
    use rstest::rstest;

    #[derive(Default)]
    struct RecordingSink {
        batches: Mutex<Vec<(String, usize)>>,
    }

    impl FeatureSink for RecordingSink {
        fn write_batch(&self, region: &RegionKey, records: &[Record]) -> Result<(), WriteError> {
            self.batches.lock().push((region.to_string(), records.len()));
            Ok(())
        }
    }

    struct FailingSink;

    impl FeatureSink for FailingSink {
        fn write_batch(&self, region: &RegionKey, _: &[Record]) -> Result<(), WriteError> {
            Err(WriteError::Write {
                path: format!("{region}.geojson").into(),
                source: std::io::Error::other("disk full"),
            })
        }
    }

    fn record(region: &str) -> Record {
        Record::new(
            RegionKey::parse(region, 2).expect("key"),
            Geometry::Point(Point::new(0.0, 0.0)),
            Vec::new(),
        )
    }

    #[rstest]
    fn flushes_full_buffers_at_batch_end() {
        let sink = RecordingSink::default();
        let mut accumulator = RegionAccumulator::new(&sink, 2);
        for region in ["02", "01", "02", "01", "03"] {
            accumulator.push(record(region));
        }
        accumulator.end_batch().expect("flush");
        assert_eq!(
            *sink.batches.lock(),
            vec![("01".to_owned(), 2), ("02".to_owned(), 2)]
        );

        let written = accumulator.finish().expect("finish");
        assert_eq!(sink.batches.lock().last(), Some(&("03".to_owned(), 1)));
        let counts: Vec<(String, u64)> = written
            .into_iter()
            .map(|(region, count)| (region.to_string(), count))
            .collect();
        assert_eq!(
            counts,
            vec![("01".into(), 2), ("02".into(), 2), ("03".into(), 1)]
        );
    }

    #[rstest]
    fn keeps_small_buffers_until_finish() {
        let sink = RecordingSink::default();
        let mut accumulator = RegionAccumulator::new(&sink, 10);
        accumulator.push(record("05"));
        accumulator.end_batch().expect("flush");
        assert!(sink.batches.lock().is_empty());
        accumulator.finish().expect("finish");
        assert_eq!(*sink.batches.lock(), vec![("05".to_owned(), 1)]);
    }

    #[rstest]
    fn surfaces_sink_failures() {
        let mut accumulator = RegionAccumulator::new(&FailingSink, 1);
        accumulator.push(record("09"));
        assert!(matches!(
            accumulator.end_batch(),
            Err(WriteError::Write { .. })
        ));
    }
}
