use crate::domain::order::CourseId;
use crate::domain::transaction::CourseTotals;
use crate::error::Result;
use rust_decimal::Decimal;
use serde::Serialize;
use std::io::Write;

#[derive(Serialize)]
struct TotalsRow<'a> {
    course_id: &'a str,
    purchased: Decimal,
    refunded: Decimal,
}

/// Writes per-course totals as CSV with the header `course_id,purchased,refunded`.
pub struct TotalsWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> TotalsWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    pub fn write_totals<'a, I>(&mut self, totals: I) -> Result<()>
    where
        I: IntoIterator<Item = (&'a CourseId, &'a CourseTotals)>,
    {
        let mut wrote_any = false;
        for (course_id, totals) in totals {
            self.writer.serialize(TotalsRow {
                course_id: course_id.as_str(),
                purchased: totals.purchased,
                refunded: totals.refunded,
            })?;
            wrote_any = true;
        }
        if !wrote_any {
            self.writer
                .write_record(["course_id", "purchased", "refunded"])?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
