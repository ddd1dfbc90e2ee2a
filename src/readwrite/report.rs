use std::fs;
use std::path::Path;

use crate::core::StepReport;
use crate::errors::Result;

/// Writes step reports as CSV rows `time,duration,new_infections,total_infected`.
pub struct ReportWriter<W: std::io::Write> {
    writer: csv::Writer<W>,
}

impl ReportWriter<fs::File> {
    pub fn from_path(path: &str) -> Result<Self> {
        if let Some(parent) = Path::new(path).parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(Self {
            writer: csv::Writer::from_path(path)?,
        })
    }
}

impl<W: std::io::Write> ReportWriter<W> {
    pub fn from_writer(writer: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(writer),
        }
    }

    pub fn write(&mut self, report: &StepReport) -> Result<()> {
        Ok(self.writer.serialize(report)?)
    }

    pub fn write_all(&mut self, reports: &[StepReport]) -> Result<()> {
        for report in reports {
            self.write(report)?;
        }
        self.flush()
    }

    pub fn flush(&mut self) -> Result<()> {
        Ok(self.writer.flush()?)
    }

    pub fn into_inner(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|err| err.into_error().into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn reports() -> Vec<StepReport> {
        vec![
            StepReport {
                time: 0.,
                duration: 1.,
                new_infections: 0,
                total_infected: 10,
            },
            StepReport {
                time: 1.,
                duration: 0.5,
                new_infections: 4,
                total_infected: 14,
            },
        ]
    }

    #[test]
    fn write_reports() {
        let mut writer = ReportWriter::from_writer(vec![]);
        writer.write_all(&reports()).unwrap();
        let output = String::from_utf8(writer.into_inner().unwrap()).unwrap();
        assert_eq!(
            output,
            "time,duration,new_infections,total_infected\n0.0,1.0,0,10\n1.0,0.5,4,14\n"
        );
    }

    #[test]
    #[serial]
    fn write_reports_file() {
        let tmp_path = std::env::temp_dir().join("diffjune_test_reports/cases.csv");
        let path = tmp_path.to_str().unwrap();
        let mut writer = ReportWriter::from_path(path).unwrap();
        writer.write_all(&reports()).unwrap();

        let mut reader = csv::Reader::from_path(path).unwrap();
        let read: Vec<StepReport> = reader.deserialize().map(|r| r.unwrap()).collect();
        assert_eq!(read, reports());
        std::fs::remove_file(path).unwrap();
    }
}
