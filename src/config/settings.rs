//! Settings module.

use super::parameters::ModelParameters;
use super::timer::TimerConfig;

use serde::{Deserialize, Serialize};
use std::fs;

use crate::errors::Result;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Settings {
    pub parameters: ModelParameters,
    pub timer: TimerConfig,
}

impl std::fmt::Display for Settings {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let output = serde_yaml::to_string(self).map_err(|_| std::fmt::Error)?;
        write!(formatter, "{output}")
    }
}

impl Settings {
    pub fn write(&self, writer: &mut dyn std::io::Write) -> Result<()> {
        Ok(serde_yaml::to_writer(writer, self)?)
    }

    pub fn read(reader: &mut dyn std::io::Read) -> Result<Settings> {
        Ok(serde_yaml::from_reader(reader)?)
    }

    pub fn write_to_file(&self, filename: &str) -> Result<()> {
        let file = fs::File::create(filename)?;
        let mut writer = std::io::BufWriter::new(file);
        self.write(&mut writer)
    }

    pub fn read_from_file(filename: &str) -> Result<Settings> {
        let file = fs::File::open(filename)?;
        let mut reader = std::io::BufReader::new(file);
        Self::read(&mut reader)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Priors;
    use crate::core::InfectiousnessProfile;
    use serial_test::serial;

    fn settings() -> Settings {
        let mut parameters = ModelParameters::with_priors(Priors::from_iter([
            ("company", 10.),
            ("school", 20.),
            ("household", 30.),
            ("leisure", 10.),
        ]));
        parameters.infectiousness = InfectiousnessProfile::Gamma {
            max_infectiousness: 1.,
            shape: 2.,
            scale: 1.5,
            shift: 0.5,
        };
        Settings {
            parameters,
            timer: TimerConfig::daily(10, &["company", "school", "leisure", "household"]),
        }
    }

    #[test]
    fn read_write() {
        let settings = settings();
        let mut output = vec![];
        settings.write(&mut output).unwrap();
        let settings2 = Settings::read(&mut &output[..]).unwrap();
        assert_eq!(settings, settings2);
    }

    #[test]
    #[serial]
    fn read_write_file() {
        let tmp_path = std::env::temp_dir().join("diffjune_test_settings.yaml");
        let path = tmp_path.to_str().unwrap();
        let settings = settings();
        settings.write_to_file(path).unwrap();
        let read_settings = Settings::read_from_file(path).unwrap();
        assert_eq!(read_settings, settings);
        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn read_minimal() {
        let yaml = r#"
parameters:
  priors:
    school: 20.0
  infectiousness: !Constant
    value: 1.0
timer:
  total_days: 5
  weekday_step_durations: [24]
  weekday_activities: [[school]]
"#;
        let settings = Settings::read(&mut yaml.as_bytes()).unwrap();
        assert_eq!(settings.timer.total_days, 5);
        assert_eq!(
            settings.parameters.infectiousness,
            InfectiousnessProfile::Constant { value: 1. }
        );
        assert_eq!(settings.parameters.seed, 0);
    }

    #[test]
    fn missing_file_fails() {
        assert!(Settings::read_from_file("/nonexistent/diffjune.yaml").is_err());
    }
}
