use indicatif::{ProgressBar, ProgressStyle};
use itertools::Itertools;

use crate::args::Args;
use crate::config::{Settings, Timer};
use crate::core::{AgentState, ContactGraph, Model, StepReport};
use crate::errors::Result;
use crate::readwrite::{AgentStateIO, ContactGraphIO, ReportWriter};

pub struct Runner {
    args: Args,
    settings: Settings,
    graph: ContactGraph,
    state: AgentState,
    model: Model,
    timer: Timer,
}

impl Runner {
    pub fn new(args: Args) -> Result<Runner> {
        Self::setup_logger(&args);

        let mut settings = Self::load_settings(&args.settings)?;
        if let Some(seed) = args.seed {
            log::info!("Overriding seed with {seed}");
            settings.parameters.seed = seed;
        }

        let model = Model::new(&settings.parameters)?;
        let state = AgentState::read(&args.agents, model.n_params())?;
        let graph = ContactGraph::read(&args.attendance, state.n_agents())?;
        let timer = Timer::new(settings.timer.clone())?;

        Ok(Self {
            args,
            settings,
            graph,
            state,
            model,
            timer,
        })
    }

    pub fn start(&mut self) -> Result<()> {
        let reports = self.run()?;
        self.finish(&reports)
    }

    /// Setup logging level and file
    fn setup_logger(args: &Args) {
        let log_level = match args.verbose {
            0 => log::LevelFilter::Info,
            1 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        };
        simple_logging::log_to_file(args.log_file.as_str(), log_level).unwrap_or_else(|_| {
            eprintln!("Unable to open log file.");
            std::process::exit(1);
        });
    }

    /// Load settings from file
    fn load_settings(path: &str) -> Result<Settings> {
        let settings: Settings = Settings::read_from_file(path)?;
        log::info!("Loaded settings\n{}", settings);
        Ok(settings)
    }

    fn progress_bar(&self) -> Option<ProgressBar> {
        if self.args.disable_progress_bar {
            return None;
        }
        let bar = ProgressBar::new(self.settings.timer.total_days as u64);
        bar.set_style(
            ProgressStyle::default_bar()
                .template(
                    "[{bar:40}] {pos:>7}/{len:7} [{elapsed_precise} / {duration_precise}] {msg}",
                )
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=> "),
        );
        Some(bar)
    }

    fn run(&mut self) -> Result<Vec<StepReport>> {
        let bar = self.progress_bar();
        let reports = self.model.run_with(
            &self.graph,
            &mut self.state,
            &mut self.timer,
            |timer, report| {
                if let Some(bar) = bar.as_ref() {
                    bar.set_position(timer.day() as u64);
                    bar.set_message(format!("infected={}", report.total_infected));
                }
            },
        )?;

        if let Some(bar) = bar {
            bar.finish_with_message("Done.");
        }
        Ok(reports)
    }

    fn finish(&self, reports: &[StepReport]) -> Result<()> {
        log::info!("Storing case report to {}...", self.args.output);
        let mut writer = ReportWriter::from_path(&self.args.output)?;
        writer.write_all(reports)?;

        let cases = self.state.cases();
        let gradient = self.model.gradient(&cases);
        let summary = self
            .model
            .parameters()
            .names()
            .iter()
            .zip(gradient.iter())
            .map(|(name, derivative)| match derivative {
                Some(derivative) => format!("{name}={derivative:.6e}"),
                None => format!("{name}=none"),
            })
            .join(", ");
        log::info!("Total cases {} with gradient [{summary}]", cases.value);
        println!("Total cases: {}", cases.value);
        Ok(())
    }
}
