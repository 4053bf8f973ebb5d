use indicatif::{ProgressBar, ProgressStyle};
use modelsight_fetch::Progress;
use once_cell::sync::Lazy;

const BYTES_STYLE: &str = "{spinner:.blue} {prefix:>12.cyan.bold} [{elapsed_precise}] {wide_bar:.cyan/blue} {bytes}/{total_bytes} ({bytes_per_sec}, {eta}) {wide_msg}";

const PERCENT_STYLE: &str =
    "{spinner:.blue} {prefix:>12.cyan.bold} [{elapsed_precise}] {wide_bar:.cyan/blue} {pos:>3}% {wide_msg}";

const TICK: &str = "⠁⠂⠄⡀⢀⠠⠐⠈ ";

const PB_CHARS: &str = "█▓▒░  ";

fn style(template: &str) -> Option<ProgressStyle> {
    ProgressStyle::with_template(template)
        .ok()
        .map(|s| s.tick_chars(TICK).progress_chars(PB_CHARS))
}

static BYTES_TEMPLATE: Lazy<Option<ProgressStyle>> = Lazy::new(|| style(BYTES_STYLE));

static PERCENT_TEMPLATE: Lazy<Option<ProgressStyle>> = Lazy::new(|| style(PERCENT_STYLE));

/// What the bar counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Unit {
    /// Raw bytes; the length follows the announced asset size.
    #[default]
    Bytes,
    /// Whole percent of a `[0, 1]` fraction.
    Percent,
}

pub struct ProgressTracker {
    pb:     ProgressBar,
    unit:   Unit,
    finish: Option<String>,
}

impl ProgressTracker {
    /// Mirror a fetch progress report.
    pub fn update(&self, progress: &Progress) {
        match self.unit {
            Unit::Bytes => {
                if let Some(total) = progress.total_bytes {
                    self.pb.set_length(total);
                }
                self.pb.set_position(progress.bytes_downloaded);
            }
            Unit::Percent => self.pb.set_position(u64::from(progress.percent())),
        }
        self.pb.set_message(progress.phase.to_string());
    }

    /// Move a percent bar to `fraction` of the way.
    pub fn set_fraction(&self, fraction: f64) {
        let percent = (fraction.clamp(0.0, 1.0) * 100.0).round() as u64;
        self.pb.set_position(percent);
    }

    pub fn position(&self) -> u64 {
        self.pb.position()
    }

    pub fn finish(&self) {
        match &self.finish {
            Some(msg) => self.pb.finish_with_message(msg.clone()),
            None => self.pb.finish(),
        }
    }

    pub fn abandon(&self, msg: impl Into<String>) {
        self.pb.abandon_with_message(msg.into());
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProgressTrackerBuilder {
    unit:   Unit,
    prefix: Option<String>,
    finish: Option<String>,
    hidden: bool,
}

impl ProgressTrackerBuilder {
    pub fn with_unit(mut self, unit: Unit) -> Self {
        self.unit = unit;
        self
    }

    pub fn with_prefix(mut self, prefix: &str) -> Self {
        self.prefix = Some(prefix.to_string());
        self
    }

    pub fn with_finish(mut self, finish: &str) -> Self {
        self.finish = Some(finish.to_string());
        self
    }

    /// Draw nothing, e.g. when stderr is not a terminal or for tests.
    pub fn hidden(mut self, hidden: bool) -> Self {
        self.hidden = hidden;
        self
    }

    pub fn build(self) -> ProgressTracker {
        let (pb, template) = match self.unit {
            Unit::Bytes => (ProgressBar::new(0), &*BYTES_TEMPLATE),
            Unit::Percent => (ProgressBar::new(100), &*PERCENT_TEMPLATE),
        };
        if self.hidden {
            pb.set_draw_target(indicatif::ProgressDrawTarget::hidden());
        }
        let pb = match template {
            Some(style) => pb.with_style(style.clone()),
            None => pb,
        };
        if let Some(prefix) = self.prefix {
            pb.set_prefix(prefix);
        }
        ProgressTracker {
            pb,
            unit: self.unit,
            finish: self.finish,
        }
    }
}
