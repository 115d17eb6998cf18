use std::fmt::Display;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Log file of one subcommand run.
///
/// Every line is timestamped and tagged with the subcommand. Steps are echoed
/// to a single stdout line that the next step overwrites.
pub struct Logger {
    writer: BufWriter<File>,
    command: &'static str,
    started: Instant,
    progress_width: usize,
}

/// `<output>.log`, next to the file the run produces
pub fn default_log_path(output: &Path) -> PathBuf {
    let mut path = output.as_os_str().to_owned();
    path.push(".log");
    PathBuf::from(path)
}

impl Logger {
    /// Open the run log and write its header
    pub fn start(command: &'static str, log_path: Option<&str>, output: &Path) -> io::Result<Self> {
        let path = log_path
            .map(PathBuf::from)
            .unwrap_or_else(|| default_log_path(output));
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut logger = Self {
            writer: BufWriter::new(File::create(&path)?),
            command,
            started: Instant::now(),
            progress_width: 0,
        };
        logger.log(&format!("=== corrcircle {} ===", command))?;
        logger.param("Software Version", format!("v{}", env!("CARGO_PKG_VERSION")))?;
        logger.param(
            "Runtime",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        )?;
        logger.param("Output File", output.display())?;
        Ok(logger)
    }

    pub fn log(&mut self, message: &str) -> io::Result<()> {
        let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
        writeln!(self.writer, "[{}] [{}] {}", timestamp, self.command, message)?;
        self.writer.flush()
    }

    /// One `name: value` line of the run parameters
    pub fn param(&mut self, name: &str, value: impl Display) -> io::Result<()> {
        self.log(&format!("  {}: {}", name, value))
    }

    /// Log a completed step and show it as the current progress line
    pub fn step(&mut self, message: &str) -> io::Result<()> {
        self.log(message)?;

        let line = format!("[{}] {}", self.command, message);
        let padding = self.progress_width.saturating_sub(line.len());
        let mut stdout = io::stdout();
        write!(stdout, "\r{}{}", line, " ".repeat(padding))?;
        stdout.flush()?;
        self.progress_width = line.len();
        Ok(())
    }

    fn end_progress(&mut self) {
        if self.progress_width > 0 {
            println!();
            self.progress_width = 0;
        }
    }

    pub fn fail(&mut self, error: &dyn Display) -> io::Result<()> {
        self.end_progress();
        self.log(&format!("{} failed: {}", self.command, error))
    }

    /// Close the run with its result line and the elapsed time
    pub fn finish(&mut self, result: &str) -> io::Result<()> {
        self.end_progress();
        self.log(result)?;
        let used = format_time_used(self.started.elapsed());
        self.log(&used)?;
        println!("{}", used);
        Ok(())
    }
}

/// Format time as "xx h xx m xx.xxx s", dropping leading zero units
pub fn format_time_used(elapsed: Duration) -> String {
    let millis = elapsed.as_millis();
    let hours = millis / 3_600_000;
    let minutes = millis % 3_600_000 / 60_000;
    let seconds = format!("{}.{:03} s", millis % 60_000 / 1000, millis % 1000);

    match (hours, minutes) {
        (0, 0) => format!("[Time used] {}", seconds),
        (0, m) => format!("[Time used] {:02} m {}", m, seconds),
        (h, m) => format!("[Time used] {:02} h {:02} m {}", h, m, seconds),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_used_picks_the_largest_unit() {
        assert_eq!(format_time_used(Duration::from_millis(1500)), "[Time used] 1.500 s");
        assert_eq!(
            format_time_used(Duration::from_secs(125)),
            "[Time used] 02 m 5.000 s"
        );
        assert_eq!(
            format_time_used(Duration::from_secs(3 * 3600 + 60)),
            "[Time used] 03 h 01 m 0.000 s"
        );
    }

    #[test]
    fn default_log_sits_next_to_the_output() {
        assert_eq!(
            default_log_path(Path::new("out/plot.ps")),
            PathBuf::from("out/plot.ps.log")
        );
    }

    #[test]
    fn run_log_is_tagged_with_the_command() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("plot.ps");
        {
            let mut logger = Logger::start("render", None, &output).unwrap();
            logger.param("Structure File", "agcu.ct").unwrap();
            logger.step("Loaded 4 bases").unwrap();
            logger.fail(&"index 9 is outside the sequence").unwrap();
        }
        let text = std::fs::read_to_string(default_log_path(&output)).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert!(lines[0].ends_with("[render] === corrcircle render ==="));
        assert!(lines.iter().all(|l| l.starts_with('[') && l.contains("] [render] ")));
        assert!(text.contains("  Structure File: agcu.ct\n"));
        assert!(text.contains("] [render] Loaded 4 bases\n"));
        assert!(lines
            .last()
            .unwrap()
            .ends_with("render failed: index 9 is outside the sequence"));
    }

    #[test]
    fn explicit_log_path_creates_its_directory() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("logs").join("run.log");
        let mut logger =
            Logger::start("reformat", log.to_str(), &dir.path().join("cc.dat")).unwrap();
        logger.finish("Correlation file written").unwrap();
        let text = std::fs::read_to_string(&log).unwrap();
        assert!(text.contains("Correlation file written"));
        assert!(text.contains("[Time used]"));
    }
}
