/*
 * A headless platform front-end. It feeds a scripted sequence of `AppEvent`s
 * to the application logic, waits out any background run between events by
 * sending idle ticks, and renders every dequeued `PlatformCommand` as a line
 * of text.
 */
use super::types::{AppEvent, MessageSeverity, PlatformCommand, PlatformEventHandler};
use std::io::{self, Write};
use std::thread;
use std::time::Duration;

const IDLE_TICK_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConsoleRunSummary {
    pub highest_severity: Option<MessageSeverity>,
    pub quit_requested: bool,
}

impl ConsoleRunSummary {
    /* A warning (e.g. a missing selection) fails the process just like an error. */
    pub fn should_fail_exit(&self) -> bool {
        self.highest_severity
            .is_some_and(|s| s >= MessageSeverity::Warning)
    }
}

pub struct ConsolePlatform<W: Write> {
    out: W,
    tick_interval: Duration,
}

impl ConsolePlatform<io::Stdout> {
    pub fn stdout() -> Self {
        ConsolePlatform {
            out: io::stdout(),
            tick_interval: IDLE_TICK_INTERVAL,
        }
    }
}

impl<W: Write> ConsolePlatform<W> {
    pub fn with_writer(out: W, tick_interval: Duration) -> Self {
        ConsolePlatform { out, tick_interval }
    }

    pub fn into_writer(self) -> W {
        self.out
    }

    /*
     * Dispatches `events` in order. After each event, keeps ticking the
     * handler until it reports idle, so a later event (e.g. revealing the
     * outputs) observes the finished run.
     */
    pub fn run(
        &mut self,
        handler: &mut dyn PlatformEventHandler,
        events: Vec<AppEvent>,
    ) -> io::Result<ConsoleRunSummary> {
        let mut summary = ConsoleRunSummary::default();
        for event in events {
            log::trace!("ConsolePlatform: Dispatching {event:?}");
            handler.handle_event(event);
            self.drain(handler, &mut summary)?;
            while handler.is_busy() {
                thread::sleep(self.tick_interval);
                handler.handle_event(AppEvent::Tick);
                self.drain(handler, &mut summary)?;
            }
            if summary.quit_requested {
                break;
            }
        }
        handler.on_quit();
        Ok(summary)
    }

    fn drain(
        &mut self,
        handler: &mut dyn PlatformEventHandler,
        summary: &mut ConsoleRunSummary,
    ) -> io::Result<()> {
        while let Some(command) = handler.try_dequeue_command() {
            self.render(&command, summary)?;
        }
        Ok(())
    }

    fn render(
        &mut self,
        command: &PlatformCommand,
        summary: &mut ConsoleRunSummary,
    ) -> io::Result<()> {
        match command {
            PlatformCommand::SetWindowTitle { title } => {
                log::debug!("ConsolePlatform: Title is now '{title}'.");
            }
            PlatformCommand::ShowInputFileList { paths } => {
                writeln!(self.out, "Selected tx0 files:")?;
                for path in paths {
                    writeln!(self.out, "  {}", path.display())?;
                }
            }
            PlatformCommand::ShowTemperatureFile { path } => {
                writeln!(self.out, "Temperature file: {}", path.display())?;
            }
            PlatformCommand::SetConverterChecked { checked } => {
                log::debug!("ConsolePlatform: Converter checkbox now {checked}.");
            }
            PlatformCommand::SetStartEnabled { enabled } => {
                log::debug!("ConsolePlatform: Start control enabled = {enabled}.");
            }
            PlatformCommand::UpdateStatus { text, severity } => {
                let prefix = match severity {
                    MessageSeverity::Information => "",
                    MessageSeverity::Warning => "warning: ",
                    MessageSeverity::Error => "error: ",
                };
                writeln!(self.out, "{prefix}{text}")?;
                summary.highest_severity = summary.highest_severity.max(Some(*severity));
            }
            PlatformCommand::QuitApplication => {
                summary.quit_requested = true;
            }
        }
        Ok(())
    }
}
