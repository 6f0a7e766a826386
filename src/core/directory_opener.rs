/*
 * Cross-platform "reveal in file manager". Windows uses the native shell
 * "open" verb; macOS spawns `open`; everything else spawns `xdg-open`. The
 * spawned process is not waited on, and its own success is not verified.
 */
use std::io;
use std::path::Path;
use std::process::{Command, ExitStatus};
use std::thread::{self, JoinHandle};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostPlatform {
    Windows,
    MacOs,
    Other,
}

impl HostPlatform {
    pub fn detect() -> Self {
        if cfg!(target_os = "windows") {
            HostPlatform::Windows
        } else if cfg!(target_os = "macos") {
            HostPlatform::MacOs
        } else {
            HostPlatform::Other
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealOutcome {
    NothingToOpen,
    Opened,
}

pub trait ProcessLauncherOperations: Send + Sync {
    // Asks the OS shell to open `path` with its default handler.
    fn shell_open(&self, path: &Path) -> io::Result<()>;
    // Starts `program path` and returns without waiting for it.
    fn spawn_detached(&self, program: &str, path: &Path) -> io::Result<()>;
}

pub struct CoreProcessLauncher {}

impl CoreProcessLauncher {
    pub fn new() -> Self {
        CoreProcessLauncher {}
    }
}

impl Default for CoreProcessLauncher {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessLauncherOperations for CoreProcessLauncher {
    #[cfg(target_os = "windows")]
    fn shell_open(&self, path: &Path) -> io::Result<()> {
        use windows::Win32::UI::Shell::ShellExecuteW;
        use windows::Win32::UI::WindowsAndMessaging::SW_SHOWNORMAL;
        use windows::core::{HSTRING, PCWSTR, w};

        let target = HSTRING::from(path.as_os_str());
        // SAFETY: all string arguments outlive the call; a null owner window is allowed.
        let result = unsafe {
            ShellExecuteW(
                None,
                w!("open"),
                &target,
                PCWSTR::null(),
                PCWSTR::null(),
                SW_SHOWNORMAL,
            )
        };
        // Values above 32 mean success.
        if result.0 as isize > 32 {
            Ok(())
        } else {
            Err(io::Error::other(format!(
                "ShellExecuteW failed for {path:?} with code {}",
                result.0 as isize
            )))
        }
    }

    #[cfg(not(target_os = "windows"))]
    fn shell_open(&self, path: &Path) -> io::Result<()> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            format!("Native shell open is only available on Windows ({path:?})"),
        ))
    }

    fn spawn_detached(&self, program: &str, path: &Path) -> io::Result<()> {
        let mut command = Command::new(program);
        command.arg(path);
        spawn_and_reap(command).map(|_reaper| ())
    }
}

/*
 * Starts `command` and waits for it on a short-lived thread, so the child is
 * reaped when it exits instead of lingering until the workbench quits.
 */
fn spawn_and_reap(mut command: Command) -> io::Result<JoinHandle<Option<ExitStatus>>> {
    let mut child = command.spawn()?;
    thread::Builder::new()
        .name("reveal-reaper".to_string())
        .spawn(move || match child.wait() {
            Ok(status) => {
                log::debug!("DirectoryOpener: File manager launcher exited with {status}.");
                Some(status)
            }
            Err(e) => {
                log::warn!("DirectoryOpener: Could not wait for the file manager launcher: {e}");
                None
            }
        })
}

/*
 * Opens `path` in the host file manager. An unset or empty path is reported
 * as `NothingToOpen` and launches nothing. Spawn errors are returned to the
 * caller; the launched process itself is not monitored.
 */
pub fn reveal(
    launcher: &dyn ProcessLauncherOperations,
    platform: HostPlatform,
    path: Option<&Path>,
) -> io::Result<RevealOutcome> {
    let Some(path) = path.filter(|p| !p.as_os_str().is_empty()) else {
        log::info!("DirectoryOpener: Directory path is empty, nothing to open.");
        return Ok(RevealOutcome::NothingToOpen);
    };
    log::debug!("DirectoryOpener: Revealing {path:?} on {platform:?}.");
    match platform {
        HostPlatform::Windows => launcher.shell_open(path)?,
        HostPlatform::MacOs => launcher.spawn_detached("open", path)?,
        HostPlatform::Other => launcher.spawn_detached("xdg-open", path)?,
    }
    Ok(RevealOutcome::Opened)
}
