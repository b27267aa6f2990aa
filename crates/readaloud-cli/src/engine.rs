//! Speech engine that speaks through an external program (espeak by default).
//!
//! Each utterance runs one child process with the text on stdin. When the
//! process exits, the outcome is sent as a [`SpeechEvent`] on the channel the
//! engine was built with.

use std::path::Path;
use std::process::Stdio;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, trace, warn};

use readaloud_core::error::SpeechError;
use readaloud_core::models::config::SpeechConfig;
use readaloud_core::speech::{SpeechEngine, SpeechEvent, Utterance, UtteranceId};

struct Running {
    id: UtteranceId,
    pid: Option<u32>,
    cancel: oneshot::Sender<()>,
}

/// The utterance whose process is alive, if any. Cleared by the waiter
/// task as soon as the process exits.
type RunningSlot = Arc<Mutex<Option<Running>>>;

pub struct CommandSpeechEngine {
    config: SpeechConfig,
    events: mpsc::UnboundedSender<SpeechEvent>,
    running: RunningSlot,
}

impl CommandSpeechEngine {
    pub fn new(config: SpeechConfig, events: mpsc::UnboundedSender<SpeechEvent>) -> Self {
        Self {
            config,
            events,
            running: Arc::new(Mutex::new(None)),
        }
    }

    fn amplitude(&self, volume: f32) -> u32 {
        (volume.clamp(0.0, 1.0) * self.config.amplitude_scale).round() as u32
    }

    fn running(&self) -> MutexGuard<'_, Option<Running>> {
        lock(&self.running)
    }

    fn running_pid(&self) -> Option<u32> {
        self.running().as_ref().and_then(|r| r.pid)
    }
}

impl SpeechEngine for CommandSpeechEngine {
    fn is_supported(&self) -> bool {
        program_exists(&self.config.program)
    }

    fn speak(&self, utterance: &Utterance) -> Result<(), SpeechError> {
        let mut command = Command::new(&self.config.program);
        command.args(&self.config.args);
        if let Some(flag) = &self.config.amplitude_arg {
            command.arg(flag).arg(self.amplitude(utterance.volume()).to_string());
        }
        command
            .stdin(Stdio::piped())
            .stdout(Stdio::inherit())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        let mut child = command.spawn().map_err(|e| {
            SpeechError::Engine(format!("failed to start {}: {}", self.config.program, e))
        })?;
        let pid = child.id();
        let id = utterance.id();
        debug!("Speaking utterance {} with {} (pid {:?})", id, self.config.program, pid);

        if let Some(mut stdin) = child.stdin.take() {
            let text = utterance.text().to_string();
            tokio::spawn(async move {
                // The program may exit before reading everything.
                if let Err(e) = stdin.write_all(text.as_bytes()).await {
                    trace!("Speech program closed stdin early: {}", e);
                }
            });
        }

        let (cancel_tx, cancel_rx) = oneshot::channel();
        // Registered before the waiter starts so an early exit can clear it.
        *self.running() = Some(Running {
            id,
            pid,
            cancel: cancel_tx,
        });

        let events = self.events.clone();
        let running = Arc::clone(&self.running);
        tokio::spawn(async move {
            tokio::select! {
                status = child.wait() => {
                    {
                        let mut slot = lock(&running);
                        if slot.as_ref().is_some_and(|r| r.id == id) {
                            *slot = None;
                        }
                    }
                    let event = match status {
                        Ok(status) if status.success() => SpeechEvent::ended(id),
                        Ok(status) => SpeechEvent::failed(id, format!("speech program exited with {}", status)),
                        Err(e) => SpeechEvent::failed(id, e.to_string()),
                    };
                    // The receiver is gone once the reader has shut down.
                    let _ = events.send(event);
                }
                _ = cancel_rx => {
                    if let Err(e) = child.kill().await {
                        warn!("Failed to kill speech program: {}", e);
                    }
                    debug!("Utterance {} cancelled", id);
                }
            }
        });

        Ok(())
    }

    fn cancel(&self) -> Result<(), SpeechError> {
        if let Some(running) = self.running().take() {
            trace!("Cancelling utterance {}", running.id);
            // Already finished if the task dropped its receiver.
            let _ = running.cancel.send(());
        }
        Ok(())
    }

    fn pause(&self) -> Result<(), SpeechError> {
        match self.running_pid() {
            Some(pid) => signal(pid, Signal::Stop),
            None => Ok(()),
        }
    }

    fn resume(&self) -> Result<(), SpeechError> {
        match self.running_pid() {
            Some(pid) => signal(pid, Signal::Continue),
            None => Ok(()),
        }
    }

    fn set_volume(&self, utterance: UtteranceId, volume: f32) -> Result<(), SpeechError> {
        debug!(
            "Volume {:.1} for {} applies from the next utterance",
            volume, utterance
        );
        Ok(())
    }
}

fn lock(slot: &RunningSlot) -> MutexGuard<'_, Option<Running>> {
    slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn program_exists(program: &str) -> bool {
    let path = Path::new(program);
    if path.components().count() > 1 {
        return path.is_file();
    }
    std::env::var_os("PATH")
        .map(|paths| std::env::split_paths(&paths).any(|dir| dir.join(program).is_file()))
        .unwrap_or(false)
}

enum Signal {
    Stop,
    Continue,
}

#[cfg(unix)]
fn signal(pid: u32, signal: Signal) -> Result<(), SpeechError> {
    let sig = match signal {
        Signal::Stop => libc::SIGSTOP,
        Signal::Continue => libc::SIGCONT,
    };
    // SAFETY: kill(2) has no memory-safety preconditions; pid is our own child.
    let rc = unsafe { libc::kill(pid as libc::pid_t, sig) };
    if rc == 0 {
        Ok(())
    } else {
        Err(SpeechError::Engine(std::io::Error::last_os_error().to_string()))
    }
}

#[cfg(not(unix))]
fn signal(_pid: u32, _signal: Signal) -> Result<(), SpeechError> {
    Err(SpeechError::Engine(
        "pausing is not available on this platform".to_string(),
    ))
}
