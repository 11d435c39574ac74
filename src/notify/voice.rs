use std::process::{Child, Command, Stdio};

use anyhow::{anyhow, Context, Result};

use super::VoiceAnnouncer;

/// Logs announcements instead of speaking them.
#[derive(Default)]
pub struct ConsoleVoice;

impl VoiceAnnouncer for ConsoleVoice {
    fn speak(&mut self, message: &str) -> Result<()> {
        log::info!("[VOICE] {}", message);
        Ok(())
    }
}

/// Speaks through an external text-to-speech program (e.g. `espeak`).
///
/// The message is passed as the last argument. `speak` returns as soon as the program is
/// started; the next announcement first waits for the previous one to finish, so messages
/// never overlap and every child is reaped.
pub struct CommandVoice {
    program: String,
    args: Vec<String>,
    speaking: Option<Child>,
}

impl CommandVoice {
    /// Build from a command line such as `espeak -s 150`.
    pub fn from_command_line(command: &str) -> Result<Self> {
        let mut parts = command.split_whitespace().map(str::to_string);
        let program = parts
            .next()
            .ok_or_else(|| anyhow!("voice command must not be empty"))?;
        Ok(Self {
            program,
            args: parts.collect(),
            speaking: None,
        })
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// True while the last announcement is still playing.
    pub fn is_speaking(&mut self) -> Result<bool> {
        let Some(child) = self.speaking.as_mut() else {
            return Ok(false);
        };
        match child
            .try_wait()
            .with_context(|| format!("failed to poll voice command '{}'", self.program))?
        {
            Some(status) => {
                self.speaking = None;
                log_exit(&self.program, status);
                Ok(false)
            }
            None => Ok(true),
        }
    }

    /// Block until the announcement in progress, if any, has finished.
    pub fn finish(&mut self) -> Result<()> {
        if let Some(mut child) = self.speaking.take() {
            let status = child
                .wait()
                .with_context(|| format!("failed to wait for voice command '{}'", self.program))?;
            log_exit(&self.program, status);
        }
        Ok(())
    }
}

fn log_exit(program: &str, status: std::process::ExitStatus) {
    if !status.success() {
        log::warn!("voice command '{}' exited with {}", program, status);
    }
}

impl Drop for CommandVoice {
    fn drop(&mut self) {
        if let Err(err) = self.finish() {
            log::warn!("{:#}", err);
        }
    }
}

impl VoiceAnnouncer for CommandVoice {
    fn speak(&mut self, message: &str) -> Result<()> {
        if self.is_speaking()? {
            log::debug!("waiting for previous announcement");
        }
        self.finish()?;
        let child = Command::new(&self.program)
            .args(&self.args)
            .arg(message)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .with_context(|| format!("failed to start voice command '{}'", self.program))?;
        self.speaking = Some(child);
        Ok(())
    }
}
