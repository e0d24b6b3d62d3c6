use std::process::Command;
use std::thread;

use crate::models::config::ShellMapping;
use crate::models::error::MixerError;

/// Hides the console window of the spawned interpreter.
#[cfg(windows)]
const CREATE_NO_WINDOW: u32 = 0x0800_0000;

/// Substitute `{cc}` and `{value}` (or `{{.CC}}` and `{{.Value}}`) in `template`.
pub fn render_template(template: &str, cc: u8, value: u8) -> String {
    let cc = cc.to_string();
    let value = value.to_string();
    template
        .replace("{{.CC}}", &cc)
        .replace("{{.Value}}", &value)
        .replace("{cc}", &cc)
        .replace("{value}", &value)
}

/// A fully resolved interpreter command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellInvocation {
    pub program: String,
    pub args: Vec<String>,
}

impl ShellInvocation {
    /// Command line for `mapping` and the event `(cc, value)`.
    ///
    /// Templates are joined into one script with CRLF line breaks; plain
    /// commands are passed as successive arguments.
    pub fn for_event(mapping: &ShellMapping, cc: u8, value: u8) -> Self {
        let (program, mut args) = if mapping.use_powershell {
            ("powershell.exe", vec!["-NoProfile".to_string(), "-NonInteractive".to_string()])
        } else {
            ("cmd.exe", vec!["/C".to_string()])
        };

        if mapping.is_template {
            args.push(render_template(&mapping.command.join("\r\n"), cc, value));
        } else {
            args.extend(mapping.command.iter().cloned());
        }

        Self {
            program: program.to_string(),
            args,
        }
    }

    /// Run to completion and return the combined stdout and stderr.
    pub fn run(&self) -> Result<String, MixerError> {
        let mut command = Command::new(&self.program);
        command.args(&self.args);
        #[cfg(windows)]
        {
            use std::os::windows::process::CommandExt;
            command.creation_flags(CREATE_NO_WINDOW);
        }

        let output = command
            .output()
            .map_err(|e| MixerError::Io(format!("failed to start {}: {}", self.program, e)))?;

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));

        if output.status.success() {
            Ok(combined)
        } else {
            Err(MixerError::Io(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                combined.trim()
            )))
        }
    }
}

/// Run `mapping` for `(cc, value)` on a worker thread.
///
/// Does nothing unless the mapping listens on `cc`. Output is logged when
/// `log_output` is set and errors unless `suppress_errors` is set.
pub fn spawn_shell_mapping(mapping: &ShellMapping, cc: u8, value: u8) -> bool {
    if mapping.cc != cc {
        return false;
    }

    let invocation = ShellInvocation::for_event(mapping, cc, value);
    let log_output = mapping.log_output;
    let suppress_errors = mapping.suppress_errors;
    log::trace!("running {:?}", invocation);

    let spawned = thread::Builder::new()
        .name("shell-mapping".into())
        .spawn(move || match invocation.run() {
            Ok(output) => {
                if log_output && !output.trim().is_empty() {
                    log::info!("{:?} returned {}", invocation.args, output.trim());
                }
            }
            Err(e) => {
                if !suppress_errors {
                    log::error!("{:?} returned error {}", invocation.args, e);
                }
            }
        });

    match spawned {
        Ok(_) => true,
        Err(e) => {
            log::error!("failed to spawn shell worker: {}", e);
            false
        }
    }
}
