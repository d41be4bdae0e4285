//! Output writing via an external typesetting engine.
//!
//! The engine is consumed through a single contract: render the complete
//! combined markup into a binary artifact on disk. The default implementation
//! spawns the `weasyprint` command; tests substitute their own.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::error::{Error, Result};

/// Renders complete document markup into a paginated binary artifact.
pub trait Typesetter {
    fn render(&self, html: &str, output: &Path) -> Result<()>;
}

/// Typesetter backed by the `weasyprint` command-line tool.
///
/// The markup is piped through stdin; the stylesheet travels inside the
/// document head, so no extra arguments are needed.
pub struct WeasyPrint {
    command: PathBuf,
}

impl WeasyPrint {
    pub fn new(command: impl Into<PathBuf>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

impl Default for WeasyPrint {
    fn default() -> Self {
        Self::new("weasyprint")
    }
}

impl Typesetter for WeasyPrint {
    fn render(&self, html: &str, output: &Path) -> Result<()> {
        let mut child = Command::new(&self.command)
            .arg("-")
            .arg(output)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()?;

        let Some(mut stdin) = child.stdin.take() else {
            return Err(Error::Typeset("stdin unavailable".to_string()));
        };
        stdin.write_all(html.as_bytes())?;
        drop(stdin);

        let result = child.wait_with_output()?;
        if !result.status.success() {
            return Err(Error::Typeset(
                String::from_utf8_lossy(&result.stderr).trim().to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_command_surfaces_as_error() {
        let typesetter = WeasyPrint::new("/nonexistent/typesetter-binary");
        let err = typesetter
            .render("<html></html>", Path::new("/tmp/out.pdf"))
            .unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
