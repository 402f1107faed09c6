use std::io::{Cursor, Write};
use std::path::PathBuf;
use std::process::{Command, Stdio};

use image::{ImageFormat, RgbImage};
use tracing::trace;

use crate::core::error::OcrError;
use crate::ocr::{OcrMode, TextExtractor};

/// Runs the `tesseract` command-line engine, streaming a PNG crop over stdin
/// and reading the recognized text from stdout.
#[derive(Debug, Clone)]
pub struct TesseractBridge {
    program: PathBuf,
    lang: String,
}

impl Default for TesseractBridge {
    fn default() -> Self {
        Self::new()
    }
}

impl TesseractBridge {
    pub fn new() -> Self {
        Self {
            program: PathBuf::from("tesseract"),
            lang: "eng".to_string(),
        }
    }

    pub fn with_program(mut self, program: PathBuf) -> Self {
        self.program = program;
        self
    }

    pub fn with_lang(mut self, lang: String) -> Self {
        self.lang = lang;
        self
    }

    fn args(&self, mode: OcrMode) -> Vec<String> {
        let mut args = vec![
            "stdin".to_string(),
            "stdout".to_string(),
            "-l".to_string(),
            self.lang.clone(),
        ];
        if mode == OcrMode::UniformBlock {
            args.extend(["--oem", "3", "--psm", "6"].map(String::from));
        }
        args
    }
}

impl TextExtractor for TesseractBridge {
    fn extract_text(&self, image: &RgbImage, mode: OcrMode) -> Result<String, OcrError> {
        let mut png = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .map_err(OcrError::Encode)?;

        let program = self.program.display().to_string();
        let spawn_error = |source| OcrError::Spawn {
            program: program.clone(),
            source,
        };

        let mut child = Command::new(&self.program)
            .args(self.args(mode))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(spawn_error)?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(&png).map_err(spawn_error)?;
        }

        let output = child.wait_with_output().map_err(spawn_error)?;
        if !output.status.success() {
            return Err(OcrError::Engine {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let text = String::from_utf8(output.stdout).map_err(OcrError::InvalidOutput)?;
        trace!(?mode, chars = text.len(), "tesseract output");
        Ok(text)
    }
}
