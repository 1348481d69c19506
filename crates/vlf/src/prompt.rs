//! Interactive step-by-step prompts.
//!
//! Each field of the current step is asked in catalog order. An empty line
//! keeps the current answer, `:back` returns to the previous step and
//! `:quit` (or end of input) abandons the session. After the last field
//! the wizard tries to advance; validation errors are shown and the step
//! is asked again.

use std::io::{self, BufRead, Write};
use std::path::Path;

use serde_json::Value;
use vlf_io::load_upload;
use vlf_wizard::{FieldKind, FieldSpec, Step, TemplateStore, Wizard};

/// Command returning to the previous step.
pub const BACK: &str = ":back";

/// Command abandoning the session.
pub const QUIT: &str = ":quit";

/// Errors from the prompt loop.
#[derive(Debug, thiserror::Error)]
pub enum PromptError {
    /// Reading input or writing prompts failed.
    #[error("terminal I/O failed: {0}")]
    Io(#[from] io::Error),
}

/// How an interactive session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Step 5 validated; the report can be rendered.
    Finished,
    /// The user quit or input ended.
    Quit,
}

enum Flow {
    Done,
    Back,
    Quit,
}

/// Prompts over any line reader and writer.
#[derive(Debug)]
pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    /// Prompt on `output`, reading answers from `input`.
    pub const fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Give back the writer.
    #[cfg(test)]
    pub fn into_output(self) -> W {
        self.output
    }

    /// Ask every step until step 5 validates or the user quits.
    ///
    /// # Errors
    ///
    /// Returns [`PromptError::Io`] if the terminal fails.
    pub fn run<T: TemplateStore>(&mut self, wizard: &mut Wizard<T>) -> Result<Outcome, PromptError> {
        writeln!(
            self.output,
            "Escriba {BACK} para volver al paso anterior o {QUIT} para salir."
        )?;
        loop {
            let step = wizard.step();
            writeln!(self.output)?;
            writeln!(self.output, "Paso {}/{}: {}", step.number(), Step::LAST.number(), step.title())?;

            match self.ask_step(wizard)? {
                Flow::Quit => return Ok(Outcome::Quit),
                Flow::Back => {
                    if !wizard.retreat().moved() {
                        writeln!(self.output, "Ya está en el primer paso.")?;
                    }
                    continue;
                }
                Flow::Done => {}
            }

            match wizard.advance() {
                Ok(_) if step == Step::LAST => return Ok(Outcome::Finished),
                Ok(_) => {}
                Err(err) => writeln!(self.output, "No se puede continuar: {err}")?,
            }
        }
    }

    fn ask_step<T: TemplateStore>(&mut self, wizard: &mut Wizard<T>) -> Result<Flow, PromptError> {
        for spec in wizard.current_fields() {
            loop {
                self.write_prompt(wizard, &spec)?;
                let Some(line) = self.read_line()? else {
                    return Ok(Flow::Quit);
                };
                let raw = line.trim();
                match raw {
                    BACK => return Ok(Flow::Back),
                    QUIT => return Ok(Flow::Quit),
                    "" => break,
                    _ => {}
                }
                let result = if spec.kind == FieldKind::PhotoUpload {
                    load_upload(Path::new(raw))
                        .map_err(|err| err.to_string())
                        .and_then(|upload| {
                            wizard.attach_upload(&spec.key, upload).map_err(|err| err.to_string())
                        })
                } else {
                    spec.kind
                        .parse_input(&spec.key, raw)
                        .and_then(|value| wizard.set(&spec.key, value))
                        .map_err(|err| err.to_string())
                };
                match result {
                    Ok(()) => break,
                    Err(msg) => writeln!(self.output, "  {msg}")?,
                }
            }
        }
        Ok(Flow::Done)
    }

    fn write_prompt<T: TemplateStore>(&mut self, wizard: &Wizard<T>, spec: &FieldSpec) -> Result<(), PromptError> {
        let session = wizard.session();
        let current = if spec.kind == FieldKind::PhotoUpload {
            session.uploads().get(&spec.key).map(|u| u.file_name.clone())
        } else {
            session.get(&spec.key).map(display)
        };
        write!(self.output, "{} ({})", spec.label, spec.kind.describe())?;
        if !spec.required {
            write!(self.output, " [opcional]")?;
        }
        if let Some(current) = current {
            write!(self.output, " [{current}]")?;
        }
        write!(self.output, ": ")?;
        self.output.flush()?;
        Ok(())
    }

    fn read_line(&mut self) -> Result<Option<String>, PromptError> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line))
    }
}

fn display(value: &Value) -> String {
    value
        .as_str()
        .map_or_else(|| value.to_string(), str::to_string)
}
