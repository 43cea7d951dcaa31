use std::process::Command;

use crate::domain::constants::{EXCEL_MACRO_EXTENSIONS, WORD_MACRO_EXTENSIONS};
use crate::domain::models::MacroModule;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OfficeKind {
    Word,
    Excel,
}

/// Which application family owns a macro-capable target, judged by
/// extension alone. `None` means the file type is not eligible.
pub fn macro_kind(target: &str) -> Option<OfficeKind> {
    let dot = target.rfind('.')?;
    let extension = target[dot..].to_ascii_lowercase();
    if WORD_MACRO_EXTENSIONS.contains(&extension.as_str()) {
        Some(OfficeKind::Word)
    } else if EXCEL_MACRO_EXTENSIONS.contains(&extension.as_str()) {
        Some(OfficeKind::Excel)
    } else {
        None
    }
}

/// The document-automation collaborator. Opens the target read-only,
/// pulls source from every code module, and releases the document even on
/// failure; this core only consumes the contract. Any failure is handled
/// per file by the caller.
pub trait MacroExtractor {
    fn extract(&self, target: &str) -> anyhow::Result<Vec<MacroModule>>;
}

/// Shells out to a configured extraction command, passing the document path
/// as the last argument and expecting a JSON array of `{name, code}` on
/// stdout.
pub struct ToolMacroExtractor {
    program: String,
    args: Vec<String>,
}

impl ToolMacroExtractor {
    pub fn new(command_line: &str) -> anyhow::Result<Self> {
        let mut parts = command_line.split_whitespace().map(str::to_string);
        let Some(program) = parts.next() else {
            anyhow::bail!("macro tool command is empty");
        };
        Ok(Self {
            program,
            args: parts.collect(),
        })
    }
}

impl MacroExtractor for ToolMacroExtractor {
    fn extract(&self, target: &str) -> anyhow::Result<Vec<MacroModule>> {
        let out = Command::new(&self.program)
            .args(&self.args)
            .arg(target)
            .output()?;
        if !out.status.success() {
            anyhow::bail!("macro tool exited with {}", out.status);
        }
        Ok(serde_json::from_slice(&out.stdout)?)
    }
}
