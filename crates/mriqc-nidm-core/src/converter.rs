//! Semantic conversion of normalized tables into NIDM graphs.
//!
//! The conversion itself is done by the external `csv2nidm` tool from
//! PyNIDM. The [`SemanticConverter`] trait keeps the orchestrator independent
//! of the process boundary so tests can substitute a stub.

use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

use crate::config::{ConverterConfig, ReferenceDictionaries};
use crate::{NidmError, Result};

/// Converts a single-row table into a graph document.
pub trait SemanticConverter {
    /// Short name used in log messages.
    fn name(&self) -> &str;

    /// Convert `table` into the graph at `output`.
    ///
    /// Concept linking is always disabled.
    fn convert(
        &self,
        table: &Path,
        dictionaries: &ReferenceDictionaries,
        output: &Path,
    ) -> Result<()>;
}

/// Runs `csv2nidm` as a blocking subprocess.
#[derive(Debug, Clone)]
pub struct Csv2Nidm {
    program: PathBuf,
    name: String,
}

impl Csv2Nidm {
    /// Use the given executable (a bare name is resolved through `PATH`).
    pub fn new(program: impl Into<PathBuf>) -> Self {
        let program = program.into();
        let name = program
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| program.display().to_string());
        Self { program, name }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Build the command line without running it.
    pub fn command(
        &self,
        table: &Path,
        dictionaries: &ReferenceDictionaries,
        output: &Path,
    ) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.arg(ConverterConfig::CSV_FLAG)
            .arg(table)
            .arg(ConverterConfig::FIELD_MAP_FLAG)
            .arg(dictionaries.field_map())
            .arg(ConverterConfig::NO_CONCEPTS_FLAG)
            .arg(ConverterConfig::DERIVATIVE_FLAG)
            .arg(dictionaries.software_metadata())
            .arg(ConverterConfig::OUTPUT_FLAG)
            .arg(output);
        cmd
    }
}

impl Default for Csv2Nidm {
    fn default() -> Self {
        Self::new(ConverterConfig::DEFAULT_PROGRAM)
    }
}

impl SemanticConverter for Csv2Nidm {
    fn name(&self) -> &str {
        &self.name
    }

    fn convert(
        &self,
        table: &Path,
        dictionaries: &ReferenceDictionaries,
        output: &Path,
    ) -> Result<()> {
        let mut cmd = self.command(table, dictionaries, output);
        debug!("Running {:?}", cmd);

        let result = cmd.output().map_err(|e| NidmError::ConverterLaunch {
            program: self.name.clone(),
            message: e.to_string(),
        })?;

        let stderr = String::from_utf8_lossy(&result.stderr);
        for line in stderr.lines().filter(|l| !l.trim().is_empty()) {
            debug!("[{}] stderr: {}", self.name, line);
        }

        if !result.status.success() {
            let mut message = format!(
                "exited with status: {}",
                result.status.code().unwrap_or(-1)
            );
            if let Some(last) = stderr.lines().rev().find(|l| !l.trim().is_empty()) {
                message.push_str(": ");
                message.push_str(last.trim());
            }
            return Err(NidmError::ConverterFailed {
                program: self.name.clone(),
                message,
            });
        }
        Ok(())
    }
}
