/// Session log
///
/// Each viewer action (phase selection, click, case switch, spectrum lookup)
/// is recorded in order together with the `geo-spectral-viewer` command
/// that reproduces it headlessly. Exports as text, JSON or a shell script.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::io;
use std::path::Path;

/// One recorded action
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    /// 1-based position in the session
    pub sequence: usize,
    pub timestamp: DateTime<Local>,
    pub operation: String,
    pub description: String,
    /// Equivalent CLI invocation; empty when the action has none
    pub command: String,
}

impl LogEntry {
    pub fn to_text(&self) -> String {
        let mut line = format!(
            "[{:03}] {} {:<14} {}",
            self.sequence,
            self.timestamp.format("%H:%M:%S"),
            self.operation,
            self.description
        );
        if !self.command.is_empty() {
            line.push_str("\n      $ ");
            line.push_str(&self.command);
        }
        line
    }

    fn to_shell_line(&self) -> String {
        let header = format!("# {}. {}: {}", self.sequence, self.operation, self.description);
        if self.command.is_empty() {
            header
        } else {
            format!("{}\n{}", header, self.command)
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionLog {
    pub session_id: String,
    pub session_start: DateTime<Local>,
    pub asset_dir: String,
    pub library: String,
    pub software_version: String,
    pub entries: Vec<LogEntry>,
}

impl SessionLog {
    pub fn new() -> Self {
        Self {
            session_id: uuid::Uuid::new_v4().to_string(),
            session_start: Local::now(),
            asset_dir: String::new(),
            library: String::new(),
            software_version: env!("CARGO_PKG_VERSION").to_string(),
            entries: Vec::new(),
        }
    }

    pub fn set_sources(&mut self, asset_dir: &Path, library: &Path) {
        self.asset_dir = asset_dir.display().to_string();
        self.library = library.display().to_string();
    }

    /// Record an action
    pub fn record(&mut self, operation: &str, description: &str, command: &str) {
        let sequence = self.entries.len() + 1;
        log::debug!("[session {:03}] {}: {}", sequence, operation, description);
        self.entries.push(LogEntry {
            sequence,
            timestamp: Local::now(),
            operation: operation.to_string(),
            description: description.to_string(),
            command: command.to_string(),
        });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries whose operation matches `operation`
    pub fn entries_for<'a>(&'a self, operation: &'a str) -> impl Iterator<Item = &'a LogEntry> + 'a {
        self.entries.iter().filter(move |e| e.operation == operation)
    }

    pub fn to_text(&self) -> String {
        let rule = "─".repeat(64);
        let mut out = String::new();
        out.push_str(&format!("Geo-spectral viewer session {}\n", self.session_id));
        out.push_str(&format!(
            "Started {}  (v{})\n",
            self.session_start.format("%Y-%m-%d %H:%M:%S"),
            self.software_version
        ));
        out.push_str(&format!("Assets:  {}\n", self.asset_dir));
        out.push_str(&format!("Library: {}\n", self.library));
        out.push_str(&rule);
        out.push('\n');
        for entry in &self.entries {
            out.push_str(&entry.to_text());
            out.push('\n');
        }
        out.push_str(&rule);
        out.push('\n');
        out.push_str(&format!("{} actions\n", self.entries.len()));
        out
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Shell script replaying every action that has a command
    pub fn to_shell_script(&self) -> String {
        let mut out = String::new();
        out.push_str("#!/bin/sh\n");
        out.push_str(&format!(
            "# Replay of geo-spectral viewer session {} ({})\n",
            self.session_id,
            self.session_start.format("%Y-%m-%d %H:%M:%S")
        ));
        out.push_str(&format!("# geo-spectral-viewer v{}\n", self.software_version));
        out.push_str("set -eu\n\n");
        for entry in &self.entries {
            out.push_str(&entry.to_shell_line());
            out.push_str("\n\n");
        }
        out
    }

    pub fn save_text(&self, path: &Path) -> io::Result<()> {
        std::fs::write(path, self.to_text())
    }

    pub fn save_json(&self, path: &Path) -> io::Result<()> {
        let json = self
            .to_json()
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, json)
    }

    pub fn save_script(&self, path: &Path) -> io::Result<()> {
        std::fs::write(path, self.to_shell_script())?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))?;
        }
        Ok(())
    }

    /// Save in the format implied by the extension (`.json`, `.sh`, else text)
    pub fn save(&self, path: &Path) -> io::Result<()> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => self.save_json(path),
            Some("sh") => self.save_script(path),
            _ => self.save_text(path),
        }
    }
}

impl Default for SessionLog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_numbers() {
        let mut log = SessionLog::new();
        assert!(log.is_empty());
        log.record("phase", "Selected 30°", "geo-spectral-viewer pixel --phase 30 --x 1 --y 1");
        log.record("clear", "Marker cleared", "");
        assert_eq!(log.len(), 2);
        assert_eq!(log.entries[0].sequence, 1);
        assert_eq!(log.entries[1].sequence, 2);
        assert_eq!(log.entries_for("clear").count(), 1);
    }

    #[test]
    fn test_text_export() {
        let mut log = SessionLog::new();
        log.set_sources(Path::new("assets"), Path::new("assets/lib.json"));
        log.record("lookup", "Row 115 (standard)", "geo-spectral-viewer pixel --phase 0 --x 5 --y 6");
        let text = log.to_text();
        assert!(text.contains("Library: assets/lib.json"));
        assert!(text.contains("Row 115 (standard)"));
        assert!(text.contains("$ geo-spectral-viewer pixel --phase 0 --x 5 --y 6"));
        assert!(text.contains("1 actions"));
    }

    #[test]
    fn test_json_roundtrip() {
        let mut log = SessionLog::new();
        log.record("case", "Switched to no_haze", "");
        let parsed: SessionLog = serde_json::from_str(&log.to_json().unwrap()).unwrap();
        assert_eq!(parsed.session_id, log.session_id);
        assert_eq!(parsed.entries[0].operation, "case");
    }

    #[test]
    fn test_shell_script_skips_empty_commands() {
        let mut log = SessionLog::new();
        log.record("clear", "Marker cleared", "");
        log.record("lookup", "Row 3", "geo-spectral-viewer pixel --phase 5 --x 1 --y 2");
        let script = log.to_shell_script();
        assert!(script.starts_with("#!/bin/sh"));
        assert!(script.contains("# 1. clear: Marker cleared\n\n"));
        assert!(script.contains("\ngeo-spectral-viewer pixel --phase 5 --x 1 --y 2\n"));
    }

    #[test]
    fn test_save_by_extension() {
        let dir = std::env::temp_dir().join(format!("session-log-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let mut log = SessionLog::new();
        log.record("phase", "Selected 0°", "");

        let json = dir.join("session.json");
        log.save(&json).unwrap();
        assert!(std::fs::read_to_string(&json).unwrap().trim_start().starts_with('{'));

        let script = dir.join("session.sh");
        log.save(&script).unwrap();
        assert!(std::fs::read_to_string(&script).unwrap().starts_with("#!/bin/sh"));

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
