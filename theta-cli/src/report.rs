use chrono::SecondsFormat;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use theta_registry::RegistryStats;
use theta_storage::{SaveId, SaveSummary};

#[derive(Debug, Clone, Serialize)]
pub struct SmokeReport {
    pub id: SaveId,
    pub size_bytes: u64,
    pub saved: RegistryStats,
    pub loaded: RegistryStats,
    pub cycles_verified: usize,
}

impl fmt::Display for SmokeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Smoke test passed")?;
        writeln!(f, "  Save:     {} ({} bytes)", self.id, self.size_bytes)?;
        writeln!(f, "  Saved:    {}", Stats(&self.saved))?;
        writeln!(f, "  Loaded:   {}", Stats(&self.loaded))?;
        write!(f, "  Cycles:   {} verified", self.cycles_verified)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct InspectReport {
    pub id: SaveId,
    pub stats: RegistryStats,
    pub types: BTreeMap<String, usize>,
}

impl fmt::Display for InspectReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Save {}", self.id)?;
        write!(f, "  Tracker:  {}", Stats(&self.stats))?;
        for (name, count) in &self.types {
            write!(f, "\n  {name:<10}{count}")?;
        }
        Ok(())
    }
}

struct Stats<'a>(&'a RegistryStats);

impl fmt::Display for Stats<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "next {}, held {}, freed {}",
            self.0.next, self.0.held, self.0.freed
        )
    }
}

/// One line per save, newest first.
pub fn render_saves(saves: &[SaveSummary]) -> String {
    if saves.is_empty() {
        return "No saves found".to_string();
    }
    saves
        .iter()
        .map(|s| {
            format!(
                "{:<12} {}  {:>8} bytes",
                s.id.as_str(),
                s.saved_at.to_rfc3339_opts(SecondsFormat::Secs, true),
                s.size_bytes
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
