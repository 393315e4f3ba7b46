use super::{execute, print_json, ScenarioFile};
use anyhow::{bail, Context, Result};
use noise_trap_harness::{driver::ScenarioReport, preset};
use std::{fs, path::PathBuf};
use tracing::info;

pub fn presets(
    names: Vec<String>,
    all: bool,
    halt_on_danger_zone: Option<bool>,
    json: bool,
) -> Result<()> {
    let presets = if all {
        preset::all()
    } else {
        names
            .iter()
            .map(|name| match preset::by_name(name) {
                Some(preset) => Ok(preset),
                None => bail!("unknown preset `{name}`, see `noise-trap list`"),
            })
            .collect::<Result<Vec<_>>>()?
    };

    let mut reports = Vec::with_capacity(presets.len());
    for mut preset in presets {
        if let Some(halt) = halt_on_danger_zone {
            preset.scenario.halt_on_danger_zone = halt;
        }
        reports.push(execute(preset.param, &preset.scenario, json)?);
    }
    finish(&reports, json)
}

pub fn config(file: PathBuf, halt_on_danger_zone: Option<bool>, json: bool) -> Result<()> {
    let content = fs::read_to_string(&file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    let ScenarioFile { bfv, mut scenario } = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse {}", file.display()))?;
    info!(path = %file.display(), scenario = %scenario.name, "loaded scenario");

    if let Some(halt) = halt_on_danger_zone {
        scenario.halt_on_danger_zone = halt;
    }
    let report = execute(bfv, &scenario, json)?;
    finish(&[report], json)
}

fn finish(reports: &[ScenarioReport], json: bool) -> Result<()> {
    if json {
        return print_json(&reports);
    }
    let halted = reports.iter().filter(|r| r.state.is_halted()).count();
    info!(scenarios = reports.len(), halted, "done");
    Ok(())
}
