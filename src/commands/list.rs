use anyhow::Result;
use noise_trap_harness::preset;
use serde::Serialize;

#[derive(Serialize)]
struct Entry<'a> {
    name: &'a str,
    about: &'a str,
    plain_modulus: u64,
    poly_degree: usize,
    halt_on_danger_zone: bool,
}

pub fn run(json: bool) -> Result<()> {
    let presets = preset::all();
    if json {
        let entries: Vec<_> = presets
            .iter()
            .map(|p| Entry {
                name: p.name,
                about: p.about,
                plain_modulus: p.param.plain_modulus.value(),
                poly_degree: p.param.poly_degree,
                halt_on_danger_zone: p.scenario.halt_on_danger_zone,
            })
            .collect();
        return super::print_json(&entries);
    }

    println!("Available presets:");
    for p in &presets {
        let flavor = if p.scenario.halt_on_danger_zone {
            "halts on danger"
        } else {
            "report only"
        };
        println!("  {:<26} {}", p.name, p.about);
        println!(
            "  {:<26} n = {}, t = {}, {}",
            "", p.param.poly_degree, p.param.plain_modulus, flavor
        );
    }
    Ok(())
}
