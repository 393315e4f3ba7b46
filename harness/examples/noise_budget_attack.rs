use noise_trap_harness::{
    driver::{AttackDriver, StepRecord},
    preset,
    report::TableSink,
};
use std::io;

fn main() {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let preset = preset::noise_budget_attack();
    println!("{}", preset.param);

    // The legitimate product sets the baseline, then an encrypted 1 is
    // multiplied in ten at a time. The expectation never moves.
    let bfv = preset.param.build().unwrap();
    let mut sink = TableSink::new(io::stdout().lock());
    let report = AttackDriver::new(&bfv, &preset.scenario).run(&mut sink).unwrap();
    let _stdout = sink.into_inner().unwrap();

    let first = &report.records[0];
    println!();
    println!("Initial noise budget: {} bits", report.header.fresh_budget);
    println!("After 100 × 10: {} bits", first.noise_budget);
    if let Some(halt) = &report.halt {
        println!("Attack succeeded at {}: {}", halt.label, halt.reason);
    }

    // The same attack in the terminating flavor.
    let scenario = preset.scenario.clone().halt_on_danger_zone(true);
    let report = AttackDriver::new(&bfv, &scenario)
        .run(&mut Vec::<StepRecord>::new())
        .unwrap();
    println!("Halting on the danger zone: {:?}", report.statuses());
}
