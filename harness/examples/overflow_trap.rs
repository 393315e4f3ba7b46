use noise_trap_harness::{driver::AttackDriver, preset, report::TableSink, zone::Zone};
use std::io;

fn main() {
    tracing_subscriber::fmt().with_env_filter("debug").init();

    for preset in [preset::overflow_trap(), preset::squaring_overflow()] {
        println!("{}", preset.param);
        let bfv = preset.param.build().unwrap();
        let mut sink = TableSink::new(io::stdout().lock());
        let report = AttackDriver::new(&bfv, &preset.scenario).run(&mut sink).unwrap();
        let _stdout = sink.into_inner().unwrap();

        // The plaintext wraps long before the noise budget runs out.
        let last = report.last().unwrap();
        assert_ne!(last.zone, Zone::Danger);
        println!(
            "{} bits of budget were still left when {} decrypted to {:?} instead of {}",
            last.noise_budget, last.label, last.decrypted, last.expected
        );
    }
}
