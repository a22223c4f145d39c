use mabalgs::prelude::*;

fn main() {
    println!("mabalgs: Single-Position Algorithm Comparison\n");
    println!("{}", "=".repeat(60));

    // Arm 2 is best until round 400, then arm 0 takes over
    let schedule = RewardSchedule::from_entries([
        (0, vec![0.3, 0.5, 0.8, 0.4]),
        (400, vec![0.9, 0.5, 0.2, 0.4]),
    ])
    .unwrap();

    println!("Reward schedule:");
    println!("  rounds   0..400: [0.30, 0.50, 0.80, 0.40]  (best: arm 2)");
    println!("  rounds 400..800: [0.90, 0.50, 0.20, 0.40]  (best: arm 0)");
    println!("{}", "=".repeat(60));

    let config = SimulationConfig::builder()
        .episodes(500)
        .rounds(800)
        .seed(42)
        .parallel(true)
        .build()
        .unwrap();
    let simulator = MonteCarloSimulator::new(config);

    for algorithm in Algorithm::ALL {
        let report = simulator.run(algorithm, &schedule).unwrap();

        println!("\n{algorithm}");
        println!("{}", "-".repeat(algorithm.name().len()));
        println!("  Average cumulative reward: {:.1}", report.final_reward());

        for t in [50, 399, 450, 799] {
            let shares: Vec<String> = report.arm_probability[t]
                .iter()
                .map(|p| format!("{:.2}", p))
                .collect();
            println!(
                "  round {:>3}: selection shares [{}]  most chosen: arm {}",
                t,
                shares.join(", "),
                report.best_arm_at(t).unwrap_or(0)
            );
        }
    }

    println!("\n{}", "=".repeat(60));
}
