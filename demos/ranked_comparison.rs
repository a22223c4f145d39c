use mabalgs::prelude::*;

fn main() {
    println!("mabalgs: Ranked Allocator Comparison\n");
    println!("{}", "=".repeat(60));

    // Near-tied favourites per rank, and a bottom slot that is rarely seen
    let schedule = RankedSchedule::new(vec![
        vec![0.80, 0.78, 0.20, 0.10, 0.05],
        vec![0.75, 0.79, 0.30, 0.10, 0.05],
        vec![0.20, 0.25, 0.70, 0.65, 0.10],
        vec![1.00, 0.80, 0.40],
    ])
    .unwrap();

    let config = SimulationConfig::builder()
        .episodes(300)
        .rounds(1000)
        .seed(7)
        .parallel(true)
        .build()
        .unwrap();
    let simulator = RankedMonteCarloSimulator::new(config);

    for allocator in [RankedAlgorithm::Rba, RankedAlgorithm::Rbam] {
        for algorithm in Algorithm::ALL {
            let report = simulator.run(allocator, algorithm, &schedule).unwrap();
            let last = report.rounds - 1;
            let placements: Vec<String> = (0..report.n_ranks())
                .map(|rank| format!("{}", report.best_arm_at(last, rank).unwrap_or(0)))
                .collect();

            println!(
                "  {:<5} + {:<6} average clicks: {:>7.1}   final placement: [{}]",
                allocator.name(),
                algorithm.name(),
                report.final_reward(),
                placements.join(", ")
            );
        }
    }

    println!("{}", "=".repeat(60));
}
