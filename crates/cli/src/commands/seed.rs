use reviewdesk_db::{
    connect_with_config, migrations, DemoSeedDataset, ReviewerSeedInfo, SeedResult, DEMO_WEEK,
};

use crate::commands::{load_config, runtime, CommandResult, StepFailure};

pub fn run() -> CommandResult {
    let config = match load_config("seed") {
        Ok(config) => config,
        Err(failure) => return failure,
    };
    let runtime = match runtime("seed") {
        Ok(runtime) => runtime,
        Err(failure) => return failure,
    };

    let result = runtime.block_on(async {
        let pool = connect_with_config(&config.database)
            .await
            .map_err(|error| ("db_connectivity", error.to_string(), 4u8))?;

        migrations::run_pending(&pool)
            .await
            .map_err(|error| ("migration", error.to_string(), 5u8))?;

        let seeded = DemoSeedDataset::load(&pool)
            .await
            .map_err(|error| ("seed_execution", error.to_string(), 5u8))?;

        let verification = DemoSeedDataset::verify(&pool)
            .await
            .map_err(|error| ("seed_verification", error.to_string(), 6u8))?;

        let failed_checks = verification
            .checks
            .iter()
            .filter_map(|(check, passed)| (!passed).then_some(*check))
            .collect::<Vec<_>>();
        let outcome: Result<SeedResult, StepFailure> = if verification.all_present {
            Ok(seeded)
        } else {
            Err(("seed_verification", verification_failure_message(&failed_checks), 6u8))
        };

        pool.close().await;
        outcome
    });

    match result {
        Ok(seeded) => CommandResult::success("seed", summary(&seeded)),
        Err(failure) => CommandResult::from_step("seed", failure),
    }
}

fn verification_failure_message(failed_checks: &[&str]) -> String {
    if failed_checks.is_empty() {
        "Some seed data failed to load".to_string()
    } else {
        format!("Seed verification failed for checks: {}", failed_checks.join(", "))
    }
}

fn summary(seeded: &SeedResult) -> String {
    let reviewers = seeded.reviewers_seeded.iter().map(reviewer_line).collect::<Vec<_>>();
    format!(
        "Demo dataset loaded for challenges {} with availability in week {DEMO_WEEK}:\n{}",
        seeded.challenges_seeded.join(", "),
        reviewers.join("\n")
    )
}

fn reviewer_line(reviewer: &ReviewerSeedInfo) -> String {
    format!("  - {}: {} ({})", reviewer.reviewer_id, reviewer.challenge_name, reviewer.description)
}
