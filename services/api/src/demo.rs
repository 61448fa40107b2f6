use crate::infra::{
    sample_requests, sample_residents, InMemoryLotteryStore, InMemoryRequestSource,
    InMemoryResidentDirectory, LogNotifier,
};
use clap::Args;
use park_net::error::AppError;
use park_net::lottery::{
    AllocationResult, LotteryService, LotteryServiceError, ParticipantOutcome, Period,
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// First lottery period (YYYY-MM). Defaults to 2025-07.
    #[arg(long, value_parser = parse_period_arg)]
    pub(crate) period: Option<Period>,
    /// Car spots offered per period
    #[arg(long, default_value_t = 2)]
    pub(crate) car_spots: u32,
    /// Motorcycle spots offered per period
    #[arg(long, default_value_t = 1)]
    pub(crate) moto_spots: u32,
    /// Pin the tie-break shuffle to a seed for reproducible output
    #[arg(long)]
    pub(crate) seed: Option<u64>,
}

fn parse_period_arg(raw: &str) -> Result<Period, String> {
    raw.parse().map_err(|err| format!("{err}"))
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        period,
        car_spots,
        moto_spots,
        seed,
    } = args;

    let first_period = match period {
        Some(period) => period,
        None => "2025-07".parse().expect("literal period token is valid"),
    };

    let requests = Arc::new(InMemoryRequestSource::default());
    let residents = Arc::new(InMemoryResidentDirectory::default());
    let lotteries = Arc::new(InMemoryLotteryStore::default());
    let notifier = Arc::new(LogNotifier::new(
        "Park-Net <no-reply@park-net.example>".to_string(),
    ));
    let service = LotteryService::new(requests.clone(), residents.clone(), lotteries, notifier);

    for resident in sample_residents() {
        residents.upsert(resident);
    }

    println!("Park-Net lottery demo");
    println!(
        "Offering {car_spots} car spot(s) and {moto_spots} motorcycle spot(s) per period.\n"
    );

    // First period: every sample resident enters.
    for request in sample_requests(first_period) {
        requests.push(request);
    }
    let first = execute(&service, first_period, car_spots, moto_spots, seed)?;
    render_result(&first);

    // Second period: everyone re-enters, so first-period losers carry
    // their priority boost into this draw.
    let second_period = next_period(first_period);
    for request in sample_requests(second_period) {
        requests.push(request);
    }
    let second = execute(&service, second_period, car_spots, moto_spots, seed.map(|s| s + 1))?;
    render_result(&second);

    if let Some(carried) = first.non_winners.first() {
        let assignments = service
            .assignments_for_resident(&carried.resident_id, second_period)
            .map_err(AppError::from)?;
        println!(
            "{} lost {} and holds {} assignment(s) for {}.",
            carried.full_name,
            first.period,
            assignments.len(),
            second_period
        );
    }

    // The guard: a period can only ever be drawn once.
    match service.execute_lottery(first_period, car_spots, moto_spots) {
        Err(LotteryServiceError::AlreadyExecuted(period)) => {
            println!("\nRe-running {period} is rejected: a result already exists.");
        }
        Ok(_) => println!("\nUnexpected: the duplicate run was accepted."),
        Err(other) => return Err(AppError::from(other)),
    }

    Ok(())
}

fn execute(
    service: &LotteryService<
        InMemoryRequestSource,
        InMemoryResidentDirectory,
        InMemoryLotteryStore,
        LogNotifier,
    >,
    period: Period,
    car_spots: u32,
    moto_spots: u32,
    seed: Option<u64>,
) -> Result<AllocationResult, AppError> {
    let result = match seed {
        Some(seed) => service.execute_lottery_with_rng(
            period,
            car_spots,
            moto_spots,
            &mut ChaCha8Rng::seed_from_u64(seed),
        ),
        None => service.execute_lottery(period, car_spots, moto_spots),
    };
    result.map_err(AppError::from)
}

fn next_period(period: Period) -> Period {
    let (year, month) = if period.month() == 12 {
        (period.year() + 1, 1)
    } else {
        (period.year(), period.month() + 1)
    };
    Period::new(year, month).expect("incremented period is valid")
}

fn render_result(result: &AllocationResult) {
    println!("Period {}", result.period);
    println!("  Winners:");
    if result.winners.is_empty() {
        println!("    (none)");
    }
    for winner in &result.winners {
        println!("    {}", participant_line(winner));
    }
    println!("  Non-winners:");
    if result.non_winners.is_empty() {
        println!("    (none)");
    }
    for participant in &result.non_winners {
        println!("    {}", participant_line(participant));
    }
    println!();
}

fn participant_line(participant: &ParticipantOutcome) -> String {
    let spot = participant.spot.as_deref().unwrap_or("-");
    format!(
        "{:<16} {:<10} plate {:<8} spot {}",
        participant.full_name,
        participant.vehicle_category.label(),
        participant.license_plate,
        spot
    )
}
