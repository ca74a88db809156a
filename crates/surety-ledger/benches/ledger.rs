//! Ledger benchmarks
//!
//! - Insurance purchase path
//! - Quorum finalisation with crediting, by number of insurees
//! - Snapshot serialisation

use criterion::{
    black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion, Throughput,
};
use std::sync::Arc;
use surety_common::{AccountId, Amount, FlightKey, StatusCode};
use surety_ledger::{FixedClock, SuretyConfig, SuretyLedger};

const NOW: i64 = 1_700_000_000;

fn setup(passengers: usize) -> (SuretyLedger, FlightKey, Vec<AccountId>) {
    let config = SuretyConfig {
        oracle_index_space: 3,
        rng_seed: Some(1),
        ..SuretyConfig::default()
    };
    let first = config.first_airline;
    let fee = config.registration_fee;
    let premium = config.insurance_pay_limit;

    let mut ledger = SuretyLedger::new(config, Arc::new(FixedClock::new(NOW))).unwrap();
    let flight = FlightKey::new(first, "BENCH1", NOW + 3_600);
    ledger.register_flight(first, flight.clone()).unwrap();

    for n in 0..passengers {
        let passenger = AccountId::derive(&format!("passenger-{}", n));
        ledger.buy(passenger, flight.clone(), premium).unwrap();
    }

    let oracles: Vec<_> = (0..3)
        .map(|n| AccountId::derive(&format!("oracle-{}", n)))
        .collect();
    for oracle in &oracles {
        ledger.register_oracle(*oracle, fee).unwrap();
    }
    (ledger, flight, oracles)
}

fn bench_buy(c: &mut Criterion) {
    let mut group = c.benchmark_group("insurance");
    group.throughput(Throughput::Elements(1));

    group.bench_function("buy", |b| {
        let (mut ledger, flight, _) = setup(0);
        let mut n = 0u64;
        b.iter(|| {
            n += 1;
            let passenger = AccountId::derive(&n.to_string());
            ledger
                .buy(passenger, flight.clone(), black_box(Amount::from_base(1)))
                .unwrap()
        });
    });

    group.finish();
}

fn bench_finalize(c: &mut Criterion) {
    let mut group = c.benchmark_group("consensus");

    for passengers in [10usize, 100, 1_000] {
        group.throughput(Throughput::Elements(passengers as u64));
        group.bench_with_input(
            BenchmarkId::new("finalize_and_credit", passengers),
            &passengers,
            |b, &passengers| {
                b.iter_batched(
                    || {
                        let (mut ledger, flight, oracles) = setup(passengers);
                        let ticket = ledger
                            .fetch_flight_status(oracles[0], flight.clone())
                            .unwrap();
                        (ledger, flight, oracles, ticket.key.index)
                    },
                    |(mut ledger, flight, oracles, index)| {
                        for oracle in oracles {
                            ledger
                                .submit_oracle_response(
                                    oracle,
                                    index,
                                    flight.clone(),
                                    StatusCode::LateAirline,
                                )
                                .unwrap();
                        }
                        ledger
                    },
                    BatchSize::SmallInput,
                );
            },
        );
    }

    group.finish();
}

fn bench_snapshot(c: &mut Criterion) {
    let (ledger, _, _) = setup(1_000);

    c.bench_function("snapshot_to_json", |b| {
        b.iter(|| black_box(ledger.snapshot()).to_json().unwrap())
    });
}

criterion_group!(insurance, bench_buy);
criterion_group!(consensus, bench_finalize);
criterion_group!(snapshot, bench_snapshot);

criterion_main!(insurance, consensus, snapshot);
