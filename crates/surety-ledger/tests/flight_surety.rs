//! End-to-end flows through the ledger facade

use std::sync::Arc;
use surety_common::{AccountId, Amount, FlightKey, StatusCode};
use surety_ledger::{
    Admission, FetchTicket, FixedClock, LedgerEvent, LedgerSnapshot, OpenOutcome, PayoutPolicy,
    ResponseOutcome, Settlement, SuretyConfig, SuretyLedger,
};

const NOW: i64 = 1_700_000_000;
const DEPARTURE: i64 = NOW + 3_600;

struct Fixture {
    ledger: SuretyLedger,
    clock: Arc<FixedClock>,
    airlines: Vec<AccountId>,
    oracles: Vec<AccountId>,
    flight: FlightKey,
    passenger: AccountId,
}

fn airline(n: usize) -> AccountId {
    AccountId::derive(&format!("airline-{}", n))
}

/// Index space of three means every oracle holds every index
fn config(policy: PayoutPolicy) -> SuretyConfig {
    SuretyConfig {
        first_airline: airline(1),
        oracle_index_space: 3,
        payout_policy: policy,
        rng_seed: Some(42),
        ..SuretyConfig::default()
    }
}

/// Four funded airlines, one flight, five oracles
fn fixture(policy: PayoutPolicy) -> Fixture {
    let clock = Arc::new(FixedClock::new(NOW));
    let mut ledger = SuretyLedger::new(config(policy), clock.clone()).unwrap();
    let fund = ledger.config().participation_fund;

    let airlines: Vec<_> = (1..=4).map(airline).collect();
    ledger.fund(airlines[0], fund).unwrap();
    for candidate in &airlines[1..] {
        let admission = ledger.register_airline(airlines[0], *candidate).unwrap();
        assert_eq!(admission, Admission::Registered);
        ledger.fund(*candidate, fund).unwrap();
    }

    let flight = FlightKey::new(airlines[0], "ND1309", DEPARTURE);
    ledger.register_flight(airlines[0], flight.clone()).unwrap();

    let fee = ledger.config().registration_fee;
    let oracles: Vec<_> = (0..5)
        .map(|n| AccountId::derive(&format!("oracle-{}", n)))
        .collect();
    for oracle in &oracles {
        ledger.register_oracle(*oracle, fee).unwrap();
    }

    Fixture {
        ledger,
        clock,
        airlines,
        oracles,
        flight,
        passenger: AccountId::derive("passenger"),
    }
}

fn respond(f: &mut Fixture, ticket: &FetchTicket, oracle: usize, status: StatusCode) -> ResponseOutcome {
    f.ledger
        .submit_oracle_response(f.oracles[oracle], ticket.key.index, f.flight.clone(), status)
        .unwrap()
}

#[test]
fn test_admission_switches_to_voting_at_four() {
    let mut f = fixture(PayoutPolicy::Unconditional);
    let a5 = airline(5);
    assert_eq!(f.ledger.registered_airline_count(), 4);

    let first = f.ledger.register_airline(f.airlines[0], a5).unwrap();
    assert_eq!(first, Admission::Pending { votes: 1, required: 2 });
    assert!(!f.ledger.is_airline(&a5));

    let err = f.ledger.register_airline(f.airlines[0], a5).unwrap_err();
    assert_eq!(err.code(), "DuplicateVote");
    assert_eq!(f.ledger.votes_for(&a5), vec![f.airlines[0]]);

    let second = f.ledger.register_airline(f.airlines[1], a5).unwrap();
    assert_eq!(second, Admission::Elected { votes: 2 });
    assert!(f.ledger.is_airline(&a5));
    assert!(f.ledger.votes_for(&a5).is_empty());

    // An admitted but unfunded airline cannot vote
    let err = f.ledger.register_airline(a5, airline(6)).unwrap_err();
    assert_eq!(err.code(), "CallerNotFunded");
}

#[test]
fn test_flight_registration_rules() {
    let mut f = fixture(PayoutPolicy::Unconditional);

    let err = f
        .ledger
        .register_flight(f.airlines[0], f.flight.clone())
        .unwrap_err();
    assert_eq!(err.code(), "FlightAlreadyRegistered");

    let departed = FlightKey::new(f.airlines[0], "ND1310", NOW);
    let err = f.ledger.register_flight(f.airlines[0], departed).unwrap_err();
    assert_eq!(err.code(), "FlightInPast");

    let unknown = FlightKey::new(airline(9), "XX1", DEPARTURE);
    let err = f.ledger.register_flight(airline(9), unknown.clone()).unwrap_err();
    assert_eq!(err.code(), "AirlineNotRegistered");
    assert_eq!(f.ledger.view_flight_status(&unknown), StatusCode::Unknown);

    f.clock.advance(10_000);
    let late = FlightKey::new(f.airlines[1], "ND1311", DEPARTURE);
    let err = f.ledger.register_flight(f.airlines[1], late).unwrap_err();
    assert_eq!(err.code(), "FlightInPast");
}

#[test]
fn test_insurance_purchase_cap() {
    let mut f = fixture(PayoutPolicy::Unconditional);
    let half = f.ledger.config().insurance_pay_limit.half();

    f.ledger.buy(f.passenger, f.flight.clone(), half).unwrap();
    let total = f.ledger.buy(f.passenger, f.flight.clone(), half).unwrap();
    assert_eq!(total, f.ledger.config().insurance_pay_limit);

    let err = f
        .ledger
        .buy(f.passenger, f.flight.clone(), Amount::from_base(1))
        .unwrap_err();
    assert_eq!(err.code(), "InsuranceOverbought");
    assert_eq!(f.ledger.policy(&f.passenger, &f.flight), total);
}

#[test]
fn test_oracle_quorum_credits_once_and_pays_once() {
    let mut f = fixture(PayoutPolicy::Unconditional);
    let limit = f.ledger.config().insurance_pay_limit;
    f.ledger.buy(f.passenger, f.flight.clone(), limit).unwrap();
    let held_before = f.ledger.treasury().held();

    let ticket = f.ledger.fetch_flight_status(f.passenger, f.flight.clone()).unwrap();
    assert_eq!(ticket.outcome, OpenOutcome::Opened);

    // Split responses; the first code to reach three wins
    assert!(matches!(
        respond(&mut f, &ticket, 0, StatusCode::OnTime),
        ResponseOutcome::Recorded { agreeing: 1, required: 3, .. }
    ));
    respond(&mut f, &ticket, 1, StatusCode::LateAirline);
    respond(&mut f, &ticket, 2, StatusCode::LateAirline);
    let err = f
        .ledger
        .submit_oracle_response(f.oracles[1], ticket.key.index, f.flight.clone(), StatusCode::OnTime)
        .unwrap_err();
    assert_eq!(err.code(), "DuplicateResponse");

    let outcome = respond(&mut f, &ticket, 3, StatusCode::LateAirline);
    assert_eq!(
        outcome,
        ResponseOutcome::Finalized {
            status: StatusCode::LateAirline,
            agreeing: 3
        }
    );
    assert_eq!(f.ledger.view_flight_status(&f.flight), StatusCode::LateAirline);
    assert!(f.ledger.flight(&f.flight).unwrap().credited);

    let expected = limit.mul_ratio(3, 2).unwrap();
    assert_eq!(f.ledger.get_insuree_credit(&f.passenger), expected);

    let err = f
        .ledger
        .submit_oracle_response(f.oracles[4], ticket.key.index, f.flight.clone(), StatusCode::LateAirline)
        .unwrap_err();
    assert_eq!(err.code(), "RequestAlreadyClosed");

    // Crediting again changes nothing
    assert_eq!(f.ledger.credit_insurees(&f.flight).unwrap(), Settlement::AlreadyCredited);
    assert_eq!(f.ledger.get_insuree_credit(&f.passenger), expected);

    let paid = f.ledger.pay(f.passenger).unwrap();
    assert_eq!(paid, expected);
    assert_eq!(f.ledger.get_insuree_credit(&f.passenger), Amount::ZERO);
    assert_eq!(f.ledger.pay(f.passenger).unwrap_err().code(), "NoCreditOwed");
    assert_eq!(f.ledger.treasury().held(), held_before.checked_sub(expected).unwrap());

    let finalized = f
        .ledger
        .events()
        .iter()
        .filter(|e| matches!(e.event, LedgerEvent::FlightStatusInfo { .. }))
        .count();
    let credited = f
        .ledger
        .events()
        .iter()
        .filter(|e| matches!(e.event, LedgerEvent::InsureesCredited { .. }))
        .count();
    assert_eq!((finalized, credited), (1, 1));
}

#[test]
fn test_request_lifecycle() {
    let mut f = fixture(PayoutPolicy::Unconditional);
    let ticket = f.ledger.fetch_flight_status(f.passenger, f.flight.clone()).unwrap();

    let unopened = (ticket.key.index + 1) % 3;
    assert!(f.ledger.status_request(unopened, &f.flight).is_none());
    let err = f
        .ledger
        .submit_oracle_response(f.oracles[0], unopened, f.flight.clone(), StatusCode::OnTime)
        .unwrap_err();
    assert_eq!(err.code(), "StatusRequestNotFound");

    for oracle in 0..3 {
        respond(&mut f, &ticket, oracle, StatusCode::LateWeather);
    }
    assert!(!f.ledger.status_request(ticket.key.index, &f.flight).unwrap().is_open());

    // Fetch until the closed request is drawn again
    let reopened = loop {
        let next = f.ledger.fetch_flight_status(f.passenger, f.flight.clone()).unwrap();
        if next.key == ticket.key {
            break next;
        }
    };
    assert_eq!(
        reopened.outcome,
        OpenOutcome::Reopened {
            previous: StatusCode::LateWeather
        }
    );

    for oracle in 0..3 {
        respond(&mut f, &reopened, oracle, StatusCode::LateTechnical);
    }
    assert_eq!(f.ledger.view_flight_status(&f.flight), StatusCode::LateTechnical);
}

#[test]
fn test_every_fetch_announces_a_request() {
    let mut f = fixture(PayoutPolicy::Unconditional);
    let announced = |ledger: &SuretyLedger| {
        ledger
            .events()
            .iter()
            .filter(|e| matches!(e.event, LedgerEvent::OracleRequest { .. }))
            .count()
    };

    let first = f.ledger.fetch_flight_status(f.passenger, f.flight.clone()).unwrap();
    respond(&mut f, &first, 0, StatusCode::OnTime);
    let mut fetches = 1;

    // Draw the open request again; its tally survives the refetch
    loop {
        let next = f.ledger.fetch_flight_status(f.passenger, f.flight.clone()).unwrap();
        fetches += 1;
        if next.key == first.key {
            assert_eq!(next.outcome, OpenOutcome::AlreadyOpen);
            break;
        }
    }
    let request = f.ledger.status_request(first.key.index, &f.flight).unwrap();
    assert!(request.is_open());
    assert!(request.has_responded(&f.oracles[0]));
    assert_eq!(request.tally(StatusCode::OnTime), 1);

    while fetches < 10 {
        f.ledger.fetch_flight_status(f.passenger, f.flight.clone()).unwrap();
        fetches += 1;
    }
    assert_eq!(announced(&f.ledger), fetches);
}

#[test]
fn test_airline_delay_only_defers_until_airline_fault() {
    let mut f = fixture(PayoutPolicy::AirlineDelayOnly);
    let limit = f.ledger.config().insurance_pay_limit;
    f.ledger.buy(f.passenger, f.flight.clone(), limit).unwrap();

    let ticket = f.ledger.fetch_flight_status(f.passenger, f.flight.clone()).unwrap();
    for oracle in 0..3 {
        respond(&mut f, &ticket, oracle, StatusCode::LateWeather);
    }
    assert!(!f.ledger.flight(&f.flight).unwrap().credited);
    assert_eq!(f.ledger.get_insuree_credit(&f.passenger), Amount::ZERO);

    let ticket = f.ledger.fetch_flight_status(f.passenger, f.flight.clone()).unwrap();
    assert_ne!(ticket.outcome, OpenOutcome::AlreadyOpen);
    for oracle in 0..3 {
        respond(&mut f, &ticket, oracle, StatusCode::LateAirline);
    }
    assert!(f.ledger.flight(&f.flight).unwrap().credited);
    assert_eq!(
        f.ledger.get_insuree_credit(&f.passenger),
        limit.mul_ratio(3, 2).unwrap()
    );
}

#[test]
fn test_pause_blocks_oracle_traffic() {
    let mut f = fixture(PayoutPolicy::Unconditional);
    let owner = f.ledger.config().owner;
    let ticket = f.ledger.fetch_flight_status(f.passenger, f.flight.clone()).unwrap();

    f.ledger.set_operational(owner, false).unwrap();
    let err = f
        .ledger
        .submit_oracle_response(f.oracles[0], ticket.key.index, f.flight.clone(), StatusCode::OnTime)
        .unwrap_err();
    assert_eq!(err.code(), "SystemPaused");
    assert_eq!(
        f.ledger
            .fetch_flight_status(f.passenger, f.flight.clone())
            .unwrap_err()
            .code(),
        "SystemPaused"
    );
    assert_eq!(f.ledger.get_my_indexes(&f.oracles[0]).map(|i| i.len()), Some(3));

    f.ledger.set_operational(owner, true).unwrap();
    respond(&mut f, &ticket, 0, StatusCode::OnTime);
}

#[test]
fn test_paused_ledger_rejects_every_mutation() {
    let mut f = fixture(PayoutPolicy::Unconditional);
    let owner = f.ledger.config().owner;
    let fund = f.ledger.config().participation_fund;
    let fee = f.ledger.config().registration_fee;
    let limit = f.ledger.config().insurance_pay_limit;
    let later = FlightKey::new(f.airlines[1], "ND1312", DEPARTURE);

    f.ledger.set_operational(owner, false).unwrap();
    let recorded = f.ledger.events().len();
    let snapshot = f.ledger.snapshot();

    let errors = [
        f.ledger.fund(f.airlines[0], fund).unwrap_err(),
        f.ledger.register_airline(f.airlines[0], airline(5)).unwrap_err(),
        f.ledger.register_flight(f.airlines[1], later).unwrap_err(),
        f.ledger.buy(f.passenger, f.flight.clone(), limit).unwrap_err(),
        f.ledger
            .register_oracle(AccountId::derive("oracle-late"), fee)
            .unwrap_err(),
        f.ledger.credit_insurees(&f.flight).unwrap_err(),
        f.ledger.pay(f.passenger).unwrap_err(),
    ];
    for err in &errors {
        assert_eq!(err.code(), "SystemPaused");
    }
    assert_eq!(f.ledger.events().len(), recorded);
    assert_eq!(f.ledger.snapshot(), snapshot);

    f.ledger.set_operational(owner, true).unwrap();
    f.ledger.buy(f.passenger, f.flight.clone(), limit).unwrap();
}

#[test]
fn test_snapshot_restore_round_trip() {
    let mut f = fixture(PayoutPolicy::Unconditional);
    let limit = f.ledger.config().insurance_pay_limit;
    f.ledger.buy(f.passenger, f.flight.clone(), limit).unwrap();
    f.ledger.register_airline(f.airlines[0], airline(5)).unwrap();
    let ticket = f.ledger.fetch_flight_status(f.passenger, f.flight.clone()).unwrap();
    respond(&mut f, &ticket, 0, StatusCode::LateAirline);

    let snapshot = f.ledger.snapshot();
    let json = snapshot.to_json().unwrap();
    let parsed = LedgerSnapshot::from_json(&json).unwrap();
    assert_eq!(parsed, snapshot);

    let mut restored =
        SuretyLedger::restore(config(PayoutPolicy::Unconditional), parsed, f.clock.clone()).unwrap();
    assert_eq!(restored.snapshot(), snapshot);
    assert!(restored.events().is_empty());
    assert_eq!(restored.votes_for(&airline(5)), vec![f.airlines[0]]);

    // The open request carries over
    for oracle in 1..3 {
        restored
            .submit_oracle_response(f.oracles[oracle], ticket.key.index, f.flight.clone(), StatusCode::LateAirline)
            .unwrap();
    }
    assert_eq!(
        restored.get_insuree_credit(&f.passenger),
        limit.mul_ratio(3, 2).unwrap()
    );
}

#[tokio::test]
async fn test_subscriber_sees_status_requests() {
    let mut f = fixture(PayoutPolicy::Unconditional);
    let mut rx = f.ledger.subscribe();

    let ticket = f.ledger.fetch_flight_status(f.passenger, f.flight.clone()).unwrap();
    let envelope = rx.recv().await.unwrap();

    assert_eq!(
        envelope.event,
        LedgerEvent::OracleRequest {
            index: ticket.key.index,
            flight: f.flight.clone(),
        }
    );
    assert_eq!(envelope.sequence as usize, f.ledger.events().len());
    assert_eq!(envelope.recorded_at, NOW);
}
