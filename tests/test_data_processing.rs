//! Integration tests for the data layer: generation, CSV round trips, summaries

use falcon_landing::data::{
    normalize_launch, ApiLaunch, DatasetLoader, GeneratorConfig, LaunchTable, Orbit, ResolvedResources,
    SampleGenerator,
};
use falcon_landing::report::DatasetSummary;
use std::io::Write;

#[test]
fn test_generator_is_deterministic() {
    let config = GeneratorConfig::default().with_samples(50).with_seed(9);
    let a = SampleGenerator::new(config.clone()).generate().unwrap();
    let b = SampleGenerator::new(config).generate().unwrap();
    assert_eq!(a, b);

    let c = SampleGenerator::new(GeneratorConfig::default().with_samples(50).with_seed(10))
        .generate()
        .unwrap();
    assert_ne!(a, c);
}

#[test]
fn test_generated_records_are_consistent() {
    let records = SampleGenerator::new(GeneratorConfig::default()).generate().unwrap();
    assert_eq!(records.len(), 100);
    for (i, r) in records.iter().enumerate() {
        assert_eq!(r.flight_number as usize, i + 1);
        assert!((1..=3).contains(&r.payload_count));
        if !r.landing_attempt {
            assert_eq!(r.landing_success, None);
        }
    }
    assert!(records.windows(2).all(|w| w[0].date <= w[1].date));
}

#[test]
fn test_csv_round_trip_preserves_summary() {
    let records = SampleGenerator::new(GeneratorConfig::default().with_samples(40)).generate().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("launches.csv");

    let loader = DatasetLoader::new();
    loader.save(&LaunchTable::from_records(&records).unwrap(), &path).unwrap();
    let table = loader.load(&path).unwrap();

    let summary = DatasetSummary::from_table(&table).unwrap();
    let expected = DatasetSummary::from_records(&records);
    assert_eq!(summary.total, expected.total);
    assert_eq!(summary.successes, expected.successes);
    assert_eq!(summary.by_site, expected.by_site);
    assert_eq!(summary.by_year, expected.by_year);
}

#[test]
fn test_summary_of_handwritten_csv() {
    let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
    writeln!(file, "FlightNumber,Date,LaunchSite,Orbit,GridFins,Reused,Legs,LandingAttempt,PayloadMass,Class").unwrap();
    writeln!(file, "1,2015-01-10,CCAFS SLC-40,ISS,False,False,True,True,2395.0,0").unwrap();
    writeln!(file, "2,2016-04-08,CCAFS SLC-40,ISS,True,False,True,True,3136.0,1").unwrap();
    writeln!(file, "3,2016-05-27,CCAFS SLC-40,GTO,True,False,True,True,,1").unwrap();
    writeln!(file, "4,2017-02-19,KSC LC-39A,ISS,True,True,True,True,2490.0,1").unwrap();
    file.flush().unwrap();

    let table = DatasetLoader::new().load(file.path()).unwrap();
    let summary = DatasetSummary::from_table(&table).unwrap();

    assert_eq!(summary.total, 4);
    assert_eq!(summary.successes, 3);
    assert_eq!(summary.by_site.len(), 2);
    assert_eq!(summary.by_orbit[0].key, "ISS");
    assert_eq!(summary.by_orbit[0].launches, 3);
    let payload = summary.payload.unwrap();
    assert_eq!(payload.min, 2395.0);
    assert_eq!(payload.max, 3136.0);

    let grid_fins = &summary.feature_impact[0];
    assert_eq!(grid_fins.with_rate, Some(1.0));
    assert_eq!(grid_fins.without_rate, Some(0.0));
}

#[test]
fn test_collector_normalizes_nested_launch() {
    let launch: ApiLaunch = serde_json::from_str(
        r#"{
            "flight_number": 12,
            "date_utc": "2016-04-08T20:43:00.000Z",
            "launchpad": "pad-1",
            "rocket": "falcon9",
            "cores": [{"gridfins": true, "legs": true, "reused": false,
                       "landing_attempt": true, "landing_success": true, "landing_type": "ASDS"}],
            "payloads": ["p1", "p2"]
        }"#,
    )
    .unwrap();

    let mut resources = ResolvedResources::default();
    resources.payloads.insert(
        "p1".to_string(),
        serde_json::from_str(r#"{"id": "p1", "mass_kg": 3136.0, "orbit": "ISS"}"#).unwrap(),
    );
    resources.payloads.insert(
        "p2".to_string(),
        serde_json::from_str(r#"{"id": "p2", "mass_kg": null, "orbit": "LEO"}"#).unwrap(),
    );

    let record = normalize_launch(&launch, &resources).unwrap();
    assert_eq!(record.flight_number, 12);
    assert_eq!(record.payload_count, 2);
    assert_eq!(record.payload_mass, Some(3136.0));
    assert_eq!(record.orbit, Orbit::Iss);
    assert!(record.class());
}
