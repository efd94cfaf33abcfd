use chrono::{DateTime, Duration, Utc};
use loopwatch_status::{
    parse_status_reports, AlarmLevel, InMemoryNotifications, LoopFailure, LoopPlugin,
    LoopSettings, LoopStatusKind, NotificationRegistry, RecordingRenderHost, StatusReport,
    LOOP_ALARM_NAME, LOOP_PROPERTY_NAME,
};

const DEVICESTATUS_FIXTURE: &str = include_str!("../fixtures/devicestatus.json");

fn fixture() -> Vec<StatusReport> {
    parse_status_reports(DEVICESTATUS_FIXTURE).expect("fixture decodes")
}

fn at(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .expect("valid timestamp")
        .with_timezone(&Utc)
}

#[test]
fn integration_enacted_cycle_updates_pill_and_forecast() {
    let reports = fixture();
    let plugin = LoopPlugin::default();
    let mut host = RecordingRenderHost::new();
    let mut registry = InMemoryNotifications::new();

    plugin.run_cycle(&reports, at("2016-08-13T20:09:15Z"), &mut host, &mut registry);

    let property = host.property(LOOP_PROPERTY_NAME).expect("loop property offered");
    assert_eq!(property.display.symbol, "⌁");
    assert_eq!(property.display.code, "enacted");

    let pill = host.pills.last().expect("pill text");
    assert_eq!(pill.label, "Loop ⌁");
    assert_eq!(pill.value, "1m ago");
    assert_eq!(pill.info[0].label, "1m ago");
    assert_eq!(
        pill.info[0].value,
        "<b>Temp Basal Started</b> 0.88U/hour for 30m, IOB: 0.17U"
    );
    assert_eq!(host.forecasts.len(), 1);
    assert_eq!(host.forecasts[0].len(), 6);
    assert!(registry.active_alarms().is_empty());
}

#[test]
fn integration_error_cycle_shows_failure_reason() {
    let reports = fixture();
    let plugin = LoopPlugin::default();
    let mut host = RecordingRenderHost::new();
    let mut registry = InMemoryNotifications::new();

    plugin.run_cycle(&reports, at("2016-08-13T20:04:15Z"), &mut host, &mut registry);

    let pill = host.pills.last().expect("pill text");
    assert_eq!(pill.symbol, "x");
    assert_eq!(pill.code, "error");
    assert_eq!(pill.label, "Loop x");
    assert_eq!(pill.value, "1m ago");
    assert_eq!(pill.info[0].label, "1m ago");
    assert_eq!(pill.info[0].value, "Error: SomeError");
}

#[test]
fn integration_unreceived_enactment_is_reported_as_error() {
    let mut reports = fixture();
    reports[0]
        .loop_record
        .as_mut()
        .and_then(|record| record.enacted.as_mut())
        .expect("enacted record")
        .received = Some(false);
    let mut host = RecordingRenderHost::new();

    let property =
        LoopPlugin::default().set_properties(&reports, at("2016-08-13T20:09:15Z"), &mut host);
    assert_eq!(property.display.symbol, "x");
    assert_eq!(property.display.code, "error");
    assert_eq!(
        property.status.kind,
        LoopStatusKind::Error {
            failure: LoopFailure::NotReceived
        }
    );
}

#[test]
fn integration_stuck_loop_raises_urgent_alarm() {
    let reports = fixture();
    let plugin = LoopPlugin::new(LoopSettings {
        enable_alerts: true,
        ..LoopSettings::default()
    });
    let now = at("2016-08-13T20:09:15Z") + Duration::hours(2);
    let mut host = RecordingRenderHost::new();
    let mut registry = InMemoryNotifications::new();

    plugin.run_cycle(&reports, now, &mut host, &mut registry);
    plugin.run_cycle(&reports, now, &mut host, &mut registry);

    let highest = registry
        .find_highest_alarm(LOOP_ALARM_NAME)
        .expect("loop alarm");
    assert_eq!(highest.level, AlarmLevel::Urgent);
    assert_eq!(highest.title, "Loop isn't looping");
    assert_eq!(registry.active_alarms().len(), 1);
    assert_eq!(host.pills[0], host.pills[1]);
}

#[test]
fn integration_overnight_error_is_selected_by_last_wins_tie_break() {
    let reports = fixture();
    let property = LoopPlugin::default().analyze(&reports, at("2016-08-13T01:20:00Z"));
    assert_eq!(property.display.code, "error");
    assert!(property.display.info[0]
        .value
        .starts_with("Error: StaleDataError(\"Glucose Date"));
    assert!(property.forecast.is_empty());
}
