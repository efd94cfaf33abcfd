#![no_main]

use chrono::{DateTime, Duration};
use libfuzzer_sys::fuzz_target;
use loopwatch_status::{
    parse_status_reports, InMemoryNotifications, LoopPlugin, LoopSettings, NotificationRegistry,
    RecordingRenderHost, LOOP_ALARM_NAME,
};

fuzz_target!(|data: &[u8]| {
    let raw = String::from_utf8_lossy(data);
    let Ok(reports) = parse_status_reports(&raw) else {
        return;
    };
    let Some(now) = reports
        .iter()
        .map(|report| report.created_at)
        .max()
        .and_then(|latest| latest.checked_add_signed(Duration::minutes(1)))
        .or(DateTime::from_timestamp(0, 0))
    else {
        return;
    };

    let plugin = LoopPlugin::new(LoopSettings {
        enable_alerts: true,
        ..LoopSettings::default()
    });
    let mut host = RecordingRenderHost::new();
    let mut registry = InMemoryNotifications::new();
    let property = plugin.run_cycle(&reports, now, &mut host, &mut registry);

    assert_eq!(property.display.label, format!("Loop {}", property.display.symbol));
    assert!(!property.display.info.is_empty());
    if let Some(report) = property.status.report.as_ref() {
        assert!(report.created_at <= now);
    }
    assert!(registry.active_alarms().len() <= 1);
    if property.display.code == "missing" {
        assert!(registry.find_highest_alarm(LOOP_ALARM_NAME).is_some());
    }
});
