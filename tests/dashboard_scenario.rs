use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::json;

use service_insights::db::SqliteStore;
use service_insights::{
    aggregate, resolve, AlertWindowConfig, ColumnDefinition, DashboardService, EngineConfig,
    LayoutOutcome, LayoutScope, Row, Schema, SemanticType, TimelineSpan, WidgetKey,
};

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

fn schema() -> Schema {
    Schema::new(vec![
        ColumnDefinition::new("d", "Vencimento", SemanticType::Date),
        ColumnDefinition::new("v", "Valor", SemanticType::Currency),
        ColumnDefinition::new("s", "Status", SemanticType::Status),
    ])
}

fn rows() -> Vec<Row> {
    let item = |id: &str, days: i64, value: i64, status: &str| {
        Row::new(id, now() - Duration::days(20))
            .with_field("d", json!((now() + Duration::days(days)).format("%Y-%m-%d").to_string()))
            .with_field("v", json!(value))
            .with_field("s", json!(status))
    };
    vec![
        item("r1", 10, 100, "Pendente"),
        item("r2", 50, 200, "Em Andamento"),
        item("r3", -5, 50, "Concluído"),
    ]
}

#[test]
fn scenario_snapshot() {
    service_insights::init_logging();
    let roles = resolve(&schema());
    let snap = aggregate(&rows(), &roles, &AlertWindowConfig::default(), now());

    assert_eq!(snap.short_term_count, 1);
    assert_eq!(snap.short_term_alerts[0].row.id, "r1");
    assert_eq!(snap.long_term_count, 1);
    assert_eq!(snap.long_term_alerts[0].row.id, "r2");
    assert_eq!(snap.total_value, 350.0);
    assert_eq!(snap.active_count, 1);
    assert_eq!(snap.overdue_count, 1);

    let groups: Vec<_> = snap
        .status_groups
        .iter()
        .map(|g| (g.status.as_str(), g.count))
        .collect();
    assert_eq!(
        groups,
        [("Pendente", 1), ("Em Andamento", 1), ("Concluído", 1)]
    );
}

#[test]
fn scenario_through_sqlite_backed_service() {
    let dir = tempfile::tempdir().unwrap();
    let store = SqliteStore::open(&dir.path().join("insights.db")).unwrap();
    let service = DashboardService::new(&store, EngineConfig::default());
    let scope = LayoutScope::new("ana", "dashboard");

    let (layout, outcome) = service
        .layouts()
        .reorder(&scope, &["alerts", "total", "status-Nope"])
        .unwrap();
    assert!(matches!(outcome, LayoutOutcome::Reordered { .. }));
    assert_eq!(
        layout.to_stored(),
        ["alerts", "total", "values", "active", "consolidated_status"]
    );

    let data = service
        .load(&scope, &schema(), &rows(), TimelineSpan::Days(30), now())
        .unwrap();
    assert_eq!(data.layout, layout);
    assert_eq!(data.widgets[0].key, WidgetKey::Alerts);
    assert_eq!(data.candidates.len(), 3);

    let rejected = service
        .alert_settings()
        .save("ana", AlertWindowConfig { short_term_days: 90, long_term_days: 30 });
    assert!(rejected.is_err());
    assert_eq!(
        service.alert_settings().load("ana").unwrap(),
        AlertWindowConfig::default()
    );
}
