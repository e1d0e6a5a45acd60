// Dashboard service.
// The one entry point the dashboard view, the inbox view and notification
// rule evaluation share: resolve roles, load the user's window, aggregate,
// and pair the snapshot with the user's layout.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::alerts::{AlertDigest, AlertWindowConfig};
use crate::config::EngineConfig;
use crate::error::StoreError;
use crate::layout::{LayoutManager, ResolvedWidget, WidgetKey, WidgetLayout};
use crate::metrics::{aggregate_with, timeline, HistogramBucket, MetricsSnapshot, TimelineSpan};
use crate::roles::{ResolvedRoles, RoleCache};
use crate::schema::{Row, Schema};
use crate::services::AlertWindowSettings;
use crate::store::{AlertConfigStore, LayoutScope, LayoutStore};

/// Everything one dashboard render needs.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardData {
    pub roles: ResolvedRoles,
    pub alert_window: AlertWindowConfig,
    pub snapshot: MetricsSnapshot,
    pub timeline: Vec<HistogramBucket>,
    pub layout: WidgetLayout,
    pub widgets: Vec<ResolvedWidget>,
    pub candidates: Vec<WidgetKey>,
}

pub struct DashboardService<'a, S: LayoutStore + AlertConfigStore + ?Sized> {
    store: &'a S,
    config: EngineConfig,
    roles: RoleCache,
}

impl<'a, S: LayoutStore + AlertConfigStore + ?Sized> DashboardService<'a, S> {
    pub fn new(store: &'a S, config: EngineConfig) -> Self {
        Self {
            store,
            config,
            roles: RoleCache::new(),
        }
    }

    pub fn alert_settings(&self) -> AlertWindowSettings<'a, S> {
        AlertWindowSettings::new(self.store, self.config.default_alert_window)
    }

    pub fn layouts(&self) -> LayoutManager<'a, S> {
        LayoutManager::new(self.store)
    }

    pub fn roles(&self, schema: &Schema) -> ResolvedRoles {
        self.roles.resolve(schema)
    }

    /// Aggregate `rows` under the user's alert window.
    pub fn snapshot(
        &self,
        user_id: &str,
        schema: &Schema,
        rows: &[Row],
        now: DateTime<Utc>,
    ) -> Result<MetricsSnapshot, StoreError> {
        let window = self.alert_settings().load(user_id)?;
        Ok(self.snapshot_with(schema, rows, &window, now))
    }

    fn snapshot_with(
        &self,
        schema: &Schema,
        rows: &[Row],
        window: &AlertWindowConfig,
        now: DateTime<Utc>,
    ) -> MetricsSnapshot {
        let roles = self.roles(schema);
        aggregate_with(rows, &roles, window, now, Some(schema), &self.config.aggregation)
    }

    pub fn load(
        &self,
        scope: &LayoutScope,
        schema: &Schema,
        rows: &[Row],
        span: TimelineSpan,
        now: DateTime<Utc>,
    ) -> Result<DashboardData, StoreError> {
        let alert_window = self.alert_settings().load(&scope.user_id)?;
        let roles = self.roles(schema);
        let snapshot = self.snapshot_with(schema, rows, &alert_window, now);
        let layout = self.layouts().load(scope)?;

        Ok(DashboardData {
            roles,
            alert_window,
            timeline: timeline(rows, now, span),
            widgets: layout.render(&snapshot),
            candidates: layout.candidates(&snapshot),
            layout,
            snapshot,
        })
    }

    /// Notification-rule input for one user over one service.
    pub fn digest(
        &self,
        user_id: &str,
        schema: &Schema,
        rows: &[Row],
        now: DateTime<Utc>,
    ) -> Result<AlertDigest, StoreError> {
        let snapshot = self.snapshot(user_id, schema, rows, now)?;
        Ok(AlertDigest::from_snapshot(&snapshot))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{LayoutOutcome, WidgetView};
    use crate::schema::{ColumnDefinition, ColumnOption, SemanticType};
    use crate::store::MemoryStore;
    use chrono::{Duration, TimeZone};
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 10, 9, 0, 0).unwrap()
    }

    fn schema() -> Schema {
        Schema::new(vec![
            ColumnDefinition::new("cliente", "Cliente", SemanticType::Text),
            ColumnDefinition::new("fim", "Data limite", SemanticType::Date),
            ColumnDefinition::new("preco", "Preço", SemanticType::Currency),
            ColumnDefinition::new("sit", "Situação", SemanticType::Status).with_options(vec![
                ColumnOption {
                    value: "Vigente".into(),
                    color: "#22c55e".into(),
                },
            ]),
        ])
    }

    fn rows() -> Vec<Row> {
        vec![
            Row::new("a", now() - Duration::days(1))
                .with_field("fim", json!((now() + Duration::days(12)).to_rfc3339()))
                .with_field("preco", json!("R$ 2.000,00"))
                .with_field("sit", json!("Vigente")),
            Row::new("b", now() - Duration::days(40))
                .with_field("fim", json!((now() + Duration::days(20)).to_rfc3339()))
                .with_field("preco", json!(500))
                .with_field("sit", json!("Vigente")),
            Row::new("c", now() - Duration::days(3))
                .with_field("sit", json!("Aguardando aprovação")),
        ]
    }

    #[test]
    fn load_combines_snapshot_layout_and_candidates() {
        let store = MemoryStore::new();
        let service = DashboardService::new(&store, EngineConfig::default());
        let scope = LayoutScope::new("u1", "dashboard");

        let data = service
            .load(&scope, &schema(), &rows(), TimelineSpan::Months(6), now())
            .unwrap();

        assert_eq!(data.snapshot.total_value, 2500.0);
        assert_eq!(data.snapshot.short_term_count, 2);
        assert_eq!(data.snapshot.active_count, 2);
        assert_eq!(data.snapshot.status_groups[0].color, "#22c55e");
        assert_eq!(data.layout, WidgetLayout::default());
        assert_eq!(data.widgets.len(), 5);
        assert_eq!(
            data.candidates,
            [
                WidgetKey::Status("Vigente".into()),
                WidgetKey::Status("Aguardando aprovação".into())
            ]
        );
        assert_eq!(data.timeline.len(), 6);
        assert_eq!(data.timeline.iter().map(|b| b.count).sum::<usize>(), 3);
    }

    #[test]
    fn user_window_changes_alert_buckets() {
        let store = MemoryStore::new();
        let service = DashboardService::new(&store, EngineConfig::default());
        service
            .alert_settings()
            .save("u1", AlertWindowConfig::new(15, 30).unwrap())
            .unwrap();

        let digest = service.digest("u1", &schema(), &rows(), now()).unwrap();
        let short: Vec<_> = digest.short_term.iter().map(|a| a.row_id.as_str()).collect();
        let long: Vec<_> = digest.long_term.iter().map(|a| a.row_id.as_str()).collect();
        assert_eq!(short, ["a"]);
        assert_eq!(long, ["b"]);
        assert_eq!(digest.status_counts[0].count, 2);

        let other = service.digest("u2", &schema(), &rows(), now()).unwrap();
        assert_eq!(other.short_term.len(), 2);
    }

    #[test]
    fn added_status_widget_renders_from_current_rows() {
        let store = MemoryStore::new();
        let service = DashboardService::new(&store, EngineConfig::default());
        let scope = LayoutScope::new("u1", "inbox");

        let (_, outcome) = service
            .layouts()
            .add(&scope, WidgetKey::Status("Vigente".into()))
            .unwrap();
        assert_eq!(outcome, LayoutOutcome::Added);

        let data = service
            .load(&scope, &schema(), &rows()[2..], TimelineSpan::Days(30), now())
            .unwrap();
        let last = data.widgets.last().unwrap();
        assert_eq!(last.key, WidgetKey::Status("Vigente".into()));
        assert_eq!(
            last.view,
            WidgetView::Status {
                status: "Vigente".into(),
                group: None
            }
        );
    }
}
