use anyhow::Result as AnyResult;
use chrono::{DateTime, TimeZone, Utc};
use dentalflow_application::command_bus::CommandBus;
use dentalflow_application::config::LabSettings;
use dentalflow_application::context::{Actor, AppContext};
use dentalflow_application::error::AppError;
use dentalflow_application::query_bus::QueryBus;
use dentalflow_application::work_orders::{
    ChangeAggregateStatus, ConfirmDelivery, DeleteAggregate, EditAggregate,
    FinishClinicWorkOrders, GetLabReport, GetWorkOrderStatistics, ListGroupedWorkOrders,
    SaveAggregateNotes, register_handlers,
};
use dentalflow_application::{InMemoryCommandBus, InMemoryQueryBus, InMemoryWorkOrderStore};
use dentalflow_domain::aggregation::SourceIds;
use dentalflow_domain::filter::WorkOrderFilter;
use dentalflow_domain::membership::{Membership, Role};
use dentalflow_domain::persist::WorkOrderRepository;
use dentalflow_domain::report::ReportPeriod;
use dentalflow_domain::value_object::Money;
use dentalflow_domain::work_order::{
    ClinicId, LineItem, WorkOrderId, WorkOrderRecord, WorkOrderStatus,
};
use std::sync::Arc;

struct App {
    store: Arc<InMemoryWorkOrderStore>,
    commands: InMemoryCommandBus,
    queries: InMemoryQueryBus,
}

fn at(s: &str) -> DateTime<Utc> {
    s.parse().unwrap()
}

fn record(id: &str, patient: &str, clinic: &str, created_at: &str, status: WorkOrderStatus, tooth: &str, quantity: u32, price: i64) -> WorkOrderRecord {
    WorkOrderRecord::builder()
        .id(id)
        .patient_name(patient)
        .clinic_id(clinic)
        .status(status)
        .created_at(at(created_at))
        .total_price(price)
        .line_items(vec![
            LineItem::builder()
                .service_id("S1")
                .quantity(quantity)
                .price(price)
                .tooth_number(tooth)
                .build(),
        ])
        .build()
}

fn seed() -> Vec<WorkOrderRecord> {
    use WorkOrderStatus::*;
    vec![
        record("id1", "Juan Perez", "C1", "2024-03-01T10:00:00Z", Pending, "15", 1, 1000),
        record("id2", "Juan Perez", "C1", "2024-03-01T11:00:00Z", Pending, "15", 2, 2000),
        record("id3", "Juan Perez", "C1", "2024-03-01T12:00:00Z", Pending, "15", 1, 1000),
        record("id4", "Juan Perez", "C1", "2024-03-01T12:00:00Z", Pending, "16", 1, 1000),
        record("id5", "Maria Rojas", "C1", "2024-03-02T09:00:00Z", InProduction, "21", 1, 5000),
        record("id6", "Ana Soto", "C2", "2024-03-05T09:00:00Z", Finished, "11", 1, 7000),
        record("id7", "Ana Soto", "C2", "2024-04-05T09:00:00Z", Pending, "11", 1, 3000),
    ]
}

fn app() -> AnyResult<App> {
    let store = Arc::new(InMemoryWorkOrderStore::with_records(seed()));
    let commands = InMemoryCommandBus::new();
    let queries = InMemoryQueryBus::new();
    register_handlers(&commands, &queries, store.clone(), LabSettings::default())?;
    Ok(App {
        store,
        commands,
        queries,
    })
}

fn ctx(role: Role) -> AppContext {
    AppContext::builder()
        .actor(Actor::builder().id("u-1").role(role).build())
        .requested_at(Utc.with_ymd_and_hms(2024, 4, 10, 15, 0, 0).unwrap())
        .build()
}

fn source_ids(raw: &[&str]) -> SourceIds {
    SourceIds::try_from(raw.iter().map(|s| WorkOrderId::new(*s)).collect::<Vec<_>>()).unwrap()
}

async fn status_of(app: &App, id: &str) -> AnyResult<Option<WorkOrderStatus>> {
    Ok(app
        .store
        .find(&WorkOrderId::new(id))
        .await?
        .map(|r| r.status))
}

#[tokio::test]
async fn grouped_listing_merges_duplicates() -> AnyResult<()> {
    let app = app()?;
    let dto = app
        .queries
        .dispatch(&ctx(Role::Client), ListGroupedWorkOrders::default())
        .await?;

    assert_eq!(dto.total_records, 7);
    assert_eq!(dto.shown_records, 7);
    assert_eq!(dto.aggregate_count, 5);
    assert_eq!(dto.clinics.len(), 2);

    let juan = dto
        .work_orders()
        .find(|w| w.merged)
        .expect("merged aggregate");
    assert_eq!(juan.source_ids, vec![WorkOrderId::new("id1"), WorkOrderId::new("id2"), WorkOrderId::new("id3")]);
    assert_eq!(juan.total_price, Money::from(4000));
    assert_eq!(juan.line_items[0].quantity, 4);
    Ok(())
}

#[tokio::test]
async fn listing_reports_shown_vs_total() -> AnyResult<()> {
    let app = app()?;
    let q = ListGroupedWorkOrders {
        filter: WorkOrderFilter {
            clinic_id: Some(ClinicId::new("C2")),
            ..Default::default()
        },
    };
    let dto = app.queries.dispatch(&ctx(Role::Admin), q).await?;
    assert_eq!(dto.shown_records, 2);
    assert_eq!(dto.total_records, 7);
    assert_eq!(dto.clinics.len(), 1);
    Ok(())
}

#[tokio::test]
async fn status_change_fans_out_to_every_source_record() -> AnyResult<()> {
    let app = app()?;
    app.commands
        .dispatch(
            &ctx(Role::Technician),
            ChangeAggregateStatus {
                source_ids: source_ids(&["id1", "id2", "id3"]),
                status: WorkOrderStatus::InProduction,
            },
        )
        .await?;

    for id in ["id1", "id2", "id3"] {
        assert_eq!(status_of(&app, id).await?, Some(WorkOrderStatus::InProduction));
    }
    assert_eq!(status_of(&app, "id4").await?, Some(WorkOrderStatus::Pending));
    Ok(())
}

#[tokio::test]
async fn edit_keeps_primary_and_drops_duplicates() -> AnyResult<()> {
    let app = app()?;
    let items = vec![
        LineItem::builder()
            .service_id("S1")
            .quantity(4)
            .price(3500)
            .tooth_number("15")
            .build(),
    ];
    app.commands
        .dispatch(
            &ctx(Role::Client),
            EditAggregate {
                source_ids: source_ids(&["id1", "id2", "id3"]),
                line_items: items.clone(),
            },
        )
        .await?;

    let primary = app.store.find(&WorkOrderId::new("id1")).await?.unwrap();
    assert_eq!(primary.line_items, items);
    assert_eq!(primary.total_price, Money::from(3500));
    assert_eq!(status_of(&app, "id2").await?, None);
    assert_eq!(status_of(&app, "id3").await?, None);
    assert_eq!(app.store.len(), 5);
    Ok(())
}

#[tokio::test]
async fn empty_edit_is_rejected_without_side_effects() -> AnyResult<()> {
    let app = app()?;
    let err = app
        .commands
        .dispatch(
            &ctx(Role::Client),
            EditAggregate {
                source_ids: source_ids(&["id1", "id2"]),
                line_items: Vec::new(),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Domain(_)));
    assert_eq!(app.store.len(), 7);
    Ok(())
}

#[tokio::test]
async fn notes_delete_and_finish_for_clinic() -> AnyResult<()> {
    let app = app()?;
    let ctx = ctx(Role::Client);

    app.commands
        .dispatch(
            &ctx,
            SaveAggregateNotes {
                source_ids: source_ids(&["id5"]),
                notes: Some(" color A2 ".into()),
            },
        )
        .await?;
    let maria = app.store.find(&WorkOrderId::new("id5")).await?.unwrap();
    assert_eq!(maria.notes.as_deref(), Some("color A2"));

    app.commands
        .dispatch(&ctx, DeleteAggregate { source_ids: source_ids(&["id4"]) })
        .await?;
    assert_eq!(status_of(&app, "id4").await?, None);

    app.commands
        .dispatch(&ctx, FinishClinicWorkOrders { clinic_id: ClinicId::new("C1") })
        .await?;
    for id in ["id1", "id2", "id3", "id5"] {
        assert_eq!(status_of(&app, id).await?, Some(WorkOrderStatus::Finished));
    }
    assert_eq!(status_of(&app, "id7").await?, Some(WorkOrderStatus::Pending));

    // 再次执行没有可完成的工单
    app.commands
        .dispatch(&ctx, FinishClinicWorkOrders { clinic_id: ClinicId::new("C1") })
        .await?;
    Ok(())
}

#[tokio::test]
async fn delivery_confirmation_records_history() -> AnyResult<()> {
    let app = app()?;
    let ctx = ctx(Role::Technician);
    app.commands
        .dispatch(
            &ctx,
            ConfirmDelivery {
                work_order_id: WorkOrderId::new("id6"),
                delivered_by: "Pedro".into(),
                receiver_name: Some("Recepcion".into()),
                observations: None,
            },
        )
        .await?;

    let ana = app.store.find(&WorkOrderId::new("id6")).await?.unwrap();
    assert_eq!(ana.status, WorkOrderStatus::Delivered);
    let delivery = ana.delivery.unwrap();
    assert_eq!(delivery.delivered_at, ctx.requested_at);
    assert_eq!(app.store.delivery_history(&WorkOrderId::new("id6")).len(), 1);

    let err = app
        .commands
        .dispatch(
            &ctx,
            ConfirmDelivery {
                work_order_id: WorkOrderId::new("missing"),
                delivered_by: "Pedro".into(),
                receiver_name: None,
                observations: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::WorkOrderNotFound(_)));

    let err = app
        .commands
        .dispatch(
            &ctx,
            ConfirmDelivery {
                work_order_id: WorkOrderId::new("id5"),
                delivered_by: "   ".into(),
                receiver_name: None,
                observations: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Domain(_)));
    Ok(())
}

#[tokio::test]
async fn statistics_count_aggregates() -> AnyResult<()> {
    let app = app()?;
    let stats = app
        .queries
        .dispatch(&ctx(Role::Client), GetWorkOrderStatistics::default())
        .await?;
    assert_eq!(stats.total, 5);
    assert_eq!(stats.pending, 3);
    assert_eq!(stats.in_production, 1);
    assert_eq!(stats.finished, 1);
    assert_eq!(stats.in_progress, 4);
    assert_eq!(stats.revenue, Money::from(20_000));
    Ok(())
}

#[tokio::test]
async fn lab_report_applies_default_vat() -> AnyResult<()> {
    let app = app()?;
    let report = app
        .queries
        .dispatch(
            &ctx(Role::Client),
            GetLabReport {
                period: ReportPeriod::Month { year: 2024, month: 3 },
                clinic_id: None,
            },
        )
        .await?;
    assert_eq!(report.report.record_count, 6);
    assert_eq!(report.report.service_count, 7);
    assert_eq!(report.report.gross_income, Money::from(17_000));
    assert_eq!(report.report.totals.tax, Money::from(3_230));
    assert_eq!(report.report.totals.net, Money::from(20_230));
    Ok(())
}

#[tokio::test]
async fn access_rules_are_enforced() -> AnyResult<()> {
    let app = app()?;
    let err = app
        .queries
        .dispatch(
            &ctx(Role::Technician),
            GetLabReport {
                period: ReportPeriod::Year { year: 2024 },
                clinic_id: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Authorization(_)));

    let lapsed = AppContext::builder()
        .actor(
            Actor::builder()
                .id("u-2")
                .role(Role::Client)
                .membership(Membership {
                    plan: "pro".into(),
                    expires_on: chrono::NaiveDate::from_ymd_opt(2024, 1, 1),
                    subscription_active: true,
                })
                .build(),
        )
        .requested_at(Utc.with_ymd_and_hms(2024, 4, 10, 15, 0, 0).unwrap())
        .build();
    let err = app
        .commands
        .dispatch(&lapsed, DeleteAggregate { source_ids: source_ids(&["id1"]) })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Authorization(_)));
    assert_eq!(app.store.len(), 7);
    Ok(())
}
