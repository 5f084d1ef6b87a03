//! 工单用例：命令、查询、处理器与 DTO
//!
mod commands;
mod dto;
mod queries;

use std::sync::Arc;

use dentalflow_domain::persist::WorkOrderRepository;

pub use commands::{
    ChangeAggregateStatus, ConfirmDelivery, DeleteAggregate, EditAggregate,
    FinishClinicWorkOrders, SaveAggregateNotes, WorkOrderCommandHandler,
};
pub use dto::{
    AggregatedWorkOrderDto, ClinicGroupDto, GroupedWorkOrdersDto, LabReportDto, PatientGroupDto,
    WorkOrderStatisticsDto,
};
pub use queries::{
    GetLabReport, GetWorkOrderStatistics, ListGroupedWorkOrders, WorkOrderQueryHandler,
};

use crate::config::LabSettings;
use crate::error::AppError;
use crate::inmemory_command_bus::InMemoryCommandBus;
use crate::inmemory_query_bus::InMemoryQueryBus;

/// 将全部工单命令与查询处理器注册到总线
pub fn register_handlers<R>(
    commands: &InMemoryCommandBus,
    queries: &InMemoryQueryBus,
    repo: Arc<R>,
    settings: LabSettings,
) -> Result<(), AppError>
where
    R: WorkOrderRepository + 'static,
{
    let command_handler = Arc::new(WorkOrderCommandHandler::new(repo.clone()));
    commands.register::<ChangeAggregateStatus, _>(command_handler.clone())?;
    commands.register::<DeleteAggregate, _>(command_handler.clone())?;
    commands.register::<EditAggregate, _>(command_handler.clone())?;
    commands.register::<SaveAggregateNotes, _>(command_handler.clone())?;
    commands.register::<FinishClinicWorkOrders, _>(command_handler.clone())?;
    commands.register::<ConfirmDelivery, _>(command_handler)?;

    let query_handler = Arc::new(WorkOrderQueryHandler::new(repo, settings));
    queries.register::<ListGroupedWorkOrders, _>(query_handler.clone())?;
    queries.register::<GetWorkOrderStatistics, _>(query_handler.clone())?;
    queries.register::<GetLabReport, _>(query_handler)?;

    tracing::debug!(
        commands = commands.registered_commands().len(),
        queries = queries.registered_queries().len(),
        "work order handlers registered"
    );
    Ok(())
}
