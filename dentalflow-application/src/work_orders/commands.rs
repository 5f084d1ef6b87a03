//! 工单命令及其处理器
//!
//! 命令作用于界面上的归并工单（携带其 `SourceIds`），处理器把它展开为
//! 对原始记录的存储操作并依次执行。多步操作之间没有回滚。
//!
use std::sync::Arc;

use async_trait::async_trait;
use dentalflow_domain::aggregation::{SourceIds, WorkOrderAggregator};
use dentalflow_domain::mutation::{
    MutationTarget, StoreOperation, confirm_delivery, finish_open_for_clinic,
};
use dentalflow_domain::persist::WorkOrderRepository;
use dentalflow_domain::work_order::{
    ClinicId, DeliveryRecord, LineItem, WorkOrderId, WorkOrderStatus,
};
use serde::{Deserialize, Serialize};

use crate::command::Command;
use crate::command_handler::CommandHandler;
use crate::context::AppContext;
use crate::error::AppError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeAggregateStatus {
    pub source_ids: SourceIds,
    pub status: WorkOrderStatus,
}

impl Command for ChangeAggregateStatus {
    const NAME: &'static str = "work_orders.change_status";
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteAggregate {
    pub source_ids: SourceIds,
}

impl Command for DeleteAggregate {
    const NAME: &'static str = "work_orders.delete";
}

/// 编辑明细：主记录被改写，其余来源记录被删除
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditAggregate {
    pub source_ids: SourceIds,
    pub line_items: Vec<LineItem>,
}

impl Command for EditAggregate {
    const NAME: &'static str = "work_orders.edit";
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveAggregateNotes {
    pub source_ids: SourceIds,
    pub notes: Option<String>,
}

impl Command for SaveAggregateNotes {
    const NAME: &'static str = "work_orders.save_notes";
}

/// 将诊所所有未完成工单标记为已完成
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinishClinicWorkOrders {
    pub clinic_id: ClinicId,
}

impl Command for FinishClinicWorkOrders {
    const NAME: &'static str = "work_orders.finish_clinic";
}

/// 扫码确认交付（单条原始记录）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmDelivery {
    pub work_order_id: WorkOrderId,
    pub delivered_by: String,
    #[serde(default)]
    pub receiver_name: Option<String>,
    #[serde(default)]
    pub observations: Option<String>,
}

impl Command for ConfirmDelivery {
    const NAME: &'static str = "work_orders.confirm_delivery";
}

pub struct WorkOrderCommandHandler<R> {
    repo: Arc<R>,
}

impl<R> WorkOrderCommandHandler<R>
where
    R: WorkOrderRepository,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    /// 执行单个批量操作，目标行缺失时记录告警
    async fn run(&self, op: &StoreOperation) -> Result<usize, AppError> {
        let expected = op.target_ids().len();
        let affected = self.repo.execute(op).await?;
        if affected < expected {
            tracing::warn!(
                op = op.kind(),
                expected,
                affected,
                "some source records were already gone"
            );
        }
        Ok(affected)
    }
}

#[async_trait]
impl<R> CommandHandler<ChangeAggregateStatus> for WorkOrderCommandHandler<R>
where
    R: WorkOrderRepository + 'static,
{
    async fn handle(&self, ctx: &AppContext, cmd: ChangeAggregateStatus) -> Result<(), AppError> {
        ctx.ensure_active_membership()?;
        let op = cmd.source_ids.change_status(cmd.status);
        let affected = self.run(&op).await?;
        tracing::info!(status = %cmd.status, affected, "work order status changed");
        Ok(())
    }
}

#[async_trait]
impl<R> CommandHandler<DeleteAggregate> for WorkOrderCommandHandler<R>
where
    R: WorkOrderRepository + 'static,
{
    async fn handle(&self, ctx: &AppContext, cmd: DeleteAggregate) -> Result<(), AppError> {
        ctx.ensure_active_membership()?;
        let affected = self.run(&cmd.source_ids.delete()).await?;
        tracing::info!(affected, "work order deleted");
        Ok(())
    }
}

#[async_trait]
impl<R> CommandHandler<EditAggregate> for WorkOrderCommandHandler<R>
where
    R: WorkOrderRepository + 'static,
{
    async fn handle(&self, ctx: &AppContext, cmd: EditAggregate) -> Result<(), AppError> {
        ctx.ensure_active_membership()?;
        let ops = cmd.source_ids.edit(cmd.line_items)?;

        for (step, op) in ops.iter().enumerate() {
            if let Err(err) = self.run(op).await {
                if step > 0 {
                    tracing::warn!(
                        primary = %cmd.source_ids.primary(),
                        failed = op.kind(),
                        error = %err,
                        "edit partially applied"
                    );
                }
                return Err(err);
            }
        }

        tracing::info!(
            primary = %cmd.source_ids.primary(),
            removed = cmd.source_ids.rest().len(),
            "work order edited"
        );
        Ok(())
    }
}

#[async_trait]
impl<R> CommandHandler<SaveAggregateNotes> for WorkOrderCommandHandler<R>
where
    R: WorkOrderRepository + 'static,
{
    async fn handle(&self, ctx: &AppContext, cmd: SaveAggregateNotes) -> Result<(), AppError> {
        ctx.ensure_active_membership()?;
        self.run(&cmd.source_ids.update_notes(cmd.notes)).await?;
        tracing::info!(primary = %cmd.source_ids.primary(), "work order notes saved");
        Ok(())
    }
}

#[async_trait]
impl<R> CommandHandler<FinishClinicWorkOrders> for WorkOrderCommandHandler<R>
where
    R: WorkOrderRepository + 'static,
{
    async fn handle(&self, ctx: &AppContext, cmd: FinishClinicWorkOrders) -> Result<(), AppError> {
        ctx.ensure_active_membership()?;
        let records = self.repo.fetch_all().await?;
        let aggregates = WorkOrderAggregator::aggregate_checked(&records)?;

        let Some(op) = finish_open_for_clinic(&aggregates, &cmd.clinic_id) else {
            tracing::info!(clinic = %cmd.clinic_id, "no open work orders to finish");
            return Ok(());
        };
        let affected = self.run(&op).await?;
        tracing::info!(clinic = %cmd.clinic_id, affected, "clinic work orders finished");
        Ok(())
    }
}

#[async_trait]
impl<R> CommandHandler<ConfirmDelivery> for WorkOrderCommandHandler<R>
where
    R: WorkOrderRepository + 'static,
{
    async fn handle(&self, ctx: &AppContext, cmd: ConfirmDelivery) -> Result<(), AppError> {
        ctx.ensure_active_membership()?;
        let record = self
            .repo
            .find(&cmd.work_order_id)
            .await?
            .ok_or_else(|| AppError::WorkOrderNotFound(cmd.work_order_id.to_string()))?;

        let delivery = DeliveryRecord {
            delivered_at: ctx.requested_at,
            delivered_by: cmd.delivered_by.trim().to_string(),
            receiver_name: cmd.receiver_name,
            observations: cmd.observations,
        };
        let op = confirm_delivery(&record, delivery)?;
        self.run(&op).await?;
        tracing::info!(work_order = %record.id, "delivery confirmed");
        Ok(())
    }
}
