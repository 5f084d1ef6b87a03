use std::sync::Arc;

use crate::{command::Command, context::AppContext, error::AppError};
use async_trait::async_trait;

/// 命令处理器
///
/// 处理器负责访问校验、重新拉取记录并把命令还原为存储操作；
/// 同一处理器类型可以为多个命令实现本 trait（如 `WorkOrderCommandHandler`）。
#[async_trait]
pub trait CommandHandler<C>: Send + Sync
where
    C: Command,
{
    async fn handle(&self, ctx: &AppContext, cmd: C) -> Result<(), AppError>;
}

#[async_trait]
impl<C, H> CommandHandler<C> for Arc<H>
where
    C: Command,
    H: CommandHandler<C> + ?Sized,
{
    async fn handle(&self, ctx: &AppContext, cmd: C) -> Result<(), AppError> {
        (**self).handle(ctx, cmd).await
    }
}
