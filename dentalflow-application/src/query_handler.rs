use std::sync::Arc;

use crate::{context::AppContext, error::AppError, query::Query};
use async_trait::async_trait;

/// 查询处理器
///
/// 每次查询都从存储重新拉取并重新归并，不缓存结果。
#[async_trait]
pub trait QueryHandler<Q>: Send + Sync
where
    Q: Query,
{
    async fn handle(&self, ctx: &AppContext, q: Q) -> Result<Q::Dto, AppError>;
}

#[async_trait]
impl<Q, H> QueryHandler<Q> for Arc<H>
where
    Q: Query,
    H: QueryHandler<Q> + ?Sized,
{
    async fn handle(&self, ctx: &AppContext, q: Q) -> Result<Q::Dto, AppError> {
        (**self).handle(ctx, q).await
    }
}
