//! Task-scoped tenant carrier.
//!
//! The tenant gate installs the request's [`TenantContext`] with [`scope`] for
//! exactly the lifetime of the downstream future. Code deeper in the call
//! chain that does not receive the context as an argument can read it with
//! [`current`] or [`require_current`].
//!
//! The slot is a tokio task-local, so it follows the request's task across
//! worker threads and is never visible to another task sharing the same
//! thread. When the scoped future completes, fails, panics or is dropped the
//! slot is gone with it; there is no explicit clear step to forget.
//!
//! Tasks started with `tokio::spawn` do not inherit the slot. Use [`inherit`]
//! to carry the current context into a spawned future.

use std::future::Future;

use tokio::task::futures::TaskLocalFuture;

use super::context::TenantContext;
use crate::error::TenantError;

tokio::task_local! {
    static CURRENT_TENANT: TenantContext;
}

/// Runs `future` with `ctx` installed as the current tenant.
pub fn scope<F>(ctx: TenantContext, future: F) -> TaskLocalFuture<TenantContext, F>
where
    F: Future,
{
    CURRENT_TENANT.scope(ctx, future)
}

/// Runs the blocking closure `f` with `ctx` installed as the current tenant.
pub fn sync_scope<R>(ctx: TenantContext, f: impl FnOnce() -> R) -> R {
    CURRENT_TENANT.sync_scope(ctx, f)
}

/// Returns the tenant installed for the running task, if any.
pub fn current() -> Option<TenantContext> {
    CURRENT_TENANT.try_with(|ctx| ctx.clone()).ok()
}

/// Returns the tenant installed for the running task.
///
/// # Errors
///
/// Returns [`TenantError::MissingContext`] outside of a tenant scope.
pub fn require_current() -> Result<TenantContext, TenantError> {
    current().ok_or(TenantError::MissingContext)
}

/// Wraps `future` so it runs under the current task's tenant.
///
/// # Errors
///
/// Returns [`TenantError::MissingContext`] outside of a tenant scope.
pub fn inherit<F>(future: F) -> Result<TaskLocalFuture<TenantContext, F>, TenantError>
where
    F: Future,
{
    let ctx = require_current()?;
    Ok(scope(ctx, future))
}
