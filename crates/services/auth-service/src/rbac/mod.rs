//! Role-based access control for gRPC calls.
//!
//! [`RbacLayer`] wraps the tonic router. For each call it extracts the
//! operation name from the request path, lets public operations through,
//! and otherwise requires a valid bearer token whose roles grant the
//! operation.

mod interceptor;
mod layer;
mod permissions;

pub use interceptor::RbacInterceptor;
pub use layer::{operation_name, RbacLayer, RbacService};
pub use permissions::{operations, PermissionTable};
