//! gRPC transport adapter.

mod auth_grpc;
mod timeout;

pub use auth_grpc::AuthGrpcService;
pub use timeout::parse_grpc_timeout;
