//! gRPC implementation for AuthService.

use std::sync::Arc;
use std::time::Duration;

use tonic::{Request, Response, Status};
use uuid::Uuid;

use super::timeout::parse_grpc_timeout;
use crate::service::AuthService;
use common::{AppError, Deadline};
use domain::Registration;
use proto::auth::{
    auth_service_server::AuthService as AuthServiceProto, GetUserDataRequest,
    GetUserDataResponse, LoginRequest, LoginResponse, RegisterRequest, RegisterResponse,
};

const GRPC_TIMEOUT_HEADER: &str = "grpc-timeout";

/// gRPC service wrapper for AuthService.
pub struct AuthGrpcService {
    service: Arc<dyn AuthService>,
    request_timeout: Duration,
}

impl AuthGrpcService {
    /// `request_timeout` bounds calls that carry no `grpc-timeout` header,
    /// and caps those that do.
    pub fn new(service: Arc<dyn AuthService>, request_timeout: Duration) -> Self {
        Self {
            service,
            request_timeout,
        }
    }

    fn deadline<T>(&self, request: &Request<T>) -> Deadline {
        let budget = request
            .metadata()
            .get(GRPC_TIMEOUT_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(parse_grpc_timeout)
            .map_or(self.request_timeout, |client| client.min(self.request_timeout));
        Deadline::after(budget)
    }
}

#[tonic::async_trait]
impl AuthServiceProto for AuthGrpcService {
    async fn register_user(
        &self,
        request: Request<RegisterRequest>,
    ) -> Result<Response<RegisterResponse>, Status> {
        let deadline = self.deadline(&request);
        let req = request.into_inner();

        let registration = Registration {
            name: req.name,
            surname: req.surname,
            patronymic: req.patronymic,
            email: req.email,
            password: req.password,
        };
        let id = self
            .service
            .register(registration, deadline)
            .await
            .map_err(Status::from)?;

        Ok(Response::new(RegisterResponse {
            id: id.to_string(),
            message: "User registered successfully".to_string(),
        }))
    }

    async fn login_user(
        &self,
        request: Request<LoginRequest>,
    ) -> Result<Response<LoginResponse>, Status> {
        let deadline = self.deadline(&request);
        let req = request.into_inner();

        let token = self
            .service
            .login(req.email, req.password, deadline)
            .await
            .map_err(Status::from)?;

        Ok(Response::new(LoginResponse {
            token: token.access_token,
            message: "User logged in successfully".to_string(),
            token_type: token.token_type,
            expires_in: token.expires_in,
        }))
    }

    async fn get_user_data(
        &self,
        request: Request<GetUserDataRequest>,
    ) -> Result<Response<GetUserDataResponse>, Status> {
        let deadline = self.deadline(&request);
        let req = request.into_inner();

        let id = Uuid::parse_str(&req.id)
            .map_err(|_| Status::from(AppError::validation("invalid fields: id")))?;
        let user = self
            .service
            .get_user(id, deadline)
            .await
            .map_err(Status::from)?;

        Ok(Response::new(GetUserDataResponse {
            id: user.id.to_string(),
            name: user.name,
            surname: user.surname,
            patronymic: user.patronymic,
            email: user.email,
            roles: user.roles.names(),
            created_at: user.created_at.to_rfc3339(),
        }))
    }
}
