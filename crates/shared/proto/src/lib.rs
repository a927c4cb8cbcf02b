//! gRPC protocol definitions for `auth.AuthService`.
//!
//! Messages are declared here with prost derives (see `proto/auth.proto` for
//! the wire contract); the server and client stubs are generated by build.rs.

/// Authentication service definitions.
pub mod auth {
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct RegisterRequest {
        #[prost(string, tag = "1")]
        pub name: String,
        #[prost(string, tag = "2")]
        pub surname: String,
        #[prost(string, tag = "3")]
        pub patronymic: String,
        #[prost(string, tag = "4")]
        pub email: String,
        #[prost(string, tag = "5")]
        pub password: String,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct RegisterResponse {
        #[prost(string, tag = "1")]
        pub id: String,
        #[prost(string, tag = "2")]
        pub message: String,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct LoginRequest {
        #[prost(string, tag = "1")]
        pub email: String,
        #[prost(string, tag = "2")]
        pub password: String,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct LoginResponse {
        #[prost(string, tag = "1")]
        pub token: String,
        #[prost(string, tag = "2")]
        pub message: String,
        #[prost(string, tag = "3")]
        pub token_type: String,
        #[prost(int64, tag = "4")]
        pub expires_in: i64,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct GetUserDataRequest {
        #[prost(string, tag = "1")]
        pub id: String,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct GetUserDataResponse {
        #[prost(string, tag = "1")]
        pub id: String,
        #[prost(string, tag = "2")]
        pub name: String,
        #[prost(string, tag = "3")]
        pub surname: String,
        #[prost(string, tag = "4")]
        pub patronymic: String,
        #[prost(string, tag = "5")]
        pub email: String,
        #[prost(string, repeated, tag = "6")]
        pub roles: Vec<String>,
        #[prost(string, tag = "7")]
        pub created_at: String,
    }

    include!(concat!(env!("OUT_DIR"), "/auth.AuthService.rs"));
}

// Re-export commonly used items
pub use auth::auth_service_client::AuthServiceClient;
pub use auth::auth_service_server::{AuthService, AuthServiceServer};
