use tonic_build::manual::{Builder, Method, Service};

fn unary(name: &str, route: &str, input: &str, output: &str) -> Method {
    Method::builder()
        .name(name)
        .route_name(route)
        .input_type(format!("crate::auth::{}", input))
        .output_type(format!("crate::auth::{}", output))
        .codec_path("tonic::codec::ProstCodec")
        .build()
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    // Messages live in src/lib.rs and mirror proto/auth.proto
    let auth_service = Service::builder()
        .name("AuthService")
        .package("auth")
        .method(unary(
            "register_user",
            "RegisterUser",
            "RegisterRequest",
            "RegisterResponse",
        ))
        .method(unary("login_user", "LoginUser", "LoginRequest", "LoginResponse"))
        .method(unary(
            "get_user_data",
            "GetUserData",
            "GetUserDataRequest",
            "GetUserDataResponse",
        ))
        .build();

    Builder::new().compile(&[auth_service]);
}
