fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Session service: server for this binary, client for the edge service
    tonic_build::configure()
        .build_server(true)
        .build_client(true)
        .compile_protos(&["proto/auth/v1/auth_service.proto"], &["proto"])?;

    Ok(())
}
