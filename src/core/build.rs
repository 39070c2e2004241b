fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Compile protobuf definitions for the build service client
    tonic_build::configure()
        .build_server(false)
        .build_client(true)
        .out_dir("src/grpc/proto")
        .compile(&["proto/core.proto"], &["proto"])?;

    println!("cargo:rerun-if-changed=proto/core.proto");

    Ok(())
}
