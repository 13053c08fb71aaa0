fn main() -> Result<(), Box<dyn std::error::Error>> {
    tonic_build::configure()
        .build_server(false)
        .build_client(false)
        .compile_protos(&["proto/tink.proto"], &["proto"])?;

    println!("cargo:rerun-if-changed=proto/tink.proto");

    Ok(())
}
