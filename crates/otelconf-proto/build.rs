//! Compiles the bundled SDK configuration protos into a descriptor set
//! that `ProtoBridge::bundled` embeds.

use std::path::PathBuf;

use prost::Message;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("cargo:rerun-if-changed=proto");

    let mut compiler = protox::Compiler::new(["proto"])?;
    compiler.include_imports(true);
    compiler.open_files(["opentelemetry/sdk/v1/sdk.proto"])?;
    let bytes = compiler.file_descriptor_set().encode_to_vec();

    let out = PathBuf::from(std::env::var("OUT_DIR")?).join("otelconf_descriptor.bin");
    std::fs::write(out, bytes)?;
    Ok(())
}
