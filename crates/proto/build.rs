fn main() -> Result<(), Box<dyn std::error::Error>> {
    let protos = [
        "proto/upf/rule.proto",
        "proto/upf/subscriber.proto",
        "proto/upf/flow.proto",
        "proto/upf/config.proto",
    ];

    tonic_prost_build::configure()
        .build_server(true)
        .build_client(true)
        // CLI 以 JSON 输出回复
        .type_attribute(".", "#[derive(serde::Serialize)]")
        .compile_protos(&protos, &["proto"])?;

    for proto in protos {
        println!("cargo:rerun-if-changed={proto}");
    }
    Ok(())
}
