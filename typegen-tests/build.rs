fn main() {
    // Generate declarations for integration tests
    // The output is only read by tests (via include_str!), so it won't
    // affect normal library compilation
    let out_dir = std::env::var("OUT_DIR").unwrap();

    // SQLite fixture, configured through [package.metadata.typegen]
    typegen::generate_from_cargo_metadata().expect("sqlite codegen failed");

    // Postgres fixture, configured through the builder
    typegen::CodegenBuilder::new("fixtures/postgres-schema.sql")
        .dialect(typegen::codegen::DialectKind::Postgres)
        .out_file(format!("{}/postgres.d.ts", out_dir))
        .camel_case(true)
        .singularize(true)
        .generate()
        .expect("postgres codegen failed");

    // Same fixture with runtime enums and custom imports
    typegen::CodegenBuilder::new("fixtures/postgres-schema.sql")
        .dialect(typegen::codegen::DialectKind::Postgres)
        .out_file(format!("{}/postgres-runtime.d.ts", out_dir))
        .runtime_enums(typegen::codegen::RuntimeEnumStyle::PascalCase)
        .custom_import("InstantString", "./scalars#Instant")
        .override_column("accounts.created_at", "InstantString")
        .generate()
        .expect("postgres runtime enum codegen failed");

    println!("cargo:rerun-if-changed=fixtures/postgres-schema.sql");
}
