//! Compile-time expansion of the generator over the bundled specs; the
//! integration tests drive the expanded code.

typegenitor::generate_api!(path = "specs/health.yaml", client = true, module_name = "health_api");
