//! Environment overrides. Kept in their own binary: the process
//! environment is shared by every test in it.

use dcabot::infrastructure::config::Config;

#[test]
fn env_overrides_database_and_signer() {
    std::env::set_var("DCABOT_DATABASE", "/var/lib/dcabot/env.db");
    std::env::set_var("DCABOT_SIGNER_URL", "http://127.0.0.1:9000/sign");

    // Live mode passes validation because the signer comes from the env.
    let config = Config::parse_toml(
        "database = \"file.db\"\n[chain]\ndca_address = \"terra1dca\"\n",
    )
    .unwrap();

    std::env::remove_var("DCABOT_DATABASE");
    std::env::remove_var("DCABOT_SIGNER_URL");

    assert_eq!(config.database, "/var/lib/dcabot/env.db");
    assert_eq!(
        config.chain.signer_url.as_deref(),
        Some("http://127.0.0.1:9000/sign")
    );
    assert!(!config.chain.dry_run);
}
