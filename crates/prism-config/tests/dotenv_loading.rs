//! `.env` loading runs in its own test binary: dotenvy writes to the process
//! environment outside of `Jail`'s control.

use figment::Jail;
use prism_config::PrismConfig;

#[test]
fn dotenv_file_feeds_env_layer() {
    Jail::expect_with(|jail| {
        jail.create_file(".env", "PRISM_POLLING__MAX_ATTEMPTS=7\n")?;

        let config = PrismConfig::load_with_dotenv().expect("config loads");
        assert_eq!(config.polling.max_attempts, 7);
        Ok(())
    });
}
