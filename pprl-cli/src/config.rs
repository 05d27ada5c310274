// pprl-cli/src/config.rs
//
// Bloom/embedder parameters the full command-line driver would normally
// load from `.env`/party configuration. Here they're a plain struct with
// `clap`'s `env` attribute as the only configuration source — no dotenv
// loading, no party-to-party handshake, both of which belong to the
// excluded external driver.

use clap::Args;

#[derive(Debug, Clone, Args)]
pub struct CoreConfig {
    #[arg(long, env = "PPRL_BF_SIZE", default_value_t = 1024)]
    pub bf_size: u32,

    #[arg(long, env = "PPRL_NUM_HASHES", default_value_t = 10)]
    pub num_hashes: usize,

    #[arg(long, env = "PPRL_OFFSET", default_value_t = 64)]
    pub offset: u32,

    #[arg(long, env = "PPRL_SALT", default_value = "")]
    pub salt: String,

    #[arg(long, env = "PPRL_ABS_CUTOFF", default_value_t = 0.3)]
    pub abs_cutoff: f64,

    #[arg(long, env = "PPRL_REL_CUTOFF")]
    pub rel_cutoff: Option<f64>,

    #[arg(long, env = "PPRL_ONE_TO_ONE", default_value_t = true)]
    pub one_to_one: bool,
}
