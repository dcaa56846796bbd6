use clap::Parser;

/// Command-line surface for oracle-install
///
/// There are no options beyond help and version; everything else comes from
/// ORACLE_* environment variables or the config file.
#[derive(Parser, Debug)]
#[command(
    name = "oracle-install",
    version,
    about = "Download and install the latest oracle release for this machine",
    after_help = "Configuration: ORACLE_OWNER, ORACLE_REPO, ORACLE_BINARY_NAME, ORACLE_INSTALL_DIR, \
ORACLE_TARGET, ORACLE_ASSET_FILTER, ORACLE_TAG, ORACLE_ASSET_NAME, ORACLE_INSTALL_STRATEGY \
(api|convention), ORACLE_INSTALL_CONFIG, GITHUB_TOKEN"
)]
pub struct Args {}
