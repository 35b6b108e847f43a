pub fn generate_starter_config() -> String {
    r#"# =============================================================================
# APPLOGS CONFIGURATION
# =============================================================================
# Where aggregated container logs live. Each application's node files are
# expected under:
#
#   <remote_app_log_dir>/<owner>[/<remote_app_log_dir_suffix>]/<application id>/
#
# Config file locations (in order of precedence):
#   1. Path specified via --config argument
#   2. ~/.config/applogs/config.yml
#   3. /etc/applogs/config.yml
#
# Values may reference environment variables with $env{VAR_NAME}.

# Root directory of aggregated application logs.
remote_app_log_dir: /tmp/logs

# Directory inserted between the owner and the application id. Set to null
# or an empty string if the layout has no suffix level.
remote_app_log_dir_suffix: logs
"#
    .to_string()
}
