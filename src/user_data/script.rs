//! Runner install script executed by cloud-init on first boot.

use shell_escape::unix::escape;

use crate::params::BootstrapInstance;

use super::tools::RunnerTool;

/// Path the install script is written to on the instance.
pub(crate) const INSTALL_SCRIPT_PATH: &str = "/usr/local/bin/garm-install-runner";

const INSTALL_SCRIPT_BODY: &str = r#"
RUNNER_HOME=/home/runner/actions-runner
CURL_RETRY=(--retry 5 --retry-delay 5 --retry-connrefused --fail)

call() {
	curl "${CURL_RETRY[@]}" -s -X POST -d "$1" \
		-H 'Accept: application/json' \
		-H "Authorization: Bearer ${INSTANCE_TOKEN}" \
		"${CALLBACK_URL}" || echo "failed to report status"
}

send_status() {
	call "{\"status\": \"installing\", \"message\": \"$1\"}"
}

success() {
	call "{\"status\": \"idle\", \"message\": \"$1\", \"agent_id\": $2}"
}

fail() {
	call "{\"status\": \"failed\", \"message\": \"$1\"}"
	exit 1
}

send_status "downloading tools from ${DOWNLOAD_URL}"
AUTH_HEADER=()
if [ -n "${TEMP_TOKEN}" ]; then
	AUTH_HEADER=(-H "Authorization: Bearer ${TEMP_TOKEN}")
fi
curl "${CURL_RETRY[@]}" -L "${AUTH_HEADER[@]}" -o "/home/runner/${FILENAME}" "${DOWNLOAD_URL}" \
	|| fail "failed to download tools"

if [ -n "${CHECKSUM}" ]; then
	echo "${CHECKSUM}  /home/runner/${FILENAME}" | sha256sum -c - || fail "runner checksum mismatch"
fi

mkdir -p "${RUNNER_HOME}" || fail "failed to create runner directory"
tar xf "/home/runner/${FILENAME}" -C "${RUNNER_HOME}" || fail "failed to extract runner"
chown -R runner:runner /home/runner || fail "failed to change runner ownership"
cd "${RUNNER_HOME}" || fail "failed to enter runner directory"

send_status "installing dependencies"
./bin/installdependencies.sh || fail "failed to install dependencies"

if [ "${JIT_CONFIG_ENABLED}" = "true" ]; then
	send_status "fetching just-in-time runner configuration"
	for file in runner credentials credentials_rsaparams; do
		curl "${CURL_RETRY[@]}" -s \
			-H 'Accept: application/json' \
			-H "Authorization: Bearer ${INSTANCE_TOKEN}" \
			-o "${RUNNER_HOME}/.${file}" \
			"${METADATA_URL}/credentials/${file}" || fail "failed to fetch runner ${file}"
	done
	chown runner:runner "${RUNNER_HOME}"/.runner "${RUNNER_HOME}"/.credentials*
else
	send_status "fetching runner registration token"
	REGISTRATION_TOKEN=$(curl "${CURL_RETRY[@]}" -s -X GET \
		-H 'Accept: application/json' \
		-H "Authorization: Bearer ${INSTANCE_TOKEN}" \
		"${METADATA_URL}/runner-registration-token/") || fail "failed to get runner registration token"

	send_status "configuring runner"
	GROUP_ARGS=()
	if [ -n "${RUNNER_GROUP}" ]; then
		GROUP_ARGS=(--runnergroup "${RUNNER_GROUP}")
	fi
	sudo -u runner -- ./config.sh --unattended --ephemeral \
		--url "${REPO_URL}" \
		--token "${REGISTRATION_TOKEN}" \
		--name "${RUNNER_NAME}" \
		--labels "${RUNNER_LABELS}" \
		"${GROUP_ARGS[@]}" || fail "failed to configure runner"
fi

send_status "installing runner service"
./svc.sh install runner || fail "failed to install runner service"
./svc.sh start || fail "failed to start runner service"

AGENT_ID=$(grep -oE '"[Aa]gent[Ii]d": *[0-9]+' "${RUNNER_HOME}/.runner" | grep -oE '[0-9]+$' || echo 0)
success "runner successfully installed" "${AGENT_ID:-0}"
"#;

/// Renders the install script for `bootstrap` using the selected `tool`.
///
/// Every value taken from the bootstrap request is shell escaped before it is
/// assigned, so the static body only ever sees quoted variables.
pub(crate) fn render_install_script(bootstrap: &BootstrapInstance, tool: &RunnerTool) -> String {
    let labels = bootstrap.labels.join(",");
    let jit = if bootstrap.jit_config_enabled {
        "true"
    } else {
        "false"
    };
    let assignments = [
        ("RUNNER_NAME", bootstrap.name.as_str()),
        ("REPO_URL", bootstrap.repo_url.as_str()),
        ("CALLBACK_URL", bootstrap.callback_url.as_str()),
        ("METADATA_URL", bootstrap.metadata_url.trim_end_matches('/')),
        ("INSTANCE_TOKEN", bootstrap.instance_token.as_str()),
        ("RUNNER_LABELS", labels.as_str()),
        ("RUNNER_GROUP", bootstrap.github_runner_group.as_str()),
        ("JIT_CONFIG_ENABLED", jit),
        ("DOWNLOAD_URL", tool.download_url.as_str()),
        ("FILENAME", tool.filename.as_str()),
        ("TEMP_TOKEN", tool.temp_download_token.as_deref().unwrap_or_default()),
        ("CHECKSUM", tool.sha256_checksum.as_deref().unwrap_or_default()),
    ];

    let mut script = String::from("#!/bin/bash\nset -o pipefail\n\n");
    for (name, value) in assignments {
        script.push_str(name);
        script.push('=');
        script.push_str(escape(value.into()).as_ref());
        script.push('\n');
    }
    script.push_str(INSTALL_SCRIPT_BODY);
    script
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tool() -> RunnerTool {
        RunnerTool {
            download_url: String::from("https://example.com/runner.tar.gz"),
            filename: String::from("runner.tar.gz"),
            sha256_checksum: None,
            temp_download_token: None,
        }
    }

    #[test]
    fn escapes_bootstrap_values() {
        let bootstrap = BootstrapInstance {
            name: String::from("runner; rm -rf /"),
            labels: vec![String::from("linode"), String::from("it's")],
            ..BootstrapInstance::default()
        };
        let script = render_install_script(&bootstrap, &tool());
        assert!(script.contains("RUNNER_NAME='runner; rm -rf /'"), "{script}");
        assert!(script.contains(r"RUNNER_LABELS='linode,it'\''s'"), "{script}");
    }

    #[test]
    fn trims_trailing_slash_from_metadata_url() {
        let bootstrap = BootstrapInstance {
            metadata_url: String::from("https://garm/api/v1/metadata/"),
            ..BootstrapInstance::default()
        };
        let script = render_install_script(&bootstrap, &tool());
        assert!(
            script.contains("METADATA_URL='https://garm/api/v1/metadata'\n"),
            "{script}"
        );
    }

    #[test]
    fn records_jit_flag() {
        let bootstrap = BootstrapInstance {
            jit_config_enabled: true,
            ..BootstrapInstance::default()
        };
        let script = render_install_script(&bootstrap, &tool());
        assert!(script.starts_with("#!/bin/bash\n"));
        assert!(script.contains("JIT_CONFIG_ENABLED=true\n"));
        assert!(script.contains("TEMP_TOKEN=''\n"));
    }
}
