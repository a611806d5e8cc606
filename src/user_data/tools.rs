//! Runner download selection.

use crate::params::{OsArch, OsType, RunnerApplicationDownload};

use super::UserDataError;

/// Forge naming for an operating system, as used in runner downloads.
const fn forge_os(os: OsType) -> Option<&'static str> {
    match os {
        OsType::Linux => Some("linux"),
        OsType::Windows => Some("win"),
        OsType::Unknown => None,
    }
}

/// Forge naming for an architecture, as used in runner downloads.
const fn forge_arch(arch: OsArch) -> Option<&'static str> {
    match arch {
        OsArch::Amd64 => Some("x64"),
        OsArch::Arm64 => Some("arm64"),
        OsArch::Arm => Some("arm"),
        OsArch::I386 => Some("x86"),
        OsArch::Unknown => None,
    }
}

/// A runner download with every field the install script needs.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct RunnerTool {
    pub(crate) download_url: String,
    pub(crate) filename: String,
    pub(crate) sha256_checksum: Option<String>,
    pub(crate) temp_download_token: Option<String>,
}

/// Picks the first download matching `os` and `arch`.
pub(crate) fn resolve_tool(
    tools: &[RunnerApplicationDownload],
    os: OsType,
    arch: OsArch,
) -> Result<RunnerTool, UserDataError> {
    let not_found = || UserDataError::ToolResolution {
        os: format!("{os:?}").to_ascii_lowercase(),
        arch: format!("{arch:?}").to_ascii_lowercase(),
    };
    let (Some(wanted_os), Some(wanted_arch)) = (forge_os(os), forge_arch(arch)) else {
        return Err(not_found());
    };

    tools
        .iter()
        .filter(|tool| tool.os.as_deref() == Some(wanted_os))
        .filter(|tool| tool.architecture.as_deref() == Some(wanted_arch))
        .find_map(|tool| {
            let download_url = tool.download_url.as_deref().filter(|url| !url.is_empty())?;
            let filename = tool.filename.as_deref().filter(|name| !name.is_empty())?;
            Some(RunnerTool {
                download_url: download_url.to_owned(),
                filename: filename.to_owned(),
                sha256_checksum: tool.sha256_checksum.clone().filter(|sum| !sum.is_empty()),
                temp_download_token: tool
                    .temp_download_token
                    .clone()
                    .filter(|token| !token.is_empty()),
            })
        })
        .ok_or_else(not_found)
}
