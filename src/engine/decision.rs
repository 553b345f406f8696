//! Fetch, install and deploy decisions
//!
//! Per descriptor the pipeline moves through
//! `NeedFetch -> Staged -> NeedInstall -> Installed`, or ends in `Skip`.
//! These functions are pure; the orchestrator gathers the facts.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    NeedFetch,
    Staged,
    NeedInstall,
    Installed,
    Skip,
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::NeedFetch => "need-fetch",
            Self::Staged => "staged",
            Self::NeedInstall => "need-install",
            Self::Installed => "installed",
            Self::Skip => "skipped",
        };
        f.write_str(s)
    }
}

/// Why a fetch is needed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchReason {
    NotStaged,
    Snapshot,
    Forced,
}

/// Why an install is needed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallReason {
    NotInstalled,
    Snapshot,
    Forced,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    InstallDisabled,
    AlreadyInstalled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallDecision {
    Install(InstallReason),
    Skip(SkipReason),
}

/// Facts about one descriptor at decision time
#[derive(Debug, Clone, Copy, Default)]
pub struct Facts {
    pub staged: bool,
    pub installed: bool,
    pub snapshot: bool,
    pub forced: bool,
}

/// `None` means the staged file is reused with no network activity.
pub fn decide_fetch(facts: Facts) -> Option<FetchReason> {
    if !facts.staged {
        Some(FetchReason::NotStaged)
    } else if facts.snapshot {
        Some(FetchReason::Snapshot)
    } else if facts.forced {
        Some(FetchReason::Forced)
    } else {
        None
    }
}

pub fn decide_install(install: bool, facts: Facts) -> InstallDecision {
    if !install {
        InstallDecision::Skip(SkipReason::InstallDisabled)
    } else if !facts.installed {
        InstallDecision::Install(InstallReason::NotInstalled)
    } else if facts.snapshot {
        InstallDecision::Install(InstallReason::Snapshot)
    } else if facts.forced {
        InstallDecision::Install(InstallReason::Forced)
    } else {
        InstallDecision::Skip(SkipReason::AlreadyInstalled)
    }
}

impl InstallDecision {
    /// State the pipeline moves to from `Staged`.
    pub fn next_state(self) -> PipelineState {
        match self {
            Self::Install(_) => PipelineState::NeedInstall,
            Self::Skip(_) => PipelineState::Skip,
        }
    }
}

impl fmt::Display for FetchReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::NotStaged => "not staged",
            Self::Snapshot => "snapshot version",
            Self::Forced => "forced",
        })
    }
}

impl fmt::Display for InstallReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::NotInstalled => "not in local repository",
            Self::Snapshot => "snapshot version",
            Self::Forced => "forced",
        })
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::InstallDisabled => "install disabled",
            Self::AlreadyInstalled => "already installed",
        })
    }
}
