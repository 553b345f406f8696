//! Per-run orchestration
//!
//! Descriptors are processed in declaration order, each completely before
//! the next:
//!
//! 1. decide whether the staged file can be reused
//! 2. fetch (through the run cache), verify, extract, cross-check
//! 3. move the verified candidate into the staging path
//! 4. decide and perform the install
//!
//! Deployment is a separate stage after every descriptor is installed.
//! The first fatal error aborts the run; the fetcher's temporary directory
//! is removed when the orchestrator is dropped.

use crate::config::PackageDescriptor;
use crate::coordinates::Coordinates;
use crate::core::output;
use crate::error::{Error, Result};
use crate::helpers::acquire::central::{LookupClient, LookupOutcome};
use crate::helpers::acquire::transport::{HttpTransport, Transports};
use crate::helpers::acquire::{Fetcher, verify};
use crate::helpers::build::{ExtractRequest, extract_member};
use crate::helpers::install::{Deployer, InstallRequest, LocalRepository};
use crate::helpers::internal::{fs_utils, url_utils};
use std::path::{Path, PathBuf};

use super::context::RunContext;
use super::decision::{
    Facts, FetchReason, InstallDecision, PipelineState, decide_fetch, decide_install,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Goal {
    Resolve,
    Install,
    Deploy,
}

impl Goal {
    fn verb(self) -> &'static str {
        match self {
            Self::Resolve => "Resolving",
            Self::Install => "Installing",
            Self::Deploy => "Deploying",
        }
    }
}

/// What happened to one descriptor
#[derive(Debug, Clone)]
pub struct DescriptorOutcome {
    pub coordinates: Coordinates,
    pub staged_file: PathBuf,
    /// Why the artifact was fetched, `None` when the staged file was reused
    pub fetch: Option<FetchReason>,
    pub install: Option<InstallDecision>,
    pub state: PipelineState,
    pub deployed: bool,
}

#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub outcomes: Vec<DescriptorOutcome>,
    /// Real transfers; cache hits are not counted
    pub fetch_count: usize,
    pub warnings: Vec<String>,
}

impl RunReport {
    pub fn installed(&self) -> usize {
        self.count(|o| o.state == PipelineState::Installed)
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| o.state == PipelineState::Skip)
    }

    pub fn deployed(&self) -> usize {
        self.count(|o| o.deployed)
    }

    fn count(&self, pred: impl Fn(&DescriptorOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(o)).count()
    }

    pub fn summary(&self) -> String {
        format!(
            "{} artifact(s): {} fetched, {} installed, {} deployed, {} skipped, {} warning(s)",
            self.outcomes.len(),
            self.fetch_count,
            self.installed(),
            self.deployed(),
            self.skipped(),
            self.warnings.len()
        )
    }
}

pub struct Orchestrator<'a> {
    ctx: &'a RunContext,
    fetcher: Fetcher,
    /// Construction failure is kept and reported per descriptor that uses the lookup
    lookup: std::result::Result<LookupClient, String>,
    repository: LocalRepository,
    http: HttpTransport,
    report: RunReport,
}

impl<'a> Orchestrator<'a> {
    pub fn new(ctx: &'a RunContext) -> Result<Self> {
        Self::with_transports(ctx, Transports::standard(&ctx.settings))
    }

    /// Orchestrator fetching through the given transports.
    pub fn with_transports(ctx: &'a RunContext, transports: Transports) -> Result<Self> {
        let http = HttpTransport::new(&ctx.settings);
        let lookup = LookupClient::new(
            http.clone(),
            &ctx.lookup_url,
            ctx.lookup_rows,
            ctx.lookup_timeout,
        )
        .map_err(|e| e.to_string());
        Ok(Self {
            ctx,
            fetcher: Fetcher::new(transports)?,
            lookup,
            repository: LocalRepository::new(ctx.local_repository_path()),
            http,
            report: RunReport::default(),
        })
    }

    pub fn run(mut self, goal: Goal, descriptors: &mut [PackageDescriptor]) -> Result<RunReport> {
        let deployer = match goal {
            Goal::Deploy => self.deployer(descriptors)?,
            _ => None,
        };

        let total = descriptors.len();
        for (index, descriptor) in descriptors.iter_mut().enumerate() {
            output::action_numbered(index + 1, total, &format!("{} {}", goal.verb(), descriptor));
            let outcome = self.process(index, descriptor, goal)?;
            self.report.outcomes.push(outcome);
        }

        if let Some(deployer) = deployer {
            output::action(&format!("Deploying to {}", deployer.target().url));
            for (descriptor, outcome) in descriptors.iter().zip(self.report.outcomes.iter_mut()) {
                if !descriptor.deploy {
                    output::debug(&format!("{descriptor}: deploy disabled"));
                    continue;
                }
                deployer.deploy(&self.repository, &descriptor.coordinates)?;
                outcome.deployed = true;
            }
        }

        self.report.fetch_count = self.fetcher.fetch_count();
        Ok(self.report)
    }

    fn deployer(&self, descriptors: &[PackageDescriptor]) -> Result<Option<Deployer>> {
        let Some(first) = descriptors.iter().find(|d| d.deploy) else {
            return Ok(None);
        };
        let target = self.ctx.distribution.clone().ok_or_else(|| Error::Deploy {
            artifact: first.coordinates.to_string(),
            reason: "no [distribution] target configured".to_string(),
        })?;
        Ok(Some(Deployer::new(target, self.http.clone(), &self.ctx.settings)))
    }

    fn process(
        &mut self,
        index: usize,
        descriptor: &mut PackageDescriptor,
        goal: Goal,
    ) -> Result<DescriptorOutcome> {
        let staged_file = self.ctx.staging_path(descriptor);
        let facts = Facts {
            staged: staged_file.is_file(),
            installed: self.repository.contains(&descriptor.coordinates),
            snapshot: descriptor.coordinates.is_snapshot(),
            forced: self.ctx.is_forced(descriptor),
        };

        let fetch = decide_fetch(facts);
        match fetch {
            Some(reason) => {
                trace(descriptor, PipelineState::NeedFetch, PipelineState::Staged);
                self.acquire(index, descriptor, &staged_file, reason)?
            }
            None => output::skip(&format!("already staged at {}", staged_file.display())),
        }
        descriptor.resolved_file = Some(staged_file.clone());

        let mut outcome = DescriptorOutcome {
            coordinates: descriptor.coordinates.clone(),
            staged_file,
            fetch,
            install: None,
            state: PipelineState::Staged,
            deployed: false,
        };
        if goal == Goal::Resolve {
            return Ok(outcome);
        }

        let decision = decide_install(descriptor.install, facts);
        outcome.install = Some(decision);
        outcome.state = decision.next_state();
        trace(descriptor, PipelineState::Staged, outcome.state);
        match decision {
            InstallDecision::Skip(reason) => output::skip(&format!("install skipped: {reason}")),
            InstallDecision::Install(reason) => {
                output::sub_action(&format!("install ({reason})"));
                let pom_file = descriptor
                    .pom_file
                    .as_deref()
                    .map(|p| self.ctx.resolve_path(p));
                self.repository.install(&InstallRequest {
                    coordinates: &descriptor.coordinates,
                    file: &outcome.staged_file,
                    pom_file: pom_file.as_deref(),
                    generate_pom: descriptor.generate_pom,
                    create_checksum: self.ctx.create_checksum_for(descriptor),
                })?;
                trace(descriptor, outcome.state, PipelineState::Installed);
                outcome.state = PipelineState::Installed;
            }
        }
        Ok(outcome)
    }

    /// Fetch and verify into a scratch candidate, then stage it.
    fn acquire(
        &mut self,
        index: usize,
        descriptor: &PackageDescriptor,
        staged_file: &Path,
        reason: FetchReason,
    ) -> Result<()> {
        descriptor.validate_checksums()?;
        let Some(raw_url) = descriptor.download_url() else {
            if staged_file.is_file() {
                output::debug(&format!(
                    "{descriptor}: no downloadUrl, keeping {}",
                    staged_file.display()
                ));
                return Ok(());
            }
            return Err(Error::config(format!(
                "{} has no downloadUrl and nothing is staged at {}\n{}",
                descriptor,
                staged_file.display(),
                descriptor.coordinates.describe()
            )));
        };

        output::sub_action(&format!("fetch ({reason})"));
        let url = url_utils::parse_download_url(&raw_url)?;
        let label = descriptor.coordinates.to_string();
        let downloaded = self.fetcher.fetch(&label, &url, descriptor.timeout)?;

        if let Some(expected) = &descriptor.checksum {
            verify::verify(&downloaded, expected, &label)?;
        }

        let candidate = match descriptor.extract_file() {
            Some(member) => {
                let file_name = staged_file
                    .file_name()
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from("member"));
                let candidate = self
                    .fetcher
                    .scratch_dir(&format!("stage-{index}"))?
                    .join(file_name);
                let work = self.fetcher.scratch_dir(&format!("extract-{index}"))?;
                let context = format!("  url     : {url}\n{}", descriptor.coordinates.describe());
                extract_member(
                    &ExtractRequest {
                        archive: &downloaded,
                        member: &member,
                        dest: &candidate,
                        repack: descriptor.repack,
                        context: &context,
                    },
                    &work,
                )?;
                if let Some(expected) = &descriptor.extract_file_checksum {
                    verify::verify(&candidate, expected, &format!("{label} member {member}"))?;
                }
                candidate
            }
            None => downloaded,
        };

        if self.ctx.lookup_enabled(descriptor) {
            let outcome = match &self.lookup {
                Ok(client) => client.cross_check(&candidate, &descriptor.coordinates)?,
                Err(reason) => LookupOutcome::Unavailable(reason.clone()),
            };
            match outcome {
                LookupOutcome::Verified { hits } => {
                    output::detail(&format!("central lookup: {hits} matching record(s)"))
                }
                LookupOutcome::Unavailable(reason) => {
                    let msg = format!("central lookup for {label} skipped: {reason}");
                    output::warning(&msg);
                    self.report.warnings.push(msg);
                }
            }
        }

        fs_utils::copy_file(&candidate, staged_file)?;
        output::detail(&format!("staged {}", staged_file.display()));
        Ok(())
    }
}

fn trace(descriptor: &PackageDescriptor, from: PipelineState, to: PipelineState) {
    output::debug(&format!("{descriptor}: {from} -> {to}"));
}

/// Fetch, verify and stage every descriptor.
pub fn resolve(ctx: &RunContext, descriptors: &mut [PackageDescriptor]) -> Result<RunReport> {
    Orchestrator::new(ctx)?.run(Goal::Resolve, descriptors)
}

/// Resolve, then install into the local repository.
pub fn install(ctx: &RunContext, descriptors: &mut [PackageDescriptor]) -> Result<RunReport> {
    Orchestrator::new(ctx)?.run(Goal::Install, descriptors)
}

/// Install, then publish to the distribution target.
pub fn deploy(ctx: &RunContext, descriptors: &mut [PackageDescriptor]) -> Result<RunReport> {
    Orchestrator::new(ctx)?.run(Goal::Deploy, descriptors)
}
