// ABOUTME: Generic deployment struct parameterized by state marker.
// ABOUTME: Carries the validated plan, resolved colors and the run record through every state.

use std::collections::HashMap;
use std::marker::PhantomData;

use crate::config::{Config, EnvFile, resolve_env_map};
use crate::diagnostics::{Diagnostics, Warning};
use crate::error::Result;
use crate::proxy::ProxyConfig;
use crate::types::{Color, ContainerId};

use super::resolve::ColorPair;
use super::run::{DeploymentRun, StepName};
use super::state::{Completed, Resolved};

/// How the target color's images are obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LaunchMode {
    /// `up --build` from local sources.
    #[default]
    BuildLocal,
    /// Pull registry images (with retry), then `up --no-build`.
    PullPrebuilt,
}

/// Per-run switches from the command line or environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeployOptions {
    pub mode: LaunchMode,
    pub force_reencrypt: bool,
    pub skip_reencrypt: bool,
}

/// Everything a deployment needs, checked before any container is touched.
#[derive(Debug, Clone)]
pub struct DeployPlan {
    pub config: Config,
    pub domain: String,
    pub maintenance_env: HashMap<String, String>,
    pub options: DeployOptions,
}

impl DeployPlan {
    /// Pre-flight: env file with `DOMAIN`, maintenance env, and a template
    /// that renders cleanly for both colors.
    pub fn prepare(config: Config, options: DeployOptions) -> Result<Self> {
        let env_file = EnvFile::load(&config.env_file)?;
        let domain = env_file.domain()?.to_string();
        let maintenance_env = resolve_env_map(&config.maintenance.env)?;

        for color in Color::ALL {
            ProxyConfig::for_color(&config.proxy, &config.app, color, &domain).render()?;
        }

        Ok(Self {
            config,
            domain,
            maintenance_env,
            options,
        })
    }
}

/// A deployment in progress, parameterized by its current state.
#[derive(Debug)]
pub struct Deployment<S> {
    pub(crate) plan: DeployPlan,
    pub(crate) colors: ColorPair,
    pub(crate) run: DeploymentRun,
    pub(crate) diagnostics: Diagnostics,
    /// Previous worker stopped by this run, restarted if the run aborts.
    pub(crate) quiesced: Option<ContainerId>,
    pub(crate) state: PhantomData<S>,
}

impl Deployment<Resolved> {
    pub fn new(plan: DeployPlan, colors: ColorPair) -> Self {
        let mut run = DeploymentRun::new(colors);
        run.ok(
            StepName::ResolveColors,
            match colors.current {
                Some(current) => format!("{} active, deploying {}", current, colors.target),
                None => format!("first deployment into {}", colors.target),
            },
        );
        Deployment {
            plan,
            colors,
            run,
            diagnostics: Diagnostics::default(),
            quiesced: None,
            state: PhantomData,
        }
    }
}

impl<S> Deployment<S> {
    pub fn config(&self) -> &Config {
        &self.plan.config
    }

    pub fn options(&self) -> &DeployOptions {
        &self.plan.options
    }

    pub fn colors(&self) -> ColorPair {
        self.colors
    }

    pub fn target(&self) -> Color {
        self.colors.target
    }

    /// The color serving before this run (None on first deploy).
    pub fn current(&self) -> Option<Color> {
        self.colors.current
    }

    pub fn run(&self) -> &DeploymentRun {
        &self.run
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub(crate) fn warn(&mut self, warning: Warning) {
        self.diagnostics.warn(warning);
    }

    /// Move to the next state, keeping everything else.
    pub(crate) fn transition<T>(self) -> Deployment<T> {
        Deployment {
            plan: self.plan,
            colors: self.colors,
            run: self.run,
            diagnostics: self.diagnostics,
            quiesced: self.quiesced,
            state: PhantomData,
        }
    }
}

impl Deployment<Completed> {
    /// The color now serving traffic.
    pub fn active(&self) -> Color {
        self.colors.target
    }
}
