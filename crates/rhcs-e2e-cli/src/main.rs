//! RHCS e2e - drive a resource kind's Terraform manifests by hand
//!
//! Each invocation runs one lifecycle step against one manifest directory.
//!
//! ## Commands
//!
//! - `init`: initialise the manifest directory
//! - `apply`: init, apply with arguments from a JSON file, print the outputs
//! - `output`: print the typed outputs of an applied directory
//! - `destroy`: init and destroy with arguments from a JSON file
//! - `show`: print the applied state, or one resource's attributes

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use rhcs_e2e::{CloudProvidersKind, ClusterKind, IdpKind, IdpType, MachinePoolKind};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tf_harness::{
    encode_var_files, CancellationToken, ExecContext, HarnessConfig, Lifecycle, ResourceKind,
    ResourceService, Terraform,
};
use tracing::{info, warn, Level};

#[derive(Parser)]
#[command(name = "rhcs-e2e")]
#[command(author = "RHCS QE")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Drive RHCS Terraform manifests through their lifecycle", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialise a manifest directory
    Init {
        #[command(flatten)]
        target: Target,
    },

    /// Apply a resource and print its outputs
    Apply {
        #[command(flatten)]
        target: Target,

        /// JSON file holding the argument record
        #[arg(long)]
        args: Option<PathBuf>,

        /// Terraform variable files, later files override earlier ones
        #[arg(long = "var-file")]
        var_files: Vec<PathBuf>,

        /// Extra flags passed to terraform after the variables
        #[arg(last = true)]
        extra: Vec<String>,
    },

    /// Print the typed outputs of an applied directory
    Output {
        #[command(flatten)]
        target: Target,
    },

    /// Destroy a resource
    Destroy {
        #[command(flatten)]
        target: Target,

        /// JSON file holding the argument record used for the apply
        #[arg(long)]
        args: Option<PathBuf>,
    },

    /// Print the applied state
    Show {
        #[command(flatten)]
        target: Target,

        /// Only this resource or data source, as TYPE.NAME
        #[arg(long)]
        resource: Option<String>,
    },
}

#[derive(Args, Debug, Clone)]
struct Target {
    /// Resource kind
    #[arg(short, long, value_enum)]
    kind: Kind,

    /// Manifest directory (default: the kind's directory under RHCS_MANIFESTS_DIR)
    #[arg(short, long)]
    dir: Option<PathBuf>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Cluster,
    MachinePool,
    IdpHtpasswd,
    IdpGithub,
    IdpGitlab,
    IdpGoogle,
    IdpLdap,
    IdpOpenid,
    CloudProviders,
}

impl Kind {
    fn idp_type(self) -> Option<IdpType> {
        match self {
            Kind::IdpHtpasswd => Some(IdpType::Htpasswd),
            Kind::IdpGithub => Some(IdpType::Github),
            Kind::IdpGitlab => Some(IdpType::Gitlab),
            Kind::IdpGoogle => Some(IdpType::Google),
            Kind::IdpLdap => Some(IdpType::Ldap),
            Kind::IdpOpenid => Some(IdpType::Openid),
            _ => None,
        }
    }
}

/// One lifecycle step with its inputs.
#[derive(Debug, Clone)]
enum Step {
    Init,
    Apply {
        args: Option<PathBuf>,
        var_files: Vec<PathBuf>,
        extra: Vec<String>,
    },
    Output,
    Destroy {
        args: Option<PathBuf>,
    },
    Show {
        resource: Option<String>,
    },
}

impl Commands {
    fn split(self) -> (Target, Step) {
        match self {
            Commands::Init { target } => (target, Step::Init),
            Commands::Apply {
                target,
                args,
                var_files,
                extra,
            } => (
                target,
                Step::Apply {
                    args,
                    var_files,
                    extra,
                },
            ),
            Commands::Output { target } => (target, Step::Output),
            Commands::Destroy { target, args } => (target, Step::Destroy { args }),
            Commands::Show { target, resource } => (target, Step::Show { resource }),
        }
    }
}

/// Configuration and runner shared by every step.
struct Env {
    config: HarnessConfig,
    terraform: Terraform,
    exec: ExecContext,
}

impl Env {
    fn service<K>(&self, kind: K) -> ResourceService<K>
    where
        K: ResourceKind,
    {
        ResourceService::new(kind, self.terraform.clone(), self.config.clone())
            .with_context(self.exec.clone())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    tf_harness::init_tracing(cli.json, level);

    let config = HarnessConfig::from_env().context("Failed to read harness configuration")?;

    // Ctrl-C kills the running terraform instead of orphaning it
    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("interrupted, cancelling terraform");
                cancel.cancel();
            }
        });
    }

    let env = Env {
        terraform: Terraform::from_config(&config),
        exec: ExecContext::from_config(&config).with_cancellation(cancel),
        config,
    };

    let (target, step) = cli.command.split();
    if let Some(document) = dispatch(&env, &target, step).await? {
        println!("{}", serde_json::to_string_pretty(&document)?);
    }
    Ok(())
}

async fn dispatch(env: &Env, target: &Target, step: Step) -> Result<Option<Value>> {
    let dir = target.dir.as_deref();
    match target.kind {
        Kind::Cluster => run_step(env, ClusterKind, dir, step).await,
        Kind::MachinePool => run_step(env, MachinePoolKind, dir, step).await,
        Kind::CloudProviders => run_step(env, CloudProvidersKind, dir, step).await,
        idp => {
            let idp_type = idp
                .idp_type()
                .with_context(|| format!("{:?} is not an identity provider", idp))?;
            run_step(env, IdpKind::new(idp_type), dir, step).await
        }
    }
}

async fn run_step<K>(env: &Env, kind: K, dir: Option<&Path>, step: Step) -> Result<Option<Value>>
where
    K: ResourceKind + 'static,
    K::Args: DeserializeOwned,
    K::Output: Serialize,
{
    let dir = dir
        .map(Path::to_path_buf)
        .unwrap_or_else(|| kind.default_manifest_dir(&env.config));
    let name = kind.name().to_string();

    match step {
        Step::Init => {
            let mut svc = env.service(kind);
            svc.init(Some(dir.clone()))
                .await
                .with_context(|| format!("Failed to initialise {}", name))?;
            info!(kind = %name, dir = %dir.display(), "initialised");
            Ok(None)
        }
        Step::Apply {
            args,
            var_files,
            mut extra,
        } => {
            let args: K::Args = match load_args(args.as_deref())? {
                Some(args) => args,
                None => empty_args()?,
            };
            extra.extend(encode_var_files(&var_files));

            let mut svc = env.service(kind);
            svc.init(Some(dir))
                .await
                .with_context(|| format!("Failed to initialise {}", name))?;
            svc.create(args, &extra)
                .await
                .with_context(|| format!("Failed to apply {}", name))?;
            let output = svc
                .output()
                .await
                .with_context(|| format!("Failed to read {} outputs", name))?;
            Ok(Some(serde_json::to_value(output)?))
        }
        Step::Output => {
            let outputs = env
                .terraform
                .output(&dir, &env.exec)
                .await
                .with_context(|| format!("Failed to read {} outputs", name))?;
            Ok(Some(serde_json::to_value(kind.project(&outputs))?))
        }
        Step::Destroy { args } => {
            let args: Option<K::Args> = load_args(args.as_deref())?;
            let mut svc = env.service(kind);
            svc.init(Some(dir))
                .await
                .with_context(|| format!("Failed to initialise {}", name))?;
            svc.destroy(args)
                .await
                .with_context(|| format!("Failed to destroy {}", name))?;
            info!(kind = %name, "destroyed");
            Ok(None)
        }
        Step::Show { resource } => {
            let state = env
                .terraform
                .show(&dir, &env.exec)
                .await
                .with_context(|| format!("Failed to read {} state", name))?;
            match resource {
                None => Ok(Some(state.as_value().clone())),
                Some(address) => {
                    let (type_name, resource_name) = address
                        .split_once('.')
                        .with_context(|| format!("Resource must be TYPE.NAME, got {:?}", address))?;
                    let values = state
                        .resource(type_name, resource_name)
                        .with_context(|| format!("Resource {} not found in state", address))?;
                    Ok(Some(values.clone()))
                }
            }
        }
    }
}

/// Read an argument record from a JSON file.
fn load_args<T: DeserializeOwned>(path: Option<&Path>) -> Result<Option<T>> {
    let Some(path) = path else {
        return Ok(None);
    };
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read arguments from {:?}", path))?;
    let args = serde_json::from_str(&raw)
        .with_context(|| format!("Invalid argument record in {:?}", path))?;
    Ok(Some(args))
}

/// Record with every field unset, leaving the manifest defaults in charge.
fn empty_args<T: DeserializeOwned>() -> Result<T> {
    serde_json::from_value(Value::Object(Default::default()))
        .context("Argument record has required fields, pass --args")
}
