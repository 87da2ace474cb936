//! Filename templates and output planning.
//!
//! Lock file names are derived from a user template containing
//! single-brace variables: `{platform}` and `{dev-dependencies}`. The
//! template is expanded and validated — including the collision check for
//! per-platform output kinds — *before* any resolution work begins, so a
//! misconfigured template fails fast instead of after minutes of solving.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::Result;
use regex::Regex;
use std::sync::OnceLock;

use crate::core::EnvlockError;
use crate::filter::InclusionPolicy;

/// Output kinds the renderer knows how to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputKind {
    /// Unified multi-platform YAML document (the default).
    Lock,
    /// One `@EXPLICIT` URL list per platform.
    Explicit,
}

impl OutputKind {
    /// Whether this kind writes one file per platform (as opposed to one
    /// merged document that may cover several platforms).
    pub fn is_per_platform(self) -> bool {
        matches!(self, Self::Explicit)
    }

    /// Filename template applied when the user didn't pass one.
    pub fn default_template(self) -> &'static str {
        match self {
            Self::Lock => crate::constants::DEFAULT_FILENAME_TEMPLATE,
            // Per-platform output needs distinct names out of the box.
            Self::Explicit => "envlock-{platform}.lock",
        }
    }
}

impl std::fmt::Display for OutputKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Lock => f.write_str("lock"),
            Self::Explicit => f.write_str("explicit"),
        }
    }
}

/// Variable values available to one template expansion.
#[derive(Debug, Clone, Copy)]
pub struct TemplateVars<'a> {
    /// The platform being rendered.
    pub platform: &'a str,
    /// `"true"` or `"false"`, from the requested dev policy.
    pub dev_dependencies: &'a str,
}

fn variable_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\{([^{}]*)\}").expect("static pattern is valid"))
}

/// Expand a filename template for one platform.
///
/// # Errors
///
/// Returns [`EnvlockError::UnknownTemplateVariable`] for any variable other
/// than `{platform}` and `{dev-dependencies}`.
pub fn expand(template: &str, vars: &TemplateVars<'_>) -> Result<String> {
    let mut result = String::with_capacity(template.len());
    let mut last_end = 0;

    for capture in variable_pattern().captures_iter(template) {
        let whole = capture.get(0).expect("capture 0 always present");
        let name = &capture[1];
        result.push_str(&template[last_end..whole.start()]);
        match name {
            "platform" => result.push_str(vars.platform),
            "dev-dependencies" => result.push_str(vars.dev_dependencies),
            other => {
                return Err(EnvlockError::UnknownTemplateVariable {
                    variable: other.to_string(),
                    template: template.to_string(),
                }
                .into());
            }
        }
        last_end = whole.end();
    }
    result.push_str(&template[last_end..]);

    Ok(result)
}

/// One planned output file and the platforms that render into it.
#[derive(Debug, Clone)]
pub struct PlannedFile {
    /// Rendered file name (template with variables substituted).
    pub filename: String,
    /// Full output path.
    pub path: PathBuf,
    /// Platforms that render into this file, in request order. Always a
    /// single platform for per-platform kinds.
    pub platforms: Vec<String>,
}

/// The complete output plan for one invocation.
///
/// Computed before dispatching any solver so that configuration errors
/// surface while they are still cheap.
#[derive(Debug, Clone)]
pub struct RenderPlan {
    /// Planned files in first-rendered order.
    pub files: Vec<PlannedFile>,
    /// The output kind the plan was built for.
    pub kind: OutputKind,
}

impl RenderPlan {
    /// The planned file a given platform renders into.
    pub fn file_for_platform(&self, platform: &str) -> Option<&PlannedFile> {
        self.files.iter().find(|f| f.platforms.iter().any(|p| p == platform))
    }
}

/// Expand the template for every platform and group platforms by rendered
/// file name.
///
/// For per-platform kinds a shared name across platforms is a configuration
/// error; for the unified kind it simply means those platforms merge into
/// one multi-platform document.
pub fn plan_outputs(
    template: &str,
    kind: OutputKind,
    platforms: &[String],
    policy: &InclusionPolicy,
    output_dir: &Path,
) -> Result<RenderPlan> {
    let dev_value = policy.dev_dependencies_template_value();

    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, Vec<String>> = HashMap::new();

    for platform in platforms {
        let vars = TemplateVars {
            platform,
            dev_dependencies: dev_value,
        };
        let filename = expand(template, &vars)?;
        let group = groups.entry(filename.clone()).or_insert_with(|| {
            order.push(filename);
            Vec::new()
        });
        group.push(platform.clone());
    }

    let mut files = Vec::with_capacity(order.len());
    for filename in order {
        let platforms = groups.remove(&filename).expect("group exists for ordered name");
        if kind.is_per_platform() && platforms.len() > 1 {
            return Err(EnvlockError::FilenameCollision {
                filename,
                platforms,
            }
            .into());
        }
        files.push(PlannedFile {
            path: output_dir.join(&filename),
            filename,
            platforms,
        });
    }

    Ok(RenderPlan { files, kind })
}
