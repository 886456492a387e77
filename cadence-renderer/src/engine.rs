//! Tera rendering engine: [`TemplateEngine`] and the default
//! [`ContentRenderer`], [`TeraRenderer`].
//!
//! # Path mapping
//!
//! Paths are relative to the target directory; `{plural}` is `playbooks` or
//! `standards`.
//!
//! | Agent       | Output path                                          |
//! |-------------|------------------------------------------------------|
//! | (always)    | `.cadence/{plural}/<slug>.md`, `.cadence/{plural}-index.md` |
//! | Claude      | `.claude/rules/cadence-{plural}.md`                  |
//! | Cursor      | `.cursor/rules/cadence-{plural}.mdc`                 |
//! | Windsurf    | `.windsurf/rules/cadence-{plural}.md`                |
//! | Copilot     | `.github/instructions/cadence-{plural}.instructions.md` |
//! | Cline       | `.clinerules/cadence-{plural}.md`                    |
//! | Junie       | `.junie/guidelines/cadence-{plural}.md`              |
//! | Antigravity | `.agent/rules/cadence-{plural}.md`                   |

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use tera::Tera;

use cadence_core::types::{ContentKind, ContentVersion, Repository, Target};
use cadence_core::AgentKind;

use crate::context::{index_file, target_prefixed, RenderContext};
use crate::error::RenderError;
use crate::updates::{ContentRenderer, FileUpdate, FileUpdates};

// ---------------------------------------------------------------------------
// Embedded templates, baked in with include_str!
// ---------------------------------------------------------------------------

const CONTENT_TEMPLATE: &str = "cadence/content.md.tera";
const INDEX_TEMPLATE: &str = "cadence/index.md.tera";

const TPLS: &[(&str, &str)] = &[
    ("shared/_header.tera", include_str!("templates/_partials/header.tera")),
    ("shared/_items.tera", include_str!("templates/_partials/items.tera")),
    (CONTENT_TEMPLATE, include_str!("templates/content.md.tera")),
    (INDEX_TEMPLATE, include_str!("templates/index.md.tera")),
    ("claude/rules.md.tera", include_str!("templates/claude.md.tera")),
    ("cursor/rules.mdc.tera", include_str!("templates/cursor.mdc.tera")),
    ("windsurf/rules.md.tera", include_str!("templates/windsurf.md.tera")),
    ("copilot/instructions.md.tera", include_str!("templates/copilot.md.tera")),
    ("cline/rules.md.tera", include_str!("templates/cline.md.tera")),
    ("junie/guidelines.md.tera", include_str!("templates/junie.md.tera")),
    ("antigravity/rules.md.tera", include_str!("templates/antigravity.md.tera")),
];

/// Template used for an agent's instruction file.
pub fn agent_template(agent: AgentKind) -> &'static str {
    match agent {
        AgentKind::Claude      => "claude/rules.md.tera",
        AgentKind::Cursor      => "cursor/rules.mdc.tera",
        AgentKind::Windsurf    => "windsurf/rules.md.tera",
        AgentKind::Copilot     => "copilot/instructions.md.tera",
        AgentKind::Cline       => "cline/rules.md.tera",
        AgentKind::Junie       => "junie/guidelines.md.tera",
        AgentKind::Antigravity => "antigravity/rules.md.tera",
    }
}

/// Instruction file for `agent` and `kind`, relative to the target directory.
pub fn agent_output_path(agent: AgentKind, kind: ContentKind) -> String {
    let plural = kind.plural();
    match agent {
        AgentKind::Claude      => format!(".claude/rules/cadence-{plural}.md"),
        AgentKind::Cursor      => format!(".cursor/rules/cadence-{plural}.mdc"),
        AgentKind::Windsurf    => format!(".windsurf/rules/cadence-{plural}.md"),
        AgentKind::Copilot     => format!(".github/instructions/cadence-{plural}.instructions.md"),
        AgentKind::Cline       => format!(".clinerules/cadence-{plural}.md"),
        AgentKind::Junie       => format!(".junie/guidelines/cadence-{plural}.md"),
        AgentKind::Antigravity => format!(".agent/rules/cadence-{plural}.md"),
    }
}

// ---------------------------------------------------------------------------
// Template loading helpers
// ---------------------------------------------------------------------------

fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> RenderError {
    RenderError::Io { path: path.into(), source }
}

fn normalize_template_name(path: &Path) -> String {
    path.to_string_lossy()
        .replace('\\', "/")
        .to_lowercase()
}

fn collect_template_files(dir: &Path, out: &mut Vec<PathBuf>) -> Result<(), RenderError> {
    let entries = std::fs::read_dir(dir).map_err(|e| io_err(dir, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| io_err(dir, e))?;
        let path = entry.path();
        let meta = entry.metadata().map_err(|e| io_err(&path, e))?;
        if meta.is_dir() {
            collect_template_files(&path, out)?;
        } else if meta.is_file() {
            out.push(path);
        }
    }
    Ok(())
}

fn load_user_templates(dir: &Path) -> Result<Vec<(String, String)>, RenderError> {
    if !dir.exists() {
        return Ok(vec![]);
    }
    let mut files = Vec::new();
    collect_template_files(dir, &mut files)?;
    let mut templates = Vec::new();
    for path in files {
        if path.extension().and_then(|s| s.to_str()) != Some("tera") {
            continue;
        }
        let rel = path.strip_prefix(dir).unwrap_or(path.as_path());
        let name = normalize_template_name(rel);
        let contents = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
        templates.push((name, contents));
    }
    Ok(templates)
}

fn build_tera(user_template_dir: Option<&Path>) -> Result<Tera, RenderError> {
    let mut templates: HashMap<String, String> = HashMap::new();
    for (name, content) in TPLS {
        templates.insert(normalize_template_name(Path::new(name)), (*content).to_string());
    }
    if let Some(dir) = user_template_dir {
        for (name, content) in load_user_templates(dir)? {
            templates.insert(name, content);
        }
    }

    let mut tera = Tera::default();
    let items: Vec<(String, String)> = templates.into_iter().collect();
    tera.add_raw_templates(items)?;
    Ok(tera)
}

/// LF line endings and exactly one trailing newline.
fn normalize_output(rendered: String) -> String {
    let lf = rendered.replace("\r\n", "\n");
    format!("{}\n", lf.trim_end())
}

fn validate_slugs(versions: &[ContentVersion]) -> Result<(), RenderError> {
    let mut seen = BTreeSet::new();
    for v in versions {
        let slug = v.slug.as_str();
        let bad = slug.is_empty()
            || slug == "."
            || slug == ".."
            || slug.contains('/')
            || slug.contains('\\');
        if bad {
            return Err(RenderError::InvalidSlug { slug: v.slug.clone(), name: v.name.clone() });
        }
        if !seen.insert(slug) {
            return Err(RenderError::DuplicateSlug { slug: v.slug.clone() });
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// TemplateEngine
// ---------------------------------------------------------------------------

/// Tera-based engine with optional user overrides.
///
/// `user_template_dir` may contain `.tera` files that override embedded
/// defaults by name (for example `claude/rules.md.tera`). Template names are
/// normalised to lowercase and relative paths.
pub struct TemplateEngine {
    tera: Tera,
}

impl TemplateEngine {
    pub fn new(user_template_dir: Option<&Path>) -> Result<Self, RenderError> {
        let tera = build_tera(user_template_dir)?;
        Ok(TemplateEngine { tera })
    }

    /// Canonical file for one item of the context.
    pub fn render_item(&self, ctx: &RenderContext, index: usize) -> Result<String, RenderError> {
        let mut tera_ctx = ctx.to_tera_context()?;
        if let Some(item) = ctx.items.get(index) {
            tera_ctx.insert("item", item);
        }
        Ok(normalize_output(self.tera.render(CONTENT_TEMPLATE, &tera_ctx)?))
    }

    pub fn render_index(&self, ctx: &RenderContext) -> Result<String, RenderError> {
        let tera_ctx = ctx.to_tera_context()?;
        Ok(normalize_output(self.tera.render(INDEX_TEMPLATE, &tera_ctx)?))
    }

    pub fn render_agent(&self, ctx: &RenderContext, agent: AgentKind) -> Result<String, RenderError> {
        let tera_ctx = ctx.to_tera_context()?;
        Ok(normalize_output(self.tera.render(agent_template(agent), &tera_ctx)?))
    }
}

// ---------------------------------------------------------------------------
// TeraRenderer
// ---------------------------------------------------------------------------

/// Default [`ContentRenderer`].
///
/// Create once with [`TeraRenderer::new`] and reuse; rendering is read-only.
pub struct TeraRenderer {
    engine: TemplateEngine,
}

impl TeraRenderer {
    /// Embedded templates only.
    pub fn new() -> Result<Self, RenderError> {
        Ok(TeraRenderer { engine: TemplateEngine::new(None)? })
    }

    /// Embedded templates overridden by any `.tera` files under `dir`.
    pub fn with_template_dir(dir: &Path) -> Result<Self, RenderError> {
        Ok(TeraRenderer { engine: TemplateEngine::new(Some(dir))? })
    }
}

impl ContentRenderer for TeraRenderer {
    fn render(
        &self,
        kind: ContentKind,
        versions: &[ContentVersion],
        repository: &Repository,
        target: &Target,
        agents: &[AgentKind],
    ) -> Result<FileUpdates, RenderError> {
        validate_slugs(versions)?;
        let ctx = RenderContext::new(kind, versions, repository, target);
        let mut updates = FileUpdates::default();

        for (index, item) in ctx.items.iter().enumerate() {
            updates.create_or_update.push(FileUpdate {
                path: PathBuf::from(&item.path),
                content: self.engine.render_item(&ctx, index)?,
            });
        }
        updates.create_or_update.push(FileUpdate {
            path: PathBuf::from(target_prefixed(target, &index_file(kind))),
            content: self.engine.render_index(&ctx)?,
        });

        for agent in AgentKind::all() {
            let path = PathBuf::from(target_prefixed(target, &agent_output_path(*agent, kind)));
            if agents.contains(agent) {
                updates.create_or_update.push(FileUpdate {
                    path,
                    content: self.engine.render_agent(&ctx, *agent)?,
                });
            } else {
                updates.delete.push(path);
            }
        }

        Ok(updates)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
