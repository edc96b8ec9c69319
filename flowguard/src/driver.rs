// flowguard/src/driver.rs
//
// The auto-test driver: walks `<project>/specs`, categorizes
// every YAML file, runs parse → normalize → validate → coverage, and returns
// the two report documents (emission to disk is the caller's job, see
// `commands::check`).

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::{Context, Result};
use chrono::Utc;
use flowguard_core::application::{FlowSource, ValidationOrchestrator};
use flowguard_core::domain::config::DomainConfig;
use flowguard_core::domain::coverage::{compute_coverage, quality_score, quality_verdict};
use flowguard_core::domain::flow::FlowType;
use flowguard_core::domain::issue::{Scope, Severity};
use flowguard_core::domain::pages::SpecsContext;
use flowguard_core::domain::ports::Normalizer;
use flowguard_core::infrastructure::normalizer::YamlNormalizer;
use futures::stream::{self, StreamExt};
use regex::Regex;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::report::{
    compatibility_verdict, issues_by_category, CompatibilityReport, CompatibilitySummary, NormalizeDetail,
    NormalizeFailure, NormalizeSummary, ParseFailure, QualityReport, QualitySummary, RateSummary,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileCategory {
    Flow,
    Domain,
    Schema,
    System,
    Config,
    Ui,
    Infrastructure,
    Shared,
    Other,
}

impl FileCategory {
    fn as_str(&self) -> &'static str {
        match self {
            FileCategory::Flow => "flow",
            FileCategory::Domain => "domain",
            FileCategory::Schema => "schema",
            FileCategory::System => "system",
            FileCategory::Config => "config",
            FileCategory::Ui => "ui",
            FileCategory::Infrastructure => "infrastructure",
            FileCategory::Shared => "shared",
            FileCategory::Other => "other",
        }
    }
}

struct CategoryPatterns {
    flow: Regex,
    domain: Regex,
    schema: Regex,
    system: Regex,
    config: Regex,
    ui: Regex,
    infrastructure: Regex,
    shared: Regex,
}

fn re(pattern: &str) -> Regex {
    // Patterns are hardcoded above; this never actually fails.
    Regex::new(pattern).unwrap_or_else(|_| Regex::new("$^").unwrap_or_else(|_| unreachable!()))
}

fn patterns() -> &'static CategoryPatterns {
    static PATTERNS: OnceLock<CategoryPatterns> = OnceLock::new();
    PATTERNS.get_or_init(|| CategoryPatterns {
        flow: re(r"^domains/([^/]+)/flows/([^/]+)\.ya?ml$"),
        domain: re(r"^domains/([^/]+)/domain\.ya?ml$"),
        schema: re(r"^schemas/"),
        system: re(r"^system\.ya?ml$"),
        config: re(r"^(config|architecture)\.ya?ml$"),
        ui: re(r"^ui/"),
        infrastructure: re(r"^infrastructure\.ya?ml$"),
        shared: re(r"^shared/"),
    })
}

pub struct CategorizedFile {
    pub path: PathBuf,
    pub relative: String,
    pub category: FileCategory,
    pub domain_id: Option<String>,
    pub flow_id: Option<String>,
}

fn categorize(relative: &str) -> (FileCategory, Option<String>, Option<String>) {
    let p = patterns();
    if let Some(caps) = p.flow.captures(relative) {
        return (FileCategory::Flow, Some(caps[1].to_string()), Some(caps[2].to_string()));
    }
    if let Some(caps) = p.domain.captures(relative) {
        return (FileCategory::Domain, Some(caps[1].to_string()), None);
    }
    if p.schema.is_match(relative) {
        return (FileCategory::Schema, None, None);
    }
    if p.system.is_match(relative) {
        return (FileCategory::System, None, None);
    }
    if p.config.is_match(relative) {
        return (FileCategory::Config, None, None);
    }
    if p.ui.is_match(relative) {
        return (FileCategory::Ui, None, None);
    }
    if p.infrastructure.is_match(relative) {
        return (FileCategory::Infrastructure, None, None);
    }
    if p.shared.is_match(relative) {
        return (FileCategory::Shared, None, None);
    }
    (FileCategory::Other, None, None)
}

/// Walks `<project>/specs`, skipping hidden directories and `node_modules`,
/// collecting every `.yaml`/`.yml` file with its category and (for flow/
/// domain files) the ids parsed from its path.
pub fn discover(project_dir: &Path) -> Vec<CategorizedFile> {
    let specs_dir = project_dir.join("specs");
    let mut files = Vec::new();

    let walker = WalkDir::new(&specs_dir).into_iter().filter_entry(|e| {
        let name = e.file_name().to_string_lossy();
        if e.file_type().is_dir() {
            return !name.starts_with('.') && name != "node_modules";
        }
        true
    });

    for entry in walker.filter_map(|e| e.ok()) {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let is_yaml = path.extension().is_some_and(|ext| ext == "yaml" || ext == "yml");
        if !is_yaml {
            continue;
        }
        let relative = path.strip_prefix(&specs_dir).unwrap_or(path).to_string_lossy().replace('\\', "/");
        let (category, domain_id, flow_id) = categorize(&relative);
        files.push(CategorizedFile { path: path.to_path_buf(), relative, category, domain_id, flow_id });
    }

    files
}

struct ParseOutcome {
    file: CategorizedFile,
    value: Option<serde_yaml::Value>,
    error: Option<String>,
}

/// Reads every discovered file concurrently (bounded to 8 in-flight reads,
/// mirroring a bounded-concurrency `buffer_unordered(8)` idiom) and parses it as
/// YAML. A read/parse failure is captured, never propagated.
async fn parse_all(files: Vec<CategorizedFile>) -> Vec<ParseOutcome> {
    stream::iter(files)
        .map(|file| async move {
            match tokio::fs::read_to_string(&file.path).await {
                Ok(text) => match serde_yaml::from_str::<serde_yaml::Value>(&text) {
                    Ok(value) => ParseOutcome { file, value: Some(value), error: None },
                    Err(e) => ParseOutcome { file, value: None, error: Some(e.to_string()) },
                },
                Err(e) => ParseOutcome { file, value: None, error: Some(e.to_string()) },
            }
        })
        .buffer_unordered(8)
        .collect()
        .await
}

pub struct DriverOutput {
    pub compatibility: CompatibilityReport,
    pub quality: QualityReport,
}

pub async fn run(project_dir: &Path) -> Result<DriverOutput> {
    let project = project_dir.display().to_string();
    let discovered = discover(project_dir);
    info!(file_count = discovered.len(), "discovered spec files");

    let mut files_by_category: HashMap<String, usize> = HashMap::new();
    for file in &discovered {
        *files_by_category.entry(file.category.as_str().to_string()).or_insert(0) += 1;
    }

    let parsed = parse_all(discovered).await;

    let parse_failures: Vec<ParseFailure> = parsed
        .iter()
        .filter_map(|p| p.error.as_ref().map(|e| ParseFailure { file: p.file.relative.clone(), error: e.clone() }))
        .collect();
    let parse_success_count = parsed.iter().filter(|p| p.error.is_none()).count();
    let parse_failed_count = parsed.len() - parse_success_count;

    // Domain configs come first: flow normalization needs to know each
    // flow's declared type.
    let mut domains: Vec<DomainConfig> = Vec::new();
    for outcome in &parsed {
        if outcome.file.category != FileCategory::Domain {
            continue;
        }
        let Some(value) = &outcome.value else { continue };
        match serde_yaml::from_value::<DomainConfig>(value.clone()) {
            Ok(config) => domains.push(config),
            Err(e) => warn!(file = %outcome.file.relative, error = %e, "failed to deserialize domain.yaml"),
        }
    }

    let normalizer = YamlNormalizer;
    let mut sources_by_domain: HashMap<String, Vec<FlowSource>> = HashMap::new();
    let mut normalize_failures = Vec::new();
    let mut normalize_details = Vec::new();

    for outcome in &parsed {
        if outcome.file.category != FileCategory::Flow {
            continue;
        }
        let (Some(domain_id), Some(flow_id)) = (&outcome.file.domain_id, &outcome.file.flow_id) else { continue };

        let Some(value) = &outcome.value else {
            normalize_failures.push(NormalizeFailure {
                domain_id: domain_id.clone(),
                flow_id: flow_id.clone(),
                error: outcome.error.clone().unwrap_or_default(),
            });
            normalize_details.push(NormalizeDetail { domain_id: domain_id.clone(), flow_id: flow_id.clone(), success: false });
            continue;
        };
        let Some(mapping) = value.as_mapping() else {
            normalize_failures.push(NormalizeFailure { domain_id: domain_id.clone(), flow_id: flow_id.clone(), error: "flow document is not a mapping".into() });
            normalize_details.push(NormalizeDetail { domain_id: domain_id.clone(), flow_id: flow_id.clone(), success: false });
            continue;
        };

        let flow_type = domains
            .iter()
            .find(|d| &d.name == domain_id)
            .and_then(|d| d.flows.iter().find(|f| &f.id == flow_id))
            .map(|f| f.flow_type)
            .unwrap_or(FlowType::Traditional);

        let raw = match normalizer.normalize(mapping, domain_id, flow_id, flow_type) {
            Ok(doc) => {
                normalize_details.push(NormalizeDetail { domain_id: domain_id.clone(), flow_id: flow_id.clone(), success: true });
                Ok(doc)
            }
            Err(e) => {
                normalize_failures.push(NormalizeFailure { domain_id: domain_id.clone(), flow_id: flow_id.clone(), error: e.to_string() });
                normalize_details.push(NormalizeDetail { domain_id: domain_id.clone(), flow_id: flow_id.clone(), success: false });
                Err(e.to_string())
            }
        };

        sources_by_domain.entry(domain_id.clone()).or_default().push(FlowSource { flow_id: flow_id.clone(), raw });
    }

    let normalize_success_count = normalize_details.iter().filter(|d| d.success).count();
    let normalize_failed_count = normalize_details.len() - normalize_success_count;

    let normalized_flows: Vec<_> = sources_by_domain.values().flatten().filter_map(|s| s.raw.clone().ok()).collect();
    debug!(flows = normalized_flows.len(), "normalized flows ready for coverage");

    let mut ctx = build_specs_context(&parsed);
    ctx.flow_docs = normalized_flows.clone();

    let mut orchestrator = ValidationOrchestrator::new();
    orchestrator.validate_all_domains(&domains, &sources_by_domain);
    orchestrator.validate_system(&domains, Some(&ctx));

    let mut flow_results: Vec<_> = orchestrator.all_flow_results().map(|(_, r)| r.clone()).collect();
    flowguard_core::application::orchestrator::sort_by_target_id(&mut flow_results);
    let mut domain_results: Vec<_> = orchestrator.all_domain_results().map(|(_, r)| r.clone()).collect();
    flowguard_core::application::orchestrator::sort_by_target_id(&mut domain_results);
    let system_result = orchestrator.system_result().cloned().unwrap_or_else(|| {
        flowguard_core::domain::issue::ValidationResult::build(flowguard_core::domain::issue::Scope::System, "system", vec![])
    });

    let coverage = compute_coverage(&normalized_flows, &flow_results);

    // `domain_results` entries have their flows' issues folded in (see
    // `ValidationOrchestrator::validate_domain_flows`) so that the
    // per-domain view and the implement gate see a domain's full picture.
    // That folding would double-count every flow-scope issue here, since
    // `flow_results` already carries them — so the corpus-wide aggregation
    // below only takes each domain result's own domain-scope issues.
    let domain_only_issues: Vec<&flowguard_core::domain::issue::ValidationIssue> = domain_results
        .iter()
        .flat_map(|r| r.issues.iter())
        .filter(|i| i.scope == Scope::Domain)
        .collect();

    let total_errors: usize = flow_results.iter().map(|r| r.error_count).sum::<usize>()
        + domain_only_issues.iter().filter(|i| i.severity == Severity::Error).count()
        + system_result.error_count;
    let total_warnings: usize = flow_results.iter().map(|r| r.warning_count).sum::<usize>()
        + domain_only_issues.iter().filter(|i| i.severity == Severity::Warning).count()
        + system_result.warning_count;
    let total_info: usize = flow_results.iter().map(|r| r.info_count).sum::<usize>()
        + domain_only_issues.iter().filter(|i| i.severity == Severity::Info).count()
        + system_result.info_count;

    let all_issues: Vec<&flowguard_core::domain::issue::ValidationIssue> = flow_results
        .iter()
        .flat_map(|r| r.issues.iter())
        .chain(domain_only_issues.iter().copied())
        .chain(system_result.issues.iter())
        .collect();

    let score = quality_score(coverage.flows.total, total_errors, total_warnings);

    let compatibility = CompatibilityReport {
        report: "tool-compatibility-report",
        generated_at: Utc::now().to_rfc3339(),
        project: project.clone(),
        summary: CompatibilitySummary {
            total_files: files_by_category.values().sum(),
            files_by_category,
            parse: RateSummary::new(parse_success_count, parse_failed_count),
            normalize: NormalizeSummary::new(normalize_success_count, normalize_failed_count),
        },
        parse_failures: parse_failures.clone(),
        normalize_failures,
        normalize_details,
        compatibility_verdict: compatibility_verdict(!parse_failures.is_empty(), normalize_failed_count > 0),
    };

    let quality = QualityReport {
        report: "spec-quality-report",
        generated_at: Utc::now().to_rfc3339(),
        project,
        summary: QualitySummary {
            quality_score: score,
            total_issues: total_errors + total_warnings + total_info,
            errors: total_errors,
            warnings: total_warnings,
            info: total_info,
            issues_by_category: issues_by_category(&all_issues),
        },
        coverage,
        flow_validation: flow_results,
        domain_validation: domain_results,
        system_validation: system_result,
        quality_verdict: quality_verdict(score),
    };

    Ok(DriverOutput { compatibility, quality })
}

fn build_specs_context(parsed: &[ParseOutcome]) -> SpecsContext {
    let mut ctx = SpecsContext::default();

    for outcome in parsed {
        let Some(value) = &outcome.value else { continue };
        match outcome.file.category {
            FileCategory::Schema => {
                if let Some(name) = outcome.file.path.file_stem().map(|s| s.to_string_lossy().to_string()) {
                    ctx.schemas.push(flowguard_core::domain::pages::SchemaFile { name });
                }
            }
            _ if outcome.file.relative == "pages.yaml" || outcome.file.relative == "pages.yml" => {
                if let Ok(pages_config) = serde_yaml::from_value(value.clone()) {
                    ctx.pages_config = Some(pages_config);
                }
                if let Some(pages) = value.get("pages").and_then(|v| v.as_sequence()) {
                    for page in pages {
                        if let Ok(spec) = serde_yaml::from_value(page.clone()) {
                            ctx.page_specs.push(spec);
                        }
                    }
                }
            }
            FileCategory::Infrastructure => {
                ctx.infrastructure = serde_yaml::from_value(value.clone()).ok();
            }
            _ => {}
        }
    }

    ctx
}

pub fn write_reports(project_dir: &Path, output: &DriverOutput) -> Result<()> {
    let compat_path = project_dir.join("tool-compatibility-report.yaml");
    let quality_path = project_dir.join("spec-quality-report.yaml");

    let compat_yaml = serde_yaml::to_string(&output.compatibility).context("serializing compatibility report")?;
    let quality_yaml = serde_yaml::to_string(&output.quality).context("serializing quality report")?;

    std::fs::write(&compat_path, compat_yaml).with_context(|| format!("writing {}", compat_path.display()))?;
    std::fs::write(&quality_path, quality_yaml).with_context(|| format!("writing {}", quality_path.display()))?;

    Ok(())
}
