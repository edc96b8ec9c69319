// flowguard/src/commands/flow.rs
//
// `flowguard flow <path> --domain <id>`: validates a single flow file in
// isolation, optionally resolving sub_flow cross-references against sibling
// domain.yaml files.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use flowguard_core::domain::config::DomainConfig;
use flowguard_core::domain::flow::FlowType;
use flowguard_core::domain::ports::Normalizer;
use flowguard_core::domain::validators::validate_flow;
use flowguard_core::infrastructure::normalizer::YamlNormalizer;

pub fn run(path: &Path, domain_id: &str, domains_dir: Option<PathBuf>) -> Result<()> {
    let text = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let value: serde_yaml::Value = serde_yaml::from_str(&text).with_context(|| format!("parsing {}", path.display()))?;
    let mapping = value.as_mapping().context("flow document is not a mapping")?;

    let flow_id = path.file_stem().map(|s| s.to_string_lossy().to_string()).unwrap_or_default();

    let domains = load_sibling_domains(domains_dir, domain_id)?;
    let flow_type = domains
        .iter()
        .find(|d| d.name == domain_id)
        .and_then(|d| d.flows.iter().find(|f| f.id == flow_id))
        .map(|f| f.flow_type)
        .unwrap_or(FlowType::Traditional);

    let doc = YamlNormalizer.normalize(mapping, domain_id, &flow_id, flow_type)?;
    let result = validate_flow(&doc, &domains);

    println!("{}", serde_yaml::to_string(&result)?);

    Ok(())
}

fn load_sibling_domains(domains_dir: Option<PathBuf>, _focus_domain: &str) -> Result<Vec<DomainConfig>> {
    let Some(dir) = domains_dir else { return Ok(Vec::new()) };
    let mut domains = Vec::new();

    if !dir.is_dir() {
        return Ok(domains);
    }

    for entry in std::fs::read_dir(&dir)?.filter_map(|e| e.ok()) {
        let domain_yaml = entry.path().join("domain.yaml");
        if !domain_yaml.is_file() {
            continue;
        }
        let text = std::fs::read_to_string(&domain_yaml)?;
        if let Ok(config) = serde_yaml::from_str::<DomainConfig>(&text) {
            domains.push(config);
        }
    }

    Ok(domains)
}
