use ll_core::config::{DEFAULT_MAX_DOMAIN_RULES, DOMAIN_RULE_BASE_ID};
use ll_core::{DomainToken, EngineConfig, ResourceType, Rule, RuleCondition, RuleId};

/// Compiles domain lists into blocking rules with deterministic IDs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleCompiler {
    pub max_domain_rules: usize,
    pub base_id: RuleId,
}

impl Default for RuleCompiler {
    fn default() -> Self {
        Self {
            max_domain_rules: DEFAULT_MAX_DOMAIN_RULES,
            base_id: DOMAIN_RULE_BASE_ID,
        }
    }
}

impl RuleCompiler {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            max_domain_rules: config.max_domain_rules,
            base_id: config.domain_rule_base_id,
        }
    }

    /// One rule per domain, IDs counting up from `base_id` in list order.
    /// Domains past `max_domain_rules`, or past the last representable rule
    /// ID, are dropped.
    pub fn compile_domain_rules(&self, domains: &[DomainToken]) -> Vec<Rule> {
        if domains.len() > self.max_domain_rules {
            log::debug!(
                "truncating {} domains to {} rules",
                domains.len(),
                self.max_domain_rules
            );
        }

        let rules: Vec<Rule> = domains
            .iter()
            .take(self.max_domain_rules)
            .zip(self.base_id..=RuleId::MAX)
            .map(|(domain, id)| domain_rule(id, domain))
            .collect();

        if rules.len() < domains.len().min(self.max_domain_rules) {
            log::warn!(
                "rule IDs from {} ran out after {} domain rules",
                self.base_id,
                rules.len()
            );
        }
        rules
    }
}

/// Compile with the default cap and base ID.
pub fn compile_domain_rules(domains: &[DomainToken]) -> Vec<Rule> {
    RuleCompiler::default().compile_domain_rules(domains)
}

fn domain_rule(id: RuleId, domain: &DomainToken) -> Rule {
    Rule::block(
        id,
        RuleCondition {
            url_filter: Some(format!("||{}^", domain)),
            resource_types: Some(ResourceType::DOMAIN_RULE_TYPES.to_vec()),
        },
    )
}
